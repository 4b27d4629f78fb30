//! Catalog storage layer: the store-side collaborator of the import pipeline.
//!
//! The pipeline only talks to the narrow [`CatalogStore`] trait, so the
//! reconciliation and mapping logic can run against any backend (or a test
//! double). [`SqlCatalog`] is the shipped libSQL implementation with
//! versioned migrations and seed rows for the well-known attributes.

mod entities;
mod migrations;

use std::path::Path;

use async_trait::async_trait;
use chrono::Utc;
use libsql::{Connection, Database, params};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use shopmirror_shared::{Result, ShopMirrorError};

pub use entities::{
    AttributeCombination, AttributeDefinition, AttributeMapping, AttributePair, AttributeValue,
    CatalogProduct, CategoryNode, ControlType, NewAttributeMapping, NewAttributeValue,
    NewCategory, NewCombination, NewProduct, PictureAsset, ProductCategory, ProductPicture,
    UserField,
};

/// Ids of the seed rows created by migration v1, plus the fixed layout ids.
pub mod known {
    /// Seeded "Color" attribute definition (swatch grid).
    pub const ATTRIBUTE_COLOR: &str = "attr-color";
    /// Seeded "Size" attribute definition (dropdown).
    pub const ATTRIBUTE_SIZE: &str = "attr-size";
    /// Seeded "Ships From" attribute definition (dropdown).
    pub const ATTRIBUTE_SHIPS_FROM: &str = "attr-ships-from";
    /// Default layout for imported products.
    pub const PRODUCT_LAYOUT_SIMPLE: &str = "layout-simple";
    /// Default layout for categories created during reconciliation.
    pub const CATEGORY_LAYOUT_GRID_OR_LINES: &str = "layout-grid-or-lines";
}

// ---------------------------------------------------------------------------
// CatalogStore trait
// ---------------------------------------------------------------------------

/// The catalog service capability consumed by the import pipeline.
///
/// Every method is one catalog mutation or lookup; the pipeline composes them
/// and owns the error policy (what is fatal, what is skip-and-log).
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Create a product. Returns the generated product id.
    async fn insert_product(&self, product: &NewProduct) -> Result<String>;

    /// Fetch a product with all its associations loaded.
    async fn get_product(&self, id: &str) -> Result<Option<CatalogProduct>>;

    /// Associate a product with a category.
    async fn attach_category(
        &self,
        product_id: &str,
        category_id: &str,
        featured: bool,
    ) -> Result<()>;

    /// Set (upsert) a key/value metadata field on a product.
    async fn set_user_field(&self, product_id: &str, key: &str, value: &str) -> Result<()>;

    /// Create a category node. Returns the generated category id.
    async fn insert_category(&self, category: &NewCategory) -> Result<String>;

    /// Look up a category by the marketplace's external id.
    async fn category_by_external_id(&self, external_id: i64) -> Result<Option<CategoryNode>>;

    /// Look up a category by its catalog id.
    async fn category_by_id(&self, id: &str) -> Result<Option<CategoryNode>>;

    /// Create an attribute definition. Returns the generated attribute id.
    async fn insert_attribute(&self, name: &str) -> Result<String>;

    /// Look up an attribute definition by id.
    async fn attribute_by_id(&self, id: &str) -> Result<Option<AttributeDefinition>>;

    /// Bind an attribute (with its values) to a product. Returns the stored
    /// mapping including generated value ids.
    async fn insert_attribute_mapping(
        &self,
        product_id: &str,
        mapping: &NewAttributeMapping,
    ) -> Result<AttributeMapping>;

    /// Create a purchasable combination. Returns the generated id.
    async fn insert_combination(
        &self,
        product_id: &str,
        combination: &NewCombination,
    ) -> Result<String>;

    /// Register a picture asset from raw bytes.
    async fn insert_picture(&self, data: &[u8], mime_type: &str, alt: &str)
    -> Result<PictureAsset>;

    /// Attach a picture to a product's gallery at the given display order.
    async fn attach_picture(
        &self,
        product_id: &str,
        picture_id: &str,
        display_order: i64,
    ) -> Result<()>;

    /// Pictures currently attached to a product, ordered by display order.
    async fn product_pictures(&self, product_id: &str) -> Result<Vec<ProductPicture>>;
}

// ---------------------------------------------------------------------------
// SqlCatalog
// ---------------------------------------------------------------------------

/// libSQL-backed catalog store.
pub struct SqlCatalog {
    #[allow(dead_code)]
    db: Database,
    conn: Connection,
}

impl SqlCatalog {
    /// Open or create a catalog database at `path`.
    pub async fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ShopMirrorError::io(parent, e))?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| ShopMirrorError::Catalog(e.to_string()))?;

        let conn = db
            .connect()
            .map_err(|e| ShopMirrorError::Catalog(e.to_string()))?;

        let catalog = Self { db, conn };
        catalog.run_migrations().await?;
        Ok(catalog)
    }

    /// Run pending schema migrations.
    async fn run_migrations(&self) -> Result<()> {
        let current_version = self.get_schema_version().await;

        for migration in migrations::all_migrations() {
            if migration.version > current_version {
                tracing::info!(
                    version = migration.version,
                    description = migration.description,
                    "applying migration"
                );
                self.conn.execute_batch(migration.sql).await.map_err(|e| {
                    ShopMirrorError::Catalog(format!(
                        "migration v{} failed: {e}",
                        migration.version
                    ))
                })?;
            }
        }
        Ok(())
    }

    /// Get the current schema version, or 0 if no migrations have been applied.
    async fn get_schema_version(&self) -> u32 {
        let result = self
            .conn
            .query("SELECT MAX(version) FROM schema_migrations", params![])
            .await;

        match result {
            Ok(mut rows) => {
                if let Ok(Some(row)) = rows.next().await {
                    row.get::<u32>(0).unwrap_or(0)
                } else {
                    0
                }
            }
            Err(_) => 0, // Table doesn't exist yet
        }
    }

    /// Load the attribute mappings (with values) attached to a product.
    async fn load_mappings(&self, product_id: &str) -> Result<Vec<AttributeMapping>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, attribute_id, control_type, is_required, display_order
                 FROM attribute_mappings WHERE product_id = ?1 ORDER BY display_order",
                params![product_id],
            )
            .await
            .map_err(catalog_err)?;

        let mut mappings = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            let id: String = row.get(0).map_err(catalog_err)?;
            let control: String = row.get(2).map_err(catalog_err)?;
            mappings.push(AttributeMapping {
                id: id.clone(),
                attribute_id: row.get(1).map_err(catalog_err)?,
                control_type: ControlType::from_str_lossy(&control),
                is_required: row.get::<i64>(3).map_err(catalog_err)? != 0,
                display_order: row.get(4).map_err(catalog_err)?,
                values: Vec::new(),
            });
        }

        for mapping in &mut mappings {
            mapping.values = self.load_values(&mapping.id).await?;
        }
        Ok(mappings)
    }

    /// Load the values under one attribute mapping.
    async fn load_values(&self, mapping_id: &str) -> Result<Vec<AttributeValue>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, name, picture_id, display_order, price_adjustment, quantity
                 FROM attribute_values WHERE mapping_id = ?1 ORDER BY display_order",
                params![mapping_id],
            )
            .await
            .map_err(catalog_err)?;

        let mut values = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            values.push(AttributeValue {
                id: row.get(0).map_err(catalog_err)?,
                name: row.get(1).map_err(catalog_err)?,
                picture_id: row.get::<String>(2).ok(),
                display_order: row.get(3).map_err(catalog_err)?,
                price_adjustment: row.get(4).map_err(catalog_err)?,
                quantity: row.get(5).map_err(catalog_err)?,
            });
        }
        Ok(values)
    }

    /// Load the combinations attached to a product.
    async fn load_combinations(&self, product_id: &str) -> Result<Vec<AttributeCombination>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, pairs_json, stock_quantity, overridden_price, picture_id
                 FROM attribute_combinations WHERE product_id = ?1",
                params![product_id],
            )
            .await
            .map_err(catalog_err)?;

        let mut combinations = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            let pairs_json: String = row.get(1).map_err(catalog_err)?;
            let pairs: Vec<AttributePair> = serde_json::from_str(&pairs_json)
                .map_err(|e| ShopMirrorError::Catalog(format!("invalid pairs json: {e}")))?;
            combinations.push(AttributeCombination {
                id: row.get(0).map_err(catalog_err)?,
                pairs,
                stock_quantity: row.get(2).map_err(catalog_err)?,
                overridden_price: row.get(3).map_err(catalog_err)?,
                picture_id: row.get::<String>(4).ok(),
            });
        }
        Ok(combinations)
    }
}

#[async_trait]
impl CatalogStore for SqlCatalog {
    async fn insert_product(&self, product: &NewProduct) -> Result<String> {
        let id = Uuid::now_v7().to_string();
        let now = Utc::now().to_rfc3339();
        self.conn
            .execute(
                "INSERT INTO products (
                    id, name, description, layout_id, published, show_on_home_page,
                    visible_individually, allow_customer_reviews, manage_stock_by_attributes,
                    display_stock_quantity, price, product_cost, catalog_price,
                    min_entered_price, max_entered_price, stock_quantity,
                    order_minimum_quantity, order_maximum_quantity, display_order, created_at
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20)",
                params![
                    id.as_str(),
                    product.name.as_str(),
                    product.description.as_str(),
                    product.layout_id.as_str(),
                    product.published as i64,
                    product.show_on_home_page as i64,
                    product.visible_individually as i64,
                    product.allow_customer_reviews as i64,
                    product.manage_stock_by_attributes as i64,
                    product.display_stock_quantity as i64,
                    product.price,
                    product.product_cost,
                    product.catalog_price,
                    product.min_entered_price,
                    product.max_entered_price,
                    product.stock_quantity,
                    product.order_minimum_quantity,
                    product.order_maximum_quantity,
                    product.display_order,
                    now.as_str(),
                ],
            )
            .await
            .map_err(catalog_err)?;
        Ok(id)
    }

    async fn get_product(&self, id: &str) -> Result<Option<CatalogProduct>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, name, description, layout_id, published, show_on_home_page,
                        visible_individually, allow_customer_reviews, manage_stock_by_attributes,
                        display_stock_quantity, price, product_cost, catalog_price,
                        min_entered_price, max_entered_price, stock_quantity,
                        order_minimum_quantity, order_maximum_quantity, display_order
                 FROM products WHERE id = ?1",
                params![id],
            )
            .await
            .map_err(catalog_err)?;

        let row = match rows.next().await {
            Ok(Some(row)) => row,
            Ok(None) => return Ok(None),
            Err(e) => return Err(catalog_err(e)),
        };

        let mut product = CatalogProduct {
            id: row.get(0).map_err(catalog_err)?,
            name: row.get(1).map_err(catalog_err)?,
            description: row.get(2).map_err(catalog_err)?,
            layout_id: row.get(3).map_err(catalog_err)?,
            published: row.get::<i64>(4).map_err(catalog_err)? != 0,
            show_on_home_page: row.get::<i64>(5).map_err(catalog_err)? != 0,
            visible_individually: row.get::<i64>(6).map_err(catalog_err)? != 0,
            allow_customer_reviews: row.get::<i64>(7).map_err(catalog_err)? != 0,
            manage_stock_by_attributes: row.get::<i64>(8).map_err(catalog_err)? != 0,
            display_stock_quantity: row.get::<i64>(9).map_err(catalog_err)? != 0,
            price: row.get(10).map_err(catalog_err)?,
            product_cost: row.get(11).map_err(catalog_err)?,
            catalog_price: row.get(12).map_err(catalog_err)?,
            min_entered_price: row.get(13).map_err(catalog_err)?,
            max_entered_price: row.get(14).map_err(catalog_err)?,
            stock_quantity: row.get(15).map_err(catalog_err)?,
            order_minimum_quantity: row.get(16).map_err(catalog_err)?,
            order_maximum_quantity: row.get(17).map_err(catalog_err)?,
            display_order: row.get(18).map_err(catalog_err)?,
            categories: Vec::new(),
            pictures: Vec::new(),
            user_fields: Vec::new(),
            attribute_mappings: Vec::new(),
            combinations: Vec::new(),
        };

        let mut rows = self
            .conn
            .query(
                "SELECT category_id, featured FROM product_categories WHERE product_id = ?1",
                params![id],
            )
            .await
            .map_err(catalog_err)?;
        while let Ok(Some(row)) = rows.next().await {
            product.categories.push(ProductCategory {
                category_id: row.get(0).map_err(catalog_err)?,
                featured: row.get::<i64>(1).map_err(catalog_err)? != 0,
            });
        }

        product.pictures = self.product_pictures(id).await?;

        let mut rows = self
            .conn
            .query(
                "SELECT key, value FROM product_user_fields WHERE product_id = ?1 ORDER BY key",
                params![id],
            )
            .await
            .map_err(catalog_err)?;
        while let Ok(Some(row)) = rows.next().await {
            product.user_fields.push(UserField {
                key: row.get(0).map_err(catalog_err)?,
                value: row.get(1).map_err(catalog_err)?,
            });
        }

        product.attribute_mappings = self.load_mappings(id).await?;
        product.combinations = self.load_combinations(id).await?;

        Ok(Some(product))
    }

    async fn attach_category(
        &self,
        product_id: &str,
        category_id: &str,
        featured: bool,
    ) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO product_categories (product_id, category_id, featured)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(product_id, category_id) DO NOTHING",
                params![product_id, category_id, featured as i64],
            )
            .await
            .map_err(catalog_err)?;
        Ok(())
    }

    async fn set_user_field(&self, product_id: &str, key: &str, value: &str) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO product_user_fields (product_id, key, value)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(product_id, key) DO UPDATE SET value = excluded.value",
                params![product_id, key, value],
            )
            .await
            .map_err(catalog_err)?;
        Ok(())
    }

    async fn insert_category(&self, category: &NewCategory) -> Result<String> {
        let id = Uuid::now_v7().to_string();
        let now = Utc::now().to_rfc3339();
        self.conn
            .execute(
                "INSERT INTO categories (
                    id, name, parent_id, external_id, layout_id, published, include_in_menu,
                    allow_page_size_selection, page_size, page_size_options, picture_id, created_at
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                params![
                    id.as_str(),
                    category.name.as_str(),
                    category.parent_id.as_deref(),
                    category.external_id,
                    category.layout_id.as_str(),
                    category.published as i64,
                    category.include_in_menu as i64,
                    category.allow_page_size_selection as i64,
                    category.page_size,
                    category.page_size_options.as_str(),
                    category.picture_id.as_deref(),
                    now.as_str(),
                ],
            )
            .await
            .map_err(catalog_err)?;
        Ok(id)
    }

    async fn category_by_external_id(&self, external_id: i64) -> Result<Option<CategoryNode>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, name, parent_id, external_id, layout_id, published, include_in_menu,
                        allow_page_size_selection, page_size, page_size_options, picture_id
                 FROM categories WHERE external_id = ?1",
                params![external_id],
            )
            .await
            .map_err(catalog_err)?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(row_to_category(&row)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(catalog_err(e)),
        }
    }

    async fn category_by_id(&self, id: &str) -> Result<Option<CategoryNode>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, name, parent_id, external_id, layout_id, published, include_in_menu,
                        allow_page_size_selection, page_size, page_size_options, picture_id
                 FROM categories WHERE id = ?1",
                params![id],
            )
            .await
            .map_err(catalog_err)?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(row_to_category(&row)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(catalog_err(e)),
        }
    }

    async fn insert_attribute(&self, name: &str) -> Result<String> {
        let id = Uuid::now_v7().to_string();
        self.conn
            .execute(
                "INSERT INTO attributes (id, name) VALUES (?1, ?2)",
                params![id.as_str(), name],
            )
            .await
            .map_err(catalog_err)?;
        Ok(id)
    }

    async fn attribute_by_id(&self, id: &str) -> Result<Option<AttributeDefinition>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, name FROM attributes WHERE id = ?1",
                params![id],
            )
            .await
            .map_err(catalog_err)?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(AttributeDefinition {
                id: row.get(0).map_err(catalog_err)?,
                name: row.get(1).map_err(catalog_err)?,
            })),
            Ok(None) => Ok(None),
            Err(e) => Err(catalog_err(e)),
        }
    }

    async fn insert_attribute_mapping(
        &self,
        product_id: &str,
        mapping: &NewAttributeMapping,
    ) -> Result<AttributeMapping> {
        let mapping_id = Uuid::now_v7().to_string();
        self.conn
            .execute(
                "INSERT INTO attribute_mappings (id, product_id, attribute_id, control_type, is_required, display_order)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    mapping_id.as_str(),
                    product_id,
                    mapping.attribute_id.as_str(),
                    mapping.control_type.as_str(),
                    mapping.is_required as i64,
                    mapping.display_order,
                ],
            )
            .await
            .map_err(catalog_err)?;

        let mut stored_values = Vec::with_capacity(mapping.values.len());
        for value in &mapping.values {
            let value_id = Uuid::now_v7().to_string();
            self.conn
                .execute(
                    "INSERT INTO attribute_values (id, mapping_id, name, picture_id, display_order, price_adjustment, quantity)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                    params![
                        value_id.as_str(),
                        mapping_id.as_str(),
                        value.name.as_str(),
                        value.picture_id.as_deref(),
                        value.display_order,
                        value.price_adjustment,
                        value.quantity,
                    ],
                )
                .await
                .map_err(catalog_err)?;
            stored_values.push(AttributeValue {
                id: value_id,
                name: value.name.clone(),
                picture_id: value.picture_id.clone(),
                display_order: value.display_order,
                price_adjustment: value.price_adjustment,
                quantity: value.quantity,
            });
        }

        Ok(AttributeMapping {
            id: mapping_id,
            attribute_id: mapping.attribute_id.clone(),
            control_type: mapping.control_type,
            is_required: mapping.is_required,
            display_order: mapping.display_order,
            values: stored_values,
        })
    }

    async fn insert_combination(
        &self,
        product_id: &str,
        combination: &NewCombination,
    ) -> Result<String> {
        let id = Uuid::now_v7().to_string();
        let pairs_json = serde_json::to_string(&combination.pairs)
            .map_err(|e| ShopMirrorError::Catalog(format!("serialize pairs: {e}")))?;
        self.conn
            .execute(
                "INSERT INTO attribute_combinations (id, product_id, pairs_json, stock_quantity, overridden_price, picture_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    id.as_str(),
                    product_id,
                    pairs_json.as_str(),
                    combination.stock_quantity,
                    combination.overridden_price,
                    combination.picture_id.as_deref(),
                ],
            )
            .await
            .map_err(catalog_err)?;
        Ok(id)
    }

    async fn insert_picture(
        &self,
        data: &[u8],
        mime_type: &str,
        alt: &str,
    ) -> Result<PictureAsset> {
        let id = Uuid::now_v7().to_string();
        let now = Utc::now().to_rfc3339();
        let content_hash = {
            let mut hasher = Sha256::new();
            hasher.update(data);
            format!("{:x}", hasher.finalize())
        };
        self.conn
            .execute(
                "INSERT INTO pictures (id, alt, mime_type, content_hash, data, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    id.as_str(),
                    alt,
                    mime_type,
                    content_hash.as_str(),
                    data.to_vec(),
                    now.as_str(),
                ],
            )
            .await
            .map_err(catalog_err)?;
        Ok(PictureAsset {
            id,
            alt: alt.to_string(),
            mime_type: mime_type.to_string(),
            content_hash,
        })
    }

    async fn attach_picture(
        &self,
        product_id: &str,
        picture_id: &str,
        display_order: i64,
    ) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO product_pictures (product_id, picture_id, display_order)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(product_id, picture_id) DO UPDATE SET
                   display_order = excluded.display_order",
                params![product_id, picture_id, display_order],
            )
            .await
            .map_err(catalog_err)?;
        Ok(())
    }

    async fn product_pictures(&self, product_id: &str) -> Result<Vec<ProductPicture>> {
        let mut rows = self
            .conn
            .query(
                "SELECT picture_id, display_order FROM product_pictures
                 WHERE product_id = ?1 ORDER BY display_order",
                params![product_id],
            )
            .await
            .map_err(catalog_err)?;

        let mut pictures = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            pictures.push(ProductPicture {
                picture_id: row.get(0).map_err(catalog_err)?,
                display_order: row.get(1).map_err(catalog_err)?,
            });
        }
        Ok(pictures)
    }
}

/// Map a libSQL error into the catalog error variant.
fn catalog_err(e: impl std::fmt::Display) -> ShopMirrorError {
    ShopMirrorError::Catalog(e.to_string())
}

/// Convert a database row to a [`CategoryNode`].
fn row_to_category(row: &libsql::Row) -> Result<CategoryNode> {
    Ok(CategoryNode {
        id: row.get(0).map_err(catalog_err)?,
        name: row.get(1).map_err(catalog_err)?,
        parent_id: row.get::<String>(2).ok(),
        external_id: row.get::<i64>(3).ok(),
        layout_id: row.get(4).map_err(catalog_err)?,
        published: row.get::<i64>(5).map_err(catalog_err)? != 0,
        include_in_menu: row.get::<i64>(6).map_err(catalog_err)? != 0,
        allow_page_size_selection: row.get::<i64>(7).map_err(catalog_err)? != 0,
        page_size: row.get(8).map_err(catalog_err)?,
        page_size_options: row.get(9).map_err(catalog_err)?,
        picture_id: row.get::<String>(10).ok(),
    })
}

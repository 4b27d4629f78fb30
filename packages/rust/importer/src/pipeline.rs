//! End-to-end import pipeline: scrape → normalize → create product →
//! categories → provenance → pictures → attributes → combinations.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{error, info, instrument};

use shopmirror_catalog::{CatalogProduct, CatalogStore};
use shopmirror_scraper::{AliExpressScraper, BrowserPage};
use shopmirror_shared::{ImportPolicy, MarketplaceProduct, Result, ShopMirrorError};

use crate::{attributes, categories, conversion, pictures};

/// Provenance field linking a catalog product back to its source listing.
pub const FIELD_PRODUCT_URL: &str = "AliExpressProductUrl";
/// Provenance field carrying the source's native product id.
pub const FIELD_PRODUCT_ID: &str = "AliExpressProductId";

// ---------------------------------------------------------------------------
// ProductSource
// ---------------------------------------------------------------------------

/// Where marketplace products come from.
///
/// The pipeline never touches a browser directly; it consumes this seam so
/// orchestration can be tested with canned records.
#[async_trait]
pub trait ProductSource: Send + Sync {
    /// Product ids reachable from a category's listing page.
    async fn listing_product_ids(&self, category_id: i64, category_name: &str)
    -> Result<Vec<i64>>;

    /// The normalized record for one product.
    async fn product(&self, product_id: i64) -> Result<MarketplaceProduct>;
}

#[async_trait]
impl<P: BrowserPage> ProductSource for AliExpressScraper<P> {
    async fn listing_product_ids(
        &self,
        category_id: i64,
        category_name: &str,
    ) -> Result<Vec<i64>> {
        AliExpressScraper::listing_product_ids(self, category_id, category_name).await
    }

    async fn product(&self, product_id: i64) -> Result<MarketplaceProduct> {
        AliExpressScraper::product(self, product_id).await
    }
}

// ---------------------------------------------------------------------------
// Importer
// ---------------------------------------------------------------------------

/// Runs import pipelines against one catalog store.
pub struct Importer<'a> {
    store: &'a dyn CatalogStore,
    http: reqwest::Client,
}

impl<'a> Importer<'a> {
    pub fn new(store: &'a dyn CatalogStore) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("shopmirror/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ShopMirrorError::Network(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { store, http })
    }

    /// Import a single product into the catalog.
    ///
    /// Phases run in order on the freshly created product: categories,
    /// provenance fields, gallery pictures, attribute mappings, and finally
    /// combinations. Errors propagate to the caller — per-item isolation is
    /// the batch loop's job.
    #[instrument(skip_all, fields(product_id = product_id))]
    pub async fn import_product(
        &self,
        source: &dyn ProductSource,
        product_id: i64,
        policy: &ImportPolicy,
    ) -> Result<CatalogProduct> {
        let market = source.product(product_id).await?;
        info!(title = %market.title, "product scraped");

        let catalog_id = self
            .store
            .insert_product(&conversion::new_product_from(&market, policy))
            .await?;

        categories::reconcile(self.store, &catalog_id, &market, policy).await?;

        self.store
            .set_user_field(
                &catalog_id,
                FIELD_PRODUCT_URL,
                &format!("https://www.aliexpress.com/item/{product_id}.html"),
            )
            .await?;
        self.store
            .set_user_field(&catalog_id, FIELD_PRODUCT_ID, &product_id.to_string())
            .await?;

        let assets = pictures::ingest(self.store, &self.http, &market.images).await;
        pictures::attach_to_product(self.store, &catalog_id, &assets).await?;

        let mappings =
            attributes::map_attributes(self.store, &self.http, &catalog_id, &market).await?;
        attributes::build_combinations(self.store, &catalog_id, &market, &mappings).await?;

        let product = self
            .store
            .get_product(&catalog_id)
            .await?
            .ok_or_else(|| ShopMirrorError::Catalog(format!("product {catalog_id} vanished")))?;

        info!(
            catalog_id = %product.id,
            categories = product.categories.len(),
            pictures = product.pictures.len(),
            mappings = product.attribute_mappings.len(),
            combinations = product.combinations.len(),
            "product imported"
        );
        Ok(product)
    }

    /// Import every product reachable from a category listing.
    ///
    /// Products are processed strictly sequentially and failures are
    /// isolated: a failed product is logged and excluded, and the batch
    /// always returns the (possibly empty) list of successes.
    #[instrument(skip_all, fields(category_id = category_id, category_name = %category_name))]
    pub async fn import_by_category(
        &self,
        source: &dyn ProductSource,
        category_id: i64,
        category_name: &str,
        policy: &ImportPolicy,
    ) -> Result<Vec<CatalogProduct>> {
        let product_ids = source
            .listing_product_ids(category_id, category_name)
            .await?;
        info!(products = product_ids.len(), "listing scraped");

        let mut imported = Vec::new();
        for product_id in product_ids {
            match self.import_product(source, product_id, policy).await {
                Ok(product) => imported.push(product),
                Err(e) => {
                    error!(product_id, error = %e, "product import failed, skipping");
                }
            }
        }

        info!(imported = imported.len(), "batch import finished");
        Ok(imported)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shopmirror_catalog::{ControlType, SqlCatalog};
    use shopmirror_shared::{
        CategoryPathEntry, OptionValue, PriceRange, Rating, Shop, VariantOption,
        VariantPriceEntry, VariantSet,
    };
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// A canned product source; unknown ids fail like a scrape would.
    struct FakeSource {
        listing: Vec<i64>,
        products: Vec<MarketplaceProduct>,
    }

    #[async_trait]
    impl ProductSource for FakeSource {
        async fn listing_product_ids(
            &self,
            _category_id: i64,
            _category_name: &str,
        ) -> Result<Vec<i64>> {
            Ok(self.listing.clone())
        }

        async fn product(&self, product_id: i64) -> Result<MarketplaceProduct> {
            self.products
                .iter()
                .find(|p| p.id == product_id)
                .cloned()
                .ok_or_else(|| {
                    ShopMirrorError::extraction(format!("product {product_id} failed to load"))
                })
        }
    }

    async fn test_catalog() -> SqlCatalog {
        let tmp =
            std::env::temp_dir().join(format!("sm_pipe_test_{}.db", uuid::Uuid::now_v7()));
        SqlCatalog::open(&tmp).await.expect("open test catalog")
    }

    fn sample_market(id: i64, image_base: &str) -> MarketplaceProduct {
        MarketplaceProduct {
            id,
            title: format!("Product {id}"),
            claimed_category_id: 200001004,
            categories: vec![
                CategoryPathEntry {
                    id: 3,
                    name: "Sports".into(),
                    target: "_self".into(),
                    url: String::new(),
                },
                CategoryPathEntry {
                    id: 5,
                    name: "Shoes".into(),
                    target: "_self".into(),
                    url: String::new(),
                },
            ],
            total_available_quantity: 600,
            orders: 42,
            description_url: "https://desc.example/x.html".into(),
            description: "<div>desc</div>".into(),
            images: vec![
                format!("{image_base}/main-1.jpg"),
                format!("{image_base}/main-2.jpg"),
            ],
            shop: Shop::default(),
            rating: Rating::default(),
            currency: "USD".into(),
            original_price: PriceRange { min: 10.0, max: 20.0 },
            sale_price: PriceRange { min: 8.0, max: 20.0 },
            variants: VariantSet {
                options: vec![VariantOption {
                    id: 14,
                    name: "Color".into(),
                    values: vec![
                        OptionValue {
                            id: 100,
                            name: "Red".into(),
                            display_name: "Red".into(),
                            image_path: Some(format!("{image_base}/red.jpg")),
                        },
                        OptionValue {
                            id: 101,
                            name: "Blue".into(),
                            display_name: "Blue".into(),
                            image_path: None,
                        },
                    ],
                }],
                prices: vec![
                    VariantPriceEntry {
                        id: 7001,
                        available_quantity: 400,
                        option_value_ids: "100".into(),
                        original_price: 10.0,
                        sale_price: 8.0,
                    },
                    VariantPriceEntry {
                        id: 7002,
                        available_quantity: 200,
                        option_value_ids: "101".into(),
                        original_price: 12.0,
                        sale_price: 12.0,
                    },
                ],
            },
        }
    }

    async fn image_server() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"jpeg".to_vec()))
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn single_import_runs_every_phase() {
        let catalog = test_catalog().await;
        let server = image_server().await;
        let source = FakeSource {
            listing: vec![],
            products: vec![sample_market(1005001, &server.uri())],
        };

        let importer = Importer::new(&catalog).expect("importer");
        let product = importer
            .import_product(&source, 1005001, &ImportPolicy::default())
            .await
            .expect("import");

        assert_eq!(product.name, "Product 1005001");
        // Leaf of the created breadcrumb chain
        assert_eq!(product.categories.len(), 1);
        // Two gallery pictures, 1-based orders
        assert_eq!(product.pictures.len(), 2);
        assert_eq!(product.pictures[0].display_order, 1);
        // Provenance fields stamped
        let field = |key: &str| {
            product
                .user_fields
                .iter()
                .find(|f| f.key == key)
                .map(|f| f.value.clone())
        };
        assert_eq!(field(FIELD_PRODUCT_ID).as_deref(), Some("1005001"));
        assert_eq!(
            field(FIELD_PRODUCT_URL).as_deref(),
            Some("https://www.aliexpress.com/item/1005001.html")
        );
        // One swatch mapping with both values, plus two combinations
        assert_eq!(product.attribute_mappings.len(), 1);
        assert_eq!(
            product.attribute_mappings[0].control_type,
            ControlType::ImageSquares
        );
        assert_eq!(product.attribute_mappings[0].values.len(), 2);
        assert_eq!(product.combinations.len(), 2);
    }

    #[tokio::test]
    async fn batch_import_isolates_failures() {
        let catalog = test_catalog().await;
        let server = image_server().await;
        let source = FakeSource {
            // The middle id has no product behind it and fails to scrape
            listing: vec![1005001, 4040404, 1005002],
            products: vec![
                sample_market(1005001, &server.uri()),
                sample_market(1005002, &server.uri()),
            ],
        };

        let importer = Importer::new(&catalog).expect("importer");
        let imported = importer
            .import_by_category(&source, 322, "shoes", &ImportPolicy::default())
            .await
            .expect("batch completes");

        let names: Vec<&str> = imported.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Product 1005001", "Product 1005002"]);
    }

    #[tokio::test]
    async fn batch_import_with_empty_listing_returns_empty() {
        let catalog = test_catalog().await;
        let source = FakeSource {
            listing: vec![],
            products: vec![],
        };

        let importer = Importer::new(&catalog).expect("importer");
        let imported = importer
            .import_by_category(&source, 322, "shoes", &ImportPolicy::default())
            .await
            .expect("batch completes");
        assert!(imported.is_empty());
    }

    #[tokio::test]
    async fn explicit_category_failure_propagates_in_single_mode() {
        let catalog = test_catalog().await;
        let server = image_server().await;
        let source = FakeSource {
            listing: vec![],
            products: vec![sample_market(1005001, &server.uri())],
        };

        let policy = ImportPolicy {
            category_ids: vec!["does-not-exist".into()],
            ..ImportPolicy::default()
        };
        let importer = Importer::new(&catalog).expect("importer");
        let err = importer
            .import_product(&source, 1005001, &policy)
            .await
            .expect_err("unresolvable explicit category");
        assert!(matches!(err, ShopMirrorError::CategoryNotFound { .. }));
    }
}

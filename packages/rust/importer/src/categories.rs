//! Category reconciliation: breadcrumb path → attached catalog categories.
//!
//! Reconciliation is keyed on the category's external (marketplace) id, so
//! re-importing against an already-populated hierarchy creates nothing and
//! attaches only the leaf.

use tracing::{debug, info, instrument, warn};

use shopmirror_catalog::{CatalogProduct, CatalogStore, NewCategory, known};
use shopmirror_shared::{ImportPolicy, MarketplaceProduct, Result, ShopMirrorError};

/// Reconcile the product's categories and attach them.
///
/// With explicit `policy.category_ids`, every id must resolve or the whole
/// reconciliation fails — no partial attachment against explicit ids.
/// Otherwise the breadcrumb is walked root→leaf:
/// - an existing node at the leaf is marked for attachment;
/// - an existing node mid-path just becomes the running parent;
/// - a missing node is created under the running parent and replaces any
///   previously queued attachment candidate, so only the deepest
///   newly-created node of a run is attached;
/// - a creation failure clears the running parent instead of propagating.
///
/// Returns the refreshed product with its category associations loaded.
#[instrument(skip_all, fields(product_id = %product_id))]
pub async fn reconcile(
    store: &dyn CatalogStore,
    product_id: &str,
    market: &MarketplaceProduct,
    policy: &ImportPolicy,
) -> Result<CatalogProduct> {
    let attach = if policy.category_ids.is_empty() {
        walk_breadcrumb(store, product_id, market, policy).await?
    } else {
        resolve_explicit_ids(store, &policy.category_ids).await?
    };

    for category_id in &attach {
        store.attach_category(product_id, category_id, false).await?;
    }
    info!(attached = attach.len(), "categories reconciled");

    store
        .get_product(product_id)
        .await?
        .ok_or_else(|| ShopMirrorError::Catalog(format!("product {product_id} vanished")))
}

/// Validate caller-supplied category ids; all must exist.
async fn resolve_explicit_ids(
    store: &dyn CatalogStore,
    category_ids: &[String],
) -> Result<Vec<String>> {
    let mut resolved = Vec::with_capacity(category_ids.len());
    for id in category_ids {
        match store.category_by_id(id).await? {
            Some(category) => resolved.push(category.id),
            None => return Err(ShopMirrorError::CategoryNotFound { id: id.clone() }),
        }
    }
    Ok(resolved)
}

/// Walk the breadcrumb root→leaf, creating missing nodes.
async fn walk_breadcrumb(
    store: &dyn CatalogStore,
    product_id: &str,
    market: &MarketplaceProduct,
    policy: &ImportPolicy,
) -> Result<Vec<String>> {
    // A newly created category inherits the product's first attached picture
    // as its thumbnail, when one exists at this point in the pipeline.
    let thumbnail = store
        .product_pictures(product_id)
        .await?
        .first()
        .map(|p| p.picture_id.clone());

    let mut attach: Vec<String> = Vec::new();
    let mut parent: Option<String> = None;
    let last = market.categories.len().saturating_sub(1);

    for (position, entry) in market.categories.iter().enumerate() {
        match store.category_by_external_id(entry.id).await? {
            Some(existing) => {
                if position == last {
                    attach.push(existing.id.clone());
                }
                parent = Some(existing.id);
            }
            None => {
                let new_category = NewCategory {
                    name: entry.name.clone(),
                    parent_id: parent.clone(),
                    external_id: Some(entry.id),
                    layout_id: known::CATEGORY_LAYOUT_GRID_OR_LINES.into(),
                    published: policy.publish_categories,
                    include_in_menu: policy.include_in_menu,
                    allow_page_size_selection: policy.allow_page_size_selection,
                    page_size: policy.page_size,
                    page_size_options: policy.page_size_options.clone(),
                    picture_id: thumbnail.clone(),
                };
                match store.insert_category(&new_category).await {
                    Ok(id) => {
                        debug!(external_id = entry.id, name = %entry.name, "category created");
                        // Only the deepest newly created node gets attached.
                        attach = vec![id.clone()];
                        parent = Some(id);
                    }
                    Err(e) => {
                        warn!(external_id = entry.id, error = %e, "category creation failed");
                        parent = None;
                    }
                }
            }
        }
    }

    Ok(attach)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shopmirror_catalog::{NewProduct, SqlCatalog};
    use shopmirror_shared::{CategoryPathEntry, PriceRange, Rating, Shop, VariantSet};

    async fn test_catalog() -> SqlCatalog {
        let tmp =
            std::env::temp_dir().join(format!("sm_cat_test_{}.db", uuid::Uuid::now_v7()));
        SqlCatalog::open(&tmp).await.expect("open test catalog")
    }

    fn bare_product() -> NewProduct {
        NewProduct {
            name: "p".into(),
            description: String::new(),
            layout_id: known::PRODUCT_LAYOUT_SIMPLE.into(),
            published: false,
            show_on_home_page: false,
            visible_individually: true,
            allow_customer_reviews: true,
            manage_stock_by_attributes: true,
            display_stock_quantity: true,
            price: 1.0,
            product_cost: 1.0,
            catalog_price: 1.0,
            min_entered_price: 1.0,
            max_entered_price: 1.0,
            stock_quantity: 1,
            order_minimum_quantity: 1,
            order_maximum_quantity: 999999,
            display_order: 1,
        }
    }

    fn market_with_breadcrumb(ids: &[i64]) -> MarketplaceProduct {
        MarketplaceProduct {
            id: 1,
            title: "p".into(),
            claimed_category_id: 0,
            categories: ids
                .iter()
                .map(|id| CategoryPathEntry {
                    id: *id,
                    name: format!("Category {id}"),
                    target: "_self".into(),
                    url: String::new(),
                })
                .collect(),
            total_available_quantity: 1,
            orders: 0,
            description_url: String::new(),
            description: String::new(),
            images: vec![],
            shop: Shop::default(),
            rating: Rating::default(),
            currency: "USD".into(),
            original_price: PriceRange::default(),
            sale_price: PriceRange::default(),
            variants: VariantSet::default(),
        }
    }

    #[tokio::test]
    async fn fresh_breadcrumb_creates_chain_and_attaches_deepest() {
        let catalog = test_catalog().await;
        let product_id = catalog.insert_product(&bare_product()).await.unwrap();
        let market = market_with_breadcrumb(&[3, 5, 9]);

        let product = reconcile(&catalog, &product_id, &market, &ImportPolicy::default())
            .await
            .expect("reconcile");

        // All three nodes created, chained by parent
        let root = catalog.category_by_external_id(3).await.unwrap().unwrap();
        let mid = catalog.category_by_external_id(5).await.unwrap().unwrap();
        let leaf = catalog.category_by_external_id(9).await.unwrap().unwrap();
        assert_eq!(root.parent_id, None);
        assert_eq!(mid.parent_id.as_deref(), Some(root.id.as_str()));
        assert_eq!(leaf.parent_id.as_deref(), Some(mid.id.as_str()));

        // Only the deepest created node is attached
        assert_eq!(product.categories.len(), 1);
        assert_eq!(product.categories[0].category_id, leaf.id);
        assert!(!product.categories[0].featured);
    }

    #[tokio::test]
    async fn rerun_against_existing_hierarchy_is_idempotent() {
        let catalog = test_catalog().await;
        let first = catalog.insert_product(&bare_product()).await.unwrap();
        let market = market_with_breadcrumb(&[3, 5, 9]);
        let policy = ImportPolicy::default();

        reconcile(&catalog, &first, &market, &policy).await.unwrap();
        let leaf_id = catalog
            .category_by_external_id(9)
            .await
            .unwrap()
            .unwrap()
            .id;

        // Second import of a product with the same breadcrumb: every level
        // resolves by external id, so nothing is created and only the leaf
        // is attached.
        let second = catalog.insert_product(&bare_product()).await.unwrap();
        let product = reconcile(&catalog, &second, &market, &policy).await.unwrap();

        assert_eq!(product.categories.len(), 1);
        assert_eq!(product.categories[0].category_id, leaf_id);
        // Node identity is stable across runs
        assert_eq!(
            catalog.category_by_external_id(9).await.unwrap().unwrap().id,
            leaf_id
        );
    }

    #[tokio::test]
    async fn partially_known_path_extends_under_existing_parent() {
        let catalog = test_catalog().await;
        let policy = ImportPolicy::default();

        // Seed only the root level
        let first = catalog.insert_product(&bare_product()).await.unwrap();
        reconcile(&catalog, &first, &market_with_breadcrumb(&[3]), &policy)
            .await
            .unwrap();
        let root_id = catalog
            .category_by_external_id(3)
            .await
            .unwrap()
            .unwrap()
            .id;

        let second = catalog.insert_product(&bare_product()).await.unwrap();
        let product = reconcile(&catalog, &second, &market_with_breadcrumb(&[3, 5]), &policy)
            .await
            .unwrap();

        let created = catalog.category_by_external_id(5).await.unwrap().unwrap();
        assert_eq!(created.parent_id.as_deref(), Some(root_id.as_str()));
        assert_eq!(product.categories.len(), 1);
        assert_eq!(product.categories[0].category_id, created.id);
    }

    #[tokio::test]
    async fn existing_leaf_after_created_node_attaches_both() {
        let catalog = test_catalog().await;
        let policy = ImportPolicy::default();

        // Seed only the leaf level (external id 9)
        let seed = catalog.insert_product(&bare_product()).await.unwrap();
        reconcile(&catalog, &seed, &market_with_breadcrumb(&[9]), &policy)
            .await
            .unwrap();

        // Walk [5, 9]: 5 is created (becomes the candidate), 9 is found as
        // the last entry and marked for attachment alongside it.
        let product_id = catalog.insert_product(&bare_product()).await.unwrap();
        let product = reconcile(&catalog, &product_id, &market_with_breadcrumb(&[5, 9]), &policy)
            .await
            .unwrap();
        assert_eq!(product.categories.len(), 2);
    }

    #[tokio::test]
    async fn explicit_ids_must_all_resolve() {
        let catalog = test_catalog().await;
        let product_id = catalog.insert_product(&bare_product()).await.unwrap();
        let known_id = catalog
            .insert_category(&NewCategory {
                name: "Existing".into(),
                parent_id: None,
                external_id: None,
                layout_id: known::CATEGORY_LAYOUT_GRID_OR_LINES.into(),
                published: true,
                include_in_menu: true,
                allow_page_size_selection: true,
                page_size: 10,
                page_size_options: "10,15,20".into(),
                picture_id: None,
            })
            .await
            .unwrap();

        let policy = ImportPolicy {
            category_ids: vec![known_id, "missing-id".into()],
            ..ImportPolicy::default()
        };
        let err = reconcile(
            &catalog,
            &product_id,
            &market_with_breadcrumb(&[3]),
            &policy,
        )
        .await
        .expect_err("unresolvable explicit id");
        assert!(matches!(err, ShopMirrorError::CategoryNotFound { .. }));

        // No partial attachment happened
        let product = catalog.get_product(&product_id).await.unwrap().unwrap();
        assert!(product.categories.is_empty());
    }

    #[tokio::test]
    async fn explicit_ids_skip_breadcrumb_walk() {
        let catalog = test_catalog().await;
        let product_id = catalog.insert_product(&bare_product()).await.unwrap();
        let target = catalog
            .insert_category(&NewCategory {
                name: "Target".into(),
                parent_id: None,
                external_id: None,
                layout_id: known::CATEGORY_LAYOUT_GRID_OR_LINES.into(),
                published: true,
                include_in_menu: true,
                allow_page_size_selection: true,
                page_size: 10,
                page_size_options: "10,15,20".into(),
                picture_id: None,
            })
            .await
            .unwrap();

        let policy = ImportPolicy {
            category_ids: vec![target.clone()],
            ..ImportPolicy::default()
        };
        let product = reconcile(
            &catalog,
            &product_id,
            &market_with_breadcrumb(&[3, 5]),
            &policy,
        )
        .await
        .unwrap();

        assert_eq!(product.categories.len(), 1);
        assert_eq!(product.categories[0].category_id, target);
        // Breadcrumb nodes were not created
        assert!(catalog.category_by_external_id(3).await.unwrap().is_none());
        assert!(catalog.category_by_external_id(5).await.unwrap().is_none());
    }
}

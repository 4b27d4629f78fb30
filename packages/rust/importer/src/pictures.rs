//! Picture ingestion: image URLs → registered picture assets.
//!
//! One failed fetch never aborts the batch — the URL is logged and skipped,
//! and callers must tolerate a returned list shorter than the input.

use tracing::{debug, warn};

use shopmirror_catalog::{CatalogStore, PictureAsset};
use shopmirror_shared::{Result, ShopMirrorError};

/// Mime type recorded for ingested marketplace images.
const IMAGE_MIME: &str = "image/jpeg";

/// Fetch each URL and register the bytes as a picture asset, keyed by the
/// source URL in the asset's alt text. Returns only the successfully created
/// subset, in input order.
pub async fn ingest(
    store: &dyn CatalogStore,
    http: &reqwest::Client,
    urls: &[String],
) -> Vec<PictureAsset> {
    let mut assets = Vec::with_capacity(urls.len());

    for url in urls {
        match fetch_bytes(http, url).await {
            Ok(bytes) => match store.insert_picture(&bytes, IMAGE_MIME, url).await {
                Ok(asset) => {
                    debug!(url, picture_id = %asset.id, "picture registered");
                    assets.push(asset);
                }
                Err(e) => warn!(url, error = %e, "picture registration failed, skipping"),
            },
            Err(e) => warn!(url, error = %e, "picture fetch failed, skipping"),
        }
    }

    assets
}

/// Attach assets to the product gallery with 1-based sequential display
/// orders over the successful subset.
pub async fn attach_to_product(
    store: &dyn CatalogStore,
    product_id: &str,
    assets: &[PictureAsset],
) -> Result<()> {
    for (index, asset) in assets.iter().enumerate() {
        store
            .attach_picture(product_id, &asset.id, (index + 1) as i64)
            .await?;
    }
    Ok(())
}

/// GET a URL and return the raw bytes; non-2xx is a failure.
async fn fetch_bytes(http: &reqwest::Client, url: &str) -> Result<Vec<u8>> {
    let response = http
        .get(url)
        .send()
        .await
        .map_err(|e| ShopMirrorError::Network(format!("{url}: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(ShopMirrorError::Network(format!("{url}: HTTP {status}")));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| ShopMirrorError::Network(format!("{url}: body read failed: {e}")))?;
    Ok(bytes.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shopmirror_catalog::{NewProduct, SqlCatalog, known};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn test_catalog() -> SqlCatalog {
        let tmp =
            std::env::temp_dir().join(format!("sm_pic_test_{}.db", uuid::Uuid::now_v7()));
        SqlCatalog::open(&tmp).await.expect("open test catalog")
    }

    async fn insert_product(catalog: &SqlCatalog) -> String {
        catalog
            .insert_product(&NewProduct {
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
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn failed_fetch_is_skipped_and_order_stays_sequential() {
        let server = MockServer::start().await;
        for (p, status) in [("/1.jpg", 200), ("/2.jpg", 404), ("/3.jpg", 200)] {
            Mock::given(method("GET"))
                .and(path(p))
                .respond_with(ResponseTemplate::new(status).set_body_bytes(b"jpeg".to_vec()))
                .mount(&server)
                .await;
        }

        let catalog = test_catalog().await;
        let product_id = insert_product(&catalog).await;
        let urls: Vec<String> = ["/1.jpg", "/2.jpg", "/3.jpg"]
            .iter()
            .map(|p| format!("{}{p}", server.uri()))
            .collect();

        let http = reqwest::Client::new();
        let assets = ingest(&catalog, &http, &urls).await;

        // The failed middle URL is absent, order is preserved
        assert_eq!(assets.len(), 2);
        assert_eq!(assets[0].alt, urls[0]);
        assert_eq!(assets[1].alt, urls[2]);

        attach_to_product(&catalog, &product_id, &assets)
            .await
            .expect("attach");
        let attached = catalog.product_pictures(&product_id).await.unwrap();
        let orders: Vec<i64> = attached.iter().map(|p| p.display_order).collect();
        // Display orders are 1 and 2, not 1 and 3
        assert_eq!(orders, vec![1, 2]);
    }

    #[tokio::test]
    async fn transport_error_is_skipped() {
        // A server that has already shut down: connection refused, not a
        // status code.
        let server = MockServer::start().await;
        let dead_url = format!("{}/gone.jpg", server.uri());
        drop(server);

        let catalog = test_catalog().await;
        let http = reqwest::Client::new();
        let assets = ingest(&catalog, &http, &[dead_url]).await;
        assert!(assets.is_empty());
    }

    #[tokio::test]
    async fn empty_input_yields_empty_output() {
        let catalog = test_catalog().await;
        let http = reqwest::Client::new();
        let assets = ingest(&catalog, &http, &[]).await;
        assert!(assets.is_empty());
    }
}

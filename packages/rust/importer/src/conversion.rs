//! Canonical record → new catalog product.

use shopmirror_catalog::{NewProduct, known};
use shopmirror_shared::{ImportPolicy, MarketplaceProduct};

/// Build the bare catalog product for an import run.
///
/// Stock is managed per attribute combination, so the product row only
/// carries the aggregate quantity; prices start from the sale minimum with
/// the original minimum kept as the catalog reference price.
pub fn new_product_from(market: &MarketplaceProduct, policy: &ImportPolicy) -> NewProduct {
    NewProduct {
        name: market.title.clone(),
        description: market.description.clone(),
        layout_id: known::PRODUCT_LAYOUT_SIMPLE.into(),
        published: policy.publish_products,
        show_on_home_page: policy.show_on_home_page,
        visible_individually: true,
        allow_customer_reviews: true,
        manage_stock_by_attributes: true,
        display_stock_quantity: true,
        price: market.sale_price.min,
        product_cost: market.sale_price.min,
        catalog_price: market.original_price.min,
        min_entered_price: market.sale_price.min,
        max_entered_price: market.sale_price.max,
        stock_quantity: market.total_available_quantity,
        order_minimum_quantity: 1,
        order_maximum_quantity: 999999,
        display_order: 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shopmirror_shared::{PriceRange, Rating, Shop, VariantSet};

    fn market() -> MarketplaceProduct {
        MarketplaceProduct {
            id: 1005001234,
            title: "Trail Running Shoes".into(),
            claimed_category_id: 0,
            categories: vec![],
            total_available_quantity: 600,
            orders: 0,
            description_url: String::new(),
            description: "<div>desc</div>".into(),
            images: vec![],
            shop: Shop::default(),
            rating: Rating::default(),
            currency: "USD".into(),
            original_price: PriceRange { min: 10.0, max: 22.0 },
            sale_price: PriceRange { min: 8.0, max: 20.0 },
            variants: VariantSet::default(),
        }
    }

    #[test]
    fn product_defaults_and_prices() {
        let policy = ImportPolicy::default();
        let product = new_product_from(&market(), &policy);

        assert_eq!(product.name, "Trail Running Shoes");
        assert_eq!(product.price, 8.0);
        assert_eq!(product.product_cost, 8.0);
        assert_eq!(product.catalog_price, 10.0);
        assert_eq!(product.min_entered_price, 8.0);
        assert_eq!(product.max_entered_price, 20.0);
        assert_eq!(product.stock_quantity, 600);
        assert_eq!(product.order_minimum_quantity, 1);
        assert_eq!(product.order_maximum_quantity, 999999);
        assert!(product.manage_stock_by_attributes);
        assert!(product.visible_individually);
        assert!(!product.published);
    }

    #[test]
    fn policy_flags_carry_through() {
        let policy = ImportPolicy {
            publish_products: true,
            show_on_home_page: true,
            ..ImportPolicy::default()
        };
        let product = new_product_from(&market(), &policy);
        assert!(product.published);
        assert!(product.show_on_home_page);
    }
}

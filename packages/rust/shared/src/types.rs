//! Canonical domain types for scraped marketplace products.
//!
//! A [`MarketplaceProduct`] is the normalized, site-agnostic projection of the
//! raw state object embedded in an AliExpress product page. It is immutable
//! after normalization; every downstream phase (category reconciliation,
//! attribute mapping, picture ingestion) reads from it.

use serde::{Deserialize, Serialize};

/// Delimiter between option-value ids in a price entry's id string.
pub const OPTION_VALUE_ID_DELIMITER: char = ',';

// ---------------------------------------------------------------------------
// MarketplaceProduct
// ---------------------------------------------------------------------------

/// The canonical record for a single scraped marketplace product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketplaceProduct {
    /// The site's native numeric product id.
    pub id: i64,
    /// Product title.
    pub title: String,
    /// Category id the source page claims for this product.
    pub claimed_category_id: i64,
    /// Breadcrumb path, root→leaf. Zero-id entries are filtered out and the
    /// remainder is deduplicated by id and sorted ascending; the last entry
    /// is the leaf category.
    pub categories: Vec<CategoryPathEntry>,
    /// Total available stock across all variants.
    pub total_available_quantity: i64,
    /// Number of orders reported by the source.
    pub orders: i64,
    /// URL of the rendered description sub-page.
    pub description_url: String,
    /// Rendered description markup fetched from `description_url`.
    pub description: String,
    /// Main gallery image URLs, in source order.
    pub images: Vec<String>,
    /// The seller's shop.
    pub shop: Shop,
    /// Aggregate feedback rating.
    pub rating: Rating,
    /// Currency code for all amounts.
    pub currency: String,
    /// Non-promotional price range.
    pub original_price: PriceRange,
    /// Promotional price range; falls back to the original range per bound
    /// when no activity price exists at that bound.
    pub sale_price: PriceRange,
    /// Variant dimensions and per-combination prices.
    pub variants: VariantSet,
}

/// One level of the source breadcrumb path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryPathEntry {
    /// The marketplace's category id — the reconciliation key against the
    /// catalog's external-id field.
    pub id: i64,
    /// Category display name.
    pub name: String,
    /// Link target attribute from the source markup.
    pub target: String,
    /// Category listing URL.
    pub url: String,
}

/// The seller's shop as reported on the product page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Shop {
    pub name: String,
    pub id: i64,
    pub company_id: i64,
    pub store_number: i64,
    pub followers: i64,
    pub rating_count: i64,
    /// Source-formatted positive-rating string (e.g. `"97.4%"`).
    pub rating: String,
}

/// Five-bucket feedback histogram plus the average.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rating {
    /// Maximum star value; always 5 on this marketplace.
    pub total_star: i64,
    pub average_star: f64,
    pub total_star_count: i64,
    pub five_star_count: i64,
    pub four_star_count: i64,
    pub three_star_count: i64,
    pub two_star_count: i64,
    pub one_star_count: i64,
}

impl Default for Rating {
    fn default() -> Self {
        Self {
            total_star: 5,
            average_star: 0.0,
            total_star_count: 0,
            five_star_count: 0,
            four_star_count: 0,
            three_star_count: 0,
            two_star_count: 0,
            one_star_count: 0,
        }
    }
}

/// A min/max price pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: f64,
    pub max: f64,
}

// ---------------------------------------------------------------------------
// VariantSet
// ---------------------------------------------------------------------------

/// Variant dimensions and the per-combination price list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VariantSet {
    /// Dimensions of variation (e.g. Color, Size), in source order.
    pub options: Vec<VariantOption>,
    /// Purchasable combinations with stock and pricing, in source order.
    pub prices: Vec<VariantPriceEntry>,
}

/// One axis of product variation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantOption {
    pub id: i64,
    pub name: String,
    /// Values in source order.
    pub values: Vec<OptionValue>,
}

/// A single value of a variant dimension.
///
/// Value ids are unique across the whole [`VariantSet`], so a bare id is
/// enough to find both the value and its owning option.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionValue {
    pub id: i64,
    /// Raw value name from the source.
    pub name: String,
    /// Display name; the normalizer falls back to `name` when absent.
    pub display_name: String,
    /// Swatch image path, when the source provides one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,
}

/// Price and stock for one concrete combination of 1–2 option values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantPriceEntry {
    pub id: i64,
    pub available_quantity: i64,
    /// Comma-delimited option-value ids (1–2) identifying which values this
    /// entry applies to.
    pub option_value_ids: String,
    pub original_price: f64,
    /// Falls back to `original_price` when no promotional price exists.
    pub sale_price: f64,
}

impl VariantPriceEntry {
    /// First referenced option-value id, if the id string is non-empty.
    pub fn first_value_id(&self) -> Option<&str> {
        self.option_value_ids
            .split(OPTION_VALUE_ID_DELIMITER)
            .next()
            .filter(|s| !s.is_empty())
    }

    /// Second referenced option-value id, for two-dimensional entries.
    pub fn second_value_id(&self) -> Option<&str> {
        self.option_value_ids
            .split(OPTION_VALUE_ID_DELIMITER)
            .nth(1)
            .filter(|s| !s.is_empty())
    }

    /// All referenced option-value ids, in source order.
    pub fn value_ids(&self) -> impl Iterator<Item = &str> {
        self.option_value_ids
            .split(OPTION_VALUE_ID_DELIMITER)
            .filter(|s| !s.is_empty())
    }
}

impl VariantSet {
    /// The option owning the value with the given id.
    pub fn option_by_value_id(&self, value_id: &str) -> Option<&VariantOption> {
        let id: i64 = value_id.parse().ok()?;
        self.options
            .iter()
            .find(|o| o.values.iter().any(|v| v.id == id))
    }

    /// The option value with the given id, across all dimensions.
    pub fn value_by_id(&self, value_id: &str) -> Option<&OptionValue> {
        let id: i64 = value_id.parse().ok()?;
        self.options
            .iter()
            .flat_map(|o| o.values.iter())
            .find(|v| v.id == id)
    }

    /// The price entry whose delimited id string matches `value_ids` exactly.
    pub fn price_for_value_ids(&self, value_ids: &str) -> Option<&VariantPriceEntry> {
        self.prices.iter().find(|p| p.option_value_ids == value_ids)
    }

    /// True iff any price entry references more than one option-value id —
    /// i.e. pricing is only meaningful at the combination level, not per
    /// option value.
    pub fn has_multiple_variants(&self) -> bool {
        self.prices
            .iter()
            .any(|p| p.option_value_ids.contains(OPTION_VALUE_ID_DELIMITER))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variant_set(id_strings: &[&str]) -> VariantSet {
        VariantSet {
            options: vec![VariantOption {
                id: 14,
                name: "Color".into(),
                values: vec![
                    OptionValue {
                        id: 100,
                        name: "Red".into(),
                        display_name: "Red".into(),
                        image_path: Some("https://img.example/red.jpg".into()),
                    },
                    OptionValue {
                        id: 101,
                        name: "Blue".into(),
                        display_name: "Blue".into(),
                        image_path: None,
                    },
                ],
            }],
            prices: id_strings
                .iter()
                .enumerate()
                .map(|(i, ids)| VariantPriceEntry {
                    id: i as i64,
                    available_quantity: 5,
                    option_value_ids: (*ids).into(),
                    original_price: 10.0,
                    sale_price: 8.0,
                })
                .collect(),
        }
    }

    #[test]
    fn multiple_variants_requires_delimiter() {
        assert!(!variant_set(&["100", "101"]).has_multiple_variants());
        assert!(variant_set(&["100,200", "101,200"]).has_multiple_variants());
        assert!(variant_set(&["100", "101,200"]).has_multiple_variants());
    }

    #[test]
    fn price_entry_id_accessors() {
        let set = variant_set(&["100,200"]);
        let entry = &set.prices[0];
        assert_eq!(entry.first_value_id(), Some("100"));
        assert_eq!(entry.second_value_id(), Some("200"));
        assert_eq!(entry.value_ids().collect::<Vec<_>>(), vec!["100", "200"]);

        let single = variant_set(&["101"]);
        assert_eq!(single.prices[0].second_value_id(), None);
    }

    #[test]
    fn value_lookup_crosses_dimensions() {
        let set = variant_set(&["100"]);
        assert_eq!(set.value_by_id("101").map(|v| v.name.as_str()), Some("Blue"));
        assert_eq!(set.option_by_value_id("100").map(|o| o.id), Some(14));
        assert!(set.value_by_id("999").is_none());
        assert!(set.value_by_id("not-a-number").is_none());
    }

    #[test]
    fn price_lookup_matches_exact_id_string() {
        let set = variant_set(&["100", "101"]);
        assert!(set.price_for_value_ids("100").is_some());
        assert!(set.price_for_value_ids("100,101").is_none());
    }

    #[test]
    fn product_serialization_roundtrip() {
        let product = MarketplaceProduct {
            id: 1005001234,
            title: "Trail Running Shoes".into(),
            claimed_category_id: 200001004,
            categories: vec![CategoryPathEntry {
                id: 322,
                name: "Shoes".into(),
                target: "_self".into(),
                url: "https://www.aliexpress.com/category/322/shoes.html".into(),
            }],
            total_available_quantity: 600,
            orders: 42,
            description_url: "https://desc.example/1005001234.html".into(),
            description: "<div>desc</div>".into(),
            images: vec!["https://img.example/1.jpg".into()],
            shop: Shop::default(),
            rating: Rating::default(),
            currency: "USD".into(),
            original_price: PriceRange { min: 10.0, max: 20.0 },
            sale_price: PriceRange { min: 8.0, max: 20.0 },
            variants: variant_set(&["100"]),
        };

        let json = serde_json::to_string(&product).expect("serialize");
        let parsed: MarketplaceProduct = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed.id, 1005001234);
        assert_eq!(parsed.rating.total_star, 5);
        assert_eq!(parsed.variants.options[0].values[1].image_path, None);
    }
}

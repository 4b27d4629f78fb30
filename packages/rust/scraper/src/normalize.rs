//! Projection of the raw site payload into the canonical record.
//!
//! Pure and total: every optional or absent field normalizes to a default
//! (empty list, zero, empty string) instead of failing. The payload shape is
//! site-controlled, so extraction is best-effort by design.

use serde_json::Value;

use shopmirror_shared::{
    CategoryPathEntry, MarketplaceProduct, OptionValue, PriceRange, Rating, Shop, VariantOption,
    VariantPriceEntry, VariantSet,
};

use crate::raw::{RawState, elem_i64, elem_str};

/// Project a raw product state into the canonical [`MarketplaceProduct`].
///
/// `description_url` and `description` come from the separate description
/// sub-page fetch; everything else is read out of `state`.
pub fn normalize(
    product_id: i64,
    state: &RawState,
    description_url: &str,
    description: &str,
) -> MarketplaceProduct {
    MarketplaceProduct {
        id: product_id,
        title: state
            .str_at(&["titleModule", "subject"])
            .unwrap_or_default()
            .to_string(),
        claimed_category_id: state.i64_at(&["actionModule", "categoryId"]).unwrap_or(0),
        categories: normalize_breadcrumb(state),
        total_available_quantity: state
            .i64_at(&["quantityModule", "totalAvailQuantity"])
            .unwrap_or(0),
        orders: state.i64_at(&["titleModule", "tradeCount"]).unwrap_or(0),
        description_url: description_url.to_string(),
        description: description.to_string(),
        images: state
            .array_at(&["imageModule", "imagePathList"])
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        shop: normalize_shop(state),
        rating: normalize_rating(state),
        currency: state
            .str_at(&["webEnv", "currency"])
            .unwrap_or_default()
            .to_string(),
        original_price: PriceRange {
            min: state
                .f64_at(&["priceModule", "minAmount", "value"])
                .unwrap_or(0.0),
            max: state
                .f64_at(&["priceModule", "maxAmount", "value"])
                .unwrap_or(0.0),
        },
        sale_price: normalize_sale_price(state),
        variants: normalize_variants(state),
    }
}

/// Breadcrumb path: zero-id entries filtered, deduplicated by id, ascending.
fn normalize_breadcrumb(state: &RawState) -> Vec<CategoryPathEntry> {
    let mut entries: Vec<CategoryPathEntry> = state
        .array_at(&["crossLinkModule", "breadCrumbPathList"])
        .iter()
        .filter_map(|entry| {
            let id = elem_i64(entry, "cateId")?;
            if id == 0 {
                return None;
            }
            Some(CategoryPathEntry {
                id,
                name: elem_str(entry, "name").unwrap_or_default(),
                target: elem_str(entry, "target").unwrap_or_default(),
                url: elem_str(entry, "url").unwrap_or_default(),
            })
        })
        .collect();
    entries.sort_by_key(|e| e.id);
    entries.dedup_by_key(|e| e.id);
    entries
}

fn normalize_shop(state: &RawState) -> Shop {
    Shop {
        name: state
            .str_at(&["storeModule", "storeName"])
            .unwrap_or_default()
            .to_string(),
        id: state.i64_at(&["storeModule", "companyId"]).unwrap_or(0),
        company_id: state.i64_at(&["storeModule", "companyId"]).unwrap_or(0),
        store_number: state.i64_at(&["storeModule", "storeNum"]).unwrap_or(0),
        followers: state
            .i64_at(&["storeModule", "followingNumber"])
            .unwrap_or(0),
        rating_count: state.i64_at(&["storeModule", "positiveNum"]).unwrap_or(0),
        rating: state
            .str_at(&["storeModule", "positiveRate"])
            .unwrap_or_default()
            .to_string(),
    }
}

fn normalize_rating(state: &RawState) -> Rating {
    let at = |leaf: &str| {
        state
            .i64_at(&["titleModule", "feedbackRating", leaf])
            .unwrap_or(0)
    };
    Rating {
        total_star: 5,
        average_star: state
            .f64_at(&["titleModule", "feedbackRating", "averageStar"])
            .unwrap_or(0.0),
        total_star_count: at("totalValidNum"),
        five_star_count: at("fiveStarNum"),
        four_star_count: at("fourStarNum"),
        three_star_count: at("threeStarNum"),
        two_star_count: at("twoStarNum"),
        one_star_count: at("oneStarNum"),
    }
}

/// Sale range falls back to the original range per bound when no activity
/// (promotional) amount exists at that bound.
fn normalize_sale_price(state: &RawState) -> PriceRange {
    PriceRange {
        min: state
            .f64_at(&["priceModule", "minActivityAmount", "value"])
            .or_else(|| state.f64_at(&["priceModule", "minAmount", "value"]))
            .unwrap_or(0.0),
        max: state
            .f64_at(&["priceModule", "maxActivityAmount", "value"])
            .or_else(|| state.f64_at(&["priceModule", "maxAmount", "value"]))
            .unwrap_or(0.0),
    }
}

fn normalize_variants(state: &RawState) -> VariantSet {
    let options = state
        .array_at(&["skuModule", "productSKUPropertyList"])
        .iter()
        .map(|option| VariantOption {
            id: elem_i64(option, "skuPropertyId").unwrap_or(0),
            name: elem_str(option, "skuPropertyName").unwrap_or_default(),
            values: option
                .get("skuPropertyValues")
                .and_then(Value::as_array)
                .map(Vec::as_slice)
                .unwrap_or(&[])
                .iter()
                .map(normalize_option_value)
                .collect(),
        })
        .collect();

    let prices = state
        .array_at(&["skuModule", "skuPriceList"])
        .iter()
        .map(|entry| {
            let original = entry
                .get("skuVal")
                .and_then(|v| v.get("skuAmount"))
                .and_then(|v| v.get("value"))
                .and_then(Value::as_f64)
                .unwrap_or(0.0);
            let sale = entry
                .get("skuVal")
                .and_then(|v| v.get("skuActivityAmount"))
                .and_then(|v| v.get("value"))
                .and_then(Value::as_f64)
                .unwrap_or(original);
            VariantPriceEntry {
                id: elem_i64(entry, "skuId").unwrap_or(0),
                available_quantity: entry
                    .get("skuVal")
                    .and_then(|v| elem_i64(v, "availQuantity"))
                    .unwrap_or(0),
                option_value_ids: elem_str(entry, "skuPropIds").unwrap_or_default(),
                original_price: original,
                sale_price: sale,
            }
        })
        .collect();

    VariantSet { options, prices }
}

fn normalize_option_value(value: &Value) -> OptionValue {
    let name = elem_str(value, "propertyValueName").unwrap_or_default();
    // The site often omits the display name; fall back to the raw name so
    // downstream display-name matching stays consistent.
    let display_name = elem_str(value, "propertyValueDisplayName").unwrap_or_else(|| name.clone());
    OptionValue {
        id: elem_i64(value, "propertyValueId").unwrap_or(0),
        name,
        display_name,
        image_path: elem_str(value, "skuPropertyImagePath"),
    }
}

/// Extract the `<body>` inner markup of a rendered description page, falling
/// back to the full markup when there is no body element.
pub fn description_body(markup: &str) -> String {
    let doc = scraper::Html::parse_document(markup);
    let body_sel = scraper::Selector::parse("body").expect("static selector");
    doc.select(&body_sel)
        .next()
        .map(|el| el.inner_html().trim().to_string())
        .unwrap_or_else(|| markup.to_string())
}

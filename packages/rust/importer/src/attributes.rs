//! Attribute & variant mapping: variant dimensions → attribute mappings,
//! price entries → purchasable combinations.

use tracing::{debug, info, instrument, warn};

use shopmirror_catalog::{
    AttributeMapping, AttributePair, CatalogStore, ControlType, NewAttributeMapping,
    NewAttributeValue, NewCombination, PictureAsset, known,
};
use shopmirror_shared::{MarketplaceProduct, Result, VariantOption};

use crate::pictures;

/// Semantic role of a variant dimension, matched by substring on the
/// lower-cased option name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OptionRole {
    Color,
    Size,
    ShipsFrom,
    /// Anything unrecognized gets a brand-new attribute definition.
    Custom,
}

fn classify(option_name: &str) -> OptionRole {
    let lower = option_name.to_lowercase();
    if lower.contains("color") {
        OptionRole::Color
    } else if lower.contains("size") {
        OptionRole::Size
    } else if lower.contains("ship") {
        OptionRole::ShipsFrom
    } else {
        OptionRole::Custom
    }
}

/// Create one attribute mapping per variant dimension.
///
/// Color maps to an image-swatch grid and ingests every value's swatch image
/// first so values can bind their picture by image path. Size and ships-from
/// reuse the seeded attribute definitions behind a dropdown; unknown
/// dimensions get a definition created on the fly.
///
/// Per-value price adjustment and quantity are only meaningful when the
/// product has a single variant dimension — with multiple dimensions the
/// true price/stock lives in the per-combination records and values keep
/// their defaults (adjustment 0, quantity 1).
#[instrument(skip_all, fields(product_id = %product_id))]
pub async fn map_attributes(
    store: &dyn CatalogStore,
    http: &reqwest::Client,
    product_id: &str,
    market: &MarketplaceProduct,
) -> Result<Vec<AttributeMapping>> {
    let multi_variant = market.variants.has_multiple_variants();
    let mut mappings = Vec::with_capacity(market.variants.options.len());

    for (position, option) in market.variants.options.iter().enumerate() {
        let role = classify(&option.name);
        let (attribute_id, control_type) = match role {
            OptionRole::Color => (known::ATTRIBUTE_COLOR.to_string(), ControlType::ImageSquares),
            OptionRole::Size => (known::ATTRIBUTE_SIZE.to_string(), ControlType::DropdownList),
            OptionRole::ShipsFrom => (
                known::ATTRIBUTE_SHIPS_FROM.to_string(),
                ControlType::DropdownList,
            ),
            OptionRole::Custom => {
                let id = store.insert_attribute(&option.name).await?;
                debug!(name = %option.name, attribute_id = %id, "attribute created");
                (id, ControlType::DropdownList)
            }
        };

        // Swatch images are registered as assets keyed by their source URL;
        // they stay off the product gallery.
        let swatches = if control_type == ControlType::ImageSquares {
            let urls: Vec<String> = option
                .values
                .iter()
                .filter_map(|v| v.image_path.clone())
                .collect();
            pictures::ingest(store, http, &urls).await
        } else {
            Vec::new()
        };

        let values = build_values(option, &swatches, multi_variant, market);

        let mapping = store
            .insert_attribute_mapping(
                product_id,
                &NewAttributeMapping {
                    attribute_id,
                    control_type,
                    is_required: true,
                    display_order: position as i64,
                    values,
                },
            )
            .await?;

        info!(
            option = %option.name,
            values = mapping.values.len(),
            control = ?mapping.control_type,
            "attribute mapping created"
        );
        mappings.push(mapping);
    }

    Ok(mappings)
}

fn build_values(
    option: &VariantOption,
    swatches: &[PictureAsset],
    multi_variant: bool,
    market: &MarketplaceProduct,
) -> Vec<NewAttributeValue> {
    option
        .values
        .iter()
        .enumerate()
        .map(|(index, value)| {
            let picture_id = value.image_path.as_ref().and_then(|path| {
                swatches
                    .iter()
                    .find(|asset| asset.alt == *path)
                    .map(|asset| asset.id.clone())
            });

            // Single dimension: the unique price entry addressed by this
            // value id supplies the adjustment and quantity.
            let (price_adjustment, quantity) = if multi_variant {
                (0.0, 1)
            } else {
                match market.variants.price_for_value_ids(&value.id.to_string()) {
                    Some(entry) => (entry.sale_price, entry.available_quantity),
                    None => (0.0, 1),
                }
            };

            NewAttributeValue {
                name: value.name.clone(),
                picture_id,
                display_order: (index + 1) as i64,
                price_adjustment,
                quantity,
            }
        })
        .collect()
}

/// Persist one combination per variant price entry.
///
/// Each referenced option-value id is resolved to a (mapping, value) pair by
/// matching the value's display name against the stored value names; an id
/// that fails to resolve is dropped from the combination rather than failing
/// it, and a combination that resolves no pairs at all is still persisted.
#[instrument(skip_all, fields(product_id = %product_id))]
pub async fn build_combinations(
    store: &dyn CatalogStore,
    product_id: &str,
    market: &MarketplaceProduct,
    mappings: &[AttributeMapping],
) -> Result<usize> {
    let mut created = 0;

    for entry in &market.variants.prices {
        let mut pairs: Vec<AttributePair> = Vec::new();
        let mut picture_id: Option<String> = None;

        for value_id in entry.value_ids() {
            let Some(option_value) = market.variants.value_by_id(value_id) else {
                warn!(value_id, "option value id not found in variant set");
                continue;
            };

            let resolved = mappings.iter().find_map(|mapping| {
                mapping
                    .values
                    .iter()
                    .find(|v| v.name == option_value.display_name)
                    .map(|v| (mapping, v))
            });
            match resolved {
                Some((mapping, value)) => {
                    // The color swatch value's picture carries over to the
                    // combination.
                    if mapping.control_type == ControlType::ImageSquares {
                        if let Some(pic) = &value.picture_id {
                            picture_id = Some(pic.clone());
                        }
                    }
                    pairs.push(AttributePair {
                        mapping_id: mapping.id.clone(),
                        value_id: value.id.clone(),
                    });
                }
                None => {
                    warn!(
                        value_id,
                        display_name = %option_value.display_name,
                        "no attribute value matches, dropping pair"
                    );
                }
            }
        }

        store
            .insert_combination(
                product_id,
                &NewCombination {
                    pairs,
                    stock_quantity: entry.available_quantity,
                    overridden_price: entry.sale_price,
                    picture_id,
                },
            )
            .await?;
        created += 1;
    }

    info!(combinations = created, "combinations built");
    Ok(created)
}

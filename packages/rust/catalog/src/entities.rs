//! Catalog-side entities mutated by the import pipeline.
//!
//! These mirror the store's own domain model: a product with attached
//! categories, pictures, user fields, attribute mappings, and combinations.
//! `New*` structs carry the caller-supplied fields; the store assigns ids.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Products
// ---------------------------------------------------------------------------

/// Fields for creating a catalog product.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    /// Full description markup.
    pub description: String,
    pub layout_id: String,
    pub published: bool,
    pub show_on_home_page: bool,
    pub visible_individually: bool,
    pub allow_customer_reviews: bool,
    /// Stock is tracked per attribute combination, not on the product row.
    pub manage_stock_by_attributes: bool,
    pub display_stock_quantity: bool,
    pub price: f64,
    pub product_cost: f64,
    /// Non-promotional reference price.
    pub catalog_price: f64,
    pub min_entered_price: f64,
    pub max_entered_price: f64,
    pub stock_quantity: i64,
    pub order_minimum_quantity: i64,
    pub order_maximum_quantity: i64,
    pub display_order: i64,
}

/// A catalog product with its attached associations loaded.
#[derive(Debug, Clone)]
pub struct CatalogProduct {
    pub id: String,
    pub name: String,
    pub description: String,
    pub layout_id: String,
    pub published: bool,
    pub show_on_home_page: bool,
    pub visible_individually: bool,
    pub allow_customer_reviews: bool,
    pub manage_stock_by_attributes: bool,
    pub display_stock_quantity: bool,
    pub price: f64,
    pub product_cost: f64,
    pub catalog_price: f64,
    pub min_entered_price: f64,
    pub max_entered_price: f64,
    pub stock_quantity: i64,
    pub order_minimum_quantity: i64,
    pub order_maximum_quantity: i64,
    pub display_order: i64,
    /// Attached category associations.
    pub categories: Vec<ProductCategory>,
    /// Attached gallery pictures.
    pub pictures: Vec<ProductPicture>,
    /// Provenance and other key/value metadata.
    pub user_fields: Vec<UserField>,
    /// Variant dimensions bound to this product.
    pub attribute_mappings: Vec<AttributeMapping>,
    /// Purchasable attribute combinations.
    pub combinations: Vec<AttributeCombination>,
}

/// A product ↔ category association.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductCategory {
    pub category_id: String,
    pub featured: bool,
}

/// A product ↔ picture association with gallery ordering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductPicture {
    pub picture_id: String,
    pub display_order: i64,
}

/// A key/value metadata field on a product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserField {
    pub key: String,
    pub value: String,
}

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

/// Fields for creating a category node.
#[derive(Debug, Clone)]
pub struct NewCategory {
    pub name: String,
    pub parent_id: Option<String>,
    /// The marketplace's category id — the reconciliation key for later runs.
    pub external_id: Option<i64>,
    pub layout_id: String,
    pub published: bool,
    pub include_in_menu: bool,
    pub allow_page_size_selection: bool,
    pub page_size: i64,
    pub page_size_options: String,
    /// Category thumbnail.
    pub picture_id: Option<String>,
}

/// A category node in the catalog hierarchy.
#[derive(Debug, Clone)]
pub struct CategoryNode {
    pub id: String,
    pub name: String,
    pub parent_id: Option<String>,
    pub external_id: Option<i64>,
    pub layout_id: String,
    pub published: bool,
    pub include_in_menu: bool,
    pub allow_page_size_selection: bool,
    pub page_size: i64,
    pub page_size_options: String,
    pub picture_id: Option<String>,
}

// ---------------------------------------------------------------------------
// Attributes
// ---------------------------------------------------------------------------

/// How an attribute is presented on the product page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ControlType {
    /// Plain dropdown selection.
    DropdownList,
    /// Swatch grid of value images.
    ImageSquares,
}

impl ControlType {
    /// Stable storage representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DropdownList => "dropdown",
            Self::ImageSquares => "image-squares",
        }
    }

    /// Parse the storage representation; unknown values fall back to dropdown.
    pub fn from_str_lossy(s: &str) -> Self {
        match s {
            "image-squares" => Self::ImageSquares,
            _ => Self::DropdownList,
        }
    }
}

/// A reusable attribute definition (e.g. "Color").
#[derive(Debug, Clone)]
pub struct AttributeDefinition {
    pub id: String,
    pub name: String,
}

/// Fields for binding an attribute to a product.
#[derive(Debug, Clone)]
pub struct NewAttributeMapping {
    pub attribute_id: String,
    pub control_type: ControlType,
    pub is_required: bool,
    pub display_order: i64,
    pub values: Vec<NewAttributeValue>,
}

/// Fields for one selectable value under a mapping.
#[derive(Debug, Clone)]
pub struct NewAttributeValue {
    pub name: String,
    pub picture_id: Option<String>,
    /// 1-based position within the mapping.
    pub display_order: i64,
    pub price_adjustment: f64,
    pub quantity: i64,
}

/// An attribute bound to a product, with its stored value ids.
#[derive(Debug, Clone)]
pub struct AttributeMapping {
    pub id: String,
    pub attribute_id: String,
    pub control_type: ControlType,
    pub is_required: bool,
    pub display_order: i64,
    pub values: Vec<AttributeValue>,
}

/// A stored selectable value under a mapping.
#[derive(Debug, Clone)]
pub struct AttributeValue {
    pub id: String,
    pub name: String,
    pub picture_id: Option<String>,
    pub display_order: i64,
    pub price_adjustment: f64,
    pub quantity: i64,
}

/// One (mapping, value) coordinate of a combination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributePair {
    pub mapping_id: String,
    pub value_id: String,
}

/// Fields for creating a purchasable combination.
#[derive(Debug, Clone)]
pub struct NewCombination {
    /// 0–2 resolved attribute coordinates. An empty set is valid — id
    /// resolution failures drop pairs without dropping the combination.
    pub pairs: Vec<AttributePair>,
    pub stock_quantity: i64,
    /// Final price for this combination, replacing the product price.
    pub overridden_price: f64,
    pub picture_id: Option<String>,
}

/// A stored purchasable combination.
#[derive(Debug, Clone)]
pub struct AttributeCombination {
    pub id: String,
    pub pairs: Vec<AttributePair>,
    pub stock_quantity: i64,
    pub overridden_price: f64,
    pub picture_id: Option<String>,
}

// ---------------------------------------------------------------------------
// Pictures
// ---------------------------------------------------------------------------

/// A stored picture asset. The alt text doubles as the lookup key back to the
/// source image URL.
#[derive(Debug, Clone)]
pub struct PictureAsset {
    pub id: String,
    pub alt: String,
    pub mime_type: String,
    pub content_hash: String,
}

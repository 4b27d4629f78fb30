//! Shared types, error model, and configuration for shopmirror.
//!
//! This crate is the foundation depended on by all other shopmirror crates.
//! It provides:
//! - [`ShopMirrorError`] — the unified error type
//! - The canonical product record ([`MarketplaceProduct`] and its parts)
//! - Configuration ([`AppConfig`], [`ImportPolicy`], [`ScrapeConfig`])

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DefaultsConfig, ImportConfig, ImportPolicy, ScrapeConfig, catalog_db_path,
    config_dir, config_file_path, init_config, load_config, load_config_from,
};
pub use error::{Result, ShopMirrorError};
pub use types::{
    CategoryPathEntry, MarketplaceProduct, OPTION_VALUE_ID_DELIMITER, OptionValue, PriceRange,
    Rating, Shop, VariantOption, VariantPriceEntry, VariantSet,
};

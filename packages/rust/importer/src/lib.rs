//! The import pipeline: canonical marketplace records → catalog mutations.
//!
//! Phase modules, in pipeline order:
//! - [`conversion`] — canonical record → bare catalog product
//! - [`categories`] — breadcrumb reconciliation and attachment
//! - [`pictures`] — image byte fetch, asset registration, gallery attach
//! - [`attributes`] — variant dimensions → mappings, price entries →
//!   combinations
//! - [`pipeline`] — the [`Importer`] orchestrating single and batch imports

pub mod attributes;
pub mod categories;
pub mod conversion;
pub mod pictures;
pub mod pipeline;

pub use pipeline::{FIELD_PRODUCT_ID, FIELD_PRODUCT_URL, Importer, ProductSource};

//! Browser-driven extraction and normalization of AliExpress products.
//!
//! This crate turns a live product page into the canonical
//! [`MarketplaceProduct`](shopmirror_shared::MarketplaceProduct):
//! - [`browser`] — the [`BrowserPage`] capability and its chromiumoxide
//!   implementation
//! - [`aliexpress`] — listing and product page extraction
//! - [`raw`] / [`normalize`] — null-propagating payload access and the pure
//!   projection into the canonical record

pub mod aliexpress;
pub mod browser;
pub mod normalize;
pub mod raw;

pub use aliexpress::AliExpressScraper;
pub use browser::{BrowserPage, ChromeBrowser, ChromePage};
pub use normalize::{description_body, normalize};
pub use raw::RawState;

//! Application configuration for shopmirror.
//!
//! User config lives at `~/.shopmirror/shopmirror.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, ShopMirrorError};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "shopmirror.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".shopmirror";

// ---------------------------------------------------------------------------
// Config structs (matching shopmirror.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults (browser, catalog location).
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Import policy defaults.
    #[serde(default)]
    pub import: ImportConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Catalog database path.
    #[serde(default = "default_catalog_db")]
    pub catalog_db: String,

    /// Run the browser headless.
    #[serde(default = "default_true")]
    pub headless: bool,

    /// Pixels scrolled per step while loading a listing page.
    #[serde(default = "default_scroll_distance")]
    pub scroll_distance_px: i64,

    /// Pause between scroll steps, in milliseconds.
    #[serde(default = "default_scroll_pause")]
    pub scroll_pause_ms: u64,

    /// Upper bound on scroll steps, in case the page never stops growing.
    #[serde(default = "default_max_scroll_steps")]
    pub max_scroll_steps: u32,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            catalog_db: default_catalog_db(),
            headless: true,
            scroll_distance_px: default_scroll_distance(),
            scroll_pause_ms: default_scroll_pause(),
            max_scroll_steps: default_max_scroll_steps(),
        }
    }
}

fn default_catalog_db() -> String {
    "~/.shopmirror/catalog.db".into()
}
fn default_scroll_distance() -> i64 {
    1000
}
fn default_scroll_pause() -> u64 {
    100
}
fn default_max_scroll_steps() -> u32 {
    600
}
fn default_true() -> bool {
    true
}
fn default_page_size() -> i64 {
    10
}
fn default_page_size_options() -> String {
    "10,15,20".into()
}

/// `[import]` section — defaults for how imported products and any
/// newly-created categories are published.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportConfig {
    /// Publish imported products immediately.
    #[serde(default)]
    pub publish_products: bool,

    /// Publish categories created during reconciliation.
    #[serde(default = "default_true")]
    pub publish_categories: bool,

    /// Include created categories in the store menu.
    #[serde(default = "default_true")]
    pub include_in_menu: bool,

    /// Show imported products on the home page.
    #[serde(default)]
    pub show_on_home_page: bool,

    /// Let customers pick the page size on created category pages.
    #[serde(default = "default_true")]
    pub allow_page_size_selection: bool,

    /// Default page size for created categories.
    #[serde(default = "default_page_size")]
    pub page_size: i64,

    /// Selectable page sizes for created categories.
    #[serde(default = "default_page_size_options")]
    pub page_size_options: String,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            publish_products: false,
            publish_categories: true,
            include_in_menu: true,
            show_on_home_page: false,
            allow_page_size_selection: true,
            page_size: default_page_size(),
            page_size_options: default_page_size_options(),
        }
    }
}

// ---------------------------------------------------------------------------
// Runtime configs (merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Import policy for one import run — merged from config file + CLI flags.
#[derive(Debug, Clone, Default)]
pub struct ImportPolicy {
    /// Publish the imported product.
    pub publish_products: bool,
    /// Publish categories created during reconciliation.
    pub publish_categories: bool,
    /// Include created categories in the store menu.
    pub include_in_menu: bool,
    /// Show the imported product on the home page.
    pub show_on_home_page: bool,
    /// Let customers pick the page size on created category pages.
    pub allow_page_size_selection: bool,
    /// Default page size for created categories.
    pub page_size: i64,
    /// Selectable page sizes for created categories.
    pub page_size_options: String,
    /// Explicit target category ids. When non-empty, breadcrumb
    /// reconciliation is skipped and every id must resolve.
    pub category_ids: Vec<String>,
}

impl From<&AppConfig> for ImportPolicy {
    fn from(config: &AppConfig) -> Self {
        Self {
            publish_products: config.import.publish_products,
            publish_categories: config.import.publish_categories,
            include_in_menu: config.import.include_in_menu,
            show_on_home_page: config.import.show_on_home_page,
            allow_page_size_selection: config.import.allow_page_size_selection,
            page_size: config.import.page_size,
            page_size_options: config.import.page_size_options.clone(),
            category_ids: Vec::new(),
        }
    }
}

/// Browser/scrape configuration — merged from config file + CLI flags.
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    /// Run the browser headless.
    pub headless: bool,
    /// Pixels scrolled per step while loading a listing page.
    pub scroll_distance_px: i64,
    /// Pause between scroll steps, in milliseconds.
    pub scroll_pause_ms: u64,
    /// Upper bound on scroll steps.
    pub max_scroll_steps: u32,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        ScrapeConfig::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for ScrapeConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            headless: config.defaults.headless,
            scroll_distance_px: config.defaults.scroll_distance_px,
            scroll_pause_ms: config.defaults.scroll_pause_ms,
            max_scroll_steps: config.defaults.max_scroll_steps,
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.shopmirror/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| ShopMirrorError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.shopmirror/shopmirror.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| ShopMirrorError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        ShopMirrorError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| ShopMirrorError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| ShopMirrorError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| ShopMirrorError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Resolve the catalog database path, expanding a leading `~`.
pub fn catalog_db_path(config: &AppConfig) -> Result<PathBuf> {
    let raw = &config.defaults.catalog_db;
    if let Some(rest) = raw.strip_prefix("~/") {
        let home = dirs::home_dir()
            .ok_or_else(|| ShopMirrorError::config("could not determine home directory"))?;
        Ok(home.join(rest))
    } else {
        Ok(PathBuf::from(raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("catalog_db"));
        assert!(toml_str.contains("scroll_distance_px"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.defaults.scroll_distance_px, 1000);
        assert_eq!(parsed.import.page_size, 10);
        assert!(parsed.defaults.headless);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[defaults]
headless = false

[import]
publish_products = true
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert!(!config.defaults.headless);
        assert!(config.import.publish_products);
        assert_eq!(config.defaults.max_scroll_steps, 600);
        assert_eq!(config.import.page_size_options, "10,15,20");
    }

    #[test]
    fn import_policy_from_app_config() {
        let app = AppConfig::default();
        let policy = ImportPolicy::from(&app);
        assert!(!policy.publish_products);
        assert!(policy.publish_categories);
        assert!(policy.include_in_menu);
        assert!(policy.category_ids.is_empty());
    }

    #[test]
    fn scrape_config_from_app_config() {
        let app = AppConfig::default();
        let scrape = ScrapeConfig::from(&app);
        assert!(scrape.headless);
        assert_eq!(scrape.scroll_distance_px, 1000);
        assert_eq!(scrape.scroll_pause_ms, 100);
    }

    #[test]
    fn catalog_db_path_expands_tilde() {
        let config = AppConfig::default();
        let path = catalog_db_path(&config).expect("resolve path");
        assert!(path.is_absolute());
        assert!(path.ends_with(".shopmirror/catalog.db"));
    }
}

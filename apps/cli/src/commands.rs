//! CLI command definitions, routing, and tracing setup.

use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use shopmirror_catalog::{CatalogProduct, SqlCatalog};
use shopmirror_importer::Importer;
use shopmirror_scraper::{AliExpressScraper, ChromeBrowser, ChromePage};
use shopmirror_shared::{
    AppConfig, ImportPolicy, ScrapeConfig, catalog_db_path, init_config, load_config,
};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// shopmirror — mirror marketplace listings into your store catalog.
#[derive(Parser)]
#[command(
    name = "shopmirror",
    version,
    about = "Import AliExpress products and categories into a local store catalog.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Scrape a product and print its canonical record as JSON.
    Show {
        /// The marketplace's numeric product id.
        product_id: i64,

        /// Run the browser with a visible window.
        #[arg(long)]
        headed: bool,
    },

    /// Import a single product into the catalog.
    Import {
        /// The marketplace's numeric product id.
        product_id: i64,

        /// Attach to these existing catalog category ids instead of
        /// reconciling the breadcrumb (repeatable; all must exist).
        #[arg(long = "category-id")]
        category_ids: Vec<String>,

        /// Publish the product immediately.
        #[arg(long)]
        publish: bool,

        /// Run the browser with a visible window.
        #[arg(long)]
        headed: bool,
    },

    /// Import every product listed under a marketplace category.
    ImportCategory {
        /// The marketplace's numeric category id.
        category_id: i64,

        /// The category's URL name (as it appears in the listing URL).
        category_name: String,

        /// Publish imported products immediately.
        #[arg(long)]
        publish: bool,

        /// Run the browser with a visible window.
        #[arg(long)]
        headed: bool,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "shopmirror=info",
        1 => "shopmirror=debug",
        _ => "shopmirror=trace",
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Show { product_id, headed } => cmd_show(product_id, headed).await,
        Command::Import {
            product_id,
            category_ids,
            publish,
            headed,
        } => cmd_import(product_id, category_ids, publish, headed).await,
        Command::ImportCategory {
            category_id,
            category_name,
            publish,
            headed,
        } => cmd_import_category(category_id, &category_name, publish, headed).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

/// Launch the browser and hand back a page-driving scraper.
async fn open_scraper(
    config: &AppConfig,
    headed: bool,
) -> Result<(ChromeBrowser, AliExpressScraper<ChromePage>)> {
    let mut scrape = ScrapeConfig::from(config);
    if headed {
        scrape.headless = false;
    }

    let browser = ChromeBrowser::launch(&scrape).await?;
    let page = browser.new_page().await?;
    Ok((browser, AliExpressScraper::new(page, scrape)))
}

async fn cmd_show(product_id: i64, headed: bool) -> Result<()> {
    let config = load_config()?;
    info!(product_id, "scraping product");

    let spinner = spinner();
    spinner.set_message(format!("Scraping product {product_id}"));

    let (browser, scraper) = open_scraper(&config, headed).await?;
    let result = scraper.product(product_id).await;
    browser.close().await;
    spinner.finish_and_clear();

    let product = result?;
    println!("{}", serde_json::to_string_pretty(&product)?);
    Ok(())
}

async fn cmd_import(
    product_id: i64,
    category_ids: Vec<String>,
    publish: bool,
    headed: bool,
) -> Result<()> {
    let config = load_config()?;
    let mut policy = ImportPolicy::from(&config);
    policy.category_ids = category_ids;
    if publish {
        policy.publish_products = true;
    }

    info!(product_id, "importing product");
    let catalog = SqlCatalog::open(&catalog_db_path(&config)?).await?;

    let spinner = spinner();
    spinner.set_message(format!("Importing product {product_id}"));

    let (browser, scraper) = open_scraper(&config, headed).await?;
    let importer = Importer::new(&catalog)?;
    let result = importer.import_product(&scraper, product_id, &policy).await;
    browser.close().await;
    spinner.finish_and_clear();

    let product = result?;
    print_product_summary(&product);
    Ok(())
}

async fn cmd_import_category(
    category_id: i64,
    category_name: &str,
    publish: bool,
    headed: bool,
) -> Result<()> {
    let config = load_config()?;
    let mut policy = ImportPolicy::from(&config);
    if publish {
        policy.publish_products = true;
    }

    info!(category_id, category_name, "importing category listing");
    let catalog = SqlCatalog::open(&catalog_db_path(&config)?).await?;

    let spinner = spinner();
    spinner.set_message(format!("Importing category {category_id}/{category_name}"));

    let (browser, scraper) = open_scraper(&config, headed).await?;
    let importer = Importer::new(&catalog)?;
    let result = importer
        .import_by_category(&scraper, category_id, category_name, &policy)
        .await;
    browser.close().await;
    spinner.finish_and_clear();

    let imported = result?;
    println!();
    println!("  Imported {} product(s):", imported.len());
    for product in &imported {
        println!("  - {} ({})", product.name, product.id);
    }
    println!();
    Ok(())
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// Output helpers
// ---------------------------------------------------------------------------

fn spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap()
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    spinner.enable_steady_tick(std::time::Duration::from_millis(80));
    spinner
}

fn print_product_summary(product: &CatalogProduct) {
    println!();
    println!("  Product imported successfully!");
    println!("  ID:           {}", product.id);
    println!("  Name:         {}", product.name);
    println!("  Categories:   {}", product.categories.len());
    println!("  Pictures:     {}", product.pictures.len());
    println!("  Attributes:   {}", product.attribute_mappings.len());
    println!("  Combinations: {}", product.combinations.len());
    println!();
}

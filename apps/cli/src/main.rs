//! shopmirror CLI — import AliExpress listings into a local store catalog.
//!
//! Scrapes product and category pages with a headless browser, normalizes
//! them into canonical records, and reconciles them into the catalog.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}

//! House Finder CLI.
//!
//! ```text
//! house-finder score --from-file listings.json --min-beds 2 --max-price 4000
//! house-finder score --unscored --max-score 10
//! house-finder feedback --listing-id 42 --vote no --category "Too dark"
//! ```

mod cli;
mod commands;
mod config;
mod criteria;
mod summary;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::{Cli, Commands};
use config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load .env before logging so RUST_LOG there applies
    let config = Config::from_env()?;

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,listing_eval=debug,sqlx=warn".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_line_number(true),
        )
        .init();

    match cli.command {
        Commands::Score(args) => commands::score::run(&config, args).await,
        Commands::Feedback(args) => commands::feedback::run(&config, args).await,
    }
}

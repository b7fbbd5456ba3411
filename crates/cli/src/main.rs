//! Graphica CLI - Database migrations and bulk import.
//!
//! # Usage
//!
//! ```bash
//! # Apply pending migrations
//! graphica-cli migrate
//!
//! # Import products from a CSV file
//! graphica-cli import products.csv
//!
//! # Validate a file without writing anything
//! graphica-cli import products.csv --dry-run
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` - `PostgreSQL` connection string

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "graphica-cli")]
#[command(author, version, about = "Graphica CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Bulk import products from a CSV file
    Import {
        /// Path to the CSV file
        file: PathBuf,

        /// Validate and count rows without writing
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await,
        Commands::Import { file, dry_run } => commands::import::run(&file, dry_run).await,
    }
}

//! Varmina CLI - storage maintenance and catalog tools.
//!
//! # Usage
//!
//! ```bash
//! # Report unreferenced images without deleting anything
//! varmina storage gc --dry-run
//!
//! # Delete unreferenced images in batches of 10
//! varmina storage gc
//!
//! # Insert the demo jewelry catalog
//! varmina seed
//! ```
//!
//! Credentials come from the environment (or a local `.env`):
//! `SUPABASE_URL` and `SUPABASE_ANON_KEY`.
//!
//! # Commands
//!
//! - `storage gc` - Diff referenced image URLs against the bucket and
//!   delete orphans
//! - `seed` - Seed the catalog with demo products

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "varmina")]
#[command(author, version, about = "Varmina CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Storage bucket maintenance
    Storage {
        #[command(subcommand)]
        action: StorageAction,
    },
    /// Seed the catalog with demo products
    Seed,
}

#[derive(Subcommand)]
enum StorageAction {
    /// Delete bucket objects no product, asset, or settings row references
    Gc {
        /// Report orphans without deleting anything
        #[arg(long)]
        dry_run: bool,

        /// Objects deleted per request
        #[arg(long, default_value_t = 10)]
        batch_size: usize,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Storage { action } => match action {
            StorageAction::Gc {
                dry_run,
                batch_size,
            } => commands::storage::gc(dry_run, batch_size).await?,
        },
        Commands::Seed => commands::seed::run().await?,
    }
    Ok(())
}

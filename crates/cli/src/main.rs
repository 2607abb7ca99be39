//! Dompee CLI - Inspect the directory backend from the command line.
//!
//! # Usage
//!
//! ```bash
//! # List shops the way the public shop page does
//! dompee-cli shops --search delivery --category grocery --sort name
//!
//! # List accounts
//! dompee-cli users
//!
//! # Check the backend answers with well-formed shop data
//! dompee-cli check
//! ```
//!
//! # Commands
//!
//! - `shops` - Fetch, filter and print shops
//! - `users` - Print remote user accounts
//! - `check` - Report shop counts; fails when the backend is unreachable

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "dompee-cli")]
#[command(author, version, about = "Dompee.lk directory tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List shops through the public search pipeline
    Shops {
        /// Free-text search over name and services
        #[arg(short, long, default_value = "")]
        search: String,

        /// Category id, or `all`
        #[arg(short, long, default_value = "all")]
        category: String,

        /// Sort order (`rating` or `name`)
        #[arg(long, default_value = "rating")]
        sort: String,
    },
    /// List remote user accounts
    Users,
    /// Fetch shops and report counts per category
    Check,
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

async fn run(cli: Cli) -> Result<(), commands::CliError> {
    let client = commands::client()?;
    match cli.command {
        Commands::Shops {
            search,
            category,
            sort,
        } => commands::shops::list(&client, &search, &category, &sort).await,
        Commands::Users => commands::users::list(&client).await,
        Commands::Check => commands::shops::check(&client).await,
    }
}

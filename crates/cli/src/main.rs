//! Backoffice CLI - database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Apply the dashboard schema
//! bo-cli migrate
//!
//! # Create an account (role defaults to `user`)
//! bo-cli account create -e admin@backoffice.dev -n "Ada Admin" -p 's3cure-pass' -r admin
//!
//! # Import products from the demo API
//! bo-cli seed products --limit 50
//!
//! # Load directory users from a YAML file
//! bo-cli seed users --file users.yaml
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "bo-cli")]
#[command(author, version, about = "Backoffice CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage dashboard accounts
    Account {
        #[command(subcommand)]
        action: AccountAction,
    },
    /// Seed the database
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
}

#[derive(Subcommand)]
enum AccountAction {
    /// Create a new account
    Create {
        /// Email address
        #[arg(short, long)]
        email: String,

        /// Display name
        #[arg(short, long)]
        name: String,

        /// Password (at least 6 characters)
        #[arg(short, long)]
        password: String,

        /// Role (`admin` or `user`)
        #[arg(short, long, default_value = "user")]
        role: String,
    },
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Import products from the demo API
    Products {
        /// Number of products to fetch
        #[arg(short, long)]
        limit: Option<u32>,
    },
    /// Insert directory users from a YAML file
    Users {
        /// Path to the YAML file (a list of users)
        #[arg(short, long)]
        file: String,
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

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Account { action } => match action {
            AccountAction::Create {
                email,
                name,
                password,
                role,
            } => {
                commands::account::create(&email, &name, &password, &role).await?;
            }
        },
        Commands::Seed { target } => match target {
            SeedTarget::Products { limit } => {
                commands::seed::products(limit).await?;
            }
            SeedTarget::Users { file } => {
                commands::seed::users(&file).await?;
            }
        },
    }
    Ok(())
}

//! Sonic Industries CLI - database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Apply pending migrations to the shared database
//! sonic-cli migrate
//!
//! # Create a staff user (password from --password or SONIC_USER_PASSWORD)
//! sonic-cli user create -u priya -e priya@sonicindustries.in -r admin
//!
//! # List staff users
//! sonic-cli user list
//!
//! # Load categories, products and deals from YAML
//! sonic-cli seed seed/catalog.yaml
//! sonic-cli seed seed/catalog.yaml --dry-run
//! ```
//!
//! Every command reads `DATABASE_URL` (a `.env` file is honoured).

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "sonic-cli")]
#[command(author, version, about = "Sonic Industries CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage staff users
    User {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Seed categories, products and deals from a YAML file
    Seed {
        /// Path to the YAML seed file
        file: PathBuf,

        /// Validate the file without touching the database
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a new staff user
    Create {
        /// Login name (letters, digits, '.', '_' and '-')
        #[arg(short, long)]
        username: String,

        /// Email address
        #[arg(short, long)]
        email: String,

        /// Role (`viewer`, `editor`, `admin`)
        #[arg(short, long, default_value = "viewer")]
        role: String,

        /// Password, at least 8 characters
        #[arg(long, env = "SONIC_USER_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// List staff users
    List,
}

#[tokio::main]
async fn main() {
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
        Commands::Migrate => commands::migrate::run().await?,
        Commands::User { action } => match action {
            UserAction::Create {
                username,
                email,
                role,
                password,
            } => {
                commands::user::create(&username, &email, &role, &password).await?;
            }
            UserAction::List => commands::user::list().await?,
        },
        Commands::Seed { file, dry_run } => commands::seed::run(&file, dry_run).await?,
    }
    Ok(())
}

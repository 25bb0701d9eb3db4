//! # Command Line Interface
//!
//! `serve` (the default) runs the HTTP API; `database` manages the schema.

use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::info;

use crate::api::{build_router, start_api_server, ApiState};
use crate::auth::LoggingResetDelivery;
use crate::config::{AppConfig, DatabaseConfig};
use crate::errors::Result;
use crate::observability::{init_observability, log_config_info};
use crate::startup::seed_admin;
use crate::storage::{check_connection, create_pool, migrations};
use crate::{APP_NAME, VERSION};

#[derive(Parser)]
#[command(name = "incrime")]
#[command(about = "InCrime identity and access service")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Override the database URL from the environment
    #[arg(long, global = true)]
    pub database_url: Option<String>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Run the HTTP API (default)
    Serve,

    /// Database management commands
    Database {
        #[command(subcommand)]
        command: DatabaseCommands,
    },
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum DatabaseCommands {
    /// Apply pending migrations and exit
    Migrate,

    /// Show applied and pending migrations
    Status,
}

/// Parse the command line and dispatch.
pub async fn run_cli() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::from_env()?;
    if let Some(url) = cli.database_url {
        config.database.url = url;
        config.validate()?;
    }

    init_observability(&config.observability)?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(config).await,
        Commands::Database { command } => handle_database_command(command, &config.database).await,
    }
}

async fn serve(config: AppConfig) -> Result<()> {
    info!(app_name = APP_NAME, version = VERSION, "Starting InCrime identity service");
    log_config_info(&config);

    let pool = create_pool(&config.database).await?;
    check_connection(&pool).await?;
    seed_admin(&pool, &config).await?;

    let state = ApiState::new(pool, &config.auth, Arc::new(LoggingResetDelivery))?;
    let router = build_router(state, &config.api)?;

    start_api_server(&config.api, router).await
}

async fn handle_database_command(command: DatabaseCommands, database: &DatabaseConfig) -> Result<()> {
    // Migrations are run explicitly below so `status` can report pending ones.
    let mut database = database.clone();
    database.auto_migrate = false;
    let pool = create_pool(&database).await?;

    match command {
        DatabaseCommands::Migrate => {
            migrations::run_migrations(&pool).await?;
            let applied = migrations::applied_versions(&pool).await?;
            println!("Migrations applied ({} total)", applied.len());
        }
        DatabaseCommands::Status => {
            let applied = migrations::applied_versions(&pool).await?;
            let pending: Vec<i64> = migrations::known_versions()
                .into_iter()
                .filter(|version| !applied.contains(version))
                .collect();

            println!("Applied migrations: {}", applied.len());
            for version in &applied {
                println!("  {}", version);
            }
            if pending.is_empty() {
                println!("Database is up to date");
            } else {
                println!("Pending migrations: {}", pending.len());
                for version in &pending {
                    println!("  {}", version);
                }
            }
        }
    }

    Ok(())
}

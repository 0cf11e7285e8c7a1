//! Directory Service - HTTP server for the club user directory.

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use directory_service_lib::config::DirectoryConfig;
use directory_service_lib::{MaintenanceTask, MigrateAction};

#[derive(Parser)]
#[command(name = "directory-service")]
#[command(about = "Club user directory service")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Overrides DIRECTORY_HOST
        #[arg(long)]
        host: Option<String>,
        /// Overrides DIRECTORY_PORT
        #[arg(long)]
        port: Option<u16>,
    },
    /// Database migration commands
    Migrate {
        #[command(subcommand)]
        action: MigrateCommands,
    },
    /// Write default groups, the bootstrap admin and demo profiles
    Seed,
    /// Soft-delete the seeded records
    Clean,
    /// Rebuild group member counts from active profiles
    Recount,
    /// Print an identity token for a phone number (development only)
    IssueToken {
        phone: String,
        #[arg(long, default_value = "60")]
        ttl_minutes: i64,
    },
}

#[derive(Subcommand)]
enum MigrateCommands {
    /// Run pending migrations
    Up,
    /// Rollback last migration
    Down,
    /// Show migration status
    Status,
    /// Reset database and run all migrations
    Fresh,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let mut config = DirectoryConfig::from_env();

    match cli.command {
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.service.host = host;
            }
            if let Some(port) = port {
                config.service.port = port;
            }
            directory_service_lib::run_server(config).await?;
        }
        Commands::Migrate { action } => {
            let migrate_action = match action {
                MigrateCommands::Up => MigrateAction::Up,
                MigrateCommands::Down => MigrateAction::Down,
                MigrateCommands::Status => MigrateAction::Status,
                MigrateCommands::Fresh => MigrateAction::Fresh,
            };
            directory_service_lib::run_migrations(&config, migrate_action).await?;
        }
        Commands::Seed => {
            directory_service_lib::run_maintenance(&config, MaintenanceTask::Seed).await?;
        }
        Commands::Clean => {
            directory_service_lib::run_maintenance(&config, MaintenanceTask::Clean).await?;
        }
        Commands::Recount => {
            directory_service_lib::run_maintenance(&config, MaintenanceTask::Recount).await?;
        }
        Commands::IssueToken { phone, ttl_minutes } => {
            println!(
                "{}",
                directory_service_lib::issue_dev_token(&config, &phone, ttl_minutes)?
            );
        }
    }

    Ok(())
}

//! Directory Service Library
//!
//! User directory of the club: profiles, role groups and their member
//! counts, served over HTTP. Profiles live in PostgreSQL or, for local runs
//! and tests, in memory.

pub mod api;
pub mod config;
pub mod identity;
pub mod infra;
pub mod repository;
pub mod seed;
pub mod service;

use std::sync::Arc;

use chrono::Duration;
use tracing::info;

use crate::api::{create_router, AppState};
use crate::config::{DirectoryConfig, StoreBackend};
use crate::identity::IdentityVerifier;
use crate::infra::Database;
use crate::repository::Repositories;
use crate::service::{ServiceContainer, ServiceSettings, Services};

type BoxError = Box<dyn std::error::Error>;

/// Open the configured store; PostgreSQL migrations are applied on connect.
pub async fn open_repositories(config: &DirectoryConfig) -> Result<Repositories, BoxError> {
    match config.store_backend {
        StoreBackend::Postgres => {
            let db = Database::connect(&config.database).await?;
            Ok(Repositories::postgres(db.get_connection()))
        }
        StoreBackend::Memory => {
            info!("Using in-memory store; data is lost on exit");
            Ok(Repositories::memory())
        }
    }
}

/// Wire the services over `repos`.
pub fn build_services(repos: &Repositories, config: &DirectoryConfig) -> Services {
    Services::from_repositories(
        repos,
        ServiceSettings {
            member_count_policy: config.member_count_policy,
            bootstrap_admin_phone: config.bootstrap_admin_phone.clone(),
        },
    )
}

/// Run the HTTP server.
pub async fn run_server(config: DirectoryConfig) -> Result<(), BoxError> {
    config.validate()?;

    let repos = open_repositories(&config).await?;
    let services = Arc::new(build_services(&repos, &config));

    // An empty in-memory directory has no admin to sign in with
    if config.store_backend == StoreBackend::Memory {
        let groups = services.groups();
        seed::seed_database(&repos, groups.as_ref(), &config.bootstrap_admin_phone).await?;
    }

    let state = AppState::new(
        services,
        Arc::new(IdentityVerifier::new(&config.identity)),
        repos,
    );
    let app = create_router(state);

    let addr = config.service.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(
        policy = %config.member_count_policy,
        "Directory service listening on {}",
        addr
    );

    axum::serve(listener, app).await?;
    Ok(())
}

/// Migration action type.
#[derive(Debug, Clone, Copy)]
pub enum MigrateAction {
    Up,
    Down,
    Status,
    Fresh,
}

/// Run migrations (for CLI commands).
pub async fn run_migrations(
    config: &DirectoryConfig,
    action: MigrateAction,
) -> Result<(), BoxError> {
    let db = Database::connect_without_migrations(&config.database).await?;

    match action {
        MigrateAction::Up => {
            db.run_migrations().await?;
            info!("Migrations applied successfully");
        }
        MigrateAction::Down => {
            db.rollback_migration().await?;
            info!("Rolled back last migration");
        }
        MigrateAction::Status => {
            for (name, applied) in db.migration_status().await? {
                let marker = if applied { "[x]" } else { "[ ]" };
                println!("{} {}", marker, name);
            }
        }
        MigrateAction::Fresh => {
            db.fresh_migrations().await?;
            info!("Database reset and migrations applied");
        }
    }

    Ok(())
}

/// Data maintenance commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaintenanceTask {
    /// Write default groups, bootstrap admin and demo profiles
    Seed,
    /// Soft-delete everything `Seed` wrote
    Clean,
    /// Rebuild group member counts
    Recount,
}

/// Run a maintenance task against the persistent store.
pub async fn run_maintenance(
    config: &DirectoryConfig,
    task: MaintenanceTask,
) -> Result<(), BoxError> {
    if config.store_backend == StoreBackend::Memory {
        return Err("maintenance commands need STORE_BACKEND=postgres".into());
    }

    let repos = open_repositories(config).await?;
    let services = build_services(&repos, config);

    match task {
        MaintenanceTask::Seed => {
            let groups = services.groups();
            let report =
                seed::seed_database(&repos, groups.as_ref(), &config.bootstrap_admin_phone)
                    .await?;
            for group in &report.groups {
                println!("{:<18} {:>4}  {}", group.id, group.member_count, group.name);
            }
            info!(users = report.users, "Seed finished");
        }
        MaintenanceTask::Clean => {
            seed::clean_database(&repos).await?;
        }
        MaintenanceTask::Recount => {
            for group in services.groups().recompute_member_counts().await? {
                println!("{:<18} {:>4}  {}", group.id, group.member_count, group.name);
            }
        }
    }

    Ok(())
}

/// Sign an identity token with the configured secret (local development).
pub fn issue_dev_token(
    config: &DirectoryConfig,
    phone_number: &str,
    ttl_minutes: i64,
) -> Result<String, BoxError> {
    config.validate()?;
    let verifier = IdentityVerifier::new(&config.identity);
    let phone_number = domain::normalize_phone(phone_number);
    Ok(verifier.issue(
        &format!("dev-{}", phone_number.trim_start_matches('+')),
        &phone_number,
        Duration::minutes(ttl_minutes),
    )?)
}

use std::sync::Arc;
use anyhow::Context;
use clap::Parser;
use dotenv::dotenv;
use tracing::info;
use crate::config::{Config, StorageBackend};
use crate::controller::AppState;
use crate::helpers::fixtures::Fixtures;
use crate::repositories::in_memory_repo::InMemoryRepo;
use crate::repositories::postgres_repo::{connect_pool, PostgresConnectionRepo};
use crate::repositories::ReservationStore;
use crate::services::reservation_service::ReservationService;

pub mod config;
pub mod controller;
pub mod error;
pub mod helpers;
pub mod models;
pub mod repositories;
pub mod services;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = Config::parse();

    let store = build_store(&config).await?;
    let fixtures = Fixtures::load(&config.fixtures_dir).await?;

    let reservation_service = Arc::new(ReservationService::new(store, fixtures));
    reservation_service
        .populate_db()
        .await
        .context("Failed to seed reference data")?;

    let app_state = AppState {
        reservation_service,
        allow_reset: !config.is_production(),
    };

    controller::serve(app_state, &config).await
}

async fn build_store(config: &Config) -> anyhow::Result<Arc<dyn ReservationStore>> {
    match config.storage {
        StorageBackend::Postgres => {
            let database_url = config
                .database_url
                .as_deref()
                .context("DATABASE_URL is required for postgres storage")?;
            let pool = connect_pool(database_url, config.database_pool_size).await?;
            let repo = PostgresConnectionRepo::new(pool);
            repo.ensure_schema().await?;
            info!("Using postgres storage with a pool of {}", config.database_pool_size);
            Ok(Arc::new(repo))
        }
        StorageBackend::Memory => {
            info!("Using in-memory storage, reservations will not survive a restart");
            Ok(Arc::new(InMemoryRepo::new()))
        }
    }
}

//! Database module - AppState and case persistence
//!
//! This module is split into submodules for better separation of concerns:
//! - `postgres` - sqlx-backed store used in production
//! - `memory` - in-process store for tests and demos

mod memory;
mod postgres;

pub use memory::InMemoryCaseStore;
pub use postgres::PgCaseStore;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::case::model::{Case, CasePatch, NewCase};
use crate::case::service::CaseService;
use crate::config::{AppConfig, LogoLocation, StoreBackend};
use crate::documents::logo::{AssetSource, FileAssetSource, HttpAssetSource};
use crate::documents::DocumentComposer;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("case store unavailable: {0}")]
    Unavailable(String),
    #[error("case store rejected the write: {0}")]
    Rejected(String),
    #[error("stored case is malformed: {0}")]
    Corrupt(String),
}

/// Persistence for repair cases. Implementations own case numbering.
#[async_trait]
pub trait CaseStore: Send + Sync {
    /// All cases, newest intake first.
    async fn list(&self) -> Result<Vec<Case>, StoreError>;

    async fn get_by_id(&self, id: &Uuid) -> Result<Option<Case>, StoreError>;

    /// Persist a new case with the next case number, `pending` status and
    /// intake time of now.
    async fn create(&self, new_case: NewCase) -> Result<Case, StoreError>;

    /// Merge `patch` into the stored case. `Ok(None)` when the id is unknown.
    async fn update(&self, id: &Uuid, patch: CasePatch) -> Result<Option<Case>, StoreError>;

    /// `Ok(false)` when the id is unknown.
    async fn delete(&self, id: &Uuid) -> Result<bool, StoreError>;
}

#[derive(Clone)]
pub struct AppState {
    pub cases: Arc<CaseService>,
}

impl AppState {
    pub async fn new_with_config(config: &AppConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let store: Arc<dyn CaseStore> = match &config.store {
            StoreBackend::Postgres {
                database_url,
                max_connections,
                list_cache_secs,
            } => {
                let pool = sqlx::postgres::PgPoolOptions::new()
                    .max_connections(*max_connections)
                    .acquire_timeout(std::time::Duration::from_secs(30))
                    .idle_timeout(std::time::Duration::from_secs(900))
                    .max_lifetime(std::time::Duration::from_secs(1800))
                    .connect(database_url)
                    .await?;

                sqlx::migrate!("./migrations").run(&pool).await?;
                log::info!("Database migrations applied");

                let ttl = std::time::Duration::from_secs(*list_cache_secs);
                Arc::new(PgCaseStore::with_list_cache_ttl(pool, ttl))
            }
            StoreBackend::Memory => {
                log::warn!("Using in-memory case store; data is lost on restart");
                Arc::new(InMemoryCaseStore::new())
            }
        };

        let assets: Option<Arc<dyn AssetSource>> = match &config.logo {
            Some(LogoLocation::Url(url)) => {
                let http_client = reqwest::Client::builder()
                    .timeout(std::time::Duration::from_secs(10))
                    .user_agent("printer-service-server/0.1")
                    .build()?;
                Some(Arc::new(HttpAssetSource::new(http_client, url.clone())))
            }
            Some(LogoLocation::Path(path)) => Some(Arc::new(FileAssetSource::new(path.clone()))),
            None => None,
        };

        let composer = DocumentComposer::new(config.documents.clone());
        Ok(Self::new_with_store(store, assets, composer))
    }

    pub fn new_with_store(
        store: Arc<dyn CaseStore>,
        assets: Option<Arc<dyn AssetSource>>,
        composer: DocumentComposer,
    ) -> Self {
        Self {
            cases: Arc::new(CaseService::new(store, assets, composer)),
        }
    }
}

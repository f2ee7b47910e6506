use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;

/// One tracked visit, as persisted.
#[derive(Debug, Clone)]
pub struct VisitRecord {
    /// Canonical path of the tracked resource.
    pub uri_to: String,
    /// Full URL the visitor requested.
    pub uri_from: String,
    pub ip: String,
    pub host: String,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("visit insert failed")]
    Insert(#[source] sqlx::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait VisitStore: Send + Sync {
    /// Initialize the store (create tables, etc.)
    async fn init(&self) -> Result<()>;

    /// Persist a single visit.
    async fn record_visit(&self, visit: &VisitRecord) -> StoreResult<()>;

    /// Count stored visits (diagnostic surface).
    async fn visit_count(&self) -> Result<i64>;
}

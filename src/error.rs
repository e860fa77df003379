//! Error types / 错误类型
//!
//! - `StoreError`: canonical store failures (fatal for reconciliation)
//! - `RemoteError`: search engine and cache failures (non-fatal, become warnings)
//! - `ReconcileError`: the first fatal error of a reconciliation run
//! - `DefaultsError`: failure to derive defaults from a store's index

use std::time::Duration;
use thiserror::Error;

use crate::models::StoreRef;
use crate::search_config::ValidationErrors;

/// Canonical store error / 主存储错误
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store not found: {0}")]
    NotFound(StoreRef),
    #[error("store {store_id} does not belong to organization {organization_id}")]
    AccessDenied { store_id: i64, organization_id: i64 },
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("write rejected: {0}")]
    Write(String),
    #[error("store call timed out after {0:?}")]
    Timeout(Duration),
}

/// Downstream (search engine / cache) error / 下游调用错误
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("remote returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("remote call timed out after {0:?}")]
    Timeout(Duration),
    #[error("remote unavailable: {0}")]
    Unavailable(String),
}

/// Fatal reconciliation error / 对账致命错误
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("store not found: {0}")]
    NotFound(StoreRef),
    #[error("store {0} has no associated search index")]
    NoAssociatedIndex(i64),
    #[error("{0}")]
    Validation(ValidationErrors),
    #[error("failed to load store configuration: {0}")]
    Read(#[source] StoreError),
    #[error("failed to persist store configuration: {0}")]
    Write(#[source] StoreError),
}

impl ReconcileError {
    /// Stable machine-readable kind / 错误类别
    pub fn kind(&self) -> &'static str {
        match self {
            ReconcileError::NotFound(_) => "not_found",
            ReconcileError::NoAssociatedIndex(_) => "no_associated_index",
            ReconcileError::Validation(_) => "validation_error",
            ReconcileError::Read(_) => "read_error",
            ReconcileError::Write(_) => "write_error",
        }
    }
}

/// Index defaults lookup error / 索引默认值读取错误
#[derive(Debug, Error)]
pub enum DefaultsError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("store {0} does not have an associated index")]
    NoAssociatedIndex(i64),
    #[error("failed to describe index {target}: {source}")]
    Describe {
        target: String,
        #[source]
        source: RemoteError,
    },
}

//! Canonical store adapter / 主存储适配器
//!
//! The canonical store is the single source of truth for a store's search
//! configuration. Only point reads and point writes are required.

use async_trait::async_trait;

use crate::error::StoreError;
use crate::models::{IndexBinding, StoreIdentity, StoreRef};
use crate::search_config::EffectiveConfig;

pub mod sqlite;

pub use sqlite::SqliteConfigStore;

/// Stored configuration blob as read back / 读取到的配置
#[derive(Debug, Clone, PartialEq)]
pub enum StoredConfig {
    /// Never configured / 从未配置
    Missing,
    Present(EffectiveConfig),
    /// Blob exists but could not be parsed / 配置无法解析
    Corrupt(String),
}

impl StoredConfig {
    pub fn as_config(&self) -> Option<&EffectiveConfig> {
        match self {
            StoredConfig::Present(cfg) => Some(cfg),
            _ => None,
        }
    }

    /// Parse a raw blob, a broken one is kept as `Corrupt` / 解析配置文本
    pub fn from_blob(blob: Option<&str>) -> Self {
        match blob {
            None => StoredConfig::Missing,
            Some(raw) if raw.trim().is_empty() => StoredConfig::Missing,
            Some(raw) => match serde_json::from_str::<EffectiveConfig>(raw) {
                Ok(cfg) => StoredConfig::Present(cfg),
                Err(e) => StoredConfig::Corrupt(e.to_string()),
            },
        }
    }
}

/// Everything the orchestrator needs about one store / 店铺快照
#[derive(Debug, Clone)]
pub struct StoreSnapshot {
    pub identity: StoreIdentity,
    pub index: Option<IndexBinding>,
    pub config: StoredConfig,
}

/// Canonical store capability / 主存储能力
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Load identity, index binding and configuration / 读取店铺配置
    async fn get_config(&self, store: &StoreRef) -> Result<StoreSnapshot, StoreError>;

    /// Replace the canonical configuration (no partial-write visibility) / 写入配置
    async fn put_config(
        &self,
        store_id: i64,
        actor_id: &str,
        config: &EffectiveConfig,
    ) -> Result<(), StoreError>;
}

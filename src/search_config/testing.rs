//! In-memory adapter doubles shared by the orchestrator and reader tests.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use super::{EffectiveConfig, SchemaFields, StopwordsSynonymsConfig};
use crate::cache::CacheInvalidator;
use crate::error::{RemoteError, StoreError};
use crate::models::{IndexBinding, StoreIdentity, StoreRef};
use crate::search_engine::{IndexSchema, SearchIndex};
use crate::store::{ConfigStore, StoreSnapshot, StoredConfig};

pub fn identity(id: i64) -> StoreIdentity {
    StoreIdentity {
        id,
        organization_id: 1,
        name: format!("store-{}", id),
        location: None,
        x_store_id: format!("x-{}", id),
        read_secret: "read".to_string(),
        write_secret: "write".to_string(),
        is_active: true,
        created_by: "seed".to_string(),
        created_at: "2024-01-01T00:00:00Z".to_string(),
        updated_by: None,
        updated_at: "2024-01-01T00:00:00Z".to_string(),
    }
}

pub fn binding(index_name: &str, alias: Option<&str>) -> IndexBinding {
    IndexBinding {
        index_name: index_name.to_string(),
        alias: alias.map(|a| a.to_string()),
    }
}

#[derive(Default)]
pub struct MemoryStore {
    snapshots: Mutex<HashMap<i64, StoreSnapshot>>,
    pub fail_writes: AtomicBool,
    /// Reads never complete / 读取永不返回
    pub hang_reads: AtomicBool,
    /// Writes never complete / 写入永不返回
    pub hang_writes: AtomicBool,
    pub reads: AtomicUsize,
    pub writes: AtomicUsize,
}

impl MemoryStore {
    pub fn add_store(&self, id: i64, index: Option<IndexBinding>, config: StoredConfig) {
        self.snapshots.lock().insert(
            id,
            StoreSnapshot {
                identity: identity(id),
                index,
                config,
            },
        );
    }

    pub fn config_of(&self, id: i64) -> StoredConfig {
        self.snapshots.lock()[&id].config.clone()
    }
}

#[async_trait]
impl ConfigStore for MemoryStore {
    async fn get_config(&self, store: &StoreRef) -> Result<StoreSnapshot, StoreError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.hang_reads.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        let snapshots = self.snapshots.lock();
        let found = match store {
            StoreRef::Id(id) => snapshots.get(id),
            StoreRef::External(x) => snapshots.values().find(|s| &s.identity.x_store_id == x),
        };
        found.cloned().ok_or_else(|| StoreError::NotFound(store.clone()))
    }

    async fn put_config(&self, store_id: i64, _actor_id: &str, config: &EffectiveConfig) -> Result<(), StoreError> {
        if self.hang_writes.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Write("disk full".to_string()));
        }
        let mut snapshots = self.snapshots.lock();
        let snapshot = snapshots
            .get_mut(&store_id)
            .ok_or(StoreError::NotFound(StoreRef::Id(store_id)))?;
        snapshot.config = StoredConfig::Present(config.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Records calls as `"{op}:{target}"` / 记录调用
#[derive(Default)]
pub struct RecordingSearch {
    pub calls: Mutex<Vec<String>>,
    pub fail: AtomicBool,
    /// Calls never complete / 调用永不返回
    pub hang: AtomicBool,
    pub schema: Mutex<Option<IndexSchema>>,
}

impl RecordingSearch {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    async fn record(&self, call: String) -> Result<(), RemoteError> {
        self.calls.lock().push(call);
        if self.hang.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(RemoteError::Status {
                status: 502,
                body: "bad gateway".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl SearchIndex for RecordingSearch {
    async fn push_schema(&self, target: &str, _fields: &SchemaFields) -> Result<(), RemoteError> {
        self.record(format!("schema:{}", target)).await
    }

    async fn push_lexical(&self, target: &str, _lexical: &StopwordsSynonymsConfig) -> Result<(), RemoteError> {
        self.record(format!("lexical:{}", target)).await
    }

    async fn describe(&self, target: &str) -> Result<IndexSchema, RemoteError> {
        self.record(format!("describe:{}", target)).await?;
        self.schema
            .lock()
            .clone()
            .ok_or_else(|| RemoteError::Unavailable("no schema".to_string()))
    }
}

#[derive(Default)]
pub struct RecordingCache {
    pub calls: Mutex<Vec<i64>>,
    pub fail: AtomicBool,
}

impl RecordingCache {
    pub fn calls(&self) -> Vec<i64> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl CacheInvalidator for RecordingCache {
    async fn invalidate(&self, store_id: i64) -> Result<(), RemoteError> {
        self.calls.lock().push(store_id);
        if self.fail.load(Ordering::SeqCst) {
            return Err(RemoteError::Unavailable("cache offline".to_string()));
        }
        Ok(())
    }
}

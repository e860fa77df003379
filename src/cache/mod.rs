//! Read-side cache / 读缓存
//!
//! The reconciliation core only needs to signal "store X changed". Signals go
//! to the in-process `ConfigCache` and, when configured, to an external purge
//! endpoint.

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::RemoteError;

pub mod http;
pub mod memory;

pub use http::HttpCacheInvalidator;
pub use memory::ConfigCache;

/// Cache invalidation capability / 缓存失效能力
#[async_trait]
pub trait CacheInvalidator: Send + Sync {
    async fn invalidate(&self, store_id: i64) -> Result<(), RemoteError>;
}

/// Sends the signal to every target / 向所有缓存发送失效信号
///
/// Every target is attempted even if an earlier one fails; the first failure is returned.
pub struct FanoutInvalidator {
    targets: Vec<Arc<dyn CacheInvalidator>>,
}

impl FanoutInvalidator {
    pub fn new(targets: Vec<Arc<dyn CacheInvalidator>>) -> Self {
        Self { targets }
    }
}

#[async_trait]
impl CacheInvalidator for FanoutInvalidator {
    async fn invalidate(&self, store_id: i64) -> Result<(), RemoteError> {
        let mut first_error = None;
        for target in &self.targets {
            if let Err(e) = target.invalidate(store_id).await {
                tracing::warn!("Cache invalidation failed for store {}: {}", store_id, e);
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

//! External cache purge / 外部缓存清理
//!
//! `POST {purge_url}/{store_id}` with no payload.

use async_trait::async_trait;
use reqwest::Client;

use super::CacheInvalidator;
use crate::config::CacheConfig;
use crate::error::RemoteError;

pub struct HttpCacheInvalidator {
    client: Client,
    purge_url: String,
}

impl HttpCacheInvalidator {
    pub fn new(config: &CacheConfig) -> Result<Self, RemoteError> {
        let client = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self {
            client,
            purge_url: config.purge_url.trim().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl CacheInvalidator for HttpCacheInvalidator {
    async fn invalidate(&self, store_id: i64) -> Result<(), RemoteError> {
        let url = format!("{}/{}", self.purge_url, store_id);
        let resp = self.client.post(&url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(RemoteError::Status {
                status: status.as_u16(),
                body,
            });
        }
        tracing::debug!("Cache purge sent for store {}", store_id);
        Ok(())
    }
}

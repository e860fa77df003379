//! Effective configuration reader / 生效配置读取
//!
//! Query path: stored configuration plus index-derived defaults, cached per
//! store until invalidated or expired. Nothing here writes to the canonical store.
//! A stored configuration that no longer validates is ignored in favour of the
//! defaults, the same way a corrupt blob is.

use std::sync::Arc;

use super::defaults::{resolve_for_query, IndexDefaults};
use super::schema::{field_specs, field_specs_for_index, EffectiveConfig, FieldSpec};
use super::target::resolve_target;
use super::validate::{validate, QueryByRule};
use crate::cache::ConfigCache;
use crate::error::{DefaultsError, StoreError};
use crate::models::StoreRef;
use crate::search_engine::{IndexSchema, SearchIndex};
use crate::store::{ConfigStore, StoreSnapshot, StoredConfig};

pub struct EffectiveConfigReader {
    store: Arc<dyn ConfigStore>,
    search: Arc<dyn SearchIndex>,
    cache: Arc<ConfigCache>,
}

impl EffectiveConfigReader {
    pub fn new(store: Arc<dyn ConfigStore>, search: Arc<dyn SearchIndex>, cache: Arc<ConfigCache>) -> Self {
        Self { store, search, cache }
    }

    /// Configuration in force for querying a store / 获取店铺查询时生效的配置
    pub async fn get(&self, store: &StoreRef) -> Result<EffectiveConfig, StoreError> {
        if let StoreRef::Id(id) = store {
            if let Some(cached) = self.cache.get(*id) {
                return Ok(cached);
            }
        }

        // Captured before the load so an invalidation during it is noticed
        let epoch = self.cache.epoch();
        let snapshot = self.store.get_config(store).await?;
        let store_id = snapshot.identity.id;
        if let Some(cached) = self.cache.get(store_id) {
            return Ok(cached);
        }

        let defaults = match self.describe(&snapshot).await {
            Some(schema) => IndexDefaults::from_schema(&schema),
            None => IndexDefaults::default(),
        };

        let resolved = resolve_for_query(usable_stored(&snapshot), &defaults);
        if !self.cache.insert_if_fresh(store_id, epoch, resolved.clone()) {
            tracing::debug!("Config of store {} changed while loading, not cached", store_id);
        }
        Ok(resolved)
    }

    /// Field descriptors, narrowed to the bound index when it can be read / 配置字段描述
    pub async fn config_schema(&self, store: &StoreRef) -> Result<Vec<FieldSpec>, StoreError> {
        let snapshot = self.store.get_config(store).await?;
        Ok(match self.describe(&snapshot).await {
            Some(schema) => field_specs_for_index(&schema),
            None => field_specs(),
        })
    }

    /// Defaults derived from the bound index alone / 仅由索引推导的默认配置
    ///
    /// Unlike [`get`](Self::get) a missing binding or an unreadable index is an error here.
    pub async fn index_defaults(&self, store: &StoreRef) -> Result<EffectiveConfig, DefaultsError> {
        let snapshot = self.store.get_config(store).await?;
        let store_id = snapshot.identity.id;
        let target = snapshot
            .index
            .as_ref()
            .and_then(resolve_target)
            .ok_or(DefaultsError::NoAssociatedIndex(store_id))?;

        let schema = self
            .search
            .describe(target)
            .await
            .map_err(|source| DefaultsError::Describe {
                target: target.to_string(),
                source,
            })?;
        Ok(resolve_for_query(None, &IndexDefaults::from_schema(&schema)))
    }

    async fn describe(&self, snapshot: &StoreSnapshot) -> Option<IndexSchema> {
        let target = snapshot.index.as_ref().and_then(resolve_target)?;
        match self.search.describe(target).await {
            Ok(schema) => Some(schema),
            Err(e) => {
                // 读取失败时仅使用固定默认值
                tracing::warn!(
                    "Failed to describe index {} of store {}: {}",
                    target,
                    snapshot.identity.id,
                    e
                );
                None
            }
        }
    }
}

/// Stored config if it still passes validation / 仅使用仍然合法的已存配置
fn usable_stored(snapshot: &StoreSnapshot) -> Option<&EffectiveConfig> {
    match &snapshot.config {
        StoredConfig::Present(cfg) => match validate(cfg, QueryByRule::Skip) {
            Ok(()) => Some(cfg),
            Err(errors) => {
                tracing::warn!(
                    "Stored config of store {} is invalid, serving defaults: {}",
                    snapshot.identity.id,
                    errors
                );
                None
            }
        },
        // corrupt blobs are already logged by the store adapter
        StoredConfig::Corrupt(_) | StoredConfig::Missing => None,
    }
}

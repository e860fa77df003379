//! Reconciliation orchestrator / 配置对账编排
//!
//! `FETCH_EXISTING → MERGE → DECIDE_VALIDATE → VALIDATE → PERSIST_CANONICAL
//!  → PROPAGATE_SEARCH_SCHEMA → PROPAGATE_LEXICAL → INVALIDATE_CACHE`
//!
//! Consistency contract / 一致性约定：
//! - fetch, validation and canonical write failures are fatal and returned as-is
//! - the three propagation steps are best-effort: failures become warnings
//!   attached to a successful outcome, and never undo the canonical write
//! - one attempt per adapter call, no retries

use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use super::merge::merge;
use super::schema::{EffectiveConfig, PartialConfigUpdate};
use super::target::resolve_target;
use super::validate::{validate, QueryByRule};
use crate::cache::CacheInvalidator;
use crate::config::ReconcileConfig;
use crate::error::{ReconcileError, RemoteError, StoreError};
use crate::models::StoreRef;
use crate::search_engine::SearchIndex;
use crate::store::{ConfigStore, StoreSnapshot, StoredConfig};

/// Timeouts and fan-out mode / 超时与并发选项
#[derive(Debug, Clone)]
pub struct ReconcileOptions {
    /// Canonical store call timeout, exceeding it is fatal / 主存储超时（致命）
    pub store_timeout: Duration,
    /// Per propagation call timeout, exceeding it is a warning / 下游超时（仅警告）
    pub propagation_timeout: Duration,
    pub concurrent_propagation: bool,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        ReconcileOptions::from(&ReconcileConfig::default())
    }
}

impl From<&ReconcileConfig> for ReconcileOptions {
    fn from(config: &ReconcileConfig) -> Self {
        Self {
            store_timeout: Duration::from_secs(config.store_timeout_secs),
            propagation_timeout: Duration::from_secs(config.propagation_timeout_secs),
            concurrent_propagation: config.concurrent_propagation,
        }
    }
}

/// One reconciliation call from the upstream caller / 对账请求
#[derive(Debug, Clone)]
pub struct ReconcileRequest {
    pub store: StoreRef,
    pub actor_id: String,
    pub update: PartialConfigUpdate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileStep {
    FetchExisting,
    SearchSchema,
    Lexical,
    InvalidateCache,
}

/// Non-fatal problem recorded during a successful run / 非致命警告
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconcileWarning {
    pub step: ReconcileStep,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Nothing relevant in the merged config / 无需推送
    NothingToPush,
    /// Neither alias nor index name usable / 无可用目标
    NoTarget,
}

/// Propagation step result / 推送步骤结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum StepStatus {
    Applied,
    Skipped(SkipReason),
    Failed,
}

/// Successful reconciliation / 对账结果
#[derive(Debug, Clone, Serialize)]
pub struct ReconcileOutcome {
    pub store_id: i64,
    /// The configuration now in the canonical store / 已持久化的配置
    pub config: EffectiveConfig,
    pub search_schema: StepStatus,
    pub lexical: StepStatus,
    pub cache: StepStatus,
    pub warnings: Vec<ReconcileWarning>,
}

impl ReconcileOutcome {
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

struct StepReport {
    status: StepStatus,
    warning: Option<ReconcileWarning>,
}

impl StepReport {
    fn applied() -> Self {
        Self {
            status: StepStatus::Applied,
            warning: None,
        }
    }

    fn nothing_to_push() -> Self {
        Self {
            status: StepStatus::Skipped(SkipReason::NothingToPush),
            warning: None,
        }
    }

    fn no_target(step: ReconcileStep, store_id: i64) -> Self {
        tracing::warn!("Store {} has no usable alias or index name, {:?} skipped", store_id, step);
        Self {
            status: StepStatus::Skipped(SkipReason::NoTarget),
            warning: Some(ReconcileWarning {
                step,
                message: "no alias or index name to propagate to".to_string(),
            }),
        }
    }

    fn failed(step: ReconcileStep, store_id: i64, error: RemoteError) -> Self {
        tracing::warn!("Store {} {:?} failed (non-fatal): {}", store_id, step, error);
        Self {
            status: StepStatus::Failed,
            warning: Some(ReconcileWarning {
                step,
                message: error.to_string(),
            }),
        }
    }
}

/// Reconciliation orchestrator / 对账编排器
///
/// Adapters are injected, nothing is reached through process-wide state.
pub struct Reconciler {
    store: Arc<dyn ConfigStore>,
    search: Arc<dyn SearchIndex>,
    cache: Arc<dyn CacheInvalidator>,
    options: ReconcileOptions,
}

impl Reconciler {
    pub fn new(
        store: Arc<dyn ConfigStore>,
        search: Arc<dyn SearchIndex>,
        cache: Arc<dyn CacheInvalidator>,
    ) -> Self {
        Self {
            store,
            search,
            cache,
            options: ReconcileOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ReconcileOptions) -> Self {
        self.options = options;
        self
    }

    /// Apply a partial update to one store / 对单个店铺执行配置对账
    pub async fn reconcile(&self, request: ReconcileRequest) -> Result<ReconcileOutcome, ReconcileError> {
        let ReconcileRequest {
            store,
            actor_id,
            update,
        } = request;
        tracing::info!(
            "Reconciling search config of store {} (by {}), fields: {:?}",
            store,
            actor_id,
            update.present_fields()
        );

        // FETCH_EXISTING
        let snapshot = self.fetch_existing(&store).await?;
        let store_id = snapshot.identity.id;
        let binding = snapshot
            .index
            .clone()
            .ok_or(ReconcileError::NoAssociatedIndex(store_id))?;
        let mut warnings = Vec::new();
        let existing = usable_existing(&snapshot, &mut warnings);

        // MERGE
        let merged = merge(existing.as_ref(), &update);

        // DECIDE_VALIDATE + VALIDATE
        let rule = QueryByRule::decide(existing.as_ref(), &update);
        if let Err(errors) = validate(&merged, rule) {
            tracing::info!("Search config of store {} rejected: {}", store_id, errors);
            return Err(ReconcileError::Validation(errors));
        }

        // PERSIST_CANONICAL
        self.persist(store_id, &actor_id, &merged).await?;
        tracing::info!("Search config of store {} persisted", store_id);

        // PROPAGATE_SEARCH_SCHEMA / PROPAGATE_LEXICAL / INVALIDATE_CACHE
        let target = resolve_target(&binding);
        let schema_step = self.propagate_schema(store_id, target, &merged);
        let lexical_step = self.propagate_lexical(store_id, target, &merged);
        let cache_step = self.invalidate_cache(store_id);
        let (schema, lexical, cache) = if self.options.concurrent_propagation {
            futures::join!(schema_step, lexical_step, cache_step)
        } else {
            (schema_step.await, lexical_step.await, cache_step.await)
        };

        warnings.extend(
            [&schema, &lexical, &cache]
                .into_iter()
                .filter_map(|report| report.warning.clone()),
        );
        if !warnings.is_empty() {
            tracing::warn!(
                "Store {} reconciled with {} warning(s)",
                store_id,
                warnings.len()
            );
        }

        Ok(ReconcileOutcome {
            store_id,
            config: merged,
            search_schema: schema.status,
            lexical: lexical.status,
            cache: cache.status,
            warnings,
        })
    }

    async fn fetch_existing(&self, store: &StoreRef) -> Result<StoreSnapshot, ReconcileError> {
        match tokio::time::timeout(self.options.store_timeout, self.store.get_config(store)).await {
            Ok(Ok(snapshot)) => Ok(snapshot),
            Ok(Err(StoreError::NotFound(missing))) => Err(ReconcileError::NotFound(missing)),
            Ok(Err(e)) => Err(ReconcileError::Read(e)),
            Err(_) => Err(ReconcileError::Read(StoreError::Timeout(self.options.store_timeout))),
        }
    }

    async fn persist(&self, store_id: i64, actor_id: &str, config: &EffectiveConfig) -> Result<(), ReconcileError> {
        let write = self.store.put_config(store_id, actor_id, config);
        match tokio::time::timeout(self.options.store_timeout, write).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => {
                tracing::error!("Canonical write for store {} failed: {}", store_id, e);
                Err(ReconcileError::Write(e))
            }
            Err(_) => {
                tracing::error!("Canonical write for store {} timed out", store_id);
                Err(ReconcileError::Write(StoreError::Timeout(self.options.store_timeout)))
            }
        }
    }

    /// Single attempt bounded by the propagation timeout / 单次调用，带超时
    async fn remote<F>(&self, call: F) -> Result<(), RemoteError>
    where
        F: Future<Output = Result<(), RemoteError>>,
    {
        let timeout = self.options.propagation_timeout;
        tokio::time::timeout(timeout, call)
            .await
            .unwrap_or(Err(RemoteError::Timeout(timeout)))
    }

    async fn propagate_schema(&self, store_id: i64, target: Option<&str>, config: &EffectiveConfig) -> StepReport {
        if !config.has_schema_fields() {
            return StepReport::nothing_to_push();
        }
        let Some(target) = target else {
            return StepReport::no_target(ReconcileStep::SearchSchema, store_id);
        };
        let fields = config.schema_fields();
        match self.remote(self.search.push_schema(target, &fields)).await {
            Ok(()) => {
                tracing::info!("Schema settings of store {} pushed to {}", store_id, target);
                StepReport::applied()
            }
            Err(e) => StepReport::failed(ReconcileStep::SearchSchema, store_id, e),
        }
    }

    async fn propagate_lexical(&self, store_id: i64, target: Option<&str>, config: &EffectiveConfig) -> StepReport {
        if !config.has_lexical_fields() {
            return StepReport::nothing_to_push();
        }
        let Some(target) = target else {
            return StepReport::no_target(ReconcileStep::Lexical, store_id);
        };
        let lexical = config.lexical();
        match self.remote(self.search.push_lexical(target, &lexical)).await {
            Ok(()) => {
                tracing::info!("Stopwords/synonyms of store {} pushed to {}", store_id, target);
                StepReport::applied()
            }
            Err(e) => StepReport::failed(ReconcileStep::Lexical, store_id, e),
        }
    }

    async fn invalidate_cache(&self, store_id: i64) -> StepReport {
        match self.remote(self.cache.invalidate(store_id)).await {
            Ok(()) => StepReport::applied(),
            Err(e) => StepReport::failed(ReconcileStep::InvalidateCache, store_id, e),
        }
    }
}

/// Stored config usable as merge base; unreadable or invalid records count as
/// "no configuration" and leave a warning behind.
/// 无法解析或不合法的已存配置视为未配置
fn usable_existing(snapshot: &StoreSnapshot, warnings: &mut Vec<ReconcileWarning>) -> Option<EffectiveConfig> {
    let store_id = snapshot.identity.id;
    let discarded = match &snapshot.config {
        StoredConfig::Missing => return None,
        StoredConfig::Present(cfg) => match validate(cfg, QueryByRule::Skip) {
            Ok(()) => return Some(cfg.clone()),
            Err(errors) => format!("stored configuration is invalid and was discarded: {}", errors),
        },
        StoredConfig::Corrupt(reason) => format!("stored configuration is unreadable and was discarded: {}", reason),
    };
    tracing::warn!("Store {}: {}", store_id, discarded);
    warnings.push(ReconcileWarning {
        step: ReconcileStep::FetchExisting,
        message: discarded,
    });
    None
}

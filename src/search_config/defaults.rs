//! Index-derived defaults / 索引默认值
//!
//! Read-only fallback for the query path: values the stored configuration
//! leaves unset are filled from the index schema and fixed defaults. Never
//! written back to the canonical store.

use super::schema::{EffectiveConfig, SearchStrategy};
use crate::search_engine::IndexSchema;

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_PER_PAGE: i64 = 10;
pub const DEFAULT_TYPOS: i64 = 2;

/// Defaults derived from the index schema / 从索引 Schema 推导的默认值
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexDefaults {
    /// Text fields of the index in declaration order / 文本字段
    pub query_by: Vec<String>,
    pub default_sorting_field: Option<String>,
}

impl IndexDefaults {
    pub fn from_schema(schema: &IndexSchema) -> Self {
        Self {
            query_by: schema
                .fields
                .iter()
                .filter(|f| f.is_text())
                .map(|f| f.name.clone())
                .collect(),
            default_sorting_field: schema
                .default_sorting_field
                .clone()
                .filter(|f| !f.trim().is_empty()),
        }
    }
}

/// Configuration actually in force for querying / 查询时实际生效的配置
pub fn resolve_for_query(stored: Option<&EffectiveConfig>, defaults: &IndexDefaults) -> EffectiveConfig {
    let mut resolved = stored.cloned().unwrap_or_default();

    if resolved.query_by.is_empty() {
        resolved.query_by = defaults.query_by.clone();
    }
    if resolved.default_sorting_field.is_none() {
        resolved.default_sorting_field = defaults.default_sorting_field.clone();
    }
    resolved.page.get_or_insert(DEFAULT_PAGE);
    resolved.per_page.get_or_insert(DEFAULT_PER_PAGE);
    resolved.num_typos.get_or_insert(DEFAULT_TYPOS);
    resolved.search_strategy.get_or_insert(SearchStrategy::Text);

    resolved
}

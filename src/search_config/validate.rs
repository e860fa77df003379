//! Validator / 配置校验
//!
//! Every rule is checked and every violation is reported by field name.

use serde::Serialize;
use std::fmt;

use super::schema::{ConfigField, EffectiveConfig, PartialConfigUpdate, SearchStrategy, MAX_PER_PAGE, MAX_TYPOS};

/// One violated rule / 单条校验错误
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    pub field: ConfigField,
    pub reason: String,
}

impl ValidationError {
    fn new(field: ConfigField, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field, self.reason)
    }
}

/// All violations of one config, never empty / 校验错误集合
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<ValidationError>);

impl ValidationErrors {
    pub fn first(&self) -> &ValidationError {
        &self.0[0]
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn contains(&self, field: ConfigField) -> bool {
        self.0.iter().any(|e| e.field == field)
    }

    pub fn get(&self, field: ConfigField) -> Option<&ValidationError> {
        self.0.iter().find(|e| e.field == field)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<String> = self.0.iter().map(|e| e.to_string()).collect();
        f.write_str(&messages.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

/// Whether the query_by non-empty rule applies / query_by 必填规则是否生效
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryByRule {
    Enforce,
    Skip,
}

impl QueryByRule {
    /// Enforced once a query_by list was ever supplied: by this update, or by
    /// the configuration already stored.
    /// 本次更新显式提供了 query_by，或已有配置中 query_by 非空时才强制校验
    pub fn decide(existing: Option<&EffectiveConfig>, partial: &PartialConfigUpdate) -> Self {
        let supplied_now = partial.query_by.is_some();
        let supplied_before = existing.map(|cfg| cfg.is_queryable()).unwrap_or(false);
        if supplied_now || supplied_before {
            QueryByRule::Enforce
        } else {
            QueryByRule::Skip
        }
    }
}

/// Validate a merged configuration / 校验合并后的配置
pub fn validate(cfg: &EffectiveConfig, query_by: QueryByRule) -> Result<(), ValidationErrors> {
    let mut errors = Vec::new();

    if query_by == QueryByRule::Enforce && cfg.query_by.is_empty() {
        errors.push(ValidationError::new(ConfigField::QueryBy, "field is required"));
    }

    if let Some(page) = cfg.page {
        if page < 1 {
            errors.push(ValidationError::new(
                ConfigField::Page,
                format!("must be at least 1, got {}", page),
            ));
        }
    }

    if let Some(per_page) = cfg.per_page {
        if !(1..=MAX_PER_PAGE).contains(&per_page) {
            errors.push(ValidationError::new(
                ConfigField::PerPage,
                format!("out of range: must be between 1 and {}, got {}", MAX_PER_PAGE, per_page),
            ));
        }
    }

    if let Some(typos) = cfg.num_typos {
        if !(0..=MAX_TYPOS).contains(&typos) {
            errors.push(ValidationError::new(
                ConfigField::NumTypos,
                format!("out of range: must be between 0 and {}, got {}", MAX_TYPOS, typos),
            ));
        }
    }

    if let Some(strategy) = &cfg.search_strategy {
        if !strategy.is_supported() {
            errors.push(ValidationError::new(
                ConfigField::SearchStrategy,
                format!(
                    "'{}' is not supported, expected one of {}",
                    strategy.as_str(),
                    SearchStrategy::SUPPORTED.join(", ")
                ),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationErrors(errors))
    }
}

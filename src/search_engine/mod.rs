//! Search-index adapter / 搜索引擎适配器
//!
//! Only provides primitives (push schema, push stopwords/synonyms, describe);
//! when and whether to call them is decided by the reconciliation core.
//! Call direction: Core → Search engine (unidirectional) / 调用方向

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::RemoteError;
use crate::search_config::{SchemaFields, StopwordsSynonymsConfig};

pub mod client;

pub use client::HttpSearchIndex;

/// One field declared by the index / 索引字段
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexField {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
}

impl IndexField {
    pub fn is_text(&self) -> bool {
        matches!(self.field_type.as_str(), "string" | "string[]")
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self.field_type.as_str(), "int32" | "int64" | "float")
    }
}

/// Index schema as reported by the engine / 索引 Schema
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSchema {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<IndexField>,
    #[serde(default)]
    pub default_sorting_field: Option<String>,
}

/// Search engine capability / 搜索引擎能力
///
/// `target` is the already resolved alias or index name.
#[async_trait]
pub trait SearchIndex: Send + Sync {
    /// Push schema-level settings / 推送 Schema 设置
    async fn push_schema(&self, target: &str, fields: &SchemaFields) -> Result<(), RemoteError>;

    /// Push stopwords and synonyms / 推送停用词与同义词
    async fn push_lexical(&self, target: &str, lexical: &StopwordsSynonymsConfig) -> Result<(), RemoteError>;

    /// Read the index schema (read-only introspection) / 读取索引 Schema
    async fn describe(&self, target: &str) -> Result<IndexSchema, RemoteError>;
}

use serde::{Deserialize, Serialize};
use std::fmt;

/// Store identity attributes / 店铺身份信息
///
/// Created on provisioning, mutated only by store-update and status-toggle.
/// Never deleted, deactivated through `is_active` instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct StoreIdentity {
    pub id: i64,
    pub organization_id: i64,
    pub name: String,
    pub location: Option<String>,
    /// Opaque external-facing id (x-store-id) / 对外暴露的店铺ID
    pub x_store_id: String,
    #[serde(skip_serializing)]
    pub read_secret: String,
    #[serde(skip_serializing)]
    pub write_secret: String,
    pub is_active: bool,
    pub created_by: String,
    pub created_at: String,
    pub updated_by: Option<String>,
    pub updated_at: String,
}

/// Search index associated with a store / 店铺关联的搜索索引
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct IndexBinding {
    pub index_name: String,
    pub alias: Option<String>,
}

/// How a caller addresses a store: numeric id or external x-store-id / 店铺引用方式
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoreRef {
    Id(i64),
    External(String),
}

impl StoreRef {
    /// Parse a path segment: all digits means numeric id, anything else is an external id
    /// 纯数字为内部ID，其余视为外部ID
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        match raw.parse::<i64>() {
            Ok(id) => StoreRef::Id(id),
            Err(_) => StoreRef::External(raw.to_string()),
        }
    }
}

impl fmt::Display for StoreRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreRef::Id(id) => write!(f, "#{}", id),
            StoreRef::External(x) => write!(f, "x-store-id {}", x),
        }
    }
}

impl From<i64> for StoreRef {
    fn from(id: i64) -> Self {
        StoreRef::Id(id)
    }
}

/// Store provisioning request / 创建店铺请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateStoreRequest {
    pub organization_id: i64,
    pub name: String,
    #[serde(default)]
    pub location: Option<String>,
    /// Bind an index right away (optional) / 可选：同时绑定索引
    #[serde(default)]
    pub index_name: Option<String>,
    #[serde(default)]
    pub alias: Option<String>,
}

/// Store update request, absent fields stay untouched / 更新店铺请求
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateStoreRequest {
    pub name: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BindIndexRequest {
    pub index_name: String,
    #[serde(default)]
    pub alias: Option<String>,
}

/// Returned once on provisioning: the only time secrets leave the service
/// 仅在创建时返回密钥
#[derive(Debug, Clone, Serialize)]
pub struct ProvisionedStore {
    #[serde(flatten)]
    pub identity: StoreIdentity,
    pub read_secret: String,
    pub write_secret: String,
}

/// Store credentials, only shown to the owning organization / 店铺凭证
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreCredentials {
    pub x_store_id: String,
    pub read_secret: String,
    pub write_secret: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetStatusRequest {
    pub is_active: bool,
}

/// Result of an explicit status change / 状态设置结果
#[derive(Debug, Clone, Serialize)]
pub struct StatusUpdate {
    pub store: StoreIdentity,
    /// False when the store already had the requested status
    pub changed: bool,
}

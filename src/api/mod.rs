pub mod search_config;
pub mod server;
pub mod stores;

use axum::{
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::state::AppState;
use store_search_backend::error::{DefaultsError, ReconcileError, StoreError};

/// Header carrying the acting user / 操作人请求头
pub const ACTOR_HEADER: &str = "x-user-id";
/// Header carrying the caller's organization / 组织ID请求头
pub const ORG_HEADER: &str = "x-org-id";

#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            code: 200,
            message: "success".to_string(),
            data: Some(data),
        }
    }

    pub fn with_message(message: &str, data: T) -> Self {
        Self {
            code: 200,
            message: message.to_string(),
            data: Some(data),
        }
    }

    pub fn error(status: StatusCode, message: &str) -> Self {
        Self {
            code: status.as_u16() as i32,
            message: message.to_string(),
            data: None,
        }
    }
}

pub type ApiError = (StatusCode, Json<ApiResponse<Value>>);
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

fn error_response(status: StatusCode, message: &str, data: Option<Value>) -> ApiError {
    let mut body = ApiResponse::error(status, message);
    body.data = data;
    (status, Json(body))
}

/// Map store errors / 存储错误映射
pub fn store_error(e: StoreError) -> ApiError {
    match &e {
        StoreError::NotFound(_) => error_response(StatusCode::NOT_FOUND, &e.to_string(), None),
        StoreError::Write(_) => error_response(StatusCode::BAD_REQUEST, &e.to_string(), None),
        StoreError::AccessDenied { .. } => error_response(StatusCode::FORBIDDEN, &e.to_string(), None),
        _ => {
            tracing::error!("Store operation failed: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string(), None)
        }
    }
}

/// Map reconciliation errors / 对账错误映射
pub fn reconcile_error(e: ReconcileError) -> ApiError {
    let status = match &e {
        ReconcileError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ReconcileError::NotFound(_) => StatusCode::NOT_FOUND,
        ReconcileError::NoAssociatedIndex(_) => StatusCode::CONFLICT,
        ReconcileError::Read(_) | ReconcileError::Write(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let mut data = json!({ "kind": e.kind() });
    if let ReconcileError::Validation(errors) = &e {
        data["errors"] = json!(errors);
    }
    error_response(status, &e.to_string(), Some(data))
}

/// Map index defaults errors / 默认值错误映射
pub fn defaults_error(e: DefaultsError) -> ApiError {
    match e {
        DefaultsError::Store(e) => store_error(e),
        DefaultsError::NoAssociatedIndex(_) => error_response(
            StatusCode::CONFLICT,
            &e.to_string(),
            Some(json!({ "kind": "no_associated_index" })),
        ),
        DefaultsError::Describe { .. } => {
            tracing::error!("Index defaults unavailable: {}", e);
            error_response(StatusCode::BAD_GATEWAY, &e.to_string(), None)
        }
    }
}

/// Caller's organization, required / 获取调用方组织ID
pub fn organization_id(headers: &HeaderMap) -> Result<i64, ApiError> {
    headers
        .get(ORG_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<i64>().ok())
        .ok_or_else(|| {
            error_response(
                StatusCode::BAD_REQUEST,
                &format!("missing or invalid {} header", ORG_HEADER),
                None,
            )
        })
}

/// Acting user from the request, `anonymous` when absent / 获取操作人
pub fn actor_id(headers: &HeaderMap) -> String {
    headers
        .get(ACTOR_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or("anonymous")
        .to_string()
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(server::health_check))
        .route("/api/version", get(server::version_info))
        .route("/api/stores", get(stores::list_stores))
        .route("/api/stores", post(stores::create_store))
        .route("/api/stores/:store", get(stores::get_store))
        .route("/api/stores/:store", post(stores::update_store))
        .route("/api/stores/:store/credentials", get(stores::get_credentials))
        .route("/api/stores/:store/status", post(stores::set_status))
        .route("/api/stores/:store/toggle", post(stores::toggle_store))
        .route("/api/stores/:store/index", post(stores::bind_index))
        .route("/api/stores/:store/search-config", get(search_config::get_search_config))
        .route("/api/stores/:store/search-config", post(search_config::update_search_config))
        .route("/api/stores/:store/search-config/schema", get(search_config::get_config_schema))
        .route("/api/stores/:store/search-config/defaults", get(search_config::get_index_defaults))
        .route("/api/search-config/fields", get(search_config::list_fields))
        .with_state(state)
}

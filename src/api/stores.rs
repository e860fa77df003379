use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use std::sync::Arc;

use super::{actor_id, organization_id, store_error, ApiResponse, ApiResult};
use crate::state::AppState;
use store_search_backend::error::StoreError;
use store_search_backend::models::{
    BindIndexRequest, CreateStoreRequest, IndexBinding, ProvisionedStore, SetStatusRequest, StatusUpdate,
    StoreCredentials, StoreIdentity, StoreRef, UpdateStoreRequest,
};

/// GET /api/stores - 列出当前组织的店铺
pub async fn list_stores(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> ApiResult<Vec<StoreIdentity>> {
    let org = organization_id(&headers)?;
    let stores = state.stores.list_stores(org).await.map_err(store_error)?;
    Ok(Json(ApiResponse::success(stores)))
}

/// POST /api/stores - 创建店铺
pub async fn create_store(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<CreateStoreRequest>,
) -> ApiResult<ProvisionedStore> {
    let actor = actor_id(&headers);
    let created = state.stores.create_store(&req, &actor).await.map_err(store_error)?;
    Ok(Json(ApiResponse::success(created)))
}

/// GET /api/stores/:store - 获取店铺信息
pub async fn get_store(
    State(state): State<Arc<AppState>>,
    Path(store): Path<String>,
) -> ApiResult<StoreIdentity> {
    let identity = state
        .stores
        .get_identity(&StoreRef::parse(&store))
        .await
        .map_err(store_error)?;
    Ok(Json(ApiResponse::success(identity)))
}

/// POST /api/stores/:store - 更新店铺信息
pub async fn update_store(
    State(state): State<Arc<AppState>>,
    Path(store): Path<String>,
    headers: HeaderMap,
    Json(req): Json<UpdateStoreRequest>,
) -> ApiResult<StoreIdentity> {
    let actor = actor_id(&headers);
    let identity = state
        .stores
        .update_store(&StoreRef::parse(&store), &req, &actor)
        .await
        .map_err(store_error)?;
    Ok(Json(ApiResponse::success(identity)))
}

/// GET /api/stores/:store/credentials - 获取店铺凭证
pub async fn get_credentials(
    State(state): State<Arc<AppState>>,
    Path(store): Path<String>,
    headers: HeaderMap,
) -> ApiResult<StoreCredentials> {
    let org = organization_id(&headers)?;
    let credentials = state
        .stores
        .get_credentials(&StoreRef::parse(&store), org)
        .await
        .map_err(store_error)?;
    Ok(Json(ApiResponse::success(credentials)))
}

/// POST /api/stores/:store/status - 设置启用状态
pub async fn set_status(
    State(state): State<Arc<AppState>>,
    Path(store): Path<String>,
    headers: HeaderMap,
    Json(req): Json<SetStatusRequest>,
) -> ApiResult<StatusUpdate> {
    let actor = actor_id(&headers);
    let update = state
        .stores
        .set_active(&StoreRef::parse(&store), req.is_active, &actor)
        .await
        .map_err(store_error)?;

    if update.changed {
        return Ok(Json(ApiResponse::success(update)));
    }
    let status = if update.store.is_active { "active" } else { "inactive" };
    Ok(Json(ApiResponse::with_message(&format!("store status already {}", status), update)))
}

/// POST /api/stores/:store/toggle - 切换启用状态
pub async fn toggle_store(
    State(state): State<Arc<AppState>>,
    Path(store): Path<String>,
    headers: HeaderMap,
) -> ApiResult<StoreIdentity> {
    let actor = actor_id(&headers);
    let identity = state
        .stores
        .toggle_active(&StoreRef::parse(&store), &actor)
        .await
        .map_err(store_error)?;
    Ok(Json(ApiResponse::success(identity)))
}

/// POST /api/stores/:store/index - 绑定搜索索引
pub async fn bind_index(
    State(state): State<Arc<AppState>>,
    Path(store): Path<String>,
    headers: HeaderMap,
    Json(req): Json<BindIndexRequest>,
) -> ApiResult<IndexBinding> {
    if req.index_name.trim().is_empty() {
        return Err(store_error(StoreError::Write("index_name must not be empty".to_string())));
    }
    let store_ref = StoreRef::parse(&store);
    let binding = state
        .stores
        .bind_index(&store_ref, &req.index_name, req.alias.as_deref())
        .await
        .map_err(store_error)?;

    // Index defaults change with the binding / 索引变更后清除缓存
    let identity = state.stores.get_identity(&store_ref).await.map_err(store_error)?;
    state.config_cache.remove(identity.id);
    tracing::info!("Index of store {} rebound by {}", identity.id, actor_id(&headers));

    Ok(Json(ApiResponse::success(binding)))
}

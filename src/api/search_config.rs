use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use std::sync::Arc;

use super::{actor_id, defaults_error, reconcile_error, store_error, ApiResponse, ApiResult};
use crate::state::AppState;
use store_search_backend::models::StoreRef;
use store_search_backend::search_config::{
    field_specs, EffectiveConfig, FieldSpec, PartialConfigUpdate, ReconcileOutcome, ReconcileRequest,
};

/// GET /api/stores/:store/search-config - 获取生效的搜索配置
pub async fn get_search_config(
    State(state): State<Arc<AppState>>,
    Path(store): Path<String>,
) -> ApiResult<EffectiveConfig> {
    let config = state
        .reader
        .get(&StoreRef::parse(&store))
        .await
        .map_err(store_error)?;
    Ok(Json(ApiResponse::success(config)))
}

/// POST /api/stores/:store/search-config - 更新搜索配置并同步
pub async fn update_search_config(
    State(state): State<Arc<AppState>>,
    Path(store): Path<String>,
    headers: HeaderMap,
    Json(update): Json<PartialConfigUpdate>,
) -> ApiResult<ReconcileOutcome> {
    let outcome = state
        .reconciler
        .reconcile(ReconcileRequest {
            store: StoreRef::parse(&store),
            actor_id: actor_id(&headers),
            update,
        })
        .await
        .map_err(reconcile_error)?;

    if outcome.has_warnings() {
        Ok(Json(ApiResponse::with_message("saved with warnings", outcome)))
    } else {
        Ok(Json(ApiResponse::success(outcome)))
    }
}

/// GET /api/stores/:store/search-config/schema - 按店铺索引生成字段说明
pub async fn get_config_schema(
    State(state): State<Arc<AppState>>,
    Path(store): Path<String>,
) -> ApiResult<Vec<FieldSpec>> {
    let specs = state
        .reader
        .config_schema(&StoreRef::parse(&store))
        .await
        .map_err(store_error)?;
    Ok(Json(ApiResponse::success(specs)))
}

/// GET /api/stores/:store/search-config/defaults - 索引推导的默认配置
pub async fn get_index_defaults(
    State(state): State<Arc<AppState>>,
    Path(store): Path<String>,
) -> ApiResult<EffectiveConfig> {
    let defaults = state
        .reader
        .index_defaults(&StoreRef::parse(&store))
        .await
        .map_err(defaults_error)?;
    Ok(Json(ApiResponse::success(defaults)))
}

/// GET /api/search-config/fields - 配置字段说明
pub async fn list_fields() -> Json<ApiResponse<Vec<FieldSpec>>> {
    Json(ApiResponse::success(field_specs()))
}

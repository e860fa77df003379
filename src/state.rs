use std::sync::Arc;

use store_search_backend::cache::ConfigCache;
use store_search_backend::search_config::{EffectiveConfigReader, Reconciler};
use store_search_backend::store::SqliteConfigStore;

pub struct AppState {
    /// Store provisioning and canonical config / 店铺与配置存储
    pub stores: Arc<SqliteConfigStore>,
    pub reconciler: Reconciler,
    /// Query-path config with defaults and cache / 查询路径配置读取
    pub reader: EffectiveConfigReader,
    /// Resolved config cache shared with `reader` / 已解析配置缓存
    pub config_cache: Arc<ConfigCache>,
}

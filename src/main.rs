use sqlx::sqlite::SqlitePool;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod state;

use state::AppState;
use store_search_backend::cache::{CacheInvalidator, ConfigCache, FanoutInvalidator, HttpCacheInvalidator};
use store_search_backend::config;
use store_search_backend::db;
use store_search_backend::search_config::{EffectiveConfigReader, ReconcileOptions, Reconciler};
use store_search_backend::search_engine::HttpSearchIndex;
use store_search_backend::store::SqliteConfigStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "store_search_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration / 加载配置
    let app_config = config::load_config().map_err(anyhow::Error::msg)?;
    tracing::info!("Server will listen on {}:{}", app_config.server.host, app_config.server.port);

    // Create data directory if not exists / 创建数据目录
    let data_dir = app_config.get_data_dir();
    if !data_dir.exists() {
        std::fs::create_dir_all(&data_dir)?;
        tracing::info!("Created data directory: {:?}", data_dir);
    }

    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| app_config.get_database_url());

    let pool = SqlitePool::connect(&database_url).await?;

    db::run_migrations(&pool).await?;

    let stores = Arc::new(SqliteConfigStore::new(pool));
    let search = Arc::new(HttpSearchIndex::new(&app_config.search_engine)?);
    tracing::info!("Search engine at {}", app_config.search_engine.base_url);

    // Local cache always, external purge only when configured / 本地缓存 + 可选的外部清理
    let config_cache = Arc::new(ConfigCache::new(app_config.cache.ttl()));
    let mut cache_targets: Vec<Arc<dyn CacheInvalidator>> = vec![config_cache.clone() as Arc<dyn CacheInvalidator>];
    if !app_config.cache.purge_url.trim().is_empty() {
        cache_targets.push(Arc::new(HttpCacheInvalidator::new(&app_config.cache)?));
        tracing::info!("External cache purge enabled: {}", app_config.cache.purge_url);
    }

    let reconciler = Reconciler::new(
        stores.clone(),
        search.clone(),
        Arc::new(FanoutInvalidator::new(cache_targets)),
    )
    .with_options(ReconcileOptions::from(&app_config.reconcile));
    let reader = EffectiveConfigReader::new(stores.clone(), search, config_cache.clone());

    let state = Arc::new(AppState {
        stores,
        reconciler,
        reader,
        config_cache,
    });

    let app = api::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let bind_addr = app_config.get_bind_address();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await?;

    tracing::info!("Server running at http://{}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

use anyhow::Result;
use sqlx::SqlitePool;

/// Run database migrations / 运行数据库迁移
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS stores (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            organization_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            location TEXT,
            x_store_id TEXT NOT NULL UNIQUE,
            read_secret TEXT NOT NULL,
            write_secret TEXT NOT NULL,
            is_active INTEGER NOT NULL DEFAULT 1,
            created_by TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_by TEXT,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS store_indexes (
            store_id INTEGER PRIMARY KEY,
            index_name TEXT NOT NULL,
            alias TEXT,
            updated_at TEXT NOT NULL,
            FOREIGN KEY (store_id) REFERENCES stores(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Search configuration, one row per configured store / 搜索配置
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS store_configs (
            store_id INTEGER PRIMARY KEY,
            search_config TEXT NOT NULL,
            updated_by TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            FOREIGN KEY (store_id) REFERENCES stores(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_stores_organization ON stores(organization_id)")
        .execute(pool)
        .await?;

    tracing::info!("Database migrations completed");
    Ok(())
}

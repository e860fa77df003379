//! SQLite canonical store / SQLite 主存储
//!
//! One row per store in `stores`. The search configuration is a JSON text blob
//! in `store_configs`, written apart from the identity row so a config write
//! leaves the store's own audit columns alone. The associated index lives in
//! `store_indexes`.

use async_trait::async_trait;
use chrono::Utc;
use rand::Rng;
use sqlx::{SqliteConnection, SqlitePool};
use uuid::Uuid;

use super::{ConfigStore, StoreSnapshot, StoredConfig};
use crate::error::StoreError;
use crate::models::{
    CreateStoreRequest, IndexBinding, ProvisionedStore, StatusUpdate, StoreCredentials, StoreIdentity, StoreRef,
    UpdateStoreRequest,
};
use crate::search_config::EffectiveConfig;

const SELECT_STORE: &str = r#"
    SELECT s.id, s.organization_id, s.name, s.location, s.x_store_id,
           s.read_secret, s.write_secret, s.is_active,
           s.created_by, s.created_at, s.updated_by, s.updated_at,
           c.search_config, i.index_name, i.alias
    FROM stores s
    LEFT JOIN store_configs c ON c.store_id = s.id
    LEFT JOIN store_indexes i ON i.store_id = s.id
"#;

const SELECT_IDENTITY: &str = r#"
    SELECT id, organization_id, name, location, x_store_id, read_secret, write_secret,
           is_active, created_by, created_at, updated_by, updated_at
    FROM stores
"#;

#[derive(Debug, sqlx::FromRow)]
struct StoreRow {
    id: i64,
    organization_id: i64,
    name: String,
    location: Option<String>,
    x_store_id: String,
    read_secret: String,
    write_secret: String,
    is_active: bool,
    created_by: String,
    created_at: String,
    updated_by: Option<String>,
    updated_at: String,
    search_config: Option<String>,
    index_name: Option<String>,
    alias: Option<String>,
}

impl StoreRow {
    fn into_snapshot(self) -> StoreSnapshot {
        let config = StoredConfig::from_blob(self.search_config.as_deref());
        if let StoredConfig::Corrupt(ref reason) = config {
            tracing::warn!("Stored search config of store {} is unreadable: {}", self.id, reason);
        }
        let index = self.index_name.map(|index_name| IndexBinding {
            index_name,
            alias: self.alias,
        });
        StoreSnapshot {
            identity: StoreIdentity {
                id: self.id,
                organization_id: self.organization_id,
                name: self.name,
                location: self.location,
                x_store_id: self.x_store_id,
                read_secret: self.read_secret,
                write_secret: self.write_secret,
                is_active: self.is_active,
                created_by: self.created_by,
                created_at: self.created_at,
                updated_by: self.updated_by,
                updated_at: self.updated_at,
            },
            index,
            config,
        }
    }
}

/// Generate a store secret / 生成店铺密钥
fn generate_secret() -> String {
    let bytes: [u8; 24] = rand::thread_rng().gen();
    hex::encode(bytes)
}

async fn upsert_binding(
    conn: &mut SqliteConnection,
    store_id: i64,
    index_name: &str,
    alias: Option<&str>,
) -> Result<(), StoreError> {
    sqlx::query(
        r#"
        INSERT INTO store_indexes (store_id, index_name, alias, updated_at)
        VALUES (?, ?, ?, ?)
        ON CONFLICT(store_id) DO UPDATE SET
            index_name = excluded.index_name,
            alias = excluded.alias,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(store_id)
    .bind(index_name)
    .bind(alias)
    .bind(Utc::now().to_rfc3339())
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// SQLite-backed canonical store / 基于 SQLite 的主存储
#[derive(Clone)]
pub struct SqliteConfigStore {
    db: SqlitePool,
}

impl SqliteConfigStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.db
    }

    async fn fetch_row(&self, store: &StoreRef) -> Result<StoreRow, StoreError> {
        let row = match store {
            StoreRef::Id(id) => {
                sqlx::query_as::<_, StoreRow>(&format!("{} WHERE s.id = ?", SELECT_STORE))
                    .bind(id)
                    .fetch_optional(&self.db)
                    .await?
            }
            StoreRef::External(x_store_id) => {
                sqlx::query_as::<_, StoreRow>(&format!("{} WHERE s.x_store_id = ?", SELECT_STORE))
                    .bind(x_store_id)
                    .fetch_optional(&self.db)
                    .await?
            }
        };
        row.ok_or_else(|| StoreError::NotFound(store.clone()))
    }

    /// Get store identity / 获取店铺信息
    pub async fn get_identity(&self, store: &StoreRef) -> Result<StoreIdentity, StoreError> {
        Ok(self.fetch_row(store).await?.into_snapshot().identity)
    }

    /// Stores of one organization / 列出组织下的店铺
    pub async fn list_stores(&self, organization_id: i64) -> Result<Vec<StoreIdentity>, StoreError> {
        let stores = sqlx::query_as::<_, StoreIdentity>(&format!(
            "{} WHERE organization_id = ? ORDER BY id",
            SELECT_IDENTITY
        ))
        .bind(organization_id)
        .fetch_all(&self.db)
        .await?;
        Ok(stores)
    }

    /// Secrets of a store owned by `organization_id` / 获取店铺凭证（校验归属）
    pub async fn get_credentials(
        &self,
        store: &StoreRef,
        organization_id: i64,
    ) -> Result<StoreCredentials, StoreError> {
        let identity = self.get_identity(store).await?;
        if identity.organization_id != organization_id {
            tracing::warn!(
                "Organization {} asked for credentials of store {} owned by {}",
                organization_id,
                identity.id,
                identity.organization_id
            );
            return Err(StoreError::AccessDenied {
                store_id: identity.id,
                organization_id,
            });
        }
        Ok(StoreCredentials {
            x_store_id: identity.x_store_id,
            read_secret: identity.read_secret,
            write_secret: identity.write_secret,
        })
    }

    /// Provision a new store / 创建店铺
    pub async fn create_store(
        &self,
        req: &CreateStoreRequest,
        actor_id: &str,
    ) -> Result<ProvisionedStore, StoreError> {
        let name = req.name.trim();
        if name.is_empty() {
            return Err(StoreError::Write("store name must not be empty".to_string()));
        }

        let now = Utc::now().to_rfc3339();
        let x_store_id = Uuid::new_v4().simple().to_string();

        // Store row and index binding commit together / 店铺与索引绑定同一事务
        let mut tx = self.db.begin().await?;

        let result = sqlx::query(
            r#"
            INSERT INTO stores (organization_id, name, location, x_store_id, read_secret, write_secret,
                                is_active, created_by, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, 1, ?, ?, ?)
            "#,
        )
        .bind(req.organization_id)
        .bind(name)
        .bind(&req.location)
        .bind(&x_store_id)
        .bind(generate_secret())
        .bind(generate_secret())
        .bind(actor_id)
        .bind(&now)
        .bind(&now)
        .execute(&mut *tx)
        .await?;

        let id = result.last_insert_rowid();
        if let Some(index_name) = req.index_name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
            let alias = req.alias.as_deref().map(str::trim).filter(|a| !a.is_empty());
            upsert_binding(&mut tx, id, index_name, alias).await?;
        }

        tx.commit().await?;
        tracing::info!("Store created: id={}, x_store_id={}, by={}", id, x_store_id, actor_id);

        let identity = self.get_identity(&StoreRef::Id(id)).await?;
        Ok(ProvisionedStore {
            read_secret: identity.read_secret.clone(),
            write_secret: identity.write_secret.clone(),
            identity,
        })
    }

    /// Update name/location, absent fields untouched / 更新店铺信息
    pub async fn update_store(
        &self,
        store: &StoreRef,
        req: &UpdateStoreRequest,
        actor_id: &str,
    ) -> Result<StoreIdentity, StoreError> {
        let identity = self.get_identity(store).await?;
        if matches!(req.name.as_deref(), Some(n) if n.trim().is_empty()) {
            return Err(StoreError::Write("store name must not be empty".to_string()));
        }

        sqlx::query(
            r#"
            UPDATE stores SET
                name = COALESCE(?, name),
                location = COALESCE(?, location),
                updated_by = ?,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(req.name.as_deref().map(str::trim))
        .bind(&req.location)
        .bind(actor_id)
        .bind(Utc::now().to_rfc3339())
        .bind(identity.id)
        .execute(&self.db)
        .await?;

        self.get_identity(&StoreRef::Id(identity.id)).await
    }

    /// Flip the active flag / 切换启用状态
    pub async fn toggle_active(&self, store: &StoreRef, actor_id: &str) -> Result<StoreIdentity, StoreError> {
        let identity = self.get_identity(store).await?;

        sqlx::query("UPDATE stores SET is_active = NOT is_active, updated_by = ?, updated_at = ? WHERE id = ?")
            .bind(actor_id)
            .bind(Utc::now().to_rfc3339())
            .bind(identity.id)
            .execute(&self.db)
            .await?;

        let updated = self.get_identity(&StoreRef::Id(identity.id)).await?;
        tracing::info!("Store {} active={} (by {})", updated.id, updated.is_active, actor_id);
        Ok(updated)
    }

    /// Set the active flag, no write when it already has that value / 设置启用状态
    pub async fn set_active(
        &self,
        store: &StoreRef,
        is_active: bool,
        actor_id: &str,
    ) -> Result<StatusUpdate, StoreError> {
        let identity = self.get_identity(store).await?;
        if identity.is_active == is_active {
            return Ok(StatusUpdate {
                store: identity,
                changed: false,
            });
        }

        sqlx::query("UPDATE stores SET is_active = ?, updated_by = ?, updated_at = ? WHERE id = ?")
            .bind(is_active)
            .bind(actor_id)
            .bind(Utc::now().to_rfc3339())
            .bind(identity.id)
            .execute(&self.db)
            .await?;

        let updated = self.get_identity(&StoreRef::Id(identity.id)).await?;
        tracing::info!("Store {} active={} (by {})", updated.id, updated.is_active, actor_id);
        Ok(StatusUpdate {
            store: updated,
            changed: true,
        })
    }

    /// Associate (or re-associate) the search index / 绑定搜索索引
    pub async fn bind_index(
        &self,
        store: &StoreRef,
        index_name: &str,
        alias: Option<&str>,
    ) -> Result<IndexBinding, StoreError> {
        let identity = self.get_identity(store).await?;
        let index_name = index_name.trim();
        let alias = alias.map(str::trim).filter(|a| !a.is_empty());

        let mut conn = self.db.acquire().await?;
        upsert_binding(&mut conn, identity.id, index_name, alias).await?;

        tracing::info!("Store {} bound to index {} (alias {:?})", identity.id, index_name, alias);
        Ok(IndexBinding {
            index_name: index_name.to_string(),
            alias: alias.map(|a| a.to_string()),
        })
    }
}

#[async_trait]
impl ConfigStore for SqliteConfigStore {
    async fn get_config(&self, store: &StoreRef) -> Result<StoreSnapshot, StoreError> {
        Ok(self.fetch_row(store).await?.into_snapshot())
    }

    async fn put_config(
        &self,
        store_id: i64,
        actor_id: &str,
        config: &EffectiveConfig,
    ) -> Result<(), StoreError> {
        let blob = serde_json::to_string(config)?;

        // Selecting from stores makes an unknown id a no-op / 店铺不存在时不插入
        let result = sqlx::query(
            r#"
            INSERT INTO store_configs (store_id, search_config, updated_by, updated_at)
            SELECT id, ?, ?, ? FROM stores WHERE id = ?
            ON CONFLICT(store_id) DO UPDATE SET
                search_config = excluded.search_config,
                updated_by = excluded.updated_by,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&blob)
        .bind(actor_id)
        .bind(Utc::now().to_rfc3339())
        .bind(store_id)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(StoreRef::Id(store_id)));
        }
        tracing::debug!("Search config persisted for store {} ({} bytes)", store_id, blob.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::run_migrations;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn test_store() -> SqliteConfigStore {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        run_migrations(&pool).await.unwrap();
        SqliteConfigStore::new(pool)
    }

    fn create_request(index_name: Option<&str>) -> CreateStoreRequest {
        CreateStoreRequest {
            organization_id: 7,
            name: "Flagship".to_string(),
            location: Some("Berlin".to_string()),
            index_name: index_name.map(|s| s.to_string()),
            alias: None,
        }
    }

    #[tokio::test]
    async fn test_create_and_fetch_store() {
        let store = test_store().await;
        let created = store.create_store(&create_request(Some("products")), "admin").await.unwrap();

        assert!(created.identity.is_active);
        assert_eq!(created.read_secret.len(), 48);
        assert_ne!(created.read_secret, created.write_secret);

        let by_id = store.get_config(&StoreRef::Id(created.identity.id)).await.unwrap();
        let by_external = store
            .get_config(&StoreRef::External(created.identity.x_store_id.clone()))
            .await
            .unwrap();
        assert_eq!(by_id.identity, by_external.identity);
        assert_eq!(by_id.index.unwrap().index_name, "products");
        assert_eq!(by_id.config, StoredConfig::Missing);
    }

    #[tokio::test]
    async fn test_missing_store() {
        let store = test_store().await;
        let err = store.get_config(&StoreRef::Id(404)).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(StoreRef::Id(404))));

        let err = store
            .put_config(404, "admin", &EffectiveConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_store_without_index() {
        let store = test_store().await;
        let created = store.create_store(&create_request(None), "admin").await.unwrap();
        let snapshot = store.get_config(&StoreRef::Id(created.identity.id)).await.unwrap();
        assert!(snapshot.index.is_none());
    }

    #[tokio::test]
    async fn test_put_then_get_config() {
        let store = test_store().await;
        let id = store.create_store(&create_request(Some("p")), "admin").await.unwrap().identity.id;

        let cfg = EffectiveConfig {
            query_by: vec!["title".to_string()],
            per_page: Some(20),
            ..Default::default()
        };
        store.put_config(id, "editor", &cfg).await.unwrap();

        let snapshot = store.get_config(&StoreRef::Id(id)).await.unwrap();
        assert_eq!(snapshot.config, StoredConfig::Present(cfg.clone()));

        // second write replaces the first
        let replaced = EffectiveConfig {
            per_page: Some(30),
            ..cfg
        };
        store.put_config(id, "editor", &replaced).await.unwrap();
        let snapshot = store.get_config(&StoreRef::Id(id)).await.unwrap();
        assert_eq!(snapshot.config, StoredConfig::Present(replaced));
    }

    #[tokio::test]
    async fn test_config_write_leaves_identity_untouched() {
        let store = test_store().await;
        let before = store.create_store(&create_request(Some("p")), "creator").await.unwrap().identity;

        store
            .put_config(before.id, "config-editor", &EffectiveConfig::default())
            .await
            .unwrap();

        let after = store.get_identity(&StoreRef::Id(before.id)).await.unwrap();
        assert_eq!(after, before);
        assert_eq!(after.updated_by, None);

        let (editor,): (String,) = sqlx::query_as("SELECT updated_by FROM store_configs WHERE store_id = ?")
            .bind(before.id)
            .fetch_one(store.pool())
            .await
            .unwrap();
        assert_eq!(editor, "config-editor");
    }

    #[tokio::test]
    async fn test_corrupt_blob_is_reported() {
        let store = test_store().await;
        let id = store.create_store(&create_request(Some("p")), "admin").await.unwrap().identity.id;

        sqlx::query(
            "INSERT INTO store_configs (store_id, search_config, updated_by, updated_at) \
             VALUES (?, '{\"per_page\": \"many\"', 'admin', '2024-01-01T00:00:00Z')",
        )
        .bind(id)
        .execute(store.pool())
        .await
        .unwrap();

        let snapshot = store.get_config(&StoreRef::Id(id)).await.unwrap();
        assert!(matches!(snapshot.config, StoredConfig::Corrupt(_)));
    }

    #[tokio::test]
    async fn test_update_toggle_and_rebind() {
        let store = test_store().await;
        let created = store.create_store(&create_request(Some("p_v1")), "admin").await.unwrap();
        let store_ref = StoreRef::Id(created.identity.id);

        let updated = store
            .update_store(
                &store_ref,
                &UpdateStoreRequest {
                    name: Some("Outlet".to_string()),
                    location: None,
                },
                "ops",
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Outlet");
        assert_eq!(updated.location.as_deref(), Some("Berlin"));

        let toggled = store.toggle_active(&store_ref, "ops").await.unwrap();
        assert!(!toggled.is_active);
        let toggled = store.toggle_active(&store_ref, "ops").await.unwrap();
        assert!(toggled.is_active);

        store.bind_index(&store_ref, "p_v2", Some("products")).await.unwrap();
        let snapshot = store.get_config(&store_ref).await.unwrap();
        assert_eq!(
            snapshot.index,
            Some(IndexBinding {
                index_name: "p_v2".to_string(),
                alias: Some("products".to_string()),
            })
        );
    }

    #[tokio::test]
    async fn test_set_active_reports_unchanged() {
        let store = test_store().await;
        let created = store.create_store(&create_request(None), "admin").await.unwrap();
        let store_ref = StoreRef::Id(created.identity.id);

        let same = store.set_active(&store_ref, true, "ops").await.unwrap();
        assert!(!same.changed);
        assert_eq!(same.store, created.identity);

        let off = store.set_active(&store_ref, false, "ops").await.unwrap();
        assert!(off.changed);
        assert!(!off.store.is_active);
        assert_eq!(off.store.updated_by.as_deref(), Some("ops"));
    }

    #[tokio::test]
    async fn test_list_and_credentials_by_organization() {
        let store = test_store().await;
        let first = store.create_store(&create_request(None), "admin").await.unwrap();
        let second = store.create_store(&create_request(None), "admin").await.unwrap();
        let mut other = create_request(None);
        other.organization_id = 8;
        store.create_store(&other, "admin").await.unwrap();

        let listed = store.list_stores(7).await.unwrap();
        let ids: Vec<i64> = listed.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![first.identity.id, second.identity.id]);
        assert!(store.list_stores(99).await.unwrap().is_empty());

        let store_ref = StoreRef::External(first.identity.x_store_id.clone());
        let credentials = store.get_credentials(&store_ref, 7).await.unwrap();
        assert_eq!(credentials.read_secret, first.read_secret);
        assert_eq!(credentials.write_secret, first.write_secret);

        let err = store.get_credentials(&store_ref, 8).await.unwrap_err();
        assert!(matches!(err, StoreError::AccessDenied { organization_id: 8, .. }));
    }

    #[tokio::test]
    async fn test_failed_binding_rolls_back_store() {
        let store = test_store().await;
        sqlx::query("DROP TABLE store_indexes")
            .execute(store.pool())
            .await
            .unwrap();

        assert!(store.create_store(&create_request(Some("products")), "admin").await.is_err());

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM stores")
            .fetch_one(store.pool())
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_rejects_blank_name() {
        let store = test_store().await;
        let mut req = create_request(None);
        req.name = "  ".to_string();
        assert!(matches!(
            store.create_store(&req, "admin").await,
            Err(StoreError::Write(_))
        ));
    }
}

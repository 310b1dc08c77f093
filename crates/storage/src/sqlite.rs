use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use tokio::sync::broadcast;
use tracing::{debug, info};

use prodhub_domain::{HubError, HubResult};

use crate::store::{ContextId, LocalStore, StoreChange, CHANGE_CHANNEL_CAPACITY};

fn db_err(e: sqlx::Error) -> HubError {
    HubError::Storage(e.to_string())
}

/// SQLite键值存储实现
///
/// 单表 `kv_entries`，值为JSON文本。修订号持久化在行内，
/// 启动时从历史最大值续号，保证跨重启依旧单调。
pub struct SqliteStore {
    pool: SqlitePool,
    revision: AtomicU64,
    change_tx: broadcast::Sender<StoreChange>,
}

impl SqliteStore {
    /// 连接数据库并运行迁移
    pub async fn connect(url: &str, max_connections: u32) -> HubResult<Self> {
        info!("创建SQLite存储连接池: {}", url);

        let connect_options = SqliteConnectOptions::from_str(url)
            .map_err(db_err)?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(connect_options)
            .await
            .map_err(db_err)?;

        Self::run_migrations(&pool).await?;

        let last_revision = sqlx::query("SELECT COALESCE(MAX(revision), 0) AS revision FROM kv_entries")
            .fetch_one(&pool)
            .await
            .map_err(db_err)?
            .get::<i64, _>("revision");

        info!("✅ SQLite存储初始化完成，当前修订号: {}", last_revision);

        let (change_tx, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Ok(Self {
            pool,
            revision: AtomicU64::new(last_revision as u64),
            change_tx,
        })
    }

    async fn run_migrations(pool: &SqlitePool) -> HubResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS kv_entries (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                revision INTEGER NOT NULL,
                updated_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(pool)
        .await
        .map_err(db_err)?;

        Ok(())
    }

    fn next_revision(&self) -> u64 {
        self.revision.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn notify(&self, key: &str, revision: u64, origin: &ContextId, value: Value) {
        let _ = self.change_tx.send(StoreChange {
            key: key.to_string(),
            revision,
            origin: origin.clone(),
            value,
        });
    }
}

#[async_trait]
impl LocalStore for SqliteStore {
    async fn get(&self, key: &str) -> HubResult<Option<Value>> {
        let row = sqlx::query("SELECT value FROM kv_entries WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        match row {
            Some(row) => {
                let text: String = row.get("value");
                Ok(Some(serde_json::from_str(&text)?))
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: Value, origin: &ContextId) -> HubResult<u64> {
        let text = serde_json::to_string(&value)?;
        let revision = self.next_revision();

        sqlx::query(
            "INSERT OR REPLACE INTO kv_entries (key, value, revision, updated_at) \
             VALUES (?, ?, ?, CURRENT_TIMESTAMP)",
        )
        .bind(key)
        .bind(&text)
        .bind(revision as i64)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        debug!("SQLite存储写入 key={} revision={} origin={}", key, revision, origin);
        self.notify(key, revision, origin, value);
        Ok(revision)
    }

    async fn remove(&self, key: &str, origin: &ContextId) -> HubResult<u64> {
        let revision = self.next_revision();

        sqlx::query("DELETE FROM kv_entries WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        debug!("SQLite存储删除 key={} revision={}", key, revision);
        self.notify(key, revision, origin, Value::Null);
        Ok(revision)
    }

    async fn current_revision(&self) -> u64 {
        self.revision.load(Ordering::SeqCst)
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreChange> {
        self.change_tx.subscribe()
    }
}

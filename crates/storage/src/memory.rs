use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::{broadcast, RwLock};
use tracing::debug;

use prodhub_domain::HubResult;

use crate::store::{ContextId, LocalStore, StoreChange, CHANGE_CHANNEL_CAPACITY};

/// 内存键值存储实现
///
/// 无持久化，适用于测试与临时会话。变更通知与SQLite实现完全一致。
#[derive(Debug)]
pub struct InMemoryStore {
    entries: RwLock<HashMap<String, Value>>,
    revision: AtomicU64,
    change_tx: broadcast::Sender<StoreChange>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        let (change_tx, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            entries: RwLock::new(HashMap::new()),
            revision: AtomicU64::new(0),
            change_tx,
        }
    }

    fn next_revision(&self) -> u64 {
        self.revision.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn notify(&self, key: &str, revision: u64, origin: &ContextId, value: Value) {
        // 没有订阅者时发送失败是正常情况
        let _ = self.change_tx.send(StoreChange {
            key: key.to_string(),
            revision,
            origin: origin.clone(),
            value,
        });
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LocalStore for InMemoryStore {
    async fn get(&self, key: &str) -> HubResult<Option<Value>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value, origin: &ContextId) -> HubResult<u64> {
        {
            let mut entries = self.entries.write().await;
            entries.insert(key.to_string(), value.clone());
        }
        let revision = self.next_revision();
        debug!("内存存储写入 key={} revision={} origin={}", key, revision, origin);
        self.notify(key, revision, origin, value);
        Ok(revision)
    }

    async fn remove(&self, key: &str, origin: &ContextId) -> HubResult<u64> {
        {
            let mut entries = self.entries.write().await;
            entries.remove(key);
        }
        let revision = self.next_revision();
        debug!("内存存储删除 key={} revision={}", key, revision);
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

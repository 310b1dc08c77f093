use std::fmt;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;

use prodhub_domain::HubResult;

/// 便签列表
pub const NOTES_KEY: &str = "notes";
/// 任务列表
pub const TASKS_KEY: &str = "tasks";
/// 书签数据（分组、侧边栏状态、最后修改时间）
pub const BOOKMARKS_KEY: &str = "bookmarks_data";
/// 主题偏好
pub const THEME_KEY: &str = "app_theme";
/// 当前标签页偏好
pub const CURRENT_TAB_KEY: &str = "app_current_tab";

/// 写入来源标记
///
/// 每个上下文（协调器、各前台标签）持有唯一来源ID，
/// 取代基于时间窗口的自写抑制启发式。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContextId(String);

impl ContextId {
    pub fn new(label: impl Into<String>) -> Self {
        Self(format!("{}-{}", label.into(), uuid::Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 存储变更事件
///
/// 修订号全局单调递增；订阅方据此丢弃过期变更并识别自身写入。
#[derive(Debug, Clone)]
pub struct StoreChange {
    pub key: String,
    pub revision: u64,
    pub origin: ContextId,
    pub value: Value,
}

/// 本地键值存储抽象
#[async_trait]
pub trait LocalStore: Send + Sync {
    async fn get(&self, key: &str) -> HubResult<Option<Value>>;
    /// 写入并返回本次修订号
    async fn set(&self, key: &str, value: Value, origin: &ContextId) -> HubResult<u64>;
    async fn remove(&self, key: &str, origin: &ContextId) -> HubResult<u64>;
    /// 当前最大修订号
    async fn current_revision(&self) -> u64;
    fn subscribe(&self) -> broadcast::Receiver<StoreChange>;
}

/// 读取并反序列化一个键
pub async fn get_typed<T: DeserializeOwned>(
    store: &dyn LocalStore,
    key: &str,
) -> HubResult<Option<T>> {
    match store.get(key).await? {
        Some(value) => Ok(Some(serde_json::from_value(value)?)),
        None => Ok(None),
    }
}

/// 序列化并写入一个键
pub async fn set_typed<T: Serialize>(
    store: &dyn LocalStore,
    key: &str,
    value: &T,
    origin: &ContextId,
) -> HubResult<u64> {
    let value = serde_json::to_value(value)?;
    store.set(key, value, origin).await
}

/// 广播通道容量；落后的订阅方会丢失最旧的变更并整体重读
pub(crate) const CHANGE_CHANNEL_CAPACITY: usize = 256;

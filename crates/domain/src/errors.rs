use thiserror::Error;

/// 协调器错误类型定义
#[derive(Debug, Error)]
pub enum HubError {
    #[error("存储错误: {0}")]
    Storage(String),

    #[error("序列化错误: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("任务未找到: {id}")]
    TaskNotFound { id: String },

    #[error("便签未找到: {id}")]
    NoteNotFound { id: String },

    #[error("通知平台错误: {0}")]
    Notification(String),

    #[error("通知平台不可用")]
    NotificationUnavailable,

    #[error("无效的书签数据: {0}")]
    InvalidBookmark(String),

    #[error("配置错误: {0}")]
    Configuration(String),

    #[error("消息通道错误: {0}")]
    MessageChannel(String),

    #[error("内部错误: {0}")]
    Internal(String),
}

/// 统一的Result类型
pub type HubResult<T> = std::result::Result<T, HubError>;

//! 通知平台抽象
//!
//! 把平台的回调式通知API包装成返回Future的端口，协调器逻辑因此
//! 无回调、可用假实现测试。用户交互（点击/按钮/关闭）以事件形式
//! 通过通道回流到协调器。

use async_trait::async_trait;
use serde::Serialize;
use tracing::info;

use prodhub_domain::{HubResult, Task};

/// 富通知的展示参数
#[derive(Debug, Clone)]
pub struct NotificationOptions {
    pub title: String,
    pub message: String,
    pub context_message: String,
    /// 保持可见直到用户交互
    pub require_interaction: bool,
    pub silent: bool,
    pub buttons: Vec<String>,
}

impl NotificationOptions {
    /// 任务提醒通知：两个动作按钮（完成 / 延后5分钟）
    pub fn for_task(task: &Task) -> Self {
        let context_message = if task.description.is_empty() {
            "来自生产力中心的任务提醒".to_string()
        } else {
            task.description.clone()
        };
        Self {
            title: "⏰ 任务提醒".to_string(),
            message: format!("别忘了: {}", task.title),
            context_message,
            require_interaction: true,
            silent: false,
            buttons: vec!["✓ 标记完成".to_string(), "⏰ 延后5分钟".to_string()],
        }
    }

    /// 无按钮的简单通知（诊断用）
    pub fn simple(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            context_message: String::new(),
            require_interaction: false,
            silent: false,
            buttons: Vec::new(),
        }
    }
}

/// 平台侧用户交互事件
#[derive(Debug, Clone)]
pub enum NotifierEvent {
    Clicked {
        notification_id: String,
    },
    ButtonClicked {
        notification_id: String,
        button_index: usize,
    },
    /// 用户手动关闭或程序清除均会触发；两者处理一致
    Closed {
        notification_id: String,
        by_user: bool,
    },
}

/// 通知权限诊断结果
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionStatus {
    pub platform_available: bool,
    pub permission_granted: bool,
    pub details: Vec<String>,
}

/// 通知平台端口
#[async_trait]
pub trait Notifier: Send + Sync {
    /// 创建通知，返回平台实际使用的通知ID
    async fn create(&self, notification_id: &str, options: &NotificationOptions)
        -> HubResult<String>;
    /// 清除通知；返回是否确实存在并被清除
    async fn clear(&self, notification_id: &str) -> HubResult<bool>;
    async fn permission_status(&self) -> HubResult<PermissionStatus>;
}

/// 结构化日志通知实现
///
/// 无头运行时的默认平台：通知以日志形式落地，创建永远成功。
#[derive(Debug, Default)]
pub struct LogNotifier;

impl LogNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn create(
        &self,
        notification_id: &str,
        options: &NotificationOptions,
    ) -> HubResult<String> {
        info!(
            "🔔 展示通知 [{}] {} - {} (按钮: {:?})",
            notification_id, options.title, options.message, options.buttons
        );
        Ok(notification_id.to_string())
    }

    async fn clear(&self, notification_id: &str) -> HubResult<bool> {
        info!("🔔 清除通知 [{}]", notification_id);
        Ok(true)
    }

    async fn permission_status(&self) -> HubResult<PermissionStatus> {
        Ok(PermissionStatus {
            platform_available: true,
            permission_granted: true,
            details: vec!["日志通知后端，始终可用".to_string()],
        })
    }
}

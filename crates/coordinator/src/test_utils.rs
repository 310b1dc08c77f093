//! 测试用的手写通知适配器

use std::sync::Mutex;

use async_trait::async_trait;

use prodhub_domain::{HubError, HubResult};

use crate::notifier::{NotificationOptions, Notifier, PermissionStatus};

/// 记录所有创建/清除调用的假通知适配器，可注入一次性失败
pub struct FakeNotifier {
    created: Mutex<Vec<String>>,
    cleared: Mutex<Vec<String>>,
    fail_next: Mutex<Option<String>>,
}

impl FakeNotifier {
    pub fn new() -> Self {
        Self {
            created: Mutex::new(Vec::new()),
            cleared: Mutex::new(Vec::new()),
            fail_next: Mutex::new(None),
        }
    }

    /// 下一次create调用将以指定消息失败
    pub fn fail_next_create(&self, message: &str) {
        *self.fail_next.lock().unwrap() = Some(message.to_string());
    }

    pub fn created_ids(&self) -> Vec<String> {
        self.created.lock().unwrap().clone()
    }

    pub fn cleared_ids(&self) -> Vec<String> {
        self.cleared.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for FakeNotifier {
    async fn create(&self, id: &str, _options: &NotificationOptions) -> HubResult<String> {
        if let Some(message) = self.fail_next.lock().unwrap().take() {
            return Err(HubError::Notification(message));
        }
        self.created.lock().unwrap().push(id.to_string());
        Ok(id.to_string())
    }

    async fn clear(&self, id: &str) -> HubResult<bool> {
        let existed = self.created.lock().unwrap().contains(&id.to_string());
        self.cleared.lock().unwrap().push(id.to_string());
        Ok(existed)
    }

    async fn permission_status(&self) -> HubResult<PermissionStatus> {
        Ok(PermissionStatus {
            platform_available: true,
            permission_granted: true,
            details: vec!["测试环境".to_string()],
        })
    }
}

//! 应用内临时消息（toast）
//!
//! 同一时刻只显示一条，后到的消息排队；由前台1秒tick驱动过期。

use std::collections::VecDeque;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{error, info, warn};

/// 消息级别，决定默认展示时长
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl ToastLevel {
    pub fn default_duration(&self) -> Duration {
        match self {
            ToastLevel::Info | ToastLevel::Success => Duration::from_secs(3),
            ToastLevel::Warning | ToastLevel::Error => Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub message: String,
    pub level: ToastLevel,
    pub duration: Duration,
}

/// 排队的toast展示器
pub struct ToastQueue {
    visible: Option<(Toast, Instant)>,
    pending: VecDeque<Toast>,
}

impl ToastQueue {
    pub fn new() -> Self {
        Self {
            visible: None,
            pending: VecDeque::new(),
        }
    }

    /// 以级别默认时长入队一条消息
    pub fn push(&mut self, message: impl Into<String>, level: ToastLevel) {
        let duration = level.default_duration();
        self.push_with_duration(message, level, duration);
    }

    pub fn push_with_duration(
        &mut self,
        message: impl Into<String>,
        level: ToastLevel,
        duration: Duration,
    ) {
        let toast = Toast {
            message: message.into(),
            level,
            duration,
        };
        if self.visible.is_some() {
            self.pending.push_back(toast);
        } else {
            self.display(toast);
        }
    }

    fn display(&mut self, toast: Toast) {
        match toast.level {
            ToastLevel::Info | ToastLevel::Success => info!("[toast] {}", toast.message),
            ToastLevel::Warning => warn!("[toast] {}", toast.message),
            ToastLevel::Error => error!("[toast] {}", toast.message),
        }
        self.visible = Some((toast, Instant::now()));
    }

    /// tick驱动：当前消息过期则换下一条
    pub fn tick(&mut self) {
        let expired = match &self.visible {
            Some((toast, shown_at)) => shown_at.elapsed() >= toast.duration,
            None => false,
        };
        if expired {
            self.dismiss();
        }
    }

    /// 立即隐藏当前消息（点击关闭），并展示队列中的下一条
    pub fn dismiss(&mut self) {
        self.visible = None;
        if let Some(next) = self.pending.pop_front() {
            self.display(next);
        }
    }

    pub fn visible(&self) -> Option<&Toast> {
        self.visible.as_ref().map(|(toast, _)| toast)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

impl Default for ToastQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::advance;

    #[tokio::test(start_paused = true)]
    async fn test_single_visible_toast_with_queue() {
        let mut toasts = ToastQueue::new();
        toasts.push("第一条", ToastLevel::Success);
        toasts.push("第二条", ToastLevel::Info);

        assert_eq!(toasts.visible().unwrap().message, "第一条");
        assert_eq!(toasts.pending_count(), 1);

        // 3秒后第一条过期，第二条顶上
        advance(Duration::from_secs(3)).await;
        toasts.tick();
        assert_eq!(toasts.visible().unwrap().message, "第二条");
        assert_eq!(toasts.pending_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_toast_lives_longer_than_info() {
        let mut toasts = ToastQueue::new();
        toasts.push("出错了", ToastLevel::Error);

        advance(Duration::from_secs(4)).await;
        toasts.tick();
        assert!(toasts.visible().is_some());

        advance(Duration::from_secs(1)).await;
        toasts.tick();
        assert!(toasts.visible().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dismiss_shows_next_immediately() {
        let mut toasts = ToastQueue::new();
        toasts.push("a", ToastLevel::Info);
        toasts.push("b", ToastLevel::Warning);

        toasts.dismiss();
        assert_eq!(toasts.visible().unwrap().message, "b");
    }
}

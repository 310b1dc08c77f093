//! 响铃提醒横幅
//!
//! 收到响铃开始事件后展示，带30秒倒计时与三个动作按钮。
//! 倒计时仅为界面提示，归零自动隐藏但不停止提醒音；
//! 提醒音的实际停止由协调器的计时器负责。

use std::time::Duration;

use tokio::time::Instant;
use tracing::info;

use prodhub_domain::Task;

/// 横幅倒计时时长
pub const BANNER_COUNTDOWN: Duration = Duration::from_secs(30);

/// 横幅上的三个动作按钮
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerAction {
    Complete,
    Snooze,
    StopSound,
}

struct BannerState {
    task: Task,
    notification_id: String,
    deadline: Instant,
}

/// 单任务提醒横幅；同一时刻最多展示一个
pub struct ReminderBanner {
    current: Option<BannerState>,
}

impl ReminderBanner {
    pub fn new() -> Self {
        Self { current: None }
    }

    /// 展示横幅；已有横幅时被新的取代
    pub fn show(&mut self, task: Task, notification_id: impl Into<String>) {
        let notification_id = notification_id.into();
        info!("🔔 展示提醒横幅: {} ({})", task.title, notification_id);
        self.current = Some(BannerState {
            task,
            notification_id,
            deadline: Instant::now() + BANNER_COUNTDOWN,
        });
    }

    pub fn hide(&mut self) {
        if self.current.take().is_some() {
            info!("🔔 隐藏提醒横幅");
        }
    }

    /// 按通知id隐藏；不匹配时保留当前横幅
    pub fn hide_for_notification(&mut self, notification_id: &str) {
        let matches = self
            .current
            .as_ref()
            .map(|s| s.notification_id == notification_id)
            .unwrap_or(false);
        if matches {
            self.hide();
        }
    }

    /// tick驱动：倒计时归零后自动隐藏（不影响提醒音）
    pub fn tick(&mut self) {
        let expired = self
            .current
            .as_ref()
            .map(|s| Instant::now() >= s.deadline)
            .unwrap_or(false);
        if expired {
            info!("🔔 横幅倒计时结束，自动隐藏");
            self.current = None;
        }
    }

    pub fn is_visible(&self) -> bool {
        self.current.is_some()
    }

    pub fn task(&self) -> Option<&Task> {
        self.current.as_ref().map(|s| &s.task)
    }

    /// 剩余倒计时秒数
    pub fn remaining_secs(&self) -> Option<u64> {
        self.current
            .as_ref()
            .map(|s| s.deadline.saturating_duration_since(Instant::now()).as_secs())
    }
}

impl Default for ReminderBanner {
    fn default() -> Self {
        Self::new()
    }
}

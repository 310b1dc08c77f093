//! 本地提醒计时
//!
//! 每个未完成且带提醒时间的任务对应一个计时器，到点后通过
//! 通道把任务id交还给前台事件循环去请求协调器展示通知。
//! 过期不足60秒的提醒视为刚刚错过，立即触发。

use std::collections::HashMap;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info};

use prodhub_domain::Task;

/// 错过提醒的立即触发宽限期
pub const IMMEDIATE_FIRE_GRACE_MS: i64 = 60_000;

/// 任务id → 计时器句柄；取消即abort
pub struct ReminderScheduler {
    timers: HashMap<String, JoinHandle<()>>,
    due_tx: mpsc::UnboundedSender<String>,
}

impl ReminderScheduler {
    /// 返回调度器与到期任务id的接收端
    pub fn new() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (due_tx, due_rx) = mpsc::unbounded_channel();
        (
            Self {
                timers: HashMap::new(),
                due_tx,
            },
            due_rx,
        )
    }

    /// 与任务列表全量对齐：失效计时器取消，待提醒任务重建
    pub fn sync(&mut self, tasks: &[Task]) {
        let wanted: Vec<&Task> = tasks
            .iter()
            .filter(|t| t.reminder.is_some() && !t.completed)
            .collect();

        let wanted_ids: Vec<&str> = wanted.iter().map(|t| t.id.as_str()).collect();
        let stale: Vec<String> = self
            .timers
            .keys()
            .filter(|id| !wanted_ids.contains(&id.as_str()))
            .cloned()
            .collect();
        for id in stale {
            self.cancel(&id);
        }

        for task in wanted {
            self.schedule(task);
        }
    }

    /// 为单个任务安排计时；已有计时器先取消（保证每任务至多一个）
    pub fn schedule(&mut self, task: &Task) {
        self.cancel(&task.id);

        let Some(reminder) = task.reminder else {
            return;
        };
        if task.completed {
            return;
        }

        let delay_ms = (reminder - Utc::now()).num_milliseconds();
        if delay_ms > 0 {
            let task_id = task.id.clone();
            let due_tx = self.due_tx.clone();
            let delay = Duration::from_millis(delay_ms as u64);
            info!(
                "⏰ 任务 \"{}\" 的提醒将在 {} 秒后触发",
                task.title,
                delay.as_secs()
            );
            let handle = tokio::spawn(async move {
                sleep(delay).await;
                let _ = due_tx.send(task_id);
            });
            self.timers.insert(task.id.clone(), handle);
        } else if delay_ms > -IMMEDIATE_FIRE_GRACE_MS {
            info!("⏰ 任务 \"{}\" 的提醒刚刚错过，立即触发", task.title);
            let _ = self.due_tx.send(task.id.clone());
        } else {
            debug!("⏰ 任务 \"{}\" 的提醒早已过期，跳过", task.title);
        }
    }

    pub fn cancel(&mut self, task_id: &str) {
        if let Some(handle) = self.timers.remove(task_id) {
            handle.abort();
            debug!("⏰ 已取消任务 {} 的提醒计时", task_id);
        }
    }

    pub fn cancel_all(&mut self) {
        for (_, handle) in self.timers.drain() {
            handle.abort();
        }
    }

    pub fn scheduled_count(&self) -> usize {
        self.timers.len()
    }
}

impl Drop for ReminderScheduler {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;
    use prodhub_domain::{DateCategory, Priority};
    use tokio::time::{advance, timeout};

    fn task_with_reminder(offset: ChronoDuration) -> Task {
        Task::new("t", Priority::High, DateCategory::Today)
            .with_reminder(Utc::now() + offset)
    }

    #[tokio::test(start_paused = true)]
    async fn test_future_reminder_fires_exactly_once() {
        let (mut scheduler, mut due_rx) = ReminderScheduler::new();
        let task = task_with_reminder(ChronoDuration::milliseconds(100));
        scheduler.schedule(&task);
        assert_eq!(scheduler.scheduled_count(), 1);

        advance(Duration::from_millis(150)).await;
        assert_eq!(due_rx.recv().await.as_deref(), Some(task.id.as_str()));

        // 不再有第二次触发
        advance(Duration::from_secs(60)).await;
        assert!(timeout(Duration::from_millis(10), due_rx.recv())
            .await
            .is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_recently_missed_reminder_fires_immediately() {
        let (mut scheduler, mut due_rx) = ReminderScheduler::new();
        let task = task_with_reminder(ChronoDuration::seconds(-30));
        scheduler.schedule(&task);

        assert_eq!(due_rx.recv().await.as_deref(), Some(task.id.as_str()));
        assert_eq!(scheduler.scheduled_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_long_overdue_reminder_is_skipped() {
        let (mut scheduler, mut due_rx) = ReminderScheduler::new();
        let task = task_with_reminder(ChronoDuration::minutes(-5));
        scheduler.schedule(&task);

        assert!(timeout(Duration::from_millis(10), due_rx.recv())
            .await
            .is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sync_cancels_completed_tasks() {
        let (mut scheduler, mut due_rx) = ReminderScheduler::new();
        let mut task = task_with_reminder(ChronoDuration::seconds(10));
        scheduler.sync(std::slice::from_ref(&task));
        assert_eq!(scheduler.scheduled_count(), 1);

        task.mark_completed();
        scheduler.sync(std::slice::from_ref(&task));
        assert_eq!(scheduler.scheduled_count(), 0);

        advance(Duration::from_secs(20)).await;
        assert!(timeout(Duration::from_millis(10), due_rx.recv())
            .await
            .is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reschedule_replaces_existing_timer() {
        let (mut scheduler, mut due_rx) = ReminderScheduler::new();
        let mut task = task_with_reminder(ChronoDuration::seconds(5));
        scheduler.schedule(&task);

        // 延后提醒时间后重新调度，旧计时器不应触发
        task.reminder = Some(Utc::now() + ChronoDuration::seconds(60));
        scheduler.schedule(&task);
        assert_eq!(scheduler.scheduled_count(), 1);

        advance(Duration::from_secs(10)).await;
        assert!(timeout(Duration::from_millis(10), due_rx.recv())
            .await
            .is_err());

        advance(Duration::from_secs(55)).await;
        assert_eq!(due_rx.recv().await.as_deref(), Some(task.id.as_str()));
    }
}

//! 提醒音计时
//!
//! 每条通知至多一个活动计时器；计时器到期通过通道回流协调器，
//! 由协调器执行自动停止。

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

/// 提醒音时长：无人交互时30秒后自动停止
pub const SOUND_DURATION: Duration = Duration::from_secs(30);

/// 通知ID到计时任务的关联表
pub struct SoundTimerRegistry {
    timers: HashMap<String, JoinHandle<()>>,
    expiry_tx: mpsc::UnboundedSender<String>,
}

impl SoundTimerRegistry {
    /// 创建关联表，返回到期事件的接收端
    pub fn new() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (expiry_tx, expiry_rx) = mpsc::unbounded_channel();
        (
            Self {
                timers: HashMap::new(),
                expiry_tx,
            },
            expiry_rx,
        )
    }

    /// 启动计时器；同一通知重复启动会重置计时
    pub fn start(&mut self, notification_id: &str) {
        if let Some(existing) = self.timers.remove(notification_id) {
            debug!("重置通知 {} 的提醒音计时器", notification_id);
            existing.abort();
        }

        let expiry_tx = self.expiry_tx.clone();
        let id = notification_id.to_string();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(SOUND_DURATION).await;
            // 协调器停止时接收端已关闭，发送失败可忽略
            let _ = expiry_tx.send(id);
        });

        self.timers.insert(notification_id.to_string(), handle);
        debug!("通知 {} 的提醒音计时器已启动", notification_id);
    }

    /// 取消计时器；不存在时为无操作
    pub fn cancel(&mut self, notification_id: &str) -> bool {
        match self.timers.remove(notification_id) {
            Some(handle) => {
                handle.abort();
                debug!("通知 {} 的提醒音计时器已取消", notification_id);
                true
            }
            None => false,
        }
    }

    pub fn is_active(&self, notification_id: &str) -> bool {
        self.timers.contains_key(notification_id)
    }

    pub fn active_count(&self) -> usize {
        self.timers.len()
    }

    pub fn cancel_all(&mut self) {
        for (_, handle) in self.timers.drain() {
            handle.abort();
        }
    }
}

impl Drop for SoundTimerRegistry {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_timer_fires_after_duration() {
        let (mut registry, mut expiry_rx) = SoundTimerRegistry::new();
        registry.start("n1");
        assert!(registry.is_active("n1"));

        let expired = expiry_rx.recv().await.unwrap();
        assert_eq!(expired, "n1");
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_prevents_expiry() {
        let (mut registry, mut expiry_rx) = SoundTimerRegistry::new();
        registry.start("n1");
        assert!(registry.cancel("n1"));
        assert!(!registry.is_active("n1"));

        // 取消后即使越过30秒也不应有到期事件
        let result =
            tokio::time::timeout(SOUND_DURATION * 2, expiry_rx.recv()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_cancel_missing_is_noop() {
        let (mut registry, _expiry_rx) = SoundTimerRegistry::new();
        assert!(!registry.cancel("no-such"));
        assert_eq!(registry.active_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_keeps_single_timer() {
        let (mut registry, mut expiry_rx) = SoundTimerRegistry::new();
        registry.start("n1");
        registry.start("n1");
        assert_eq!(registry.active_count(), 1);

        let expired = expiry_rx.recv().await.unwrap();
        assert_eq!(expired, "n1");
        // 只应有一次到期
        let result = tokio::time::timeout(SOUND_DURATION * 2, expiry_rx.recv()).await;
        assert!(result.is_err());
    }
}

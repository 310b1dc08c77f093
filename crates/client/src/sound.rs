//! 前台提醒音播放
//!
//! 每3秒重复一次双音序列，30秒保险自动停止；
//! 实际发声通过`TonePlayer`端口完成，无头环境下只写日志。

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval, Instant};
use tracing::{debug, info};

/// 重复播放间隔
pub const REPEAT_INTERVAL: Duration = Duration::from_secs(3);

/// 音频输出端口
pub trait TonePlayer: Send + Sync {
    /// 播放一次双音提醒序列（800Hz + 600Hz）
    fn play_sequence(&self);
}

/// 日志音频实现
#[derive(Debug, Default)]
pub struct LogTonePlayer;

impl TonePlayer for LogTonePlayer {
    fn play_sequence(&self) {
        debug!("🔊 播放提醒音序列 (800Hz/600Hz)");
    }
}

struct Playback {
    started_at: Instant,
    duration: Duration,
    repeat_task: JoinHandle<()>,
}

/// 提醒音状态机
///
/// 播放中状态由起始时刻与时长推导，重复播放任务在时长耗尽后
/// 自行退出，因此即使外部从不调用stop也不会无限播放。
pub struct AlertSound {
    player: Arc<dyn TonePlayer>,
    current: Option<Playback>,
}

impl AlertSound {
    pub fn new(player: Arc<dyn TonePlayer>) -> Self {
        Self {
            player,
            current: None,
        }
    }

    /// 开始播放指定时长；已在播放时忽略
    pub fn start(&mut self, duration: Duration) {
        if self.is_playing() {
            debug!("🔊 提醒音已在播放中");
            return;
        }
        if let Some(stale) = self.current.take() {
            stale.repeat_task.abort();
        }

        info!("🔊 开始播放提醒音 ({}秒)", duration.as_secs());
        let started_at = Instant::now();
        self.player.play_sequence();

        let player = Arc::clone(&self.player);
        let repeat_task = tokio::spawn(async move {
            let mut ticker = interval(REPEAT_INTERVAL);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if started_at.elapsed() >= duration {
                    debug!("🔊 提醒音达到时长上限，自动停止");
                    break;
                }
                player.play_sequence();
            }
        });

        self.current = Some(Playback {
            started_at,
            duration,
            repeat_task,
        });
    }

    /// 停止播放；未在播放时为空操作
    pub fn stop(&mut self) {
        if let Some(playback) = self.current.take() {
            playback.repeat_task.abort();
            info!("🔊 提醒音已停止");
        }
    }

    pub fn is_playing(&self) -> bool {
        match &self.current {
            Some(p) => p.started_at.elapsed() < p.duration,
            None => false,
        }
    }

    /// 剩余播放时间；未在播放时为零
    pub fn remaining_time(&self) -> Duration {
        match &self.current {
            Some(p) => p.duration.saturating_sub(p.started_at.elapsed()),
            None => Duration::ZERO,
        }
    }
}

impl Drop for AlertSound {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::advance;

    struct CountingPlayer {
        plays: AtomicUsize,
    }

    impl CountingPlayer {
        fn new() -> Self {
            Self {
                plays: AtomicUsize::new(0),
            }
        }

        fn count(&self) -> usize {
            self.plays.load(Ordering::SeqCst)
        }
    }

    impl TonePlayer for CountingPlayer {
        fn play_sequence(&self) {
            self.plays.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_plays_immediately_and_repeats() {
        let player = Arc::new(CountingPlayer::new());
        let mut sound = AlertSound::new(player.clone());
        sound.start(Duration::from_secs(30));
        assert_eq!(player.count(), 1);
        assert!(sound.is_playing());

        advance(REPEAT_INTERVAL).await;
        tokio::task::yield_now().await;
        assert!(player.count() >= 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_playing_expires_after_duration() {
        let player = Arc::new(CountingPlayer::new());
        let mut sound = AlertSound::new(player);
        sound.start(Duration::from_secs(30));

        advance(Duration::from_secs(31)).await;
        tokio::task::yield_now().await;
        assert!(!sound.is_playing());
        assert_eq!(sound.remaining_time(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_is_idempotent() {
        let player = Arc::new(CountingPlayer::new());
        let mut sound = AlertSound::new(player);
        sound.start(Duration::from_secs(30));
        sound.stop();
        assert!(!sound.is_playing());
        sound.stop();
        assert!(!sound.is_playing());
    }

    #[tokio::test(start_paused = true)]
    async fn test_remaining_time_counts_down() {
        let player = Arc::new(CountingPlayer::new());
        let mut sound = AlertSound::new(player);
        sound.start(Duration::from_secs(30));

        advance(Duration::from_secs(10)).await;
        let remaining = sound.remaining_time();
        assert!(remaining <= Duration::from_secs(20));
        assert!(remaining > Duration::from_secs(15));
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_while_playing_is_ignored() {
        let player = Arc::new(CountingPlayer::new());
        let mut sound = AlertSound::new(player.clone());
        sound.start(Duration::from_secs(30));
        sound.start(Duration::from_secs(30));
        assert_eq!(player.count(), 1);
    }
}

//! 前台上下文
//!
//! 标签页级别的事件循环与本地状态：响铃高亮、提醒横幅、
//! 提醒音播放、toast消息、本地提醒计时和跨上下文同步过滤。

pub mod banner;
pub mod client;
pub mod reminders;
pub mod sound;
pub mod sync;
pub mod toasts;

pub use banner::{BannerAction, ReminderBanner, BANNER_COUNTDOWN};
pub use client::ForegroundClient;
pub use reminders::ReminderScheduler;
pub use sound::{AlertSound, LogTonePlayer, TonePlayer, REPEAT_INTERVAL};
pub use sync::SyncFilter;
pub use toasts::{Toast, ToastLevel, ToastQueue};

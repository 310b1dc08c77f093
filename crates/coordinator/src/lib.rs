//! 后台协调器
//!
//! 便签/任务列表的唯一事实来源，并仲裁提醒通知的完整生命周期：
//! 创建通知、响铃集合维护、30秒提醒音计时、面向所有前台上下文的广播。

pub mod coordinator;
pub mod handle;
pub mod notifier;
pub mod sound;

pub use coordinator::{Coordinator, NotificationRecord, SNOOZE_MINUTES};
pub use handle::{spawn, CoordinatorHandle};
pub use notifier::{
    LogNotifier, NotificationOptions, Notifier, NotifierEvent, PermissionStatus,
};
pub use sound::{SoundTimerRegistry, SOUND_DURATION};

#[cfg(test)]
pub mod test_utils;

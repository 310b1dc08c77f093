//! 广播事件
//!
//! 协调器面向所有前台上下文的单向广播，不要求响应。

use serde::{Deserialize, Serialize};

use crate::entities::Task;

/// 协调器广播事件，按 `type` 标签区分
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum HubEvent {
    /// 开始播放提醒音（携带时长，毫秒）
    #[serde(rename_all = "camelCase")]
    StartNotificationSound {
        notification_id: String,
        duration_ms: u64,
    },
    #[serde(rename_all = "camelCase")]
    StopNotificationSound { notification_id: String },
    /// 任务开始响铃：携带任务快照与通知ID
    #[serde(rename_all = "camelCase")]
    TaskRingingStarted {
        task_id: String,
        task: Task,
        notification_id: String,
    },
    #[serde(rename_all = "camelCase")]
    TaskRingingStopped {
        task_id: String,
        notification_id: String,
    },
    TaskUpdated { task: Task },
}

impl HubEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            HubEvent::StartNotificationSound { .. } => "startNotificationSound",
            HubEvent::StopNotificationSound { .. } => "stopNotificationSound",
            HubEvent::TaskRingingStarted { .. } => "taskRingingStarted",
            HubEvent::TaskRingingStopped { .. } => "taskRingingStopped",
            HubEvent::TaskUpdated { .. } => "taskUpdated",
        }
    }
}

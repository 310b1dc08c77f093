//! 前后台消息协议
//!
//! 请求按 `action` 标签区分（枚举分发取代原先的字符串switch），
//! 线上字段名沿用 camelCase。

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entities::{Note, Task};
use crate::errors::HubResult;

/// 前台发往协调器的请求
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Request {
    // 便签管理
    SaveNote {
        note: Note,
    },
    GetNotes,
    #[serde(rename_all = "camelCase")]
    DeleteNote {
        note_id: String,
    },
    ClearAllNotes,
    #[serde(rename_all = "camelCase")]
    UpdateNotePosition {
        note_id: String,
        x: f64,
        y: f64,
    },
    #[serde(rename_all = "camelCase")]
    UpdateNoteSize {
        note_id: String,
        width: f64,
        height: f64,
    },
    #[serde(rename_all = "camelCase")]
    UpdateNoteContent {
        note_id: String,
        content: String,
    },
    #[serde(rename_all = "camelCase")]
    UpdateNoteTitle {
        note_id: String,
        title: String,
    },

    // 任务管理
    SaveTask {
        task: Task,
    },
    GetTasks,
    UpdateTask {
        task: Task,
    },
    #[serde(rename_all = "camelCase")]
    DeleteTask {
        task_id: String,
    },
    ClearAllTasks,

    // 通知生命周期
    ShowTaskNotification {
        task: Task,
    },
    #[serde(rename_all = "camelCase")]
    CloseTaskNotification {
        notification_id: String,
    },
    #[serde(rename_all = "camelCase")]
    StopNotificationSound {
        task_id: String,
    },
    GetActiveRingingTasks,

    // 诊断
    TestConnection,
    TestSimpleNotification,
    CheckNotificationPermissions,
}

impl Request {
    /// 请求动作名（日志用）
    pub fn action(&self) -> &'static str {
        match self {
            Request::SaveNote { .. } => "saveNote",
            Request::GetNotes => "getNotes",
            Request::DeleteNote { .. } => "deleteNote",
            Request::ClearAllNotes => "clearAllNotes",
            Request::UpdateNotePosition { .. } => "updateNotePosition",
            Request::UpdateNoteSize { .. } => "updateNoteSize",
            Request::UpdateNoteContent { .. } => "updateNoteContent",
            Request::UpdateNoteTitle { .. } => "updateNoteTitle",
            Request::SaveTask { .. } => "saveTask",
            Request::GetTasks => "getTasks",
            Request::UpdateTask { .. } => "updateTask",
            Request::DeleteTask { .. } => "deleteTask",
            Request::ClearAllTasks => "clearAllTasks",
            Request::ShowTaskNotification { .. } => "showTaskNotification",
            Request::CloseTaskNotification { .. } => "closeTaskNotification",
            Request::StopNotificationSound { .. } => "stopNotificationSound",
            Request::GetActiveRingingTasks => "getActiveRingingTasks",
            Request::TestConnection => "testConnection",
            Request::TestSimpleNotification => "testSimpleNotification",
            Request::CheckNotificationPermissions => "checkNotificationPermissions",
        }
    }
}

/// 协调器统一响应：`{success, data?, error?}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Response {
    pub fn ok() -> Self {
        Self {
            success: true,
            data: None,
            error: None,
        }
    }

    pub fn with_data(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }

    /// 把处理结果折叠成响应；错误不跨通道抛出
    pub fn from_result(result: HubResult<Option<Value>>) -> Self {
        match result {
            Ok(Some(data)) => Self::with_data(data),
            Ok(None) => Self::ok(),
            Err(e) => Self::err(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{DateCategory, Priority, Task};

    #[test]
    fn test_request_wire_tag() {
        let request = Request::DeleteNote {
            note_id: "n1".to_string(),
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["action"], "deleteNote");
        assert_eq!(value["noteId"], "n1");
    }

    #[test]
    fn test_request_roundtrip_with_payload() {
        let task = Task::new("t", Priority::Medium, DateCategory::Today);
        let request = Request::ShowTaskNotification { task: task.clone() };
        let json = serde_json::to_string(&request).unwrap();
        let parsed: Request = serde_json::from_str(&json).unwrap();
        match parsed {
            Request::ShowTaskNotification { task: t } => assert_eq!(t.id, task.id),
            other => panic!("unexpected request: {}", other.action()),
        }
    }

    #[test]
    fn test_response_from_result() {
        let ok = Response::from_result(Ok(Some(serde_json::json!({"n": 1}))));
        assert!(ok.success);
        assert!(ok.error.is_none());

        let err = Response::from_result(Err(crate::HubError::Internal("boom".to_string())));
        assert!(!err.success);
        assert!(err.error.unwrap().contains("boom"));
    }

    #[test]
    fn test_unit_action_parses() {
        let parsed: Request = serde_json::from_str(r#"{"action":"getActiveRingingTasks"}"#).unwrap();
        assert_eq!(parsed.action(), "getActiveRingingTasks");
    }
}

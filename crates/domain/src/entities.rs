use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// 生成实体ID：时间戳毫秒 + 随机后缀
///
/// 原始数据中的ID是基于时间的字符串token，这里追加随机后缀避免同毫秒冲突。
pub fn entity_id() -> String {
    format!("{}-{:04x}", Utc::now().timestamp_millis(), rand::random::<u16>())
}

/// 任务优先级
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
    Urgent,
}

/// 任务日期分类
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DateCategory {
    Past,
    Yesterday,
    Today,
    Tomorrow,
    Future,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub priority: Priority,
    pub date_category: DateCategory,
    #[serde(default)]
    pub completed: bool,
    /// 提醒时间；到达该时刻触发富通知
    pub reminder: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    pub fn new(title: impl Into<String>, priority: Priority, date_category: DateCategory) -> Self {
        let now = Utc::now();
        Self {
            id: entity_id(),
            title: title.into(),
            description: String::new(),
            priority,
            date_category,
            completed: false,
            reminder: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_reminder(mut self, reminder: DateTime<Utc>) -> Self {
        self.reminder = Some(reminder);
        self
    }

    /// 刷新更新时间戳
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn mark_completed(&mut self) {
        self.completed = true;
        self.touch();
    }

    /// 延后提醒指定分钟数
    pub fn snooze(&mut self, minutes: i64) {
        self.reminder = Some(Utc::now() + Duration::minutes(minutes));
        self.touch();
    }

    /// 是否存在尚未触发的提醒
    pub fn has_pending_reminder(&self, now: DateTime<Utc>) -> bool {
        !self.completed && self.reminder.map(|r| r > now).unwrap_or(false)
    }

    pub fn is_reminder_due(&self, now: DateTime<Utc>) -> bool {
        !self.completed && self.reminder.map(|r| r <= now).unwrap_or(false)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    pub color: Option<String>,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Note {
    pub fn new(title: impl Into<String>, x: f64, y: f64) -> Self {
        let now = Utc::now();
        Self {
            id: entity_id(),
            title: title.into(),
            content: String::new(),
            color: None,
            x,
            y,
            width: 250.0,
            height: 200.0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookmarkEntry {
    pub id: String,
    pub title: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookmarkGroup {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub bookmarks: Vec<BookmarkEntry>,
}

/// 侧边栏只有两种状态
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SidebarState {
    Collapsed,
    Visible,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarksData {
    #[serde(default)]
    pub groups: Vec<BookmarkGroup>,
    pub sidebar_state: SidebarState,
    pub last_modified: DateTime<Utc>,
}

impl Default for BookmarksData {
    fn default() -> Self {
        Self {
            groups: Vec::new(),
            sidebar_state: SidebarState::Collapsed,
            last_modified: Utc::now(),
        }
    }
}

impl BookmarksData {
    /// 校验书签数据：空标题和非http(s)地址一律拒绝，不做部分写入
    pub fn validate(&self) -> crate::HubResult<()> {
        for group in &self.groups {
            if group.name.trim().is_empty() {
                return Err(crate::HubError::InvalidBookmark(format!(
                    "书签分组 {} 名称为空",
                    group.id
                )));
            }
            for entry in &group.bookmarks {
                if entry.title.trim().is_empty() {
                    return Err(crate::HubError::InvalidBookmark(format!(
                        "书签 {} 标题为空",
                        entry.id
                    )));
                }
                if !(entry.url.starts_with("http://") || entry.url.starts_with("https://")) {
                    return Err(crate::HubError::InvalidBookmark(format!(
                        "书签 {} 的地址无效: {}",
                        entry.id, entry.url
                    )));
                }
            }
        }
        Ok(())
    }
}

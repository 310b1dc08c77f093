//! 前台上下文
//!
//! 每个打开的标签页对应一个`ForegroundClient`：订阅协调器广播与
//! 存储变更流，维护本地便签/任务缓存与响铃状态，驱动横幅、
//! 提醒音、toast和本地提醒计时。所有权威状态留在协调器，
//! 前台只持有快照。

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::{broadcast, mpsc};
use tokio::time::interval;
use tracing::{debug, error, info, warn};

use prodhub_coordinator::{
    CoordinatorHandle, NotificationOptions, Notifier, SNOOZE_MINUTES,
};
use prodhub_domain::{
    BookmarksData, HubEvent, HubResult, Note, Request, Task,
};
use prodhub_storage::{
    get_typed, set_typed, ContextId, LocalStore, StoreChange, BOOKMARKS_KEY,
    CURRENT_TAB_KEY, NOTES_KEY, TASKS_KEY, THEME_KEY,
};

use crate::banner::{BannerAction, ReminderBanner};
use crate::reminders::ReminderScheduler;
use crate::sound::{AlertSound, TonePlayer};
use crate::sync::SyncFilter;
use crate::toasts::{ToastLevel, ToastQueue};

/// 前台事件循环的tick间隔
const UI_TICK: Duration = Duration::from_secs(1);

pub struct ForegroundClient {
    context_id: ContextId,
    coordinator: CoordinatorHandle,
    store: Arc<dyn LocalStore>,
    /// 协调器请求失败时的本地降级通知出口
    fallback_notifier: Arc<dyn Notifier>,
    notes: Vec<Note>,
    tasks: Vec<Task>,
    bookmarks: BookmarksData,
    theme: String,
    current_tab: String,
    ringing: HashSet<String>,
    banner: ReminderBanner,
    sound: AlertSound,
    toasts: ToastQueue,
    reminders: ReminderScheduler,
    due_rx: Option<mpsc::UnboundedReceiver<String>>,
    sync: SyncFilter,
}

impl ForegroundClient {
    pub fn new(
        label: &str,
        coordinator: CoordinatorHandle,
        store: Arc<dyn LocalStore>,
        fallback_notifier: Arc<dyn Notifier>,
        player: Arc<dyn TonePlayer>,
    ) -> Self {
        let context_id = ContextId::new(label);
        let (reminders, due_rx) = ReminderScheduler::new();
        Self {
            sync: SyncFilter::new(context_id.clone()),
            context_id,
            coordinator,
            store,
            fallback_notifier,
            notes: Vec::new(),
            tasks: Vec::new(),
            bookmarks: BookmarksData::default(),
            theme: "light".to_string(),
            current_tab: "notes-tab".to_string(),
            ringing: HashSet::new(),
            banner: ReminderBanner::new(),
            sound: AlertSound::new(player),
            toasts: ToastQueue::new(),
            reminders,
            due_rx: Some(due_rx),
        }
    }

    pub fn context_id(&self) -> &ContextId {
        &self.context_id
    }

    /// 初始加载：便签/任务/响铃集合来自协调器，偏好与书签直接读存储
    pub async fn load(&mut self) {
        let response = self.coordinator.send(Request::GetNotes).await;
        if let Some(notes) = decode_response::<Vec<Note>>(response.data, response.success) {
            self.notes = notes;
        }

        let response = self.coordinator.send(Request::GetTasks).await;
        if let Some(tasks) = decode_response::<Vec<Task>>(response.data, response.success) {
            self.tasks = tasks;
        }
        self.reminders.sync(&self.tasks);

        let response = self.coordinator.send(Request::GetActiveRingingTasks).await;
        if let Some(ids) = decode_response::<Vec<String>>(response.data, response.success) {
            self.ringing = ids.into_iter().collect();
        }

        match get_typed::<String>(self.store.as_ref(), THEME_KEY).await {
            Ok(Some(theme)) => self.theme = theme,
            Ok(None) => {}
            Err(e) => warn!("读取主题偏好失败: {}", e),
        }
        match get_typed::<String>(self.store.as_ref(), CURRENT_TAB_KEY).await {
            Ok(Some(tab)) => self.current_tab = tab,
            Ok(None) => {}
            Err(e) => warn!("读取标签页偏好失败: {}", e),
        }
        match get_typed::<BookmarksData>(self.store.as_ref(), BOOKMARKS_KEY).await {
            Ok(Some(bookmarks)) => self.bookmarks = bookmarks,
            Ok(None) => {}
            Err(e) => warn!("读取书签数据失败: {}", e),
        }

        info!(
            "✅ 前台上下文 {} 已加载: {} 条便签, {} 个任务",
            self.context_id,
            self.notes.len(),
            self.tasks.len()
        );
    }

    /// 事件循环：协调器广播、存储变更、本地提醒到期、1秒tick
    pub async fn run(mut self, mut shutdown_rx: broadcast::Receiver<()>) {
        let mut hub_events = self.coordinator.subscribe();
        let mut store_changes = self.store.subscribe();
        let Some(mut due_rx) = self.due_rx.take() else {
            error!("前台上下文 {} 已在运行", self.context_id);
            return;
        };
        let mut ticker = interval(UI_TICK);

        loop {
            tokio::select! {
                event = hub_events.recv() => match event {
                    Ok(event) => self.handle_hub_event(event).await,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("上下文 {} 错过 {} 条广播，整体重读", self.context_id, skipped);
                        self.load().await;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
                change = store_changes.recv() => match change {
                    Ok(change) => self.handle_store_change(change),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("上下文 {} 错过 {} 条存储变更，整体重读", self.context_id, skipped);
                        self.load().await;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
                Some(task_id) = due_rx.recv() => {
                    self.handle_reminder_due(&task_id).await;
                }
                _ = ticker.tick() => self.tick(),
                _ = shutdown_rx.recv() => {
                    info!("前台上下文 {} 收到停机信号", self.context_id);
                    break;
                }
            }
        }

        self.reminders.cancel_all();
        self.sound.stop();
    }

    /// 处理一条协调器广播（事件循环的单步，也可由宿主直接驱动）
    pub async fn handle_hub_event(&mut self, event: HubEvent) {
        match event {
            HubEvent::StartNotificationSound { duration_ms, .. } => {
                self.sound.start(Duration::from_millis(duration_ms));
            }
            HubEvent::StopNotificationSound { .. } => {
                self.sound.stop();
            }
            HubEvent::TaskRingingStarted {
                task_id,
                task,
                notification_id,
            } => {
                info!("🔔 高亮响铃任务: {} ({})", task.title, task_id);
                self.ringing.insert(task_id);
                self.banner.show(task, notification_id);
            }
            HubEvent::TaskRingingStopped {
                task_id,
                notification_id,
            } => {
                info!("🔔 取消任务高亮: {}", task_id);
                self.ringing.remove(&task_id);
                self.banner.hide_for_notification(&notification_id);
            }
            HubEvent::TaskUpdated { task } => {
                debug!("收到任务更新广播: {}", task.id);
                self.reminders.schedule(&task);
                match self.tasks.iter_mut().find(|t| t.id == task.id) {
                    Some(existing) => *existing = task,
                    None => self.tasks.push(task),
                }
            }
        }
    }

    /// 应用一条外部存储变更：全量替换本地缓存（后写者胜）
    pub fn handle_store_change(&mut self, change: StoreChange) {
        if !self.sync.should_apply(&change) {
            return;
        }

        debug!(
            "上下文 {} 应用外部变更: {} (修订号 {})",
            self.context_id, change.key, change.revision
        );
        match change.key.as_str() {
            NOTES_KEY => {
                if let Some(notes) = decode_value::<Vec<Note>>(&change.key, change.value) {
                    self.notes = notes;
                }
            }
            TASKS_KEY => {
                if let Some(tasks) = decode_value::<Vec<Task>>(&change.key, change.value) {
                    self.tasks = tasks;
                    self.reminders.sync(&self.tasks);
                }
            }
            BOOKMARKS_KEY => {
                if let Some(bookmarks) =
                    decode_value::<BookmarksData>(&change.key, change.value)
                {
                    self.bookmarks = bookmarks;
                }
            }
            THEME_KEY => {
                if let Some(theme) = decode_value::<String>(&change.key, change.value) {
                    self.theme = theme;
                }
            }
            CURRENT_TAB_KEY => {
                if let Some(tab) = decode_value::<String>(&change.key, change.value) {
                    self.current_tab = tab;
                }
            }
            other => debug!("忽略未知存储键的变更: {}", other),
        }
    }

    /// 本地提醒到期：请求协调器展示富通知，失败时走本地降级通知
    async fn handle_reminder_due(&mut self, task_id: &str) {
        let Some(task) = self
            .tasks
            .iter()
            .find(|t| t.id == task_id && !t.completed)
            .cloned()
        else {
            debug!("到期任务 {} 已不存在或已完成，忽略", task_id);
            return;
        };

        self.toasts.push_with_duration(
            format!("任务提醒: {}", task.title),
            ToastLevel::Warning,
            Duration::from_secs(5),
        );

        let response = self
            .coordinator
            .send(Request::ShowTaskNotification { task: task.clone() })
            .await;
        if response.success {
            return;
        }

        warn!(
            "协调器展示通知失败 ({}), 使用本地降级通知",
            response.error.unwrap_or_default()
        );
        let fallback_id = format!("fallback-{}-{}", task.id, Utc::now().timestamp_millis());
        let options = NotificationOptions::simple("任务提醒", format!("别忘了: {}", task.title));
        if let Err(e) = self.fallback_notifier.create(&fallback_id, &options).await {
            error!("本地降级通知也失败了: {}", e);
        }
    }

    fn tick(&mut self) {
        self.toasts.tick();
        self.banner.tick();
    }

    /// 横幅按钮：三个动作都回送协调器，然后隐藏横幅
    pub async fn banner_action(&mut self, action: BannerAction) {
        let Some(task) = self.banner.task().cloned() else {
            return;
        };

        match action {
            BannerAction::Complete => {
                let mut task = task;
                task.mark_completed();
                let task_id = task.id.clone();
                self.send_checked(Request::UpdateTask { task }).await;
                self.send_checked(Request::StopNotificationSound { task_id })
                    .await;
            }
            BannerAction::Snooze => {
                let mut task = task;
                task.snooze(SNOOZE_MINUTES);
                let task_id = task.id.clone();
                self.send_checked(Request::UpdateTask { task }).await;
                self.send_checked(Request::StopNotificationSound { task_id })
                    .await;
            }
            BannerAction::StopSound => {
                self.send_checked(Request::StopNotificationSound { task_id: task.id })
                    .await;
            }
        }

        self.banner.hide();
    }

    async fn send_checked(&mut self, request: Request) {
        let action = request.action();
        let response = self.coordinator.send(request).await;
        if !response.success {
            self.toasts.push(
                format!("{} 失败: {}", action, response.error.unwrap_or_default()),
                ToastLevel::Error,
            );
        }
    }

    pub async fn save_note(&mut self, note: Note) {
        self.send_checked(Request::SaveNote { note }).await;
    }

    pub async fn delete_note(&mut self, note_id: String) {
        self.send_checked(Request::DeleteNote { note_id }).await;
    }

    pub async fn save_task(&mut self, task: Task) {
        self.send_checked(Request::SaveTask { task }).await;
    }

    pub async fn delete_task(&mut self, task_id: String) {
        self.send_checked(Request::DeleteTask { task_id }).await;
    }

    /// 校验并保存书签；校验失败只弹toast，不做部分写入
    pub async fn save_bookmarks(&mut self, mut data: BookmarksData) -> HubResult<()> {
        if let Err(e) = data.validate() {
            self.toasts.push(format!("{}", e), ToastLevel::Error);
            return Err(e);
        }
        data.last_modified = Utc::now();
        set_typed(self.store.as_ref(), BOOKMARKS_KEY, &data, &self.context_id).await?;
        self.bookmarks = data;
        self.toasts.push("书签已保存", ToastLevel::Success);
        Ok(())
    }

    pub async fn set_theme(&mut self, theme: impl Into<String>) -> HubResult<()> {
        let theme = theme.into();
        set_typed(self.store.as_ref(), THEME_KEY, &theme, &self.context_id).await?;
        self.theme = theme;
        Ok(())
    }

    pub async fn set_current_tab(&mut self, tab: impl Into<String>) -> HubResult<()> {
        let tab = tab.into();
        set_typed(self.store.as_ref(), CURRENT_TAB_KEY, &tab, &self.context_id).await?;
        self.current_tab = tab;
        Ok(())
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn bookmarks(&self) -> &BookmarksData {
        &self.bookmarks
    }

    pub fn theme(&self) -> &str {
        &self.theme
    }

    pub fn current_tab(&self) -> &str {
        &self.current_tab
    }

    pub fn ringing_tasks(&self) -> &HashSet<String> {
        &self.ringing
    }

    pub fn is_sound_playing(&self) -> bool {
        self.sound.is_playing()
    }

    pub fn is_banner_visible(&self) -> bool {
        self.banner.is_visible()
    }
}

fn decode_response<T: DeserializeOwned>(data: Option<Value>, success: bool) -> Option<T> {
    if !success {
        return None;
    }
    match data {
        Some(value) => match serde_json::from_value(value) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                warn!("解析协调器响应失败: {}", e);
                None
            }
        },
        None => None,
    }
}

fn decode_value<T: DeserializeOwned + Default>(key: &str, value: Value) -> Option<T> {
    if value.is_null() {
        // 键被删除，回落到空值
        return Some(T::default());
    }
    match serde_json::from_value(value) {
        Ok(decoded) => Some(decoded),
        Err(e) => {
            warn!("解析存储键 {} 的外部变更失败: {}", key, e);
            None
        }
    }
}

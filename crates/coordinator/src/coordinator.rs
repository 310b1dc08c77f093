use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, warn};

use prodhub_domain::{HubEvent, HubResult, Note, Request, Task};
use prodhub_storage::{
    get_typed, set_typed, ContextId, LocalStore, NOTES_KEY, TASKS_KEY,
};

use crate::notifier::{NotificationOptions, Notifier, NotifierEvent};
use crate::sound::{SoundTimerRegistry, SOUND_DURATION};

/// 默认延后分钟数（通知按钮1）
pub const SNOOZE_MINUTES: i64 = 5;

/// 活动通知记录（仅存在于协调器内存中）
#[derive(Debug, Clone)]
pub struct NotificationRecord {
    pub notification_id: String,
    pub task_id: String,
    /// 创建通知时的任务快照
    pub task: Task,
    pub created_at: DateTime<Utc>,
}

/// 后台协调器
///
/// 持有便签/任务列表的规范副本与全部通知生命周期状态。
/// 状态为独占所有权，只在actor循环内被修改。
pub struct Coordinator {
    store: Arc<dyn LocalStore>,
    notifier: Arc<dyn Notifier>,
    origin: ContextId,
    notes: Vec<Note>,
    tasks: Vec<Task>,
    active_notifications: HashMap<String, NotificationRecord>,
    ringing_tasks: HashSet<String>,
    sound_timers: SoundTimerRegistry,
    events_tx: broadcast::Sender<HubEvent>,
}

impl Coordinator {
    /// 创建协调器，返回提醒音到期事件的接收端
    pub fn new(
        store: Arc<dyn LocalStore>,
        notifier: Arc<dyn Notifier>,
        events_tx: broadcast::Sender<HubEvent>,
    ) -> (Self, mpsc::UnboundedReceiver<String>) {
        let (sound_timers, expiry_rx) = SoundTimerRegistry::new();
        (
            Self {
                store,
                notifier,
                origin: ContextId::new("coordinator"),
                notes: Vec::new(),
                tasks: Vec::new(),
                active_notifications: HashMap::new(),
                ringing_tasks: HashSet::new(),
                sound_timers,
                events_tx,
            },
            expiry_rx,
        )
    }

    /// 启动时从存储恢复便签/任务；读取失败时重置为空
    pub async fn load_state(&mut self) {
        match get_typed::<Vec<Note>>(self.store.as_ref(), NOTES_KEY).await {
            Ok(notes) => {
                self.notes = notes.unwrap_or_default();
                info!("从存储加载了 {} 条便签", self.notes.len());
            }
            Err(e) => {
                error!("从存储加载便签失败: {}", e);
                self.notes = Vec::new();
            }
        }

        match get_typed::<Vec<Task>>(self.store.as_ref(), TASKS_KEY).await {
            Ok(tasks) => {
                self.tasks = tasks.unwrap_or_default();
                info!("从存储加载了 {} 个任务", self.tasks.len());
            }
            Err(e) => {
                error!("从存储加载任务失败: {}", e);
                self.tasks = Vec::new();
            }
        }
    }

    async fn persist_notes(&self) -> HubResult<()> {
        set_typed(self.store.as_ref(), NOTES_KEY, &self.notes, &self.origin).await?;
        Ok(())
    }

    async fn persist_tasks(&self) -> HubResult<()> {
        set_typed(self.store.as_ref(), TASKS_KEY, &self.tasks, &self.origin).await?;
        Ok(())
    }

    fn broadcast(&self, event: HubEvent) {
        debug!("广播事件: {}", event.event_type());
        // 没有前台上下文在线时发送失败是正常情况
        let _ = self.events_tx.send(event);
    }

    /// 枚举分发：每个请求动作对应一个处理分支
    pub async fn handle_request(&mut self, request: Request) -> HubResult<Option<Value>> {
        match request {
            Request::SaveNote { note } => {
                self.save_note(note).await?;
                Ok(None)
            }
            Request::GetNotes => Ok(Some(serde_json::to_value(&self.notes)?)),
            Request::DeleteNote { note_id } => {
                self.notes.retain(|n| n.id != note_id);
                self.persist_notes().await?;
                info!("便签已删除: {}", note_id);
                Ok(None)
            }
            Request::ClearAllNotes => {
                self.notes.clear();
                self.persist_notes().await?;
                info!("所有便签已清空");
                Ok(None)
            }
            Request::UpdateNotePosition { note_id, x, y } => {
                if let Some(note) = self.notes.iter_mut().find(|n| n.id == note_id) {
                    note.x = x;
                    note.y = y;
                    self.persist_notes().await?;
                    debug!("便签位置已更新: {} ({}, {})", note_id, x, y);
                } else {
                    debug!("更新位置时未找到便签: {}", note_id);
                }
                Ok(None)
            }
            Request::UpdateNoteSize {
                note_id,
                width,
                height,
            } => {
                if let Some(note) = self.notes.iter_mut().find(|n| n.id == note_id) {
                    note.width = width;
                    note.height = height;
                    self.persist_notes().await?;
                    debug!("便签尺寸已更新: {}", note_id);
                }
                Ok(None)
            }
            Request::UpdateNoteContent { note_id, content } => {
                if let Some(note) = self.notes.iter_mut().find(|n| n.id == note_id) {
                    note.content = content;
                    note.touch();
                    self.persist_notes().await?;
                    debug!("便签内容已更新: {}", note_id);
                }
                Ok(None)
            }
            Request::UpdateNoteTitle { note_id, title } => {
                if let Some(note) = self.notes.iter_mut().find(|n| n.id == note_id) {
                    note.title = title;
                    note.touch();
                    self.persist_notes().await?;
                    debug!("便签标题已更新: {}", note_id);
                }
                Ok(None)
            }

            Request::SaveTask { task } => {
                self.save_task(task).await?;
                Ok(None)
            }
            Request::GetTasks => Ok(Some(serde_json::to_value(&self.tasks)?)),
            Request::UpdateTask { task } => {
                self.apply_task_update(task).await?;
                Ok(None)
            }
            Request::DeleteTask { task_id } => {
                self.tasks.retain(|t| t.id != task_id);
                self.persist_tasks().await?;
                info!("任务已删除: {}", task_id);
                Ok(None)
            }
            Request::ClearAllTasks => {
                self.tasks.clear();
                self.persist_tasks().await?;
                info!("所有任务已清空");
                Ok(None)
            }

            Request::ShowTaskNotification { task } => {
                let notification_id = self.show_task_notification(task).await?;
                Ok(Some(json!({ "notificationId": notification_id })))
            }
            Request::CloseTaskNotification { notification_id } => {
                self.close_task_notification(&notification_id).await;
                Ok(None)
            }
            Request::StopNotificationSound { task_id } => {
                self.stop_notification_sound_for_task(&task_id).await;
                Ok(None)
            }
            Request::GetActiveRingingTasks => {
                let mut ids: Vec<&String> = self.ringing_tasks.iter().collect();
                ids.sort();
                Ok(Some(serde_json::to_value(ids)?))
            }

            Request::TestConnection => {
                debug!("✅ 收到连通性测试");
                Ok(Some(json!({ "message": "协调器已连接" })))
            }
            Request::TestSimpleNotification => {
                self.test_simple_notification().await;
                Ok(None)
            }
            Request::CheckNotificationPermissions => {
                let status = self.notifier.permission_status().await?;
                Ok(Some(serde_json::to_value(status)?))
            }
        }
    }

    async fn save_note(&mut self, note: Note) -> HubResult<()> {
        match self.notes.iter_mut().find(|n| n.id == note.id) {
            Some(existing) => {
                let created_at = existing.created_at;
                *existing = note;
                existing.created_at = created_at;
                existing.touch();
                debug!("更新已有便签: {}", existing.id);
            }
            None => {
                let mut note = note;
                let now = Utc::now();
                note.created_at = now;
                note.updated_at = now;
                debug!("新增便签: {}", note.id);
                self.notes.push(note);
            }
        }
        self.persist_notes().await
    }

    async fn save_task(&mut self, task: Task) -> HubResult<()> {
        match self.tasks.iter_mut().find(|t| t.id == task.id) {
            Some(existing) => {
                let created_at = existing.created_at;
                *existing = task;
                existing.created_at = created_at;
                existing.touch();
                debug!("更新已有任务: {}", existing.id);
            }
            None => {
                let mut task = task;
                let now = Utc::now();
                task.created_at = now;
                task.updated_at = now;
                debug!("新增任务: {}", task.id);
                self.tasks.push(task);
            }
        }
        self.persist_tasks().await
    }

    /// 整体替换一个已有任务；不存在时记录告警并忽略
    async fn apply_task_update(&mut self, task: Task) -> HubResult<()> {
        match self.tasks.iter_mut().find(|t| t.id == task.id) {
            Some(existing) => {
                *existing = task;
                existing.touch();
                let id = existing.id.clone();
                self.persist_tasks().await?;
                debug!("任务已更新: {}", id);
            }
            None => {
                warn!("更新时未找到任务: {}", task.id);
            }
        }
        Ok(())
    }

    /// 展示任务提醒通知
    ///
    /// 同一任务已有活动通知时先取代旧通知，再创建新通知；
    /// 平台创建失败只记录日志，不建立任何响铃状态，也不重试。
    pub async fn show_task_notification(&mut self, task: Task) -> HubResult<String> {
        if let Some(old_id) = self
            .active_notifications
            .values()
            .find(|r| r.task_id == task.id)
            .map(|r| r.notification_id.clone())
        {
            info!("任务 {} 已有活动通知 {}，取代之", task.id, old_id);
            self.stop_notification_sound(&old_id);
            if let Err(e) = self.notifier.clear(&old_id).await {
                warn!("清除被取代的通知 {} 失败: {}", old_id, e);
            }
            self.active_notifications.remove(&old_id);
        }

        let notification_id =
            format!("task-reminder-{}-{}", task.id, Utc::now().timestamp_millis());
        let options = NotificationOptions::for_task(&task);

        let created_id = match self.notifier.create(&notification_id, &options).await {
            Ok(id) => id,
            Err(e) => {
                error!("创建任务通知失败: {}", e);
                return Err(e);
            }
        };

        info!("✅ 任务通知已创建: {}", created_id);

        self.active_notifications.insert(
            created_id.clone(),
            NotificationRecord {
                notification_id: created_id.clone(),
                task_id: task.id.clone(),
                task: task.clone(),
                created_at: Utc::now(),
            },
        );
        self.ringing_tasks.insert(task.id.clone());
        self.start_notification_sound(&created_id);
        self.broadcast(HubEvent::TaskRingingStarted {
            task_id: task.id.clone(),
            task,
            notification_id: created_id.clone(),
        });

        Ok(created_id)
    }

    /// 启动提醒音计时并广播；重复调用重置计时
    pub fn start_notification_sound(&mut self, notification_id: &str) {
        info!("🔊 启动通知 {} 的提醒音", notification_id);
        self.sound_timers.start(notification_id);
        self.broadcast(HubEvent::StartNotificationSound {
            notification_id: notification_id.to_string(),
            duration_ms: SOUND_DURATION.as_millis() as u64,
        });
    }

    /// 停止提醒音：取消计时、移出响铃集合并广播
    pub fn stop_notification_sound(&mut self, notification_id: &str) {
        info!("🔊 停止通知 {} 的提醒音", notification_id);
        self.sound_timers.cancel(notification_id);

        if let Some(record) = self.active_notifications.get(notification_id) {
            let task_id = record.task_id.clone();
            self.ringing_tasks.remove(&task_id);
            self.broadcast(HubEvent::TaskRingingStopped {
                task_id,
                notification_id: notification_id.to_string(),
            });
        }

        self.broadcast(HubEvent::StopNotificationSound {
            notification_id: notification_id.to_string(),
        });
    }

    /// 按任务停止提醒音（反向查找），无匹配时也清理响铃集合
    pub async fn stop_notification_sound_for_task(&mut self, task_id: &str) {
        info!("🔊 停止任务 {} 的提醒音", task_id);

        let matched = self
            .active_notifications
            .values()
            .find(|r| r.task_id == task_id)
            .map(|r| r.notification_id.clone());

        if let Some(notification_id) = matched {
            if let Err(e) = self.notifier.clear(&notification_id).await {
                warn!("清除通知 {} 失败: {}", notification_id, e);
            }
            self.stop_notification_sound(&notification_id);
            self.active_notifications.remove(&notification_id);
        }

        // 防御性清理：即使没有匹配的通知记录也保证任务不在响铃集合中
        self.ringing_tasks.remove(task_id);
    }

    /// 关闭通知：停止提醒音、清除平台通知并移除记录
    pub async fn close_task_notification(&mut self, notification_id: &str) {
        info!("🔔 关闭通知: {}", notification_id);
        self.stop_notification_sound(notification_id);

        match self.notifier.clear(notification_id).await {
            Ok(true) => info!("✅ 通知已清除: {}", notification_id),
            Ok(false) => info!("⚠️ 通知此前已被清除: {}", notification_id),
            Err(e) => warn!("清除通知 {} 失败: {}", notification_id, e),
        }

        self.active_notifications.remove(notification_id);
    }

    /// 处理平台侧用户交互事件
    pub async fn handle_notifier_event(&mut self, event: NotifierEvent) -> HubResult<()> {
        match event {
            NotifierEvent::Clicked { notification_id } => {
                info!("🔔 通知被点击: {}", notification_id);
                if self.active_notifications.contains_key(&notification_id) {
                    self.close_task_notification(&notification_id).await;
                }
            }
            NotifierEvent::ButtonClicked {
                notification_id,
                button_index,
            } => {
                info!(
                    "🔔 通知按钮被点击: {} 按钮: {}",
                    notification_id, button_index
                );
                let Some(record) = self.active_notifications.get(&notification_id) else {
                    return Ok(());
                };
                let mut task = record.task.clone();

                match button_index {
                    0 => {
                        info!("✅ 标记任务完成: {}", task.title);
                        task.mark_completed();
                        self.apply_task_update(task.clone()).await?;
                        self.broadcast(HubEvent::TaskUpdated { task });
                    }
                    1 => {
                        info!("⏰ 任务延后{}分钟: {}", SNOOZE_MINUTES, task.title);
                        task.snooze(SNOOZE_MINUTES);
                        self.apply_task_update(task.clone()).await?;
                        self.broadcast(HubEvent::TaskUpdated { task });
                    }
                    other => {
                        debug!("忽略未知按钮索引: {}", other);
                    }
                }

                self.close_task_notification(&notification_id).await;
            }
            NotifierEvent::Closed {
                notification_id,
                by_user,
            } => {
                // 不区分用户关闭与程序关闭
                info!("🔔 通知已关闭: {} (用户操作: {})", notification_id, by_user);
                self.stop_notification_sound(&notification_id);
                self.active_notifications.remove(&notification_id);
            }
        }
        Ok(())
    }

    /// 提醒音计时到期：30秒无人交互后自动停止
    pub fn handle_sound_expiry(&mut self, notification_id: &str) {
        info!("🔊 提醒音30秒后自动停止: {}", notification_id);
        self.stop_notification_sound(notification_id);
    }

    /// 诊断：发送一条简单通知并在5秒后自动清除
    async fn test_simple_notification(&self) {
        let test_id = format!("test-simple-{}", Utc::now().timestamp_millis());
        let options = NotificationOptions::simple("测试通知", "这是一条简单的测试通知");

        match self.notifier.create(&test_id, &options).await {
            Ok(created_id) => {
                info!("✅ 测试通知已创建: {}", created_id);
                let notifier = Arc::clone(&self.notifier);
                tokio::spawn(async move {
                    tokio::time::sleep(std::time::Duration::from_secs(5)).await;
                    if let Err(e) = notifier.clear(&created_id).await {
                        warn!("清除测试通知失败: {}", e);
                    }
                });
            }
            Err(e) => {
                error!("❌ 测试通知创建失败: {}", e);
            }
        }
    }

    pub fn ringing_tasks(&self) -> &HashSet<String> {
        &self.ringing_tasks
    }

    pub fn active_notification_count(&self) -> usize {
        self.active_notifications.len()
    }

    /// 停机收尾：取消全部计时器
    pub fn shutdown(&mut self) {
        self.sound_timers.cancel_all();
        info!("协调器已停止，清理了全部提醒音计时器");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::FakeNotifier;
    use prodhub_domain::{DateCategory, Priority};
    use prodhub_storage::InMemoryStore;

    fn test_coordinator() -> (
        Coordinator,
        mpsc::UnboundedReceiver<String>,
        Arc<FakeNotifier>,
        broadcast::Receiver<HubEvent>,
    ) {
        let store: Arc<dyn LocalStore> = Arc::new(InMemoryStore::new());
        let notifier = Arc::new(FakeNotifier::new());
        let (events_tx, events_rx) = broadcast::channel(64);
        let (coordinator, expiry_rx) =
            Coordinator::new(store, notifier.clone() as Arc<dyn Notifier>, events_tx);
        (coordinator, expiry_rx, notifier, events_rx)
    }

    fn sample_task(title: &str) -> Task {
        Task::new(title, Priority::High, DateCategory::Today)
    }

    #[tokio::test]
    async fn test_fresh_coordinator_has_empty_ringing_set() {
        let (mut coordinator, _expiry, _notifier, _events) = test_coordinator();
        let data = coordinator
            .handle_request(Request::GetActiveRingingTasks)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(data, json!([]));
    }

    #[tokio::test]
    async fn test_show_notification_establishes_ringing_state() {
        let (mut coordinator, _expiry, notifier, mut events) = test_coordinator();
        let task = sample_task("Pay rent");
        coordinator.save_task(task.clone()).await.unwrap();

        let notification_id = coordinator
            .show_task_notification(task.clone())
            .await
            .unwrap();
        assert!(notification_id.starts_with(&format!("task-reminder-{}", task.id)));
        assert!(coordinator.ringing_tasks().contains(&task.id));
        assert_eq!(coordinator.active_notification_count(), 1);
        assert_eq!(notifier.created_ids().len(), 1);

        // 广播顺序：先响铃开始所需的声音启动，再响铃开始
        let first = events.recv().await.unwrap();
        assert_eq!(first.event_type(), "startNotificationSound");
        let second = events.recv().await.unwrap();
        assert_eq!(second.event_type(), "taskRingingStarted");
    }

    #[tokio::test]
    async fn test_notifier_failure_leaves_state_unchanged() {
        let (mut coordinator, _expiry, notifier, _events) = test_coordinator();
        notifier.fail_next_create("权限被拒绝");

        let task = sample_task("t");
        let result = coordinator.show_task_notification(task.clone()).await;
        assert!(result.is_err());
        assert!(!coordinator.ringing_tasks().contains(&task.id));
        assert_eq!(coordinator.active_notification_count(), 0);
    }

    #[tokio::test]
    async fn test_duplicate_show_supersedes_prior_notification() {
        let (mut coordinator, _expiry, notifier, _events) = test_coordinator();
        let task = sample_task("t");

        let first = coordinator.show_task_notification(task.clone()).await.unwrap();
        let second = coordinator.show_task_notification(task.clone()).await.unwrap();

        assert_ne!(first, second);
        // 旧通知被清除，任一时刻每任务至多一条活动通知
        assert_eq!(coordinator.active_notification_count(), 1);
        assert!(notifier.cleared_ids().contains(&first));
        assert!(coordinator.ringing_tasks().contains(&task.id));
    }

    #[tokio::test]
    async fn test_stop_for_task_is_idempotent() {
        let (mut coordinator, _expiry, _notifier, _events) = test_coordinator();
        let task = sample_task("t");
        coordinator.show_task_notification(task.clone()).await.unwrap();

        coordinator.stop_notification_sound_for_task(&task.id).await;
        assert!(!coordinator.ringing_tasks().contains(&task.id));
        assert_eq!(coordinator.active_notification_count(), 0);

        // 第二次调用同样无错且集合保持干净
        coordinator.stop_notification_sound_for_task(&task.id).await;
        assert!(!coordinator.ringing_tasks().contains(&task.id));
    }

    #[tokio::test]
    async fn test_mark_done_button_completes_task_and_stops_ringing() {
        let (mut coordinator, _expiry, _notifier, _events) = test_coordinator();
        let task = sample_task("Pay rent");
        coordinator.save_task(task.clone()).await.unwrap();
        let notification_id = coordinator
            .show_task_notification(task.clone())
            .await
            .unwrap();
        assert!(coordinator.ringing_tasks().contains(&task.id));

        coordinator
            .handle_notifier_event(NotifierEvent::ButtonClicked {
                notification_id,
                button_index: 0,
            })
            .await
            .unwrap();

        assert!(!coordinator.ringing_tasks().contains(&task.id));
        let data = coordinator
            .handle_request(Request::GetTasks)
            .await
            .unwrap()
            .unwrap();
        let tasks: Vec<Task> = serde_json::from_value(data).unwrap();
        assert!(tasks.iter().find(|t| t.id == task.id).unwrap().completed);
    }

    #[tokio::test]
    async fn test_snooze_button_moves_reminder_and_closes() {
        let (mut coordinator, _expiry, _notifier, _events) = test_coordinator();
        let task = sample_task("t");
        coordinator.save_task(task.clone()).await.unwrap();
        let notification_id = coordinator
            .show_task_notification(task.clone())
            .await
            .unwrap();

        let before = Utc::now();
        coordinator
            .handle_notifier_event(NotifierEvent::ButtonClicked {
                notification_id,
                button_index: 1,
            })
            .await
            .unwrap();

        let data = coordinator
            .handle_request(Request::GetTasks)
            .await
            .unwrap()
            .unwrap();
        let tasks: Vec<Task> = serde_json::from_value(data).unwrap();
        let updated = tasks.iter().find(|t| t.id == task.id).unwrap();
        assert!(!updated.completed);
        let reminder = updated.reminder.unwrap();
        assert!(reminder >= before + chrono::Duration::minutes(SNOOZE_MINUTES - 1));
        assert_eq!(coordinator.active_notification_count(), 0);
    }

    #[tokio::test]
    async fn test_closed_event_cleans_up_regardless_of_by_user() {
        for by_user in [true, false] {
            let (mut coordinator, _expiry, _notifier, _events) = test_coordinator();
            let task = sample_task("t");
            let notification_id = coordinator
                .show_task_notification(task.clone())
                .await
                .unwrap();

            coordinator
                .handle_notifier_event(NotifierEvent::Closed {
                    notification_id,
                    by_user,
                })
                .await
                .unwrap();

            assert!(!coordinator.ringing_tasks().contains(&task.id));
            assert_eq!(coordinator.active_notification_count(), 0);
        }
    }

    #[tokio::test]
    async fn test_sound_expiry_stops_ringing_but_keeps_task_incomplete() {
        let (mut coordinator, _expiry, _notifier, _events) = test_coordinator();
        let task = sample_task("t");
        coordinator.save_task(task.clone()).await.unwrap();
        let notification_id = coordinator
            .show_task_notification(task.clone())
            .await
            .unwrap();

        coordinator.handle_sound_expiry(&notification_id);

        assert!(!coordinator.ringing_tasks().contains(&task.id));
        let data = coordinator
            .handle_request(Request::GetTasks)
            .await
            .unwrap()
            .unwrap();
        let tasks: Vec<Task> = serde_json::from_value(data).unwrap();
        assert!(!tasks.iter().find(|t| t.id == task.id).unwrap().completed);
    }

    #[tokio::test]
    async fn test_task_roundtrip_keeps_fields_and_bumps_updated_at() {
        let (mut coordinator, _expiry, _notifier, _events) = test_coordinator();
        let mut task = sample_task("Pay rent");
        task.description = "end of month".to_string();
        coordinator
            .handle_request(Request::SaveTask { task: task.clone() })
            .await
            .unwrap();

        let data = coordinator
            .handle_request(Request::GetTasks)
            .await
            .unwrap()
            .unwrap();
        let saved: Vec<Task> = serde_json::from_value(data).unwrap();
        let saved = saved.iter().find(|t| t.id == task.id).unwrap().clone();
        assert_eq!(saved.title, task.title);
        assert_eq!(saved.description, task.description);
        assert_eq!(saved.priority, task.priority);

        // 编辑后 updated_at 单调不减
        let mut edited = saved.clone();
        edited.title = "Pay rent (edited)".to_string();
        coordinator
            .handle_request(Request::UpdateTask { task: edited })
            .await
            .unwrap();
        let data = coordinator
            .handle_request(Request::GetTasks)
            .await
            .unwrap()
            .unwrap();
        let after: Vec<Task> = serde_json::from_value(data).unwrap();
        let after = after.iter().find(|t| t.id == task.id).unwrap();
        assert!(after.updated_at >= saved.updated_at);
        assert_eq!(after.created_at, saved.created_at);
    }

    #[tokio::test]
    async fn test_note_partial_updates() {
        let (mut coordinator, _expiry, _notifier, _events) = test_coordinator();
        let note = Note::new("shopping", 10.0, 20.0);
        coordinator
            .handle_request(Request::SaveNote { note: note.clone() })
            .await
            .unwrap();

        coordinator
            .handle_request(Request::UpdateNotePosition {
                note_id: note.id.clone(),
                x: 42.0,
                y: 7.0,
            })
            .await
            .unwrap();
        coordinator
            .handle_request(Request::UpdateNoteContent {
                note_id: note.id.clone(),
                content: "milk, eggs".to_string(),
            })
            .await
            .unwrap();

        let data = coordinator
            .handle_request(Request::GetNotes)
            .await
            .unwrap()
            .unwrap();
        let notes: Vec<Note> = serde_json::from_value(data).unwrap();
        let saved = notes.iter().find(|n| n.id == note.id).unwrap();
        assert_eq!(saved.x, 42.0);
        assert_eq!(saved.y, 7.0);
        assert_eq!(saved.content, "milk, eggs");
    }

    #[tokio::test]
    async fn test_state_persists_through_store() {
        let store: Arc<dyn LocalStore> = Arc::new(InMemoryStore::new());
        let notifier = Arc::new(FakeNotifier::new());
        let (events_tx, _events_rx) = broadcast::channel(64);

        let task = sample_task("persisted");
        {
            let (mut coordinator, _expiry) = Coordinator::new(
                Arc::clone(&store),
                notifier.clone() as Arc<dyn Notifier>,
                events_tx.clone(),
            );
            coordinator.save_task(task.clone()).await.unwrap();
        }

        let (mut coordinator, _expiry) =
            Coordinator::new(store, notifier as Arc<dyn Notifier>, events_tx);
        coordinator.load_state().await;
        let data = coordinator
            .handle_request(Request::GetTasks)
            .await
            .unwrap()
            .unwrap();
        let tasks: Vec<Task> = serde_json::from_value(data).unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].id, task.id);
    }
}

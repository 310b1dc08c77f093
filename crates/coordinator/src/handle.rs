use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use prodhub_domain::{HubEvent, Request, Response};
use prodhub_storage::LocalStore;

use crate::coordinator::Coordinator;
use crate::notifier::{Notifier, NotifierEvent};

/// 请求信封：载荷加单次回复通道
struct Envelope {
    request: Request,
    reply: oneshot::Sender<Response>,
}

/// 协调器句柄，可廉价克隆给任意前台上下文
#[derive(Clone)]
pub struct CoordinatorHandle {
    cmd_tx: mpsc::Sender<Envelope>,
    events_tx: broadcast::Sender<HubEvent>,
}

impl CoordinatorHandle {
    /// 发送请求并等待回复；协调器停止时返回错误响应而非panic
    pub async fn send(&self, request: Request) -> Response {
        let action = request.action();
        let (reply_tx, reply_rx) = oneshot::channel();
        let envelope = Envelope {
            request,
            reply: reply_tx,
        };

        if self.cmd_tx.send(envelope).await.is_err() {
            warn!("请求 {} 发送失败：协调器已停止", action);
            return Response::err("协调器已停止");
        }

        match reply_rx.await {
            Ok(response) => response,
            Err(_) => {
                warn!("请求 {} 未收到回复", action);
                Response::err("协调器未响应")
            }
        }
    }

    /// 订阅协调器广播的事件流
    pub fn subscribe(&self) -> broadcast::Receiver<HubEvent> {
        self.events_tx.subscribe()
    }
}

/// 启动协调器actor
///
/// 循环处理三个输入源：客户端请求、平台通知交互、提醒音到期，
/// 收到停机信号或全部发送端关闭后退出。
pub fn spawn(
    store: Arc<dyn LocalStore>,
    notifier: Arc<dyn Notifier>,
    mut notifier_events: mpsc::UnboundedReceiver<NotifierEvent>,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> (CoordinatorHandle, JoinHandle<()>) {
    let (cmd_tx, mut cmd_rx) = mpsc::channel::<Envelope>(64);
    let (events_tx, _) = broadcast::channel(256);

    let handle = CoordinatorHandle {
        cmd_tx,
        events_tx: events_tx.clone(),
    };

    let join = tokio::spawn(async move {
        let (mut coordinator, mut expiry_rx) = Coordinator::new(store, notifier, events_tx);
        coordinator.load_state().await;
        info!("✅ 协调器已启动");

        loop {
            tokio::select! {
                Some(envelope) = cmd_rx.recv() => {
                    let action = envelope.request.action();
                    debug!("处理请求: {}", action);
                    let result = coordinator.handle_request(envelope.request).await;
                    if let Err(e) = &result {
                        error!("请求 {} 处理失败: {}", action, e);
                    }
                    // 调用方可能已放弃等待
                    let _ = envelope.reply.send(Response::from_result(result));
                }
                Some(event) = notifier_events.recv() => {
                    if let Err(e) = coordinator.handle_notifier_event(event).await {
                        error!("处理通知交互事件失败: {}", e);
                    }
                }
                Some(notification_id) = expiry_rx.recv() => {
                    coordinator.handle_sound_expiry(&notification_id);
                }
                _ = shutdown_rx.recv() => {
                    info!("协调器收到停机信号");
                    break;
                }
                else => break,
            }
        }

        coordinator.shutdown();
    });

    (handle, join)
}

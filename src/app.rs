use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use prodhub_client::{ForegroundClient, LogTonePlayer};
use prodhub_coordinator::{CoordinatorHandle, LogNotifier, Notifier, NotifierEvent};
use prodhub_storage::{InMemoryStore, LocalStore, SqliteStore};

use crate::config::AppConfig;
use crate::shutdown::ShutdownManager;

/// 嵌入式应用程序
///
/// 单进程内组装完整系统：存储、协调器actor和N个前台上下文。
pub struct EmbeddedApplication {
    config: AppConfig,
}

/// 运行中的应用句柄
pub struct EmbeddedApplicationHandle {
    coordinator: CoordinatorHandle,
    notifier_events: mpsc::UnboundedSender<NotifierEvent>,
    shutdown_manager: ShutdownManager,
    joins: Vec<JoinHandle<()>>,
}

impl EmbeddedApplication {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    /// 启动全部组件并返回句柄
    pub async fn start(self) -> Result<EmbeddedApplicationHandle> {
        info!("初始化嵌入式应用程序");

        let store: Arc<dyn LocalStore> = if self.config.storage.use_memory {
            info!("使用内存存储（数据不落盘）");
            Arc::new(InMemoryStore::new())
        } else {
            let store = SqliteStore::connect(
                &self.config.storage.database_url,
                self.config.storage.max_connections,
            )
            .await
            .context("连接SQLite存储失败")?;
            info!("✅ SQLite存储已就绪: {}", self.config.storage.database_url);
            Arc::new(store)
        };

        let notifier: Arc<dyn Notifier> = Arc::new(LogNotifier::new());
        let (notifier_events, notifier_events_rx) = mpsc::unbounded_channel();
        let shutdown_manager = ShutdownManager::new();

        let (coordinator, coordinator_join) = prodhub_coordinator::spawn(
            Arc::clone(&store),
            Arc::clone(&notifier),
            notifier_events_rx,
            shutdown_manager.subscribe().await,
        );

        let mut joins = vec![coordinator_join];
        for index in 1..=self.config.client.contexts {
            let client = ForegroundClient::new(
                &format!("tab-{index}"),
                coordinator.clone(),
                Arc::clone(&store),
                Arc::clone(&notifier),
                Arc::new(LogTonePlayer),
            );
            let shutdown_rx = shutdown_manager.subscribe().await;
            joins.push(tokio::spawn(async move {
                let mut client = client;
                client.load().await;
                client.run(shutdown_rx).await;
            }));
        }

        info!(
            "✅ 嵌入式应用已启动: {} 个前台上下文",
            self.config.client.contexts
        );

        Ok(EmbeddedApplicationHandle {
            coordinator,
            notifier_events,
            shutdown_manager,
            joins,
        })
    }
}

impl EmbeddedApplicationHandle {
    pub fn coordinator(&self) -> &CoordinatorHandle {
        &self.coordinator
    }

    /// 平台侧通知交互事件的注入口（点击/按钮/关闭）
    pub fn notifier_events(&self) -> mpsc::UnboundedSender<NotifierEvent> {
        self.notifier_events.clone()
    }

    /// 触发优雅关闭并等待全部组件退出
    pub async fn shutdown(self) {
        self.shutdown_manager.shutdown().await;

        for join in self.joins {
            match tokio::time::timeout(Duration::from_secs(30), join).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => error!("组件退出时发生错误: {e}"),
                Err(_) => warn!("组件关闭超时"),
            }
        }

        info!("嵌入式应用已优雅关闭");
    }
}

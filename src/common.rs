use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::app::EmbeddedApplication;
use crate::config::AppConfig;

/// 通用的应用启动配置
#[derive(Debug, Clone)]
pub struct StartupConfig {
    pub config_path: Option<String>,
    pub log_level: String,
    pub log_format: String,
    pub use_memory: bool,
    pub contexts: Option<usize>,
}

/// 初始化日志系统
pub fn init_logging(log_level: &str, log_format: &str) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let registry = tracing_subscriber::registry().with(env_filter);

    match log_format {
        "json" => {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .try_init()
                .context("初始化JSON日志格式失败")?;
        }
        "pretty" => {
            registry
                .with(tracing_subscriber::fmt::layer().pretty())
                .try_init()
                .context("初始化Pretty日志格式失败")?;
        }
        _ => {
            return Err(anyhow::anyhow!("不支持的日志格式: {log_format}"));
        }
    }

    Ok(())
}

/// 加载配置并套用命令行覆盖
pub fn load_config(startup_config: &StartupConfig) -> Result<AppConfig> {
    let mut config = AppConfig::load(startup_config.config_path.as_deref())
        .context("加载应用配置失败")?;

    if startup_config.use_memory {
        config.storage.use_memory = true;
    }
    if let Some(contexts) = startup_config.contexts {
        config.client.contexts = contexts;
    }
    config.validate()?;

    Ok(config)
}

/// 启动应用并阻塞到收到关闭信号
pub async fn start_application(startup_config: StartupConfig) -> Result<()> {
    init_logging(&startup_config.log_level, &startup_config.log_format)?;

    info!("启动本地生产力中心");
    if let Some(ref path) = startup_config.config_path {
        info!("配置文件: {}", path);
    }

    let config = load_config(&startup_config)?;
    let handle = EmbeddedApplication::new(config).start().await?;

    wait_for_shutdown_signal().await;
    info!("收到关闭信号，开始优雅关闭...");
    handle.shutdown().await;
    info!("本地生产力中心已退出");

    Ok(())
}

/// 等待关闭信号
async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.unwrap_or_else(|e| {
            error!("安装Ctrl+C信号处理器失败: {}", e);
            std::process::exit(1);
        })
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => signal.recv().await,
            Err(e) => {
                error!("安装SIGTERM信号处理器失败: {}", e);
                std::process::exit(1);
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("收到Ctrl+C信号");
        },
        _ = terminate => {
            info!("收到SIGTERM信号");
        },
    }
}

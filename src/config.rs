use anyhow::{Context, Result};
use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub storage: StorageConfig,
    pub client: ClientConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// SQLite连接串，如 sqlite:prodhub.db
    pub database_url: String,
    pub max_connections: u32,
    /// 为true时使用纯内存存储（数据不落盘）
    pub use_memory: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// 启动的前台上下文数量（模拟打开的标签页）
    pub contexts: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    pub level: String,
    pub format: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage: StorageConfig {
                database_url: "sqlite:prodhub.db".to_string(),
                max_connections: 5,
                use_memory: false,
            },
            client: ClientConfig { contexts: 2 },
            log: LogConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        }
    }
}

impl AppConfig {
    /// 嵌入式默认配置（零配置启动）
    pub fn embedded_default() -> Self {
        Self::default()
    }

    /// 加载配置：TOML文件（可选）+ PRODHUB_段__字段 环境变量覆盖
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut builder = ConfigBuilder::builder();

        if let Some(path) = config_path {
            if Path::new(path).exists() {
                builder = builder.add_source(File::new(path, FileFormat::Toml));
            } else {
                return Err(anyhow::anyhow!("配置文件不存在: {}", path));
            }
        } else {
            let default_paths = ["config/prodhub.toml", "prodhub.toml"];
            let mut config_file_found = false;
            for path in &default_paths {
                if Path::new(path).exists() {
                    builder = builder.add_source(File::new(path, FileFormat::Toml));
                    config_file_found = true;
                    break;
                }
            }

            if !config_file_found {
                builder = builder
                    .set_default("storage.database_url", "sqlite:prodhub.db")?
                    .set_default("storage.max_connections", 5)?
                    .set_default("storage.use_memory", false)?
                    .set_default("client.contexts", 2)?
                    .set_default("log.level", "info")?
                    .set_default("log.format", "pretty")?;
            }
        }

        builder = builder.add_source(
            Environment::with_prefix("PRODHUB")
                .separator("__")
                .try_parsing(true),
        );

        let config: AppConfig = builder
            .build()
            .context("构建配置失败")?
            .try_deserialize()
            .context("反序列化配置失败")?;

        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.storage.database_url.trim().is_empty() && !self.storage.use_memory {
            return Err(anyhow::anyhow!("数据库连接串不能为空"));
        }
        if self.storage.max_connections == 0 {
            return Err(anyhow::anyhow!("数据库连接数必须大于0"));
        }
        if self.client.contexts == 0 {
            return Err(anyhow::anyhow!("前台上下文数量必须大于0"));
        }
        if !["trace", "debug", "info", "warn", "error"].contains(&self.log.level.as_str()) {
            return Err(anyhow::anyhow!("不支持的日志级别: {}", self.log.level));
        }
        if !["json", "pretty"].contains(&self.log.format.as_str()) {
            return Err(anyhow::anyhow!("不支持的日志格式: {}", self.log.format));
        }
        Ok(())
    }
}

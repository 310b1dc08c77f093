use anyhow::Result;
use clap::{Arg, ArgAction, Command};

mod app;
mod common;
mod config;
mod shutdown;

use common::{start_application, StartupConfig};

#[tokio::main]
async fn main() -> Result<()> {
    let matches = Command::new("prodhub")
        .version(env!("CARGO_PKG_VERSION"))
        .about("本地生产力中心（便签/任务提醒/书签）")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("配置文件路径"),
        )
        .arg(
            Arg::new("log-level")
                .short('l')
                .long("log-level")
                .value_name("LEVEL")
                .help("日志级别")
                .value_parser(["trace", "debug", "info", "warn", "error"])
                .default_value("info"),
        )
        .arg(
            Arg::new("log-format")
                .long("log-format")
                .value_name("FORMAT")
                .help("日志格式")
                .value_parser(["json", "pretty"])
                .default_value("pretty"),
        )
        .arg(
            Arg::new("memory-store")
                .long("memory-store")
                .help("使用内存存储（数据不落盘）")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("contexts")
                .long("contexts")
                .value_name("N")
                .help("前台上下文数量")
                .value_parser(clap::value_parser!(usize)),
        )
        .get_matches();

    let startup_config = StartupConfig {
        config_path: matches.get_one::<String>("config").cloned(),
        log_level: matches
            .get_one::<String>("log-level")
            .cloned()
            .unwrap_or_else(|| "info".to_string()),
        log_format: matches
            .get_one::<String>("log-format")
            .cloned()
            .unwrap_or_else(|| "pretty".to_string()),
        use_memory: matches.get_flag("memory-store"),
        contexts: matches.get_one::<usize>("contexts").copied(),
    };

    start_application(startup_config).await
}

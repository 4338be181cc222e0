//! Proact 诊断扫描器
//!
//! 独立进程运行只读心跳：读取主循环写出的工作快照，记录停滞子任务与下一步建议。
//!
//! 启动: cargo run --bin proact-scanner

use anyhow::Context;
use proact::agent::create_scanner;
use proact::config::load_config;
use proact::core::{Heartbeat, ShutdownManager};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer())
        .init();

    let cfg = load_config(None).context("Failed to load config")?;
    let settings = cfg.workspace.to_settings();

    let shutdown = ShutdownManager::new();
    shutdown.install_signal_handlers();

    let scanner = create_scanner(&cfg);
    let heartbeat = Heartbeat::new(settings.heartbeat_interval, shutdown.token());
    scanner.run(&heartbeat).await;

    Ok(())
}

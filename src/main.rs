//! Proact 主循环
//!
//! 入口：初始化日志、加载配置、组装 Workspace，对命令行给出的目标（或配置中的默认目标）
//! 运行主动心跳，直到 Ctrl+C / SIGTERM。

use anyhow::Context;
use proact::agent::create_workspace;
use proact::config::load_config;
use proact::core::ShutdownManager;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 日志：默认 info，可通过 RUST_LOG 覆盖
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer())
        .init();

    let cfg = load_config(None).context("Failed to load config")?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    let objective = if args.is_empty() {
        cfg.workspace.objective().to_string()
    } else {
        args.join(" ")
    };

    let shutdown = ShutdownManager::new();
    shutdown.install_signal_handlers();

    let mut workspace = create_workspace(&cfg);
    workspace.run(&objective, shutdown.token()).await;

    Ok(())
}

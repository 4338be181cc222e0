//! Proact 命令行对话
//!
//! 从 stdin 逐行读取消息，每行作为一条来信交给 Workspace::process_message，并打印回复。
//! 代替 WhatsApp / Twilio 传输层用于本地调试。
//!
//! 环境变量:
//! - PROACT_SENDER: 发信人标识（默认 "local"）

use anyhow::Context;
use proact::agent::create_workspace;
use proact::config::load_config;
use proact::IncomingMessage;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let cfg = load_config(None).context("Failed to load config")?;
    let sender = std::env::var("PROACT_SENDER").unwrap_or_else(|_| "local".to_string());
    let mut workspace = create_workspace(&cfg);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        let body = line.trim();
        if body.is_empty() {
            continue;
        }
        let reply = workspace
            .process_message(IncomingMessage::new(sender.clone(), body))
            .await;
        println!("{}\n", reply.body);
    }

    Ok(())
}

//! 追加式事件日志（WAL）
//!
//! 每行一条 JSON：`{"event": <string>, "ts": <unix 秒>, "data": <object>}`。
//! 只追加、不改写；读取时容忍崩溃留下的末尾半行。
//! 单写进程假设，不加锁。

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::core::WorkspaceError;
use crate::memory::unix_seconds;

/// 事件类型（固定词表）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    IncomingMessage,
    PlanDecomposed,
    PlanCompleted,
    PlanExtended,
    SubtaskExecuted,
    SubtaskEvaluated,
    ProactiveSuggestion,
    ReplySent,
    StorageFailure,
}

/// 单条事件记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub event: EventKind,
    pub ts: f64,
    pub data: Value,
}

impl Event {
    pub fn new(event: EventKind, data: Value) -> Self {
        Self {
            event,
            ts: unix_seconds(),
            data,
        }
    }
}

/// 文件事件日志：持有路径，clone 代价很低
#[derive(Debug, Clone)]
pub struct EventLog {
    path: PathBuf,
}

impl EventLog {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 追加一条事件；父目录不存在时自动创建。整行一次写入。
    pub async fn append(&self, kind: EventKind, data: Value) -> Result<(), WorkspaceError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        let mut line = serde_json::to_string(&Event::new(kind, data))?;
        line.push('\n');

        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        Ok(())
    }

    /// 追加事件，失败只记 warn：丢一条日志不影响主循环
    pub async fn record(&self, kind: EventKind, data: Value) {
        if let Err(e) = self.append(kind, data).await {
            tracing::warn!("Event log write failed ({:?}): {}", kind, e);
        }
    }

    /// 读出全部可解析事件（按追加顺序）；无法解析的行跳过并记 warn
    pub async fn read_events(&self) -> Result<Vec<Event>, WorkspaceError> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(s) => s,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut events = Vec::new();
        for (idx, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<Event>(line) {
                Ok(event) => events.push(event),
                Err(e) => tracing::warn!("Skipping unreadable event log line {}: {}", idx + 1, e),
            }
        }
        Ok(events)
    }
}

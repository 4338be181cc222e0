//! 运行时组装
//!
//! 供各入口（主循环 / 诊断扫描 / 命令行对话）调用：从 AppConfig 构建推理客户端、
//! 事件日志与快照存储，再组装 Workspace 或 ProactiveScanner。

use std::sync::Arc;

use crate::config::{load_instructions, AppConfig};
use crate::core::{ProactiveScanner, Workspace};
use crate::llm::{create_client_from_config, ReasoningClient};
use crate::memory::{EventLog, SnapshotStore};

/// 共享的存储句柄
pub struct Storage {
    pub events: EventLog,
    pub snapshots: SnapshotStore,
}

pub fn create_storage(cfg: &AppConfig) -> Storage {
    Storage {
        events: EventLog::new(cfg.storage.event_log_path()),
        snapshots: SnapshotStore::new(cfg.storage.snapshot_path()),
    }
}

pub fn create_client(cfg: &AppConfig) -> Arc<dyn ReasoningClient> {
    create_client_from_config(cfg, &load_instructions())
}

/// 主动编排器
pub fn create_workspace(cfg: &AppConfig) -> Workspace {
    let storage = create_storage(cfg);
    Workspace::new(
        create_client(cfg),
        storage.events,
        storage.snapshots,
        cfg.workspace.to_settings(),
    )
}

/// 只读诊断扫描器
pub fn create_scanner(cfg: &AppConfig) -> ProactiveScanner {
    let storage = create_storage(cfg);
    ProactiveScanner::new(create_client(cfg), storage.snapshots, storage.events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageSection;

    #[test]
    fn test_storage_paths_follow_config() {
        let cfg = AppConfig {
            storage: StorageSection {
                dir: "var/proact".into(),
                ..StorageSection::default()
            },
            ..AppConfig::default()
        };
        let storage = create_storage(&cfg);
        assert_eq!(storage.events.path(), std::path::Path::new("var/proact/wal.jsonl"));
        assert_eq!(
            storage.snapshots.path(),
            std::path::Path::new("var/proact/working_buffer.json")
        );
    }
}

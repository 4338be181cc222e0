//! 记忆与持久化：短期上下文（环形缓冲）、追加式事件日志、工作快照

pub mod event_log;
pub mod short_term;
pub mod snapshot;

pub use event_log::{Event, EventKind, EventLog};
pub use short_term::{MemoryEntry, SharedMemory, ShortTermMemory};
pub use snapshot::{Snapshot, SnapshotStore};

/// 当前 Unix 时间（秒，含小数）
pub fn unix_seconds() -> f64 {
    chrono::Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

/// 按字符截断（不会切断 UTF-8 字符）
pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

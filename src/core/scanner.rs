//! 诊断心跳（只读）
//!
//! 每次 tick 读取工作快照：不存在或损坏时跳过本次 tick、不报错；
//! 否则把序列化后的状态交给推理服务，找出停滞/阻塞的子任务并给出一个最有价值的下一步，
//! 作为 proactive_suggestion 事件追加到日志。从不修改计划。

use std::sync::Arc;

use serde_json::json;

use crate::core::heartbeat::{guarded_tick, Heartbeat};
use crate::core::WorkspaceError;
use crate::llm::ReasoningClient;
use crate::memory::{truncate_chars, EventKind, EventLog, SnapshotStore};

pub struct ProactiveScanner {
    client: Arc<dyn ReasoningClient>,
    snapshots: SnapshotStore,
    events: EventLog,
    suggestion_chars: usize,
}

impl ProactiveScanner {
    pub fn new(client: Arc<dyn ReasoningClient>, snapshots: SnapshotStore, events: EventLog) -> Self {
        Self {
            client,
            snapshots,
            events,
            suggestion_chars: 500,
        }
    }

    /// 单次诊断：读快照 -> 分析 -> 记录建议
    pub async fn scan_and_suggest(&self) -> Option<String> {
        let snapshot = match self.snapshots.load().await {
            Ok(Some(s)) => s,
            Ok(None) => {
                tracing::info!("Buffer empty, nothing to scan");
                return None;
            }
            Err(WorkspaceError::CorruptSnapshot(e)) => {
                tracing::warn!("Buffer file is corrupt ({}), skipping scan", e);
                return None;
            }
            Err(e) => {
                tracing::warn!("Buffer read failed ({}), skipping scan", e);
                return None;
            }
        };

        let state = match serde_json::to_string_pretty(&snapshot) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!("Cannot serialise snapshot: {}", e);
                return None;
            }
        };
        let prompt = format!(
            "Current task state:\n{state}\n\n\
            Analyse this state. Identify any blocked, stalled or incomplete subtasks \
            and suggest the single most impactful next action. Keep it brief."
        );

        let suggestion = match self.client.invoke(&prompt).await {
            Ok(reply) => reply.content.trim().to_string(),
            Err(e) => {
                tracing::warn!("Diagnostic scan call failed: {}", e);
                return None;
            }
        };

        tracing::info!("Proactive suggestion: {}", truncate_chars(&suggestion, 200));
        self.events
            .record(
                EventKind::ProactiveSuggestion,
                json!({ "suggestion": truncate_chars(&suggestion, self.suggestion_chars) }),
            )
            .await;
        Some(suggestion)
    }

    /// 诊断心跳主循环，直到 heartbeat 的 token 被取消
    pub async fn run(&self, heartbeat: &Heartbeat) {
        tracing::info!("Proactive scanner started. Heartbeat every {:?}", heartbeat.interval());
        while !heartbeat.is_stopped() {
            tracing::info!("[Scanner] tick");
            guarded_tick("scanner", self.scan_and_suggest()).await;
            if !heartbeat.sleep().await {
                break;
            }
        }
        tracing::info!("Proactive scanner stopped");
    }
}

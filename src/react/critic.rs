//! Evaluator：子任务结果自评
//!
//! 请求推理服务给出 "yes" 或 "no: <reason>" 的裁决。判定规则：小写、去首尾空白后以 "yes" 开头才算通过；
//! 空串、格式错误、含糊回答以及推理服务报错一律判为不通过（fail-closed），
//! 无法解析的裁决绝不能被当成认可。

use std::sync::Arc;

use serde_json::json;

use crate::llm::ReasoningClient;
use crate::memory::{truncate_chars, EventKind, EventLog};
use crate::plan::Subtask;

/// 裁决文本是否表示通过
pub fn verdict_passes(verdict: &str) -> bool {
    verdict.trim().to_lowercase().starts_with("yes")
}

pub struct Evaluator {
    client: Arc<dyn ReasoningClient>,
    events: EventLog,
    verdict_chars: usize,
}

impl Evaluator {
    pub fn new(client: Arc<dyn ReasoningClient>, events: EventLog) -> Self {
        Self {
            client,
            events,
            verdict_chars: 200,
        }
    }

    pub async fn evaluate(&self, subtask: &Subtask, output: &str) -> bool {
        let prompt = format!(
            "Subtask: {}\nRationale: {}\nOutput: {}\n\n\
            Is this output satisfactory for the subtask? Reply ONLY 'yes' or 'no: <reason>'.",
            subtask.title, subtask.rationale, output
        );

        let verdict = match self.client.invoke(&prompt).await {
            Ok(reply) => reply.content,
            Err(e) => {
                tracing::warn!("Evaluation of {} failed ({}), treating as rejected", subtask.id, e);
                String::new()
            }
        };
        let passed = verdict_passes(&verdict);

        tracing::info!("Evaluated {}: {}", subtask.id, if passed { "pass" } else { "fail" });
        self.events
            .record(
                EventKind::SubtaskEvaluated,
                json!({
                    "id": subtask.id,
                    "attempt": subtask.retries + 1,
                    "passed": passed,
                    "verdict": truncate_chars(verdict.trim(), self.verdict_chars),
                }),
            )
            .await;
        passed
    }
}

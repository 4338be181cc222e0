//! 子任务执行器
//!
//! 把子任务的 title / rationale / tool_intent 拼成 prompt 交给推理服务，输出有长度上限。
//! 调用前标记 in_progress；成功后写回 output、标记 completed，并把截断副本写入事件日志和短期记忆。
//! 推理服务出错时标记 failed 并向上返回 Execution 错误，由重试控制器计为一次失败尝试。

use std::sync::Arc;

use serde_json::json;

use crate::core::{WorkspaceError, WorkspaceSettings};
use crate::llm::ReasoningClient;
use crate::memory::{truncate_chars, EventKind, EventLog, SharedMemory};
use crate::plan::{Subtask, SubtaskStatus, ToolIntent};

pub struct SubtaskExecutor {
    client: Arc<dyn ReasoningClient>,
    events: EventLog,
    memory: SharedMemory,
    snippet_chars: usize,
    max_output_chars: usize,
}

impl SubtaskExecutor {
    pub fn new(
        client: Arc<dyn ReasoningClient>,
        events: EventLog,
        memory: SharedMemory,
        settings: &WorkspaceSettings,
    ) -> Self {
        Self {
            client,
            events,
            memory,
            snippet_chars: settings.snippet_chars,
            max_output_chars: settings.max_output_chars,
        }
    }

    fn intent_instruction(intent: ToolIntent) -> &'static str {
        match intent {
            ToolIntent::Search => "Use real-time web search for up-to-date information.",
            ToolIntent::Reason => "Reason from the prior results and your own knowledge; search only if essential.",
            ToolIntent::Respond => "Draft the reply the user should receive.",
        }
    }

    fn build_prompt(&self, subtask: &Subtask, context: &str) -> String {
        let mut prompt = format!(
            "Execute the following subtask.\n\
            Subtask [{}]: {}\n",
            subtask.id, subtask.title
        );
        if !subtask.rationale.is_empty() {
            prompt.push_str(&format!("Rationale: {}\n", subtask.rationale));
        }
        prompt.push_str(&format!(
            "Tool intent: {}. {}\n\n",
            subtask.tool_intent,
            Self::intent_instruction(subtask.tool_intent)
        ));
        prompt.push_str(context);
        prompt.push_str(
            "Return a concise result summary: a few sentences, minimal formatting, \
            readable on a phone screen.",
        );
        prompt
    }

    pub async fn execute(&self, subtask: &mut Subtask) -> Result<String, WorkspaceError> {
        subtask.status = SubtaskStatus::InProgress;
        let attempt = subtask.retries + 1;
        let context = self.memory.lock().await.to_prompt_section();
        let prompt = self.build_prompt(subtask, &context);

        let reply = match self.client.invoke(&prompt).await {
            Ok(reply) => reply,
            Err(e) => {
                subtask.status = SubtaskStatus::Failed;
                self.events
                    .record(
                        EventKind::SubtaskExecuted,
                        json!({ "id": subtask.id, "attempt": attempt, "ok": false, "error": e.to_string() }),
                    )
                    .await;
                return Err(WorkspaceError::Execution {
                    id: subtask.id.clone(),
                    source: e,
                });
            }
        };

        let output = truncate_chars(reply.content.trim(), self.max_output_chars);
        subtask.output = output.clone();
        subtask.status = SubtaskStatus::Completed;

        let snippet = truncate_chars(&output, self.snippet_chars);
        self.memory
            .lock()
            .await
            .push(subtask.id.clone(), &format!("{} => {}", subtask.title, snippet));
        self.events
            .record(
                EventKind::SubtaskExecuted,
                json!({ "id": subtask.id, "attempt": attempt, "ok": true, "output": snippet }),
            )
            .await;

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{LlmError, MockReasoningClient};
    use crate::memory::ShortTermMemory;
    use tempfile::TempDir;

    fn executor(client: Arc<MockReasoningClient>, dir: &TempDir) -> SubtaskExecutor {
        let settings = WorkspaceSettings {
            max_output_chars: 10,
            snippet_chars: 4,
            ..WorkspaceSettings::default()
        };
        SubtaskExecutor::new(
            client,
            EventLog::new(dir.path().join("wal.jsonl")),
            ShortTermMemory::shared(5, 200),
            &settings,
        )
    }

    #[tokio::test]
    async fn test_execute_success() {
        let dir = TempDir::new().unwrap();
        let client = Arc::new(MockReasoningClient::with_replies(["  0123456789abcdef  "]));
        let exec = executor(client.clone(), &dir);
        let mut subtask = Subtask::new("t1", "Find sources")
            .with_rationale("need data")
            .with_intent(ToolIntent::Search);

        let out = exec.execute(&mut subtask).await.unwrap();
        assert_eq!(out, "0123456789");
        assert_eq!(subtask.output, "0123456789");
        assert_eq!(subtask.status, SubtaskStatus::Completed);

        let prompt = &client.prompts()[0];
        assert!(prompt.contains("Find sources"));
        assert!(prompt.contains("Rationale: need data"));
        assert!(prompt.contains("real-time web search"));

        let events = exec.events.read_events().await.unwrap();
        assert_eq!(events[0].event, EventKind::SubtaskExecuted);
        assert_eq!(events[0].data["output"], "0123");
        assert_eq!(exec.memory.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn test_execute_error_propagates() {
        let dir = TempDir::new().unwrap();
        let client = Arc::new(MockReasoningClient::new());
        client.push_error(LlmError::Request("503".into()));
        let exec = executor(client, &dir);
        let mut subtask = Subtask::new("t1", "x");

        let err = exec.execute(&mut subtask).await.unwrap_err();
        assert!(matches!(err, WorkspaceError::Execution { ref id, .. } if id == "t1"));
        assert_eq!(subtask.status, SubtaskStatus::Failed);
        assert!(subtask.output.is_empty());
        assert!(exec.memory.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_prompt_includes_prior_results() {
        let dir = TempDir::new().unwrap();
        let client = Arc::new(MockReasoningClient::with_replies(["a", "b"]));
        let exec = executor(client.clone(), &dir);

        exec.execute(&mut Subtask::new("t1", "first")).await.unwrap();
        exec.execute(&mut Subtask::new("t2", "second")).await.unwrap();
        assert!(!client.prompts()[0].contains("Prior results"));
        assert!(client.prompts()[1].contains("- [t1] first => a"));
    }
}

//! 重试控制器：执行 -> 评估 的有界自我修正
//!
//! 最多 max_retries + 1 次尝试。返回第一次评估通过的输出；全部未通过时仍返回最后一次的输出，
//! 不阻塞、不丢弃尽力而为的结果。评估未通过且仍有重试额度时，把状态重置为 pending 并递增 retries，
//! 这是子任务状态唯一允许回退的地方。

use crate::plan::{Subtask, SubtaskStatus};
use crate::react::{Evaluator, SubtaskExecutor};

pub struct RetryController {
    executor: SubtaskExecutor,
    evaluator: Evaluator,
    max_retries: u32,
}

impl RetryController {
    pub fn new(executor: SubtaskExecutor, evaluator: Evaluator, max_retries: u32) -> Self {
        Self {
            executor,
            evaluator,
            max_retries,
        }
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub async fn execute_with_retry(&self, subtask: &mut Subtask) -> String {
        loop {
            tracing::info!("[RUN] {}: {} (attempt {})", subtask.id, subtask.title, subtask.retries + 1);

            match self.executor.execute(subtask).await {
                Ok(output) => {
                    if self.evaluator.evaluate(subtask, &output).await {
                        return output;
                    }
                }
                Err(e) => tracing::warn!("{}", e),
            }

            if subtask.retries >= self.max_retries {
                tracing::warn!(
                    "{} exhausted {} retries, keeping last output ({:?})",
                    subtask.id,
                    self.max_retries,
                    subtask.status
                );
                return subtask.output.clone();
            }

            subtask.status = SubtaskStatus::Pending;
            subtask.retries += 1;
            tracing::info!("[FIX] Retrying {} (retry {})", subtask.id, subtask.retries);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::WorkspaceSettings;
    use crate::llm::{LlmError, MockReasoningClient};
    use crate::memory::{EventKind, EventLog, ShortTermMemory};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn controller(client: Arc<MockReasoningClient>, log: &EventLog) -> RetryController {
        let settings = WorkspaceSettings::default();
        let memory = ShortTermMemory::shared(settings.memory_capacity, settings.snippet_chars);
        RetryController::new(
            SubtaskExecutor::new(client.clone(), log.clone(), memory, &settings),
            Evaluator::new(client, log.clone()),
            settings.max_retries,
        )
    }

    #[tokio::test]
    async fn test_passes_on_third_attempt() {
        let dir = TempDir::new().unwrap();
        let log = EventLog::new(dir.path().join("wal.jsonl"));
        let client = Arc::new(MockReasoningClient::with_replies([
            "draft 1", "no: thin", "draft 2", "no: still thin", "draft 3", "yes",
        ]));
        let rc = controller(client.clone(), &log);
        let mut subtask = Subtask::new("t1", "Find sources");

        let out = rc.execute_with_retry(&mut subtask).await;
        assert_eq!(out, "draft 3");
        assert_eq!(subtask.status, SubtaskStatus::Completed);
        assert_eq!(subtask.retries, 2);
        assert_eq!(client.calls(), 6);
    }

    #[tokio::test]
    async fn test_bounded_attempts_return_last_output() {
        let dir = TempDir::new().unwrap();
        let log = EventLog::new(dir.path().join("wal.jsonl"));
        let client = Arc::new(MockReasoningClient::with_replies([
            "a", "no", "b", "maybe", "c", "", "d", "yes",
        ]));
        let rc = controller(client.clone(), &log);
        let mut subtask = Subtask::new("t1", "x");

        let out = rc.execute_with_retry(&mut subtask).await;
        assert_eq!(out, "c");
        assert_eq!(subtask.retries, rc.max_retries());
        assert_eq!(subtask.status, SubtaskStatus::Completed);
        assert_eq!(client.calls(), 6);
        assert_eq!(client.remaining(), 2);

        let events = log.read_events().await.unwrap();
        let executed = events.iter().filter(|e| e.event == EventKind::SubtaskExecuted).count();
        assert_eq!(executed, 3);
    }

    #[tokio::test]
    async fn test_execution_errors_count_as_attempts() {
        let dir = TempDir::new().unwrap();
        let log = EventLog::new(dir.path().join("wal.jsonl"));
        let client = Arc::new(MockReasoningClient::new());
        for _ in 0..3 {
            client.push_error(LlmError::Request("unavailable".into()));
        }
        let rc = controller(client.clone(), &log);
        let mut subtask = Subtask::new("t1", "x");

        let out = rc.execute_with_retry(&mut subtask).await;
        assert_eq!(out, "");
        assert_eq!(subtask.status, SubtaskStatus::Failed);
        assert_eq!(subtask.retries, 2);
        assert_eq!(client.calls(), 3);
    }

    #[tokio::test]
    async fn test_error_then_success() {
        let dir = TempDir::new().unwrap();
        let log = EventLog::new(dir.path().join("wal.jsonl"));
        let client = Arc::new(MockReasoningClient::new());
        client.push_error(LlmError::Timeout(60));
        client.push_reply("recovered");
        client.push_reply("yes");
        let rc = controller(client, &log);
        let mut subtask = Subtask::new("t1", "x");

        assert_eq!(rc.execute_with_retry(&mut subtask).await, "recovered");
        assert_eq!(subtask.status, SubtaskStatus::Completed);
        assert_eq!(subtask.retries, 1);
    }
}

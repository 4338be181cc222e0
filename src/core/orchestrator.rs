//! Workspace 编排器：主控循环
//!
//! 由注入的推理客户端、事件日志、快照存储与设置构造（无全局单例），负责：
//! - start：分解目标、成为当前唯一活动计划、写快照；
//! - tick：主动心跳，按顺序推进 pending 子任务，全部完成后请求主动扩展并追加到计划；
//! - run：start 后 tick / sleep 直到收到停止信号；
//! - process_message：消息边界，单条文本进、单条适合手机屏幕的回复出。
//!
//! 子任务严格按列表顺序串行执行；declared dependencies 只记录，不作为门槛。

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio_util::sync::CancellationToken;

use crate::core::heartbeat::{guarded_tick, Heartbeat};
use crate::llm::ReasoningClient;
use crate::memory::{truncate_chars, EventKind, EventLog, ShortTermMemory, SnapshotStore};
use crate::plan::{Decomposer, Plan, SubtaskStatus};
use crate::react::{Evaluator, RetryController, SubtaskExecutor};

const FALLBACK_REPLY: &str = "Sorry, I couldn't find a good answer right now. Please try again shortly.";

/// 编排层设置（由配置层转换而来，核心不读环境变量）
#[derive(Debug, Clone)]
pub struct WorkspaceSettings {
    pub heartbeat_interval: Duration,
    /// 额外重试次数；总尝试次数为 max_retries + 1
    pub max_retries: u32,
    pub memory_capacity: usize,
    /// 事件日志与短期记忆中的输出截断长度
    pub snippet_chars: usize,
    pub max_output_chars: usize,
    pub max_reply_chars: usize,
}

impl Default for WorkspaceSettings {
    fn default() -> Self {
        Self {
            heartbeat_interval: Duration::from_secs(30),
            max_retries: 2,
            memory_capacity: 10,
            snippet_chars: 200,
            max_output_chars: 1500,
            max_reply_chars: 1600,
        }
    }
}

/// 来自传输层的单条消息
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    pub sender: String,
    pub body: String,
}

impl IncomingMessage {
    pub fn new(sender: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            body: body.into(),
        }
    }
}

/// 交回传输层的单条回复
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub to: String,
    pub body: String,
}

/// 单次 tick 的结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// 本次推进的子任务数
    pub executed: usize,
    /// 是否进入了主动扩展阶段
    pub proactive_ran: bool,
    /// 追加到计划的新子任务数
    pub appended: usize,
}

/// 写快照；失败记 warn 并追加 storage_failure 事件
async fn persist_snapshot(snapshots: &SnapshotStore, events: &EventLog, plan: &Plan) {
    if let Err(e) = snapshots.save(plan).await {
        tracing::warn!("Snapshot write failed: {}", e);
        events
            .record(
                EventKind::StorageFailure,
                json!({ "target": "snapshot", "error": e.to_string() }),
            )
            .await;
    }
}

pub struct Workspace {
    client: Arc<dyn ReasoningClient>,
    decomposer: Decomposer,
    retry: RetryController,
    events: EventLog,
    snapshots: SnapshotStore,
    settings: WorkspaceSettings,
    plan: Option<Plan>,
    /// 当前计划的 plan_completed 事件是否已记录
    completion_logged: bool,
}

impl Workspace {
    pub fn new(
        client: Arc<dyn ReasoningClient>,
        events: EventLog,
        snapshots: SnapshotStore,
        settings: WorkspaceSettings,
    ) -> Self {
        let memory = ShortTermMemory::shared(settings.memory_capacity, settings.snippet_chars);
        let executor = SubtaskExecutor::new(client.clone(), events.clone(), memory.clone(), &settings);
        let evaluator = Evaluator::new(client.clone(), events.clone());
        Self {
            decomposer: Decomposer::new(client.clone(), events.clone(), memory),
            retry: RetryController::new(executor, evaluator, settings.max_retries),
            client,
            events,
            snapshots,
            settings,
            plan: None,
            completion_logged: false,
        }
    }

    pub fn plan(&self) -> Option<&Plan> {
        self.plan.as_ref()
    }

    pub fn settings(&self) -> &WorkspaceSettings {
        &self.settings
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    /// 分解目标并替换当前计划
    pub async fn start(&mut self, objective: &str) -> &Plan {
        let plan = self.decomposer.decompose(objective).await;
        persist_snapshot(&self.snapshots, &self.events, &plan).await;
        self.completion_logged = false;
        self.plan.insert(plan)
    }

    /// 按列表顺序推进全部 pending 子任务，每完成一个写一次快照；返回推进个数。
    /// 上一次 tick 中途中断而停留在 in_progress 的子任务先放回 pending
    async fn drive_pending(&mut self) -> usize {
        let Some(plan) = self.plan.as_mut() else {
            return 0;
        };
        for subtask in plan.subtasks.iter_mut() {
            if subtask.status == SubtaskStatus::InProgress {
                tracing::warn!("{} was interrupted mid-run, re-queueing", subtask.id);
                subtask.status = SubtaskStatus::Pending;
            }
        }
        let mut executed = 0;
        for idx in 0..plan.subtasks.len() {
            if !plan.subtasks[idx].is_pending() {
                continue;
            }
            let unmet = plan.unmet_dependencies(&plan.subtasks[idx].id);
            if !unmet.is_empty() {
                tracing::debug!(
                    "{} runs with unmet dependencies {:?} (not enforced)",
                    plan.subtasks[idx].id,
                    unmet
                );
            }
            let output = self.retry.execute_with_retry(&mut plan.subtasks[idx]).await;
            tracing::info!("[OUT] {}: {}", plan.subtasks[idx].id, truncate_chars(&output, 120));
            executed += 1;
            persist_snapshot(&self.snapshots, &self.events, plan).await;
        }
        executed
    }

    async fn log_completion(&mut self) {
        let Some(plan) = self.plan.as_ref() else {
            return;
        };
        if self.completion_logged {
            return;
        }
        let failed = plan
            .subtasks
            .iter()
            .filter(|s| s.status == SubtaskStatus::Failed)
            .count();
        self.events
            .record(
                EventKind::PlanCompleted,
                json!({
                    "goal": truncate_chars(&plan.goal, 300),
                    "subtasks": plan.subtasks.len(),
                    "failed": failed,
                }),
            )
            .await;
        self.completion_logged = true;
    }

    fn log_token_usage(&self) {
        let (prompt, completion, total) = self.client.token_usage();
        tracing::info!(
            "[Usage] tokens prompt={} completion={} total={}",
            prompt,
            completion,
            total
        );
    }

    /// 主动心跳的一次 tick
    pub async fn tick(&mut self) -> TickReport {
        tracing::info!("[Heartbeat] tick");
        let mut report = TickReport {
            executed: self.drive_pending().await,
            ..TickReport::default()
        };

        match self.plan.as_ref() {
            None => {
                tracing::debug!("No active plan, idling");
                return report;
            }
            Some(plan) if !plan.all_completed() => return report,
            Some(_) => {}
        }

        self.log_completion().await;
        let Some(plan) = self.plan.as_mut() else {
            return report;
        };

        tracing::info!("All subtasks done. Generating proactive next steps...");
        report.proactive_ran = true;
        let next = self.decomposer.suggest_next(plan).await;
        let ids: Vec<String> = next.iter().map(|s| s.id.clone()).collect();
        report.appended = plan.extend(next);

        if report.appended > 0 {
            tracing::info!("[Proactive] {} new subtasks queued", report.appended);
            self.completion_logged = false;
            self.events
                .record(
                    EventKind::PlanExtended,
                    json!({ "count": report.appended, "suggested_ids": ids, "total": plan.subtasks.len() }),
                )
                .await;
            persist_snapshot(&self.snapshots, &self.events, plan).await;
        } else {
            tracing::info!("[Proactive] No new steps suggested. Idling...");
        }
        report
    }

    /// 主动心跳主循环：分解目标后按固定间隔 tick，直到 token 被取消
    pub async fn run(&mut self, objective: &str, token: CancellationToken) {
        let heartbeat = Heartbeat::new(self.settings.heartbeat_interval, token);
        tracing::info!("[Workspace] Starting autonomous loop for '{}'", objective);
        let count = self.start(objective).await.subtasks.len();
        tracing::info!(
            "[Planner] {} subtasks generated, heartbeat every {:?}",
            count,
            heartbeat.interval()
        );

        while !heartbeat.is_stopped() {
            guarded_tick("workspace", self.tick()).await;
            self.log_token_usage();
            if !heartbeat.sleep().await {
                break;
            }
        }
        tracing::info!("[Workspace] Heartbeat stopped");
    }

    /// 消息边界：记录来信、以消息为目标重新规划、推进全部子任务并汇总回复
    pub async fn process_message(&mut self, message: IncomingMessage) -> Reply {
        self.events
            .record(
                EventKind::IncomingMessage,
                json!({ "sender": message.sender, "content": truncate_chars(&message.body, 500) }),
            )
            .await;

        self.start(&message.body).await;
        self.drive_pending().await;

        let body = match self.plan.as_ref() {
            Some(plan) => compose_reply(plan, self.settings.max_reply_chars),
            None => FALLBACK_REPLY.to_string(),
        };
        if self.plan.as_ref().map(Plan::all_completed).unwrap_or(false) {
            self.log_completion().await;
        }

        self.events
            .record(
                EventKind::ReplySent,
                json!({ "to": message.sender, "body": truncate_chars(&body, 300) }),
            )
            .await;
        Reply {
            to: message.sender,
            body,
        }
    }
}

/// 按计划顺序拼接各子任务的最终输出，截断到回复上限；全空时给兜底文案
fn compose_reply(plan: &Plan, max_chars: usize) -> String {
    let parts: Vec<&str> = plan
        .subtasks
        .iter()
        .map(|s| s.output.trim())
        .filter(|o| !o.is_empty())
        .collect();
    if parts.is_empty() {
        return FALLBACK_REPLY.to_string();
    }
    truncate_chars(&parts.join("\n\n"), max_chars)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockReasoningClient;
    use crate::plan::Subtask;

    #[test]
    fn test_compose_reply() {
        let mut plan = Plan::fallback("x");
        plan.subtasks[0].output = "first".into();
        plan.subtasks.push(Subtask::new("t2", "y"));
        let mut third = Subtask::new("t3", "z");
        third.output = " third ".into();
        plan.subtasks.push(third);

        assert_eq!(compose_reply(&plan, 100), "first\n\nthird");
        assert_eq!(compose_reply(&plan, 3), "fir");

        plan.subtasks.iter_mut().for_each(|s| s.output.clear());
        assert_eq!(compose_reply(&plan, 100), FALLBACK_REPLY);
    }

    #[tokio::test]
    async fn test_interrupted_subtask_is_requeued() {
        let dir = tempfile::TempDir::new().unwrap();
        let client = Arc::new(MockReasoningClient::with_replies([
            r#"{"subtasks": [{"id": "t1", "title": "x"}]}"#,
            "done",
            "yes",
        ]));
        let mut ws = Workspace::new(
            client.clone(),
            EventLog::new(dir.path().join("wal.jsonl")),
            SnapshotStore::new(dir.path().join("buffer.json")),
            WorkspaceSettings::default(),
        );
        ws.start("x").await;
        // 模拟 tick 在执行中途 panic 后留下的状态
        if let Some(plan) = ws.plan.as_mut() {
            plan.subtasks[0].status = SubtaskStatus::InProgress;
        }

        assert_eq!(ws.drive_pending().await, 1);
        let subtask = &ws.plan().unwrap().subtasks[0];
        assert_eq!(subtask.status, SubtaskStatus::Completed);
        assert_eq!(subtask.output, "done");
        assert_eq!(client.remaining(), 0);
    }

    #[test]
    fn test_default_settings() {
        let s = WorkspaceSettings::default();
        assert_eq!(s.max_retries, 2);
        assert_eq!(s.heartbeat_interval, Duration::from_secs(30));
    }
}

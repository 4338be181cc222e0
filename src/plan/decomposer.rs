//! Decomposer：目标分解与主动扩展
//!
//! decompose 把一句目标交给推理服务，要求返回与 Plan 结构一致的 JSON；
//! 解析失败、缺字段或推理服务出错时，退化为单子任务计划（t1 原样复述目标），永不向调用方报错。
//! suggest_next 在全部子任务完成后请求 2-3 个后续子任务，失败时返回空列表。

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Value};

use crate::llm::ReasoningClient;
use crate::memory::{truncate_chars, EventKind, EventLog, SharedMemory};
use crate::plan::parse::{parse_tolerant, Parsed};
use crate::plan::{Plan, Subtask, ToolIntent};

const PLAN_SCHEMA: &str = r#"{
  "goal": "<restated objective>",
  "assumptions": ["<assumption>"],
  "missing_info_questions": ["<clarifying question>"],
  "subtasks": [
    {"id": "t1", "title": "<atomic action>", "rationale": "<why>", "tool_intent": "search|reason|respond", "dependencies": []}
  ]
}"#;

const SUBTASKS_SCHEMA: &str = r#"{"subtasks": [{"id": "p1", "title": "<atomic action>", "rationale": "<why>", "tool_intent": "search|reason|respond", "dependencies": []}]}"#;

/// 推理服务返回的计划草稿：字段尽量宽松，再由 into_plan 校验。
/// 可选字段为 null 与缺省等价
#[derive(Debug, Deserialize)]
struct PlanDraft {
    goal: Option<String>,
    #[serde(default)]
    assumptions: Option<Vec<String>>,
    #[serde(default)]
    missing_info_questions: Option<Vec<String>>,
    subtasks: Vec<SubtaskDraft>,
}

#[derive(Debug, Deserialize)]
struct SubtaskDraft {
    /// 字符串或数字
    #[serde(default)]
    id: Option<Value>,
    #[serde(alias = "description")]
    title: Option<String>,
    #[serde(default)]
    rationale: Option<String>,
    #[serde(default)]
    tool_intent: Option<ToolIntent>,
    #[serde(default)]
    dependencies: Option<Vec<Value>>,
}

/// 把 id / 依赖项统一成非空字符串；数字按十进制文本处理
fn id_text(value: Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

#[derive(Debug, Deserialize)]
struct SuggestionDraft {
    subtasks: Vec<SubtaskDraft>,
}

/// 草稿转子任务：无标题的条目丢弃，缺 id 的按位置补 t{n}/p{n}
fn subtasks_from_drafts(drafts: Vec<SubtaskDraft>, id_prefix: char) -> Vec<Subtask> {
    drafts
        .into_iter()
        .enumerate()
        .filter_map(|(idx, d)| {
            let title = d.title.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())?;
            let id = d
                .id
                .and_then(id_text)
                .unwrap_or_else(|| format!("{}{}", id_prefix, idx + 1));
            let dependencies = d
                .dependencies
                .unwrap_or_default()
                .into_iter()
                .filter_map(id_text)
                .collect();
            Some(
                Subtask::new(id, title)
                    .with_rationale(d.rationale.unwrap_or_default())
                    .with_intent(d.tool_intent.unwrap_or_default())
                    .with_dependencies(dependencies),
            )
        })
        .collect()
}

impl PlanDraft {
    fn into_plan(self, objective: &str) -> Option<Plan> {
        let subtasks = subtasks_from_drafts(self.subtasks, 't');
        if subtasks.is_empty() {
            return None;
        }
        let mut plan = Plan {
            goal: self
                .goal
                .filter(|g| !g.trim().is_empty())
                .unwrap_or_else(|| objective.to_string()),
            assumptions: self.assumptions.unwrap_or_default(),
            missing_info_questions: self.missing_info_questions.unwrap_or_default(),
            subtasks,
        };
        plan.ensure_unique_ids();
        Some(plan)
    }
}

pub struct Decomposer {
    client: Arc<dyn ReasoningClient>,
    events: EventLog,
    memory: SharedMemory,
}

impl Decomposer {
    pub fn new(client: Arc<dyn ReasoningClient>, events: EventLog, memory: SharedMemory) -> Self {
        Self {
            client,
            events,
            memory,
        }
    }

    fn decompose_prompt(objective: &str) -> String {
        format!(
            "Objective: {objective}\n\n\
            Decompose this objective into 3-5 atomic, executable subtasks.\n\
            Return ONLY one JSON object matching this schema exactly:\n{PLAN_SCHEMA}\n\
            Use tool_intent \"search\" when real-time information is needed."
        )
    }

    /// 分解目标为计划；任何异常都退化为单子任务计划
    pub async fn decompose(&self, objective: &str) -> Plan {
        let (plan, fallback) = match self.client.invoke(&Self::decompose_prompt(objective)).await {
            Ok(reply) => match parse_tolerant::<PlanDraft>(&reply.content) {
                Parsed::Direct(draft) | Parsed::Extracted(draft) => match draft.into_plan(objective) {
                    Some(plan) => (plan, false),
                    None => {
                        tracing::warn!("Plan has no usable subtasks, falling back to single subtask");
                        (Plan::fallback(objective), true)
                    }
                },
                Parsed::Unparseable => {
                    tracing::warn!("Plan reply is not valid JSON, falling back to single subtask");
                    (Plan::fallback(objective), true)
                }
            },
            Err(e) => {
                tracing::warn!("Decomposition call failed ({}), falling back to single subtask", e);
                (Plan::fallback(objective), true)
            }
        };

        tracing::info!("Planner produced {} subtasks for '{}'", plan.subtasks.len(), truncate_chars(objective, 80));

        let titles: Vec<&str> = plan.subtasks.iter().map(|s| s.title.as_str()).collect();
        self.memory
            .lock()
            .await
            .push("plan", &format!("Plan for '{}': {:?}", objective, titles));

        self.events
            .record(
                EventKind::PlanDecomposed,
                json!({
                    "goal": truncate_chars(&plan.goal, 300),
                    "subtasks": plan.subtasks.iter().map(|s| json!({"id": s.id, "title": s.title})).collect::<Vec<_>>(),
                    "fallback": fallback,
                }),
            )
            .await;

        plan
    }

    /// 全部完成后请求后续子任务；失败返回空列表
    pub async fn suggest_next(&self, plan: &Plan) -> Vec<Subtask> {
        let context = self.memory.lock().await.to_prompt_section();
        let done: Vec<String> = plan
            .subtasks
            .iter()
            .map(|s| format!("- [{}] {}", s.id, s.title))
            .collect();
        let prompt = format!(
            "Goal: {}\nAll current subtasks are complete:\n{}\n\n{}\
            Suggest the next 2-3 proactive follow-up actions. Do not repeat completed work.\n\
            Return ONLY one JSON object matching this schema:\n{}",
            plan.goal,
            done.join("\n"),
            context,
            SUBTASKS_SCHEMA
        );

        let reply = match self.client.invoke(&prompt).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!("Proactive suggestion call failed: {}", e);
                return Vec::new();
            }
        };

        match parse_tolerant::<SuggestionDraft>(&reply.content).into_option() {
            Some(draft) => subtasks_from_drafts(draft.subtasks, 'p'),
            None => {
                tracing::debug!("Proactive suggestion reply is not valid JSON");
                Vec::new()
            }
        }
    }
}

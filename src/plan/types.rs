//! 计划数据模型：Plan / Subtask / ToolIntent / SubtaskStatus
//!
//! Plan 的子任务顺序即执行顺序；只追加，不删除。

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// 子任务的工具意图
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ToolIntent {
    /// 需要实时搜索
    Search,
    /// 面向用户起草回复
    Respond,
    /// 纯推理；未知取值也归到这里
    #[default]
    #[serde(other)]
    Reason,
}

impl std::fmt::Display for ToolIntent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ToolIntent::Search => write!(f, "search"),
            ToolIntent::Reason => write!(f, "reason"),
            ToolIntent::Respond => write!(f, "respond"),
        }
    }
}

/// 子任务状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SubtaskStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Failed,
    Blocked,
}

/// 原子子任务
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subtask {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub rationale: String,
    #[serde(default)]
    pub tool_intent: ToolIntent,
    /// 声明的依赖；当前只记录，不作为执行门槛
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub status: SubtaskStatus,
    #[serde(default)]
    pub output: String,
    #[serde(default)]
    pub retries: u32,
}

impl Subtask {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            rationale: String::new(),
            tool_intent: ToolIntent::default(),
            dependencies: Vec::new(),
            status: SubtaskStatus::Pending,
            output: String::new(),
            retries: 0,
        }
    }

    pub fn with_rationale(mut self, rationale: impl Into<String>) -> Self {
        self.rationale = rationale.into();
        self
    }

    pub fn with_intent(mut self, intent: ToolIntent) -> Self {
        self.tool_intent = intent;
        self
    }

    pub fn with_dependencies(mut self, deps: Vec<String>) -> Self {
        self.dependencies = deps;
        self
    }

    pub fn is_pending(&self) -> bool {
        self.status == SubtaskStatus::Pending
    }

    pub fn is_completed(&self) -> bool {
        self.status == SubtaskStatus::Completed
    }

    /// 重置为新任务状态（用于主动扩展追加进来的子任务）
    fn reset(&mut self) {
        self.status = SubtaskStatus::Pending;
        self.output.clear();
        self.retries = 0;
    }
}

/// 一个目标的分解结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub goal: String,
    #[serde(default)]
    pub assumptions: Vec<String>,
    #[serde(default)]
    pub missing_info_questions: Vec<String>,
    pub subtasks: Vec<Subtask>,
}

impl Plan {
    /// 兜底计划：唯一子任务 t1 原样复述目标
    pub fn fallback(objective: &str) -> Self {
        Self {
            goal: objective.to_string(),
            assumptions: Vec::new(),
            missing_info_questions: Vec::new(),
            subtasks: vec![Subtask::new("t1", objective)
                .with_rationale("The objective could not be decomposed; treat it as a single task.")
                .with_intent(ToolIntent::Search)],
        }
    }

    pub fn get(&self, id: &str) -> Option<&Subtask> {
        self.subtasks.iter().find(|s| s.id == id)
    }

    /// 全部子任务为 completed（空计划不算完成）
    pub fn all_completed(&self) -> bool {
        !self.subtasks.is_empty() && self.subtasks.iter().all(Subtask::is_completed)
    }

    /// 重命名重复 id，保证计划内 id 唯一；返回被重命名的个数
    pub fn ensure_unique_ids(&mut self) -> usize {
        let mut seen = HashSet::new();
        let mut renamed = 0;
        for idx in 0..self.subtasks.len() {
            let id = self.subtasks[idx].id.trim().to_string();
            let id = if id.is_empty() { format!("t{}", idx + 1) } else { id };
            let unique = if seen.contains(&id) {
                renamed += 1;
                next_free_id(&id, |candidate| {
                    seen.contains(candidate) || self.subtasks.iter().any(|s| s.id == candidate)
                })
            } else {
                id
            };
            seen.insert(unique.clone());
            self.subtasks[idx].id = unique;
        }
        renamed
    }

    /// 追加主动扩展产生的子任务：状态重置为 pending，冲突 id 重命名；返回追加个数
    pub fn extend(&mut self, new_subtasks: Vec<Subtask>) -> usize {
        let mut appended = 0;
        for mut subtask in new_subtasks {
            subtask.reset();
            if subtask.id.trim().is_empty() || self.get(&subtask.id).is_some() {
                let base = format!("p{}", self.subtasks.len() + 1);
                subtask.id = next_free_id(&base, |candidate| self.get(candidate).is_some());
            }
            self.subtasks.push(subtask);
            appended += 1;
        }
        appended
    }

    /// 声明了但尚未完成的依赖（只用于日志，不阻塞执行）
    pub fn unmet_dependencies(&self, id: &str) -> Vec<String> {
        let Some(subtask) = self.get(id) else {
            return Vec::new();
        };
        subtask
            .dependencies
            .iter()
            .filter(|dep| !self.get(dep).map(Subtask::is_completed).unwrap_or(false))
            .cloned()
            .collect()
    }
}

fn next_free_id(base: &str, taken: impl Fn(&str) -> bool) -> String {
    if !taken(base) {
        return base.to_string();
    }
    (2..)
        .map(|n| format!("{}-{}", base, n))
        .find(|candidate| !taken(candidate))
        .unwrap_or_else(|| base.to_string())
}

//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `PROACT__*` 覆盖（双下划线表示嵌套，如 `PROACT__WORKSPACE__MAX_RETRIES=3`）。
//! 核心编排层不读取环境变量，只消费这里转换出的 [`WorkspaceSettings`]。

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::core::WorkspaceSettings;

/// 默认目标（未通过命令行传入时使用）
pub const DEFAULT_OBJECTIVE: &str = "Analyse the WhatsApp repo at https://github.com/Centrale73/Whatsapp, \
identify gaps, and add AI features: message sentiment analysis, an auto-responder backed by \
real-time search, and a daily summary digest.";

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub app: AppSection,
    pub llm: LlmSection,
    pub storage: StorageSection,
    pub workspace: WorkspaceSection,
}

/// [app] 段
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppSection {
    pub name: Option<String>,
}

/// [llm] 段：后端选择与超时
#[derive(Debug, Clone, Deserialize)]
pub struct LlmSection {
    /// 后端：perplexity / openai / mock
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    pub base_url: Option<String>,
    #[serde(default)]
    pub timeouts: LlmTimeoutsSection,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            base_url: None,
            timeouts: LlmTimeoutsSection::default(),
        }
    }
}

fn default_provider() -> String {
    "perplexity".to_string()
}

fn default_model() -> String {
    "sonar-pro".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmTimeoutsSection {
    /// 单次推理调用超时（秒）
    #[serde(default = "default_request_timeout")]
    pub request: u64,
}

impl Default for LlmTimeoutsSection {
    fn default() -> Self {
        Self {
            request: default_request_timeout(),
        }
    }
}

fn default_request_timeout() -> u64 {
    60
}

/// [storage] 段：事件日志与快照文件位置
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSection {
    #[serde(default = "default_storage_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_event_log")]
    pub event_log: String,
    #[serde(default = "default_snapshot")]
    pub snapshot: String,
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            dir: default_storage_dir(),
            event_log: default_event_log(),
            snapshot: default_snapshot(),
        }
    }
}

fn default_storage_dir() -> PathBuf {
    PathBuf::from("storage")
}

fn default_event_log() -> String {
    "wal.jsonl".to_string()
}

fn default_snapshot() -> String {
    "working_buffer.json".to_string()
}

impl StorageSection {
    pub fn event_log_path(&self) -> PathBuf {
        self.dir.join(&self.event_log)
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.dir.join(&self.snapshot)
    }
}

/// [workspace] 段：心跳间隔、重试上限、记忆容量与各类截断长度
#[derive(Debug, Clone, Deserialize)]
pub struct WorkspaceSection {
    #[serde(default = "default_heartbeat_interval_secs")]
    pub heartbeat_interval_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_memory_capacity")]
    pub memory_capacity: usize,
    #[serde(default = "default_snippet_chars")]
    pub snippet_chars: usize,
    #[serde(default = "default_max_output_chars")]
    pub max_output_chars: usize,
    #[serde(default = "default_max_reply_chars")]
    pub max_reply_chars: usize,
    /// 主循环的默认目标
    pub objective: Option<String>,
}

impl Default for WorkspaceSection {
    fn default() -> Self {
        Self {
            heartbeat_interval_secs: default_heartbeat_interval_secs(),
            max_retries: default_max_retries(),
            memory_capacity: default_memory_capacity(),
            snippet_chars: default_snippet_chars(),
            max_output_chars: default_max_output_chars(),
            max_reply_chars: default_max_reply_chars(),
            objective: None,
        }
    }
}

fn default_heartbeat_interval_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    2
}

fn default_memory_capacity() -> usize {
    10
}

fn default_snippet_chars() -> usize {
    200
}

fn default_max_output_chars() -> usize {
    1500
}

fn default_max_reply_chars() -> usize {
    1600
}

impl WorkspaceSection {
    /// 转为核心层消费的不透明设置值
    pub fn to_settings(&self) -> WorkspaceSettings {
        WorkspaceSettings {
            heartbeat_interval: Duration::from_secs(self.heartbeat_interval_secs.max(1)),
            max_retries: self.max_retries,
            memory_capacity: self.memory_capacity.max(1),
            snippet_chars: self.snippet_chars,
            max_output_chars: self.max_output_chars,
            max_reply_chars: self.max_reply_chars,
        }
    }

    pub fn objective(&self) -> &str {
        self.objective.as_deref().unwrap_or(DEFAULT_OBJECTIVE)
    }
}

/// 从 config 目录加载配置，环境变量 PROACT__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 PROACT__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("PROACT")
            .separator("__")
            .try_parsing(true),
    );

    let c = builder.build()?;
    c.try_deserialize()
}

/// 系统指令：优先读取 config/prompts/system.txt，否则使用内置默认值
pub fn load_instructions() -> String {
    ["config/prompts/system.txt", "../config/prompts/system.txt"]
        .into_iter()
        .find_map(|p| std::fs::read_to_string(p).ok())
        .unwrap_or_else(|| DEFAULT_INSTRUCTIONS.to_string())
}

const DEFAULT_INSTRUCTIONS: &str = "You are a proactive autonomous workspace assistant replying over WhatsApp. \
Provide concise, accurate answers in a few sentences. Use Markdown sparingly. \
Always prefer real-time search over internal knowledge.";

//! 推理客户端抽象
//!
//! 所有后端（OpenAI 兼容 / Perplexity / Mock）实现 ReasoningClient：输入一段文本 prompt，返回文本内容。
//! 后端内部可能执行实时搜索；对编排层而言它是一个可能失败（错误、超时、内容异常）的黑盒。

use async_trait::async_trait;
use thiserror::Error;

/// 单次调用的返回内容
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Completion {
    pub content: String,
}

impl Completion {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}

/// 推理客户端错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LlmError {
    #[error("Request failed: {0}")]
    Request(String),

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("Completion has no choices")]
    NoChoices,
}

/// 推理客户端 trait
#[async_trait]
pub trait ReasoningClient: Send + Sync {
    /// 发送 prompt，返回文本内容
    async fn invoke(&self, prompt: &str) -> Result<Completion, LlmError>;

    /// 获取累计 token 使用统计：(prompt_tokens, completion_tokens, total_tokens)
    /// 默认返回 (0, 0, 0)，具体实现可覆盖
    fn token_usage(&self) -> (u64, u64, u64) {
        (0, 0, 0)
    }
}

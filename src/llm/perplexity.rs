//! Perplexity API 客户端（OpenAI 兼容格式）
//!
//! Perplexity 的 sonar 系列模型在服务端自带实时搜索，因此 tool_intent 为 search 的子任务无需额外工具。
//! - Base URL: https://api.perplexity.ai
//! - 模型: sonar-pro (默认)，可在配置中覆盖

use crate::llm::OpenAiClient;

/// Perplexity API 常量
pub const PERPLEXITY_BASE_URL: &str = "https://api.perplexity.ai";
pub const SONAR_PRO: &str = "sonar-pro";

/// 创建 Perplexity 客户端
///
/// - API Key 来自环境变量 `PERPLEXITY_API_KEY`
/// - 模型可通过 `model` 参数指定，缺省为 `sonar-pro`
pub fn create_perplexity_client(
    model: Option<&str>,
    instructions: &str,
    timeout_secs: u64,
) -> OpenAiClient {
    let api_key = std::env::var("PERPLEXITY_API_KEY").unwrap_or_else(|_| "pplx-placeholder".to_string());
    let model = model.unwrap_or(SONAR_PRO);

    OpenAiClient::new(Some(PERPLEXITY_BASE_URL), model, Some(api_key.as_str()))
        .with_instructions(instructions)
        .with_timeout(timeout_secs)
}

/// 是否配置了 Perplexity Key
pub fn has_perplexity_key() -> bool {
    std::env::var("PERPLEXITY_API_KEY").map(|k| !k.is_empty()).unwrap_or(false)
}

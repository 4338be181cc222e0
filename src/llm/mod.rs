//! 推理层：客户端抽象与实现（OpenAI 兼容 / Perplexity / Mock）

pub mod mock;
pub mod openai;
pub mod perplexity;
pub mod traits;

use std::sync::Arc;

use crate::config::AppConfig;

pub use mock::MockReasoningClient;
pub use openai::{OpenAiClient, TokenUsage};
pub use perplexity::{create_perplexity_client, has_perplexity_key, PERPLEXITY_BASE_URL, SONAR_PRO};
pub use traits::{Completion, LlmError, ReasoningClient};

/// 实际使用的推理后端
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Perplexity,
    OpenAi,
    Mock,
}

/// 按 provider 与可用的 API Key 选择后端；缺 Key 或未知 provider 时退回 Mock
pub fn select_backend(provider: &str, has_perplexity_key: bool, has_openai_key: bool) -> Backend {
    match provider.trim().to_lowercase().as_str() {
        "perplexity" if has_perplexity_key => Backend::Perplexity,
        "openai" if has_openai_key => Backend::OpenAi,
        _ => Backend::Mock,
    }
}

fn has_openai_key() -> bool {
    std::env::var("OPENAI_API_KEY").map(|k| !k.is_empty()).unwrap_or(false)
}

/// 根据配置与环境变量选择推理后端（Perplexity / OpenAI 兼容 / Mock）
pub fn create_client_from_config(cfg: &AppConfig, instructions: &str) -> Arc<dyn ReasoningClient> {
    let provider = cfg.llm.provider.as_str();
    let timeout = cfg.llm.timeouts.request;

    match select_backend(provider, has_perplexity_key(), has_openai_key()) {
        Backend::Perplexity => {
            tracing::info!("Using Perplexity reasoning client ({})", cfg.llm.model);
            Arc::new(create_perplexity_client(Some(&cfg.llm.model), instructions, timeout))
        }
        Backend::OpenAi => {
            tracing::info!("Using OpenAI-compatible reasoning client ({})", cfg.llm.model);
            Arc::new(
                OpenAiClient::new(cfg.llm.base_url.as_deref(), &cfg.llm.model, None)
                    .with_instructions(instructions)
                    .with_timeout(timeout),
            )
        }
        Backend::Mock if provider.eq_ignore_ascii_case("mock") => {
            tracing::info!("Using Mock reasoning client");
            Arc::new(MockReasoningClient::new())
        }
        Backend::Mock => {
            tracing::warn!(
                "No API key set for provider '{}', using Mock reasoning client",
                provider
            );
            Arc::new(MockReasoningClient::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_backend_with_keys() {
        assert_eq!(select_backend("perplexity", true, false), Backend::Perplexity);
        assert_eq!(select_backend(" Perplexity ", true, true), Backend::Perplexity);
        assert_eq!(select_backend("openai", false, true), Backend::OpenAi);
        assert_eq!(select_backend("mock", true, true), Backend::Mock);
    }

    #[test]
    fn test_select_backend_without_keys_falls_back_to_mock() {
        assert_eq!(select_backend("perplexity", false, true), Backend::Mock);
        assert_eq!(select_backend("openai", true, false), Backend::Mock);
        assert_eq!(select_backend("anthropic", true, true), Backend::Mock);
        assert_eq!(select_backend("", false, false), Backend::Mock);
    }

    #[tokio::test]
    async fn test_mock_provider_builds_working_client() {
        let mut cfg = AppConfig::default();
        cfg.llm.provider = "mock".into();
        let client = create_client_from_config(&cfg, "be brief");
        let reply = client.invoke("hello\nworld").await.unwrap();
        assert_eq!(reply.content, "Echo from Mock: hello");
        assert_eq!(client.token_usage(), (0, 0, 0));
    }
}

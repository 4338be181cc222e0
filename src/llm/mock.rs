//! Mock 推理客户端（用于测试与无 API Key 场景）
//!
//! 按脚本顺序返回预置回复或错误，并记录每一次收到的 prompt；脚本耗尽后回显 prompt 首行。

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::llm::{Completion, LlmError, ReasoningClient};

/// Mock 客户端：脚本化回复 + prompt 记录
#[derive(Debug, Default)]
pub struct MockReasoningClient {
    script: Mutex<VecDeque<Result<String, LlmError>>>,
    prompts: Mutex<Vec<String>>,
}

impl MockReasoningClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// 以一组文本回复初始化脚本
    pub fn with_replies<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let client = Self::new();
        for reply in replies {
            client.push_reply(reply);
        }
        client
    }

    pub fn push_reply(&self, reply: impl Into<String>) {
        self.script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(Ok(reply.into()));
    }

    pub fn push_error(&self, err: LlmError) {
        self.script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(Err(err));
    }

    /// 已收到的全部 prompt（按调用顺序）
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// 尚未消费的脚本条目数
    pub fn remaining(&self) -> usize {
        self.script.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

#[async_trait]
impl ReasoningClient for MockReasoningClient {
    async fn invoke(&self, prompt: &str) -> Result<Completion, LlmError> {
        self.prompts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(prompt.to_string());

        let next = self
            .script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();

        match next {
            Some(reply) => reply.map(Completion::new),
            None => {
                let first_line = prompt.lines().next().unwrap_or("(no input)");
                Ok(Completion::new(format!("Echo from Mock: {}", first_line)))
            }
        }
    }
}

//! Proact - 主动式自治工作区
//!
//! 给定一个高层目标：分解为原子子任务，逐个交给推理服务执行并自评，失败有界重试，
//! 每一步写入追加式事件日志，并按固定心跳推进、在完成后主动扩展待办。
//!
//! 模块划分：
//! - **agent**: 运行时组装（供各二进制入口调用）
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 编排器、心跳、诊断扫描、错误、优雅关闭
//! - **llm**: 推理客户端抽象与实现（OpenAI 兼容 / Perplexity / Mock）
//! - **memory**: 事件日志、工作快照、短期上下文记忆
//! - **plan**: 计划模型、容错 JSON 解析、目标分解
//! - **react**: 子任务执行、评估、重试控制

pub mod agent;
pub mod config;
pub mod core;
pub mod llm;
pub mod memory;
pub mod plan;
pub mod react;

pub use crate::core::{IncomingMessage, ProactiveScanner, Reply, Workspace, WorkspaceSettings};
pub use crate::plan::{Plan, Subtask, SubtaskStatus, ToolIntent};

//! 计划层：数据模型、容错 JSON 解析、目标分解与主动扩展

pub mod decomposer;
pub mod parse;
pub mod types;

pub use decomposer::Decomposer;
pub use parse::{parse_tolerant, Parsed};
pub use types::{Plan, Subtask, SubtaskStatus, ToolIntent};

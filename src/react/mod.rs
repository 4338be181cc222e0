//! 执行层：子任务执行器、结果评估（Critic）、有界重试控制器

pub mod critic;
pub mod executor;
pub mod retry;

pub use critic::{verdict_passes, Evaluator};
pub use executor::SubtaskExecutor;
pub use retry::RetryController;

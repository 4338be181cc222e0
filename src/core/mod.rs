//! 核心编排层：错误、心跳、主动编排器、只读诊断扫描、优雅关闭

pub mod error;
pub mod heartbeat;
pub mod orchestrator;
pub mod scanner;
pub mod shutdown;

pub use error::WorkspaceError;
pub use heartbeat::{guarded_tick, Heartbeat};
pub use orchestrator::{IncomingMessage, Reply, TickReport, Workspace, WorkspaceSettings};
pub use scanner::ProactiveScanner;
pub use shutdown::ShutdownManager;

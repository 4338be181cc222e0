//! 编排层错误类型
//!
//! 只有执行器会把错误跨组件抛出（Execution），由重试控制器计为失败尝试；
//! 存储类错误在调用处记 warn 后吞掉，快照损坏由诊断扫描器跳过本次心跳。

use thiserror::Error;

use crate::llm::LlmError;

#[derive(Error, Debug)]
pub enum WorkspaceError {
    #[error("Subtask {id} execution failed: {source}")]
    Execution {
        id: String,
        #[source]
        source: LlmError,
    },

    #[error("Storage I/O failed: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Corrupt snapshot: {0}")]
    CorruptSnapshot(String),

    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_execution_error_display() {
        let err = WorkspaceError::Execution {
            id: "t2".into(),
            source: LlmError::Timeout(60),
        };
        assert_eq!(err.to_string(), "Subtask t2 execution failed: Request timed out after 60s");
    }

    #[test]
    fn test_io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: WorkspaceError = io.into();
        assert!(matches!(err, WorkspaceError::Storage(_)));
    }
}

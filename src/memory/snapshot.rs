//! 工作快照（working buffer）
//!
//! 单个 JSON 对象 `{"current_plan": <Plan>, "last_updated": <unix 秒>}`，每次整体覆盖，后写者胜。
//! 写入先落到同目录临时文件再 rename，读者不会看到写了一半的快照。

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::core::WorkspaceError;
use crate::memory::unix_seconds;
use crate::plan::Plan;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub current_plan: Plan,
    pub last_updated: f64,
}

/// 快照存储：单文件，原子替换
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    /// 覆盖写入当前计划
    pub async fn save(&self, plan: &Plan) -> Result<(), WorkspaceError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        let snapshot = Snapshot {
            current_plan: plan.clone(),
            last_updated: unix_seconds(),
        };
        let body = serde_json::to_string_pretty(&snapshot)?;

        let tmp = self.temp_path();
        fs::write(&tmp, body).await?;
        if let Err(e) = fs::rename(&tmp, &self.path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        Ok(())
    }

    /// 读取快照：不存在返回 Ok(None)，无法解析返回 CorruptSnapshot
    pub async fn load(&self) -> Result<Option<Snapshot>, WorkspaceError> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(s) => s,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| WorkspaceError::CorruptSnapshot(e.to_string()))
    }
}

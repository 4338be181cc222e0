//! 心跳：固定间隔的 tick 驱动
//!
//! 两个心跳循环（主动推进 / 只读诊断）共用这里的节拍与保护：
//! - sleep 与 CancellationToken 竞争，收到停止信号立即返回；
//! - 单次 tick 在 catch_unwind 下运行，panic 只记日志，不影响后续 tick。

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures_util::FutureExt;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone)]
pub struct Heartbeat {
    interval: Duration,
    token: CancellationToken,
}

impl Heartbeat {
    pub fn new(interval: Duration, token: CancellationToken) -> Self {
        Self { interval, token }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_stopped(&self) -> bool {
        self.token.is_cancelled()
    }

    /// 等待一个间隔；返回 false 表示收到停止信号
    pub async fn sleep(&self) -> bool {
        tokio::select! {
            _ = self.token.cancelled() => false,
            _ = tokio::time::sleep(self.interval) => !self.token.is_cancelled(),
        }
    }
}

/// 运行一次 tick；panic 被捕获并记 warn，返回 None
pub async fn guarded_tick<F: Future>(name: &str, tick: F) -> Option<F::Output> {
    match AssertUnwindSafe(tick).catch_unwind().await {
        Ok(out) => Some(out),
        Err(panic) => {
            let msg = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            tracing::warn!("{} tick panicked: {}; continuing with next tick", name, msg);
            None
        }
    }
}

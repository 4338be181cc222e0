//! 停止信号
//!
//! 心跳循环默认永远运行；Ctrl+C / SIGTERM 取消共享的 CancellationToken，
//! 各循环持有其克隆，在下一次 sleep 处退出。

use tokio_util::sync::CancellationToken;

#[derive(Clone, Default)]
pub struct ShutdownManager {
    token: CancellationToken,
}

impl ShutdownManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// 交给心跳循环的 token
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// 取消全部心跳；source 仅用于日志
    pub fn shutdown(&self, source: &str) {
        if !self.token.is_cancelled() {
            tracing::info!("Received {}, stopping heartbeat...", source);
        }
        self.token.cancel();
    }

    /// 安装 Ctrl+C 与（unix 下）SIGTERM 处理
    pub fn install_signal_handlers(&self) {
        let manager = self.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                manager.shutdown("Ctrl+C");
            }
        });

        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            match signal(SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    let manager = self.clone();
                    tokio::spawn(async move {
                        sigterm.recv().await;
                        manager.shutdown("SIGTERM");
                    });
                }
                Err(e) => tracing::warn!("SIGTERM handler not installed: {}", e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shutdown_cancels_shared_token() {
        let manager = ShutdownManager::new();
        let token = manager.token();
        let other = manager.clone().token();
        assert!(!token.is_cancelled());

        manager.shutdown("test");
        assert!(token.is_cancelled());
        assert!(other.is_cancelled());

        // 重复触发无副作用
        manager.shutdown("test");
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn test_install_signal_handlers_leaves_token_live() {
        let manager = ShutdownManager::new();
        manager.install_signal_handlers();
        tokio::task::yield_now().await;
        assert!(!manager.token().is_cancelled());
    }
}

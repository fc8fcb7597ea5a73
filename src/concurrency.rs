//! 阻塞任务池
//! 限制同时进行的 CPU 密集型任务（密钥派生、密码哈希）数量，避免占满异步工作线程

use std::sync::Arc;
use tokio::sync::Semaphore;

/// 阻塞任务错误
#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    #[error("Blocking pool closed")]
    Closed,

    #[error("Blocking task failed: {0}")]
    Join(String),
}

/// 有界阻塞任务池
///
/// 每个任务在 `spawn_blocking` 上运行，并持有一个信号量许可直到任务结束；
/// 调用方被取消时许可仍随任务释放
#[derive(Clone)]
pub struct BlockingPool {
    permits: Arc<Semaphore>,
    limit: usize,
}

impl BlockingPool {
    /// 创建任务池（limit 至少为 1）
    pub fn new(limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            permits: Arc::new(Semaphore::new(limit)),
            limit,
        }
    }

    /// 在阻塞线程上执行任务
    pub async fn run<F, T>(&self, task: F) -> Result<T, PoolError>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| PoolError::Closed)?;

        tokio::task::spawn_blocking(move || {
            let _permit = permit;
            task()
        })
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Blocking task failed");
            PoolError::Join(e.to_string())
        })
    }

    /// 当前空闲许可数
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }
}

impl Default for BlockingPool {
    fn default() -> Self {
        Self::new(8)
    }
}

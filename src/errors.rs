use thiserror::Error;

pub type Result<T> = std::result::Result<T, PoolError>;

/// Ошибки, которые пул возвращает вызывающему коду
#[derive(Debug, Error)]
pub enum PoolError {
    #[error("invalid pool configuration: {reason}")]
    InvalidConfiguration { reason: String },

    #[error("task queue is closed")]
    QueueClosed,

    #[error("task queue is full")]
    QueueFull,

    #[error("timed out waiting for a free queue slot")]
    SubmitTimeout,

    #[error("failed to spawn worker thread: {0}")]
    WorkerSpawn(#[from] std::io::Error),
}

impl PoolError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration { reason: reason.into() }
    }
}

/// Сбой внутри задачи. Никогда не доходит до submit, только логируется воркером.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskError {
    #[error("task failed: {0}")]
    Failed(String),

    #[error("task panicked: {0}")]
    Panicked(String),
}

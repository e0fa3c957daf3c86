use super::errors::{PoolError, Result};
use std::{env, str::FromStr, time::Duration};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

/// Конфигурация пула потоков
#[derive(Debug, Clone)]
pub struct Config {
    pub num_workers: usize,
    /// `None` означает емкость, равную числу воркеров
    pub queue_capacity: Option<usize>,
    pub poll_interval: Duration,
    pub shutdown_timeout: Duration,
    pub thread_name_prefix: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            num_workers: num_cpus::get(),
            queue_capacity: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
            thread_name_prefix: "pool-worker".to_string(),
        }
    }
}

impl Config {
    pub fn new(num_workers: usize) -> Self {
        Self {
            num_workers,
            ..Default::default()
        }
    }

    pub fn cpu_bound() -> Self {
        Self::new(num_cpus::get())
    }

    pub fn io_bound() -> Self {
        Self::new(num_cpus::get() * 2)
    }

    /// Читает `POOL_WORKERS`, `POOL_QUEUE_CAPACITY`, `POOL_POLL_INTERVAL_MS`
    /// и `POOL_SHUTDOWN_TIMEOUT_MS`. Пустые и нечитаемые значения игнорируются.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(n) = env_var::<usize>("POOL_WORKERS") {
            config.num_workers = n;
        }
        if let Some(cap) = env_var::<usize>("POOL_QUEUE_CAPACITY") {
            config.queue_capacity = Some(cap);
        }
        if let Some(ms) = env_var::<u64>("POOL_POLL_INTERVAL_MS") {
            config.poll_interval = Duration::from_millis(ms);
        }
        if let Some(ms) = env_var::<u64>("POOL_SHUTDOWN_TIMEOUT_MS") {
            config.shutdown_timeout = Duration::from_millis(ms);
        }
        config
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = Some(capacity);
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    pub fn with_thread_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.queue_capacity.unwrap_or(self.num_workers)
    }

    pub fn validate(&self) -> Result<()> {
        if self.num_workers == 0 {
            return Err(PoolError::invalid("num_workers must be at least 1"));
        }
        if self.capacity() == 0 {
            return Err(PoolError::invalid("queue_capacity must be at least 1"));
        }
        if self.poll_interval.is_zero() {
            return Err(PoolError::invalid("poll_interval must be non-zero"));
        }
        if self.thread_name_prefix.as_bytes().contains(&0) {
            return Err(PoolError::invalid("thread_name_prefix must not contain null bytes"));
        }
        Ok(())
    }
}

fn env_var<T: FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

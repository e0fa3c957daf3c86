//! Пул потоков фиксированного размера с ограниченной очередью задач
//!
//! # Features
//! - Ограниченная FIFO-очередь: отправитель блокируется, пока нет места
//! - Изоляция ошибок и паник задач на границе воркера
//! - Ожидание завершения всей работы (блокирующее, с таймаутом и async)
//! - Graceful shutdown с таймаутом на каждый воркер
//! - Метрики пула

pub mod config;
pub mod errors;
pub mod model;
pub mod pool;
pub mod queue;
pub mod task;
pub mod worker;

pub use config::Config;
pub use errors::{PoolError, Result, TaskError};
pub use model::{PoolMetrics, ShutdownReport};
pub use pool::Pool;

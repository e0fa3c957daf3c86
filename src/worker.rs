use super::{
    errors::Result,
    queue::TaskQueue,
    task::Task,
};
use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};
use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    thread::{self, JoinHandle},
    time::Duration,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, trace, warn};

/// Счетчики, которые воркеры обновляют для метрик пула
#[derive(Debug, Default)]
pub struct WorkerStats {
    pub busy: AtomicUsize,
    pub live: AtomicUsize,
    pub completed: AtomicUsize,
    pub failed: AtomicUsize,
}

/// Все, что нужно циклу воркера
#[derive(Clone)]
pub struct WorkerContext {
    pub queue: Arc<TaskQueue>,
    pub stop: CancellationToken,
    pub stats: Arc<WorkerStats>,
    pub poll_interval: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    Joined,
    TimedOut,
}

/// Долгоживущий поток, разбирающий очередь
pub struct Worker {
    id: usize,
    handle: JoinHandle<()>,
    // Отключается, когда поток завершился: сам JoinHandle не умеет ждать с таймаутом
    exited: Receiver<()>,
}

impl Worker {
    pub fn spawn(id: usize, name: String, ctx: WorkerContext) -> Result<Self> {
        let (exit_tx, exited) = channel::bounded::<()>(0);
        let handle = thread::Builder::new()
            .name(name)
            .spawn(move || worker_loop(id, ctx, exit_tx))?;
        Ok(Self { id, handle, exited })
    }

    #[inline]
    pub fn id(&self) -> usize {
        self.id
    }

    /// Ждет завершения потока не дольше `timeout`. Зависший поток отсоединяется.
    pub fn join_timeout(self, timeout: Duration) -> JoinOutcome {
        match self.exited.recv_timeout(timeout) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                if self.handle.join().is_err() {
                    // Паники задач перехватываются, сюда попадает только сбой самого цикла
                    error!(worker = self.id, "worker thread panicked");
                }
                JoinOutcome::Joined
            }
            Err(RecvTimeoutError::Timeout) => {
                warn!(
                    worker = self.id,
                    timeout_ms = timeout.as_millis() as u64,
                    "worker did not terminate within join timeout"
                );
                JoinOutcome::TimedOut
            }
        }
    }
}

/// Уменьшает счетчик очереди при любом исходе, включая размотку стека
struct DoneGuard<'a> {
    queue: &'a TaskQueue,
    stats: &'a WorkerStats,
}

impl Drop for DoneGuard<'_> {
    fn drop(&mut self) {
        self.stats.busy.fetch_sub(1, Ordering::Relaxed);
        self.queue.mark_done();
    }
}

/// Уменьшает число живых воркеров при выходе из потока
struct LiveGuard<'a>(&'a WorkerStats);

impl Drop for LiveGuard<'_> {
    fn drop(&mut self) {
        self.0.live.fetch_sub(1, Ordering::AcqRel);
    }
}

fn worker_loop(id: usize, ctx: WorkerContext, exit_tx: Sender<()>) {
    let _exit = exit_tx;
    ctx.stats.live.fetch_add(1, Ordering::AcqRel);
    let _live = LiveGuard(&ctx.stats);
    debug!(worker = id, "worker started");

    loop {
        match ctx.queue.dequeue(ctx.poll_interval) {
            Some(task) => execute(id, &ctx, task),
            None => {
                if ctx.stop.is_cancelled() {
                    break;
                }
            }
        }
    }

    debug!(worker = id, "worker stopped");
}

fn execute(worker: usize, ctx: &WorkerContext, task: Task) {
    ctx.stats.busy.fetch_add(1, Ordering::Relaxed);
    let _done = DoneGuard {
        queue: &ctx.queue,
        stats: &ctx.stats,
    };

    let task_id = task.id();
    trace!(worker, task = task_id, "executing task");
    match task.run() {
        Ok(()) => {
            ctx.stats.completed.fetch_add(1, Ordering::Relaxed);
        }
        Err(err) => {
            ctx.stats.failed.fetch_add(1, Ordering::Relaxed);
            error!(worker, task = task_id, error = %err, "task failed");
        }
    }
}

use super::{
    config::Config,
    errors::Result,
    model::{PoolMetrics, ShutdownReport},
    queue::TaskQueue,
    task::{Task, TaskOutcome},
    worker::{JoinOutcome, Worker, WorkerContext, WorkerStats},
};
use std::{
    future::Future,
    sync::{
        atomic::{AtomicU64, AtomicUsize, Ordering},
        Arc, Mutex, PoisonError,
    },
    time::Duration,
};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};


/// Пул с фиксированным числом потоков и ограниченной очередью задач.
///
/// Отправка блокируется, пока очередь заполнена. Ошибки и паники задач
/// логируются воркером и не доходят до вызывающего кода.
pub struct Pool {
    queue: Arc<TaskQueue>,
    stop: CancellationToken,
    stats: Arc<WorkerStats>,
    workers: Mutex<Vec<Worker>>,
    // Держится весь shutdown: повторный вызов ждет окончания первого
    shutdown_lock: Mutex<()>,
    next_task_id: AtomicU64,
    submitted: AtomicUsize,
    num_workers: usize,
    config: Config,
}

impl Pool {
    pub fn new(num_workers: usize) -> Result<Self> {
        Self::with_config(Config::new(num_workers))
    }

    pub fn with_config(config: Config) -> Result<Self> {
        config.validate()?;

        let queue = Arc::new(TaskQueue::new(config.capacity()));
        let stop = CancellationToken::new();
        let stats = Arc::new(WorkerStats::default());
        let ctx = WorkerContext {
            queue: queue.clone(),
            stop: stop.clone(),
            stats: stats.clone(),
            poll_interval: config.poll_interval,
        };

        let mut workers = Vec::with_capacity(config.num_workers);
        for id in 0..config.num_workers {
            let name = format!("{}-{}", config.thread_name_prefix, id);
            match Worker::spawn(id, name, ctx.clone()) {
                Ok(worker) => workers.push(worker),
                Err(err) => {
                    // Уже запущенные воркеры не должны пережить неудачный конструктор
                    stop.cancel();
                    queue.close();
                    for worker in workers {
                        worker.join_timeout(config.shutdown_timeout);
                    }
                    return Err(err);
                }
            }
        }

        info!(
            workers = config.num_workers,
            capacity = queue.capacity(),
            "pool started"
        );

        Ok(Self {
            queue,
            stop,
            stats,
            workers: Mutex::new(workers),
            shutdown_lock: Mutex::new(()),
            next_task_id: AtomicU64::new(0),
            submitted: AtomicUsize::new(0),
            num_workers: config.num_workers,
            config,
        })
    }

    #[inline]
    fn next_id(&self) -> u64 {
        self.next_task_id.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    fn accepted(&self, res: Result<()>) -> Result<()> {
        if res.is_ok() {
            self.submitted.fetch_add(1, Ordering::Relaxed);
        }
        res
    }

    /// Ставит задачу в очередь, блокируясь, пока нет свободного места
    pub fn submit<F, R>(&self, f: F) -> Result<()>
    where
        F: FnOnce() -> R + Send + 'static,
        R: TaskOutcome,
    {
        self.accepted(self.queue.enqueue(Task::new(self.next_id(), f)))
    }

    pub fn submit_timeout<F, R>(&self, f: F, timeout: Duration) -> Result<()>
    where
        F: FnOnce() -> R + Send + 'static,
        R: TaskOutcome,
    {
        self.accepted(self.queue.enqueue_timeout(Task::new(self.next_id(), f), timeout))
    }

    /// Не блокируется: при заполненной очереди возвращает `QueueFull`
    pub fn try_submit<F, R>(&self, f: F) -> Result<()>
    where
        F: FnOnce() -> R + Send + 'static,
        R: TaskOutcome,
    {
        self.accepted(self.queue.try_enqueue(Task::new(self.next_id(), f)))
    }

    /// Future выполняется до завершения в потоке воркера, занимая его целиком
    pub fn submit_future<Fut, R>(&self, fut: Fut) -> Result<()>
    where
        Fut: Future<Output = R> + Send + 'static,
        R: TaskOutcome,
    {
        self.accepted(self.queue.enqueue(Task::from_future(self.next_id(), fut)))
    }

    /// По задаче на элемент, в порядке `items`. Результаты не собираются:
    /// если они нужны, `f` пишет их сама в синхронизированное хранилище.
    pub fn map<T, I, F, R>(&self, f: F, items: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        T: Send + 'static,
        F: Fn(T) -> R + Send + Sync + 'static,
        R: TaskOutcome,
    {
        let f = Arc::new(f);
        for item in items {
            let f = Arc::clone(&f);
            self.submit(move || f(item))?;
        }
        Ok(())
    }

    /// Блокирует, пока не завершены все отправленные задачи,
    /// включая отправленные во время ожидания
    pub fn wait_completion(&self) {
        self.queue.wait_all();
    }

    pub fn wait_completion_timeout(&self, timeout: Duration) -> bool {
        self.queue.wait_all_timeout(timeout)
    }

    pub async fn wait_completion_async(&self) {
        self.queue.wait_all_async().await;
    }

    /// Останавливает пул.
    ///
    /// При `wait = true` сначала дожидается всей отправленной работы. Затем поднимает
    /// сигнал остановки, закрывает очередь и ждет каждый воркер не дольше `timeout`.
    /// Не паникует и не возвращает ошибок: зависшие воркеры попадают в отчет и лог.
    /// Параллельный или повторный вызов дожидается окончания первого и возвращает пустой отчет.
    pub fn shutdown(&self, wait: bool, timeout: Duration) -> ShutdownReport {
        let _shutdown = self.shutdown_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let workers = std::mem::take(
            &mut *self.workers.lock().unwrap_or_else(PoisonError::into_inner),
        );
        if workers.is_empty() {
            return ShutdownReport::default();
        }

        info!(wait, timeout_ms = timeout.as_millis() as u64, "pool shutting down");
        if wait {
            self.wait_completion();
        }

        self.stop.cancel();
        self.queue.close();

        let mut report = ShutdownReport::default();
        for worker in workers {
            let id = worker.id();
            match worker.join_timeout(timeout) {
                JoinOutcome::Joined => report.joined.push(id),
                JoinOutcome::TimedOut => report.timed_out.push(id),
            }
        }

        // Зависший воркер может еще разбирать очередь, его задачи не трогаем
        if report.timed_out.is_empty() {
            report.abandoned_tasks = self.queue.drain_abandoned();
            if report.abandoned_tasks > 0 {
                warn!(abandoned = report.abandoned_tasks, "queued tasks dropped unexecuted");
            }
        }

        info!(
            joined = report.joined.len(),
            timed_out = report.timed_out.len(),
            "pool stopped"
        );
        report
    }

    #[inline]
    pub fn is_shutdown(&self) -> bool {
        self.stop.is_cancelled()
    }

    #[inline]
    pub fn num_workers(&self) -> usize {
        self.num_workers
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[inline]
    pub fn metrics(&self) -> PoolMetrics {
        PoolMetrics {
            workers: self.num_workers,
            live_workers: self.stats.live.load(Ordering::Relaxed),
            busy_workers: self.stats.busy.load(Ordering::Relaxed),
            queued_tasks: self.queue.len(),
            queue_capacity: self.queue.capacity(),
            pending_tasks: self.queue.pending(),
            submitted_tasks: self.submitted.load(Ordering::Relaxed),
            completed_tasks: self.stats.completed.load(Ordering::Relaxed),
            failed_tasks: self.stats.failed.load(Ordering::Relaxed),
        }
    }
}

impl Drop for Pool {
    fn drop(&mut self) {
        self.shutdown(false, self.config.shutdown_timeout);
    }
}

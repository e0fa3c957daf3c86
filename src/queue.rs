use super::{
    errors::{PoolError, Result},
    task::Task,
};
use crossbeam::channel::{self, Receiver, RecvTimeoutError, Select, Sender, TrySendError};
use std::{
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Condvar, Mutex, PoisonError,
    },
    time::{Duration, Instant},
};
use tokio::sync::Notify;

/// Ограниченная FIFO-очередь задач со счетчиком незавершенной работы.
///
/// Счетчик увеличивается при постановке задачи и уменьшается в [`TaskQueue::mark_done`],
/// когда воркер закончил ее выполнение. Ноль означает, что вся отправленная работа сделана.
pub struct TaskQueue {
    sender: Sender<Task>,
    receiver: Receiver<Task>,
    capacity: usize,
    pending: AtomicUsize,
    closed: AtomicBool,
    // Отправитель дропается в close(), после чего close_rx сразу готов к recv
    close_tx: Mutex<Option<Sender<()>>>,
    close_rx: Receiver<()>,
    idle_lock: Mutex<()>,
    all_done: Condvar,
    all_done_notify: Notify,
}

impl TaskQueue {
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = channel::bounded(capacity);
        let (close_tx, close_rx) = channel::bounded(0);
        Self {
            sender,
            receiver,
            capacity,
            pending: AtomicUsize::new(0),
            closed: AtomicBool::new(false),
            close_tx: Mutex::new(Some(close_tx)),
            close_rx,
            idle_lock: Mutex::new(()),
            all_done: Condvar::new(),
            all_done_notify: Notify::new(),
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Задачи в канале, еще не забранные воркерами
    #[inline]
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    /// Поставлено, но еще не завершено
    #[inline]
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::Acquire)
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Блокирует, пока в очереди нет места
    pub fn enqueue(&self, task: Task) -> Result<()> {
        self.send(task, None)
    }

    pub fn enqueue_timeout(&self, task: Task, timeout: Duration) -> Result<()> {
        self.send(task, Some(Instant::now() + timeout))
    }

    pub fn try_enqueue(&self, task: Task) -> Result<()> {
        if self.is_closed() {
            return Err(PoolError::QueueClosed);
        }
        self.pending.fetch_add(1, Ordering::AcqRel);
        match self.sender.try_send(task) {
            Ok(()) => Ok(()),
            Err(err) => {
                self.retire();
                match err {
                    TrySendError::Full(_) => Err(PoolError::QueueFull),
                    TrySendError::Disconnected(_) => Err(PoolError::QueueClosed),
                }
            }
        }
    }

    fn send(&self, task: Task, deadline: Option<Instant>) -> Result<()> {
        if self.is_closed() {
            return Err(PoolError::QueueClosed);
        }
        // Счетчик растет до отправки, иначе mark_done воркера может его обогнать
        self.pending.fetch_add(1, Ordering::AcqRel);

        let mut sel = Select::new();
        let send_idx = sel.send(&self.sender);
        let close_idx = sel.recv(&self.close_rx);

        let oper = match deadline {
            Some(deadline) => match sel.select_deadline(deadline) {
                Ok(oper) => oper,
                Err(_) => {
                    self.retire();
                    return Err(PoolError::SubmitTimeout);
                }
            },
            None => sel.select(),
        };

        let outcome = match oper.index() {
            i if i == send_idx => oper
                .send(&self.sender, task)
                .map_err(|_| PoolError::QueueClosed),
            i => {
                debug_assert_eq!(i, close_idx);
                let _ = oper.recv(&self.close_rx);
                Err(PoolError::QueueClosed)
            }
        };

        if outcome.is_err() {
            self.retire();
        }
        outcome
    }

    /// `None` по таймауту: обычный путь опроса, не ошибка
    pub fn dequeue(&self, timeout: Duration) -> Option<Task> {
        match self.receiver.recv_timeout(timeout) {
            Ok(task) => Some(task),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Вызывается ровно один раз на каждую забранную задачу
    pub fn mark_done(&self) {
        self.retire();
    }

    fn retire(&self) {
        let prev = self.pending.fetch_sub(1, Ordering::AcqRel);
        debug_assert!(prev > 0, "completion counter underflow");
        if prev == 1 {
            // Берем lock, чтобы ожидающий не проспал уведомление между проверкой и wait
            let _guard = self.idle_lock.lock().unwrap_or_else(PoisonError::into_inner);
            self.all_done.notify_all();
            self.all_done_notify.notify_waiters();
        }
    }

    pub fn wait_all(&self) {
        let mut guard = self.idle_lock.lock().unwrap_or_else(PoisonError::into_inner);
        while self.pending() > 0 {
            guard = self
                .all_done
                .wait(guard)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// `false`, если за `timeout` работа не закончилась
    pub fn wait_all_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut guard = self.idle_lock.lock().unwrap_or_else(PoisonError::into_inner);
        while self.pending() > 0 {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            guard = self
                .all_done
                .wait_timeout(guard, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
        true
    }

    pub async fn wait_all_async(&self) {
        loop {
            let notified = self.all_done_notify.notified();
            tokio::pin!(notified);
            // Регистрируемся до проверки счетчика, чтобы не потерять notify_waiters
            notified.as_mut().enable();
            if self.pending() == 0 {
                return;
            }
            notified.await;
        }
    }

    /// Навсегда закрывает очередь для новых задач и будит заблокированных отправителей
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.close_tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }

    /// Выбрасывает задачи, которые никто уже не заберет. Возвращает их число.
    pub fn drain_abandoned(&self) -> usize {
        let mut abandoned = 0;
        while let Ok(task) = self.receiver.try_recv() {
            drop(task);
            self.retire();
            abandoned += 1;
        }
        abandoned
    }
}

use super::errors::TaskError;
use std::{
    any::Any,
    fmt::{self, Display},
    future::Future,
    panic::{self, AssertUnwindSafe},
};

pub type TaskResult = Result<(), TaskError>;

pub type Job = Box<dyn FnOnce() -> TaskResult + Send + 'static>;

/// То, что может вернуть замыкание задачи: `()` или `Result<(), E>`
pub trait TaskOutcome {
    fn into_task_result(self) -> TaskResult;
}

impl TaskOutcome for () {
    #[inline(always)]
    fn into_task_result(self) -> TaskResult {
        Ok(())
    }
}

impl<E: Display> TaskOutcome for Result<(), E> {
    #[inline]
    fn into_task_result(self) -> TaskResult {
        self.map_err(|e| TaskError::Failed(e.to_string()))
    }
}

/// Единица работы в очереди
pub struct Task {
    id: u64,
    job: Job,
}

impl Task {
    pub fn new<F, R>(id: u64, f: F) -> Self
    where
        F: FnOnce() -> R + Send + 'static,
        R: TaskOutcome,
    {
        Self {
            id,
            job: Box::new(move || f().into_task_result()),
        }
    }

    /// Future выполняется до конца прямо в потоке воркера
    pub fn from_future<Fut, R>(id: u64, fut: Fut) -> Self
    where
        Fut: Future<Output = R> + Send + 'static,
        R: TaskOutcome,
    {
        Self::new(id, move || futures::executor::block_on(fut))
    }

    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Запускает задачу, перехватывая панику. Задача потребляется в любом случае.
    pub fn run(self) -> TaskResult {
        let job = self.job;
        match panic::catch_unwind(AssertUnwindSafe(job)) {
            Ok(result) => result,
            Err(payload) => Err(TaskError::Panicked(panic_message(payload.as_ref()))),
        }
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task").field("id", &self.id).finish_non_exhaustive()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

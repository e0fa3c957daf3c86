#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolMetrics {
    pub workers: usize,
    pub live_workers: usize,
    pub busy_workers: usize,
    pub queued_tasks: usize,
    pub queue_capacity: usize,
    pub pending_tasks: usize,
    pub submitted_tasks: usize,
    pub completed_tasks: usize,
    pub failed_tasks: usize,
}

impl PoolMetrics {
    pub fn utilization(&self) -> f64 {
        if self.live_workers == 0 {
            return 0.0;
        }
        self.busy_workers as f64 / self.live_workers as f64
    }

    /// Доля занятых слотов очереди: 1.0 означает, что отправители сейчас блокируются
    pub fn queue_pressure(&self) -> f64 {
        if self.queue_capacity == 0 {
            return 0.0;
        }
        self.queued_tasks as f64 / self.queue_capacity as f64
    }

    pub fn success_rate(&self) -> f64 {
        let total = self.completed_tasks + self.failed_tasks;
        if total == 0 {
            return 1.0;
        }
        self.completed_tasks as f64 / total as f64
    }
}


/// Итог остановки пула
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShutdownReport {
    pub joined: Vec<usize>,
    pub timed_out: Vec<usize>,
    /// Задачи, оставшиеся в очереди после остановки воркеров и выброшенные без выполнения
    pub abandoned_tasks: usize,
}

impl ShutdownReport {
    pub fn is_clean(&self) -> bool {
        self.timed_out.is_empty() && self.abandoned_tasks == 0
    }

    pub fn total(&self) -> usize {
        self.joined.len() + self.timed_out.len()
    }
}

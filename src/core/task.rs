//! Prioritized task model.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::Duration;

use crate::core::error::TaskError;

/// Unique task identifier, monotonic within the process lifetime.
pub type TaskId = u64;

/// Boxed action a task runs exactly once.
pub type TaskAction = Box<dyn FnOnce() -> Result<(), TaskError> + Send + 'static>;

static NEXT_TASK_ID: AtomicU64 = AtomicU64::new(1);

fn next_task_id() -> TaskId {
    NEXT_TASK_ID.fetch_add(1, Ordering::Relaxed)
}

/// A single prioritized unit of work.
///
/// Priority and the interruption outcome are fixed at creation; the task is
/// consumed by [`Task::execute`], so execution is attempted exactly once.
pub struct Task {
    id: TaskId,
    priority: u8,
    duration: Duration,
    interrupt: bool,
    action: TaskAction,
}

impl Task {
    /// Lowest selectable priority.
    pub const MIN_PRIORITY: u8 = 1;
    /// Highest selectable priority (most urgent).
    pub const MAX_PRIORITY: u8 = 10;

    /// Create a task with the standard simulated action: a task marked for
    /// interruption signals [`TaskError::Interrupted`] immediately, any other
    /// task holds its worker for `duration` before completing.
    #[must_use]
    pub fn simulated(priority: u8, duration: Duration, interrupt: bool) -> Self {
        let action: TaskAction = Box::new(move || {
            if interrupt {
                return Err(TaskError::Interrupted);
            }
            thread::sleep(duration);
            Ok(())
        });
        Self::with_action(priority, duration, interrupt, action)
    }

    /// Create a task around a caller-supplied action.
    #[must_use]
    pub fn with_action(priority: u8, duration: Duration, interrupt: bool, action: TaskAction) -> Self {
        debug_assert!(
            (Self::MIN_PRIORITY..=Self::MAX_PRIORITY).contains(&priority),
            "priority out of range"
        );
        Self {
            id: next_task_id(),
            priority,
            duration,
            interrupt,
            action,
        }
    }

    /// Process-unique identifier assigned at creation.
    #[must_use]
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Priority level in `1..=10`, higher = more urgent.
    #[must_use]
    pub fn priority(&self) -> u8 {
        self.priority
    }

    /// Simulated execution duration.
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Whether this task was marked for interruption at creation time.
    #[must_use]
    pub fn will_interrupt(&self) -> bool {
        self.interrupt
    }

    /// Run the task's action, consuming the task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::Interrupted`] when the action signals
    /// interruption instead of completing normally.
    pub fn execute(self) -> Result<(), TaskError> {
        (self.action)()
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("priority", &self.priority)
            .field("duration", &self.duration)
            .field("interrupt", &self.interrupt)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique_and_monotonic() {
        let a = Task::simulated(5, Duration::from_millis(1), false);
        let b = Task::simulated(5, Duration::from_millis(1), false);
        assert!(b.id() > a.id());
    }

    #[test]
    fn interrupted_task_signals_instead_of_completing() {
        let task = Task::simulated(3, Duration::from_millis(50), true);
        assert!(task.will_interrupt());
        let started = std::time::Instant::now();
        assert!(matches!(task.execute(), Err(TaskError::Interrupted)));
        // Interruption fires before the simulated work, not after.
        assert!(started.elapsed() < Duration::from_millis(50));
    }

    #[test]
    fn normal_task_holds_the_caller_for_its_duration() {
        let task = Task::simulated(3, Duration::from_millis(30), false);
        let started = std::time::Instant::now();
        assert!(task.execute().is_ok());
        assert!(started.elapsed() >= Duration::from_millis(30));
    }
}

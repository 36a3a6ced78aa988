//! Task factory: expands a batch descriptor into concrete tasks.

use std::time::Duration;

use rand::Rng;

use crate::core::descriptor::BatchDescriptor;
use crate::core::task::Task;

/// Turns a [`BatchDescriptor`] into a list of randomized [`Task`]s.
pub struct TaskFactory;

impl TaskFactory {
    /// Produce exactly `descriptor.count()` tasks.
    ///
    /// Duration is drawn uniformly from `[min, max]` (a degenerate range is a
    /// fixed value), priority uniformly from `1..=10`, and interruption is
    /// decided independently per task with probability `chance / 100`. The
    /// randomness source is not cryptographically strong and does not need to
    /// be.
    #[must_use]
    pub fn expand(descriptor: &BatchDescriptor) -> Vec<Task> {
        let mut rng = rand::rng();
        let mut tasks = Vec::with_capacity(descriptor.count() as usize);
        for _ in 0..descriptor.count() {
            let duration_ms =
                rng.random_range(descriptor.min_duration_ms()..=descriptor.max_duration_ms());
            let priority = rng.random_range(Task::MIN_PRIORITY..=Task::MAX_PRIORITY);
            // Integer draw keeps chance==0 and chance==100 exact.
            let interrupt = rng.random_range(1..=100_u32) <= descriptor.interruption_chance();
            tasks.push(Task::simulated(
                priority,
                Duration::from_millis(duration_ms),
                interrupt,
            ));
        }
        tasks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn produces_exactly_count_tasks() {
        let desc = BatchDescriptor::new(25, 50, 10, 20);
        assert_eq!(TaskFactory::expand(&desc).len(), 25);

        let empty = BatchDescriptor::new(0, 50, 10, 20);
        assert!(TaskFactory::expand(&empty).is_empty());
    }

    #[test]
    fn zero_chance_marks_no_task_for_interruption() {
        let desc = BatchDescriptor::new(50, 0, 10, 20);
        assert!(TaskFactory::expand(&desc).iter().all(|t| !t.will_interrupt()));
    }

    #[test]
    fn full_chance_marks_every_task_for_interruption() {
        let desc = BatchDescriptor::new(50, 100, 10, 20);
        assert!(TaskFactory::expand(&desc).iter().all(Task::will_interrupt));
    }

    #[test]
    fn degenerate_range_yields_fixed_duration() {
        let desc = BatchDescriptor::new(20, 0, 75, 75);
        assert!(TaskFactory::expand(&desc)
            .iter()
            .all(|t| t.duration() == Duration::from_millis(75)));
    }

    #[test]
    fn durations_and_priorities_stay_in_bounds() {
        let desc = BatchDescriptor::new(100, 25, 10, 30);
        for task in TaskFactory::expand(&desc) {
            assert!((10..=30).contains(&u64::try_from(task.duration().as_millis()).unwrap()));
            assert!((Task::MIN_PRIORITY..=Task::MAX_PRIORITY).contains(&task.priority()));
        }
    }
}

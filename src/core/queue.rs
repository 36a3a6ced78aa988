//! Per-priority FIFO queue backing the scheduler.

use std::collections::{BTreeMap, VecDeque};

use crate::core::task::Task;

/// Sparse map from priority level to the FIFO of tasks waiting at that level.
///
/// The highest populated level always wins; within a level tasks leave in
/// insertion order. A level's entry is created lazily on the first push and
/// removed as soon as its queue drains. Not internally synchronized: the
/// scheduler guards it with its single state mutex.
#[derive(Debug, Default)]
pub struct PriorityQueue {
    levels: BTreeMap<u8, VecDeque<Task>>,
    len: usize,
}

impl PriorityQueue {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a task to the FIFO for its priority level.
    pub fn push(&mut self, task: Task) {
        self.levels.entry(task.priority()).or_default().push_back(task);
        self.len += 1;
    }

    /// Remove and return the oldest task at the highest populated level, or
    /// `None` when no task is queued.
    pub fn pop(&mut self) -> Option<Task> {
        let level = *self.levels.keys().next_back()?;
        let queue = self.levels.get_mut(&level)?;
        let task = queue.pop_front()?;
        if queue.is_empty() {
            self.levels.remove(&level);
        }
        self.len -= 1;
        Some(task)
    }

    /// `true` when no task is queued at any level.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Total number of queued tasks across all levels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Per-level `(priority, depth)` pairs, highest priority first.
    #[must_use]
    pub fn depths(&self) -> Vec<(u8, usize)> {
        self.levels.iter().rev().map(|(p, q)| (*p, q.len())).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn task(priority: u8) -> Task {
        Task::simulated(priority, Duration::from_millis(1), false)
    }

    #[test]
    fn pops_highest_priority_first() {
        let mut queue = PriorityQueue::new();
        queue.push(task(2));
        queue.push(task(9));
        queue.push(task(5));

        assert_eq!(queue.pop().unwrap().priority(), 9);
        assert_eq!(queue.pop().unwrap().priority(), 5);
        assert_eq!(queue.pop().unwrap().priority(), 2);
        assert!(queue.pop().is_none());
    }

    #[test]
    fn fifo_within_a_level() {
        let mut queue = PriorityQueue::new();
        let first = task(4);
        let second = task(4);
        let third = task(4);
        let ids = [first.id(), second.id(), third.id()];
        queue.push(first);
        queue.push(second);
        queue.push(third);

        for expected in ids {
            assert_eq!(queue.pop().unwrap().id(), expected);
        }
    }

    #[test]
    fn mixed_sequence_never_increases_priority() {
        let mut queue = PriorityQueue::new();
        for priority in [3, 7, 1, 7, 10, 3, 5, 10, 1] {
            queue.push(task(priority));
        }

        let mut last = u8::MAX;
        while let Some(task) = queue.pop() {
            assert!(task.priority() <= last);
            last = task.priority();
        }
    }

    #[test]
    fn drained_levels_are_removed() {
        let mut queue = PriorityQueue::new();
        queue.push(task(8));
        queue.push(task(3));
        assert_eq!(queue.depths(), vec![(8, 1), (3, 1)]);

        queue.pop();
        assert_eq!(queue.depths(), vec![(3, 1)]);

        queue.pop();
        assert!(queue.is_empty());
        assert_eq!(queue.len(), 0);
        assert!(queue.depths().is_empty());
    }

    #[test]
    fn len_tracks_pushes_and_pops() {
        let mut queue = PriorityQueue::new();
        for priority in 1..=10 {
            queue.push(task(priority));
        }
        assert_eq!(queue.len(), 10);
        queue.pop();
        queue.pop();
        assert_eq!(queue.len(), 8);
    }
}

//! Activation tasks and their reuse pool.
//!
//! A task is the three invokers one top-level `activate_node(.., true)` call
//! writes into. Tasks are fungible, so the pool is a plain free list capped
//! at a fixed capacity; returns beyond the cap are dropped.

use crate::engine::ComponentId;

use super::invoker::{Invoker, Stage};

// =============================================================================
// Activate Task
// =============================================================================

pub struct ActivateTask {
    pub preload: Invoker,
    pub on_load: Invoker,
    pub on_enable: Invoker,
}

impl Default for ActivateTask {
    fn default() -> Self {
        Self::new()
    }
}

impl ActivateTask {
    pub fn new() -> Self {
        Self {
            preload: Invoker::new(Stage::Preload),
            on_load: Invoker::new(Stage::OnLoad),
            on_enable: Invoker::new(Stage::OnEnable),
        }
    }

    pub fn invoker(&self, stage: Stage) -> &Invoker {
        match stage {
            Stage::Preload => &self.preload,
            Stage::OnLoad => &self.on_load,
            Stage::OnEnable => &self.on_enable,
        }
    }

    pub fn invoker_mut(&mut self, stage: Stage) -> &mut Invoker {
        match stage {
            Stage::Preload => &mut self.preload,
            Stage::OnLoad => &mut self.on_load,
            Stage::OnEnable => &mut self.on_enable,
        }
    }

    /// Drop pending entries matching `cancel` from all three invokers.
    pub fn cancel_where(&mut self, mut cancel: impl FnMut(ComponentId) -> bool) -> usize {
        self.preload.cancel_where(&mut cancel)
            + self.on_load.cancel_where(&mut cancel)
            + self.on_enable.cancel_where(&mut cancel)
    }

    pub fn clear(&mut self) {
        self.preload.clear();
        self.on_load.clear();
        self.on_enable.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.preload.is_empty() && self.on_load.is_empty() && self.on_enable.is_empty()
    }
}

// =============================================================================
// Task Pool
// =============================================================================

pub struct TaskPool {
    tasks: Vec<ActivateTask>,
    capacity: usize,
}

impl TaskPool {
    pub fn new(capacity: usize) -> Self {
        Self {
            tasks: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Pop a pooled task or build a fresh one.
    pub fn get(&mut self) -> ActivateTask {
        self.tasks.pop().unwrap_or_default()
    }

    /// Clear a task and keep it if the pool has room.
    pub fn put(&mut self, mut task: ActivateTask) {
        if self.tasks.len() < self.capacity {
            task.clear();
            self.tasks.push(task);
        } else {
            tracing::trace!(capacity = self.capacity, "task pool full, dropping task");
        }
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Registry;

    #[test]
    fn test_pool_reuse() {
        let mut pool = TaskPool::new(4);
        assert!(pool.is_empty());

        let task = pool.get();
        pool.put(task);
        assert_eq!(pool.len(), 1);

        let _task = pool.get();
        assert!(pool.is_empty());
    }

    #[test]
    fn test_pool_is_bounded() {
        let mut pool = TaskPool::new(2);

        let tasks: Vec<ActivateTask> = (0..5).map(|_| pool.get()).collect();
        for task in tasks {
            pool.put(task);
        }

        assert_eq!(pool.len(), 2);
        assert_eq!(pool.capacity(), 2);
    }

    #[test]
    fn test_zero_capacity_never_pools() {
        let mut pool = TaskPool::new(0);
        let task = pool.get();
        pool.put(task);
        assert!(pool.is_empty());
    }

    #[test]
    fn test_returned_tasks_are_cleared() {
        let mut reg = Registry::new();
        let comp = ComponentId::from_raw(reg.insert(()));

        let mut pool = TaskPool::new(1);
        let mut task = pool.get();
        task.preload.add(comp);
        task.on_enable.add(comp);
        assert!(!task.is_empty());

        pool.put(task);
        let task = pool.get();
        assert!(task.is_empty());
    }

    #[test]
    fn test_cancel_across_stages() {
        let mut reg = Registry::new();
        let a = ComponentId::from_raw(reg.insert(()));
        let b = ComponentId::from_raw(reg.insert(()));

        let mut task = ActivateTask::new();
        task.preload.add(a);
        task.on_load.add(a);
        task.on_load.add(b);
        task.on_enable.add(a);

        assert_eq!(task.cancel_where(|comp| comp == a), 3);
        assert!(task.invoker(Stage::Preload).is_empty());
        assert_eq!(task.invoker(Stage::OnLoad).pending(), &[b]);
    }
}

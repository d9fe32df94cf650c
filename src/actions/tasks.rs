//! Task and Subtask Actions
//!
//! Subtask create/update follow the remote-confirm-then-invalidate flow;
//! the position batches are the persistence path of the reordering engine
//! and roll the whole list back when the write fails.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{DomainError, DomainResult, Subtask, Task};
use crate::mutation::OptimisticMutation;
use crate::remote::{NewSubtask, TaskApi};
use crate::store::{CacheKey, CacheStore};

use super::{order_tasks_key, task_subtasks_key};

pub struct CreateSubtask {
    store: CacheStore,
    api: Arc<dyn TaskApi>,
    subtasks_key: CacheKey,
}

impl CreateSubtask {
    pub fn new(store: CacheStore, api: Arc<dyn TaskApi>, task_id: &str) -> Self {
        Self {
            store,
            api,
            subtasks_key: task_subtasks_key(task_id),
        }
    }
}

#[async_trait]
impl OptimisticMutation for CreateSubtask {
    type Input = NewSubtask;
    type Output = Subtask;
    type Context = ();

    fn describe(&self) -> &'static str {
        "create subtask"
    }

    fn on_mutate(&self, _input: &NewSubtask) -> DomainResult<()> {
        Ok(())
    }

    async fn execute(&self, input: &NewSubtask) -> DomainResult<Subtask> {
        self.api.create_subtask(input.clone()).await
    }

    fn on_error(&self, _input: &NewSubtask, _context: (), _error: &DomainError) {}

    fn on_success(&self, _input: &NewSubtask, _context: (), output: &Subtask) {
        let confirmed = output.clone();
        self.store
            .update::<Vec<Subtask>, _>(&self.subtasks_key, |subtasks| {
                if !subtasks.iter().any(|s| s.id == confirmed.id) {
                    subtasks.push(confirmed.clone());
                }
            });
        self.store.invalidate(&self.subtasks_key);
    }
}

pub struct SubtaskListContext {
    previous: Vec<Subtask>,
}

pub struct UpdateSubtask {
    store: CacheStore,
    api: Arc<dyn TaskApi>,
    subtasks_key: CacheKey,
}

impl UpdateSubtask {
    pub fn new(store: CacheStore, api: Arc<dyn TaskApi>, task_id: &str) -> Self {
        Self {
            store,
            api,
            subtasks_key: task_subtasks_key(task_id),
        }
    }
}

#[async_trait]
impl OptimisticMutation for UpdateSubtask {
    type Input = Subtask;
    type Output = Subtask;
    type Context = SubtaskListContext;

    fn describe(&self) -> &'static str {
        "update subtask"
    }

    fn on_mutate(&self, input: &Subtask) -> DomainResult<SubtaskListContext> {
        let previous = self
            .store
            .get::<Vec<Subtask>>(&self.subtasks_key)
            .unwrap_or_default();

        let updated = input.clone();
        self.store
            .update::<Vec<Subtask>, _>(&self.subtasks_key, |subtasks| {
                if let Some(subtask) = subtasks.iter_mut().find(|s| s.id == updated.id) {
                    *subtask = updated.clone();
                }
            });

        Ok(SubtaskListContext { previous })
    }

    async fn execute(&self, input: &Subtask) -> DomainResult<Subtask> {
        self.api.update_subtask(input.clone()).await
    }

    fn on_error(&self, _input: &Subtask, context: SubtaskListContext, _error: &DomainError) {
        self.store.set(&self.subtasks_key, context.previous);
    }

    fn on_success(&self, _input: &Subtask, _context: SubtaskListContext, _output: &Subtask) {
        self.store.invalidate(&self.subtasks_key);
    }
}

pub struct TaskListContext {
    previous: Vec<Task>,
}

/// Persists the task batch produced by a drop and mirrors it into the
/// cached task list
pub struct PersistTaskPositions {
    store: CacheStore,
    api: Arc<dyn TaskApi>,
    tasks_key: CacheKey,
}

impl PersistTaskPositions {
    pub fn new(store: CacheStore, api: Arc<dyn TaskApi>, order_id: &str) -> Self {
        Self {
            store,
            api,
            tasks_key: order_tasks_key(order_id),
        }
    }
}

#[async_trait]
impl OptimisticMutation for PersistTaskPositions {
    type Input = Vec<Task>;
    type Output = ();
    type Context = TaskListContext;

    fn describe(&self) -> &'static str {
        "save task order"
    }

    fn on_mutate(&self, input: &Vec<Task>) -> DomainResult<TaskListContext> {
        let previous = self
            .store
            .get::<Vec<Task>>(&self.tasks_key)
            .unwrap_or_default();

        let batch = input.clone();
        self.store.update::<Vec<Task>, _>(&self.tasks_key, |tasks| {
            for updated in &batch {
                if let Some(task) = tasks.iter_mut().find(|t| t.id == updated.id) {
                    *task = updated.clone();
                }
            }
        });

        Ok(TaskListContext { previous })
    }

    async fn execute(&self, input: &Vec<Task>) -> DomainResult<()> {
        self.api.update_task_positions(input.clone()).await
    }

    fn on_error(&self, _input: &Vec<Task>, context: TaskListContext, _error: &DomainError) {
        self.store.set(&self.tasks_key, context.previous);
    }

    fn on_success(&self, _input: &Vec<Task>, _context: TaskListContext, _output: &()) {
        self.store.invalidate(&self.tasks_key);
    }
}

/// Subtask counterpart of `PersistTaskPositions`
pub struct PersistSubtaskPositions {
    store: CacheStore,
    api: Arc<dyn TaskApi>,
    subtasks_key: CacheKey,
}

impl PersistSubtaskPositions {
    pub fn new(store: CacheStore, api: Arc<dyn TaskApi>, task_id: &str) -> Self {
        Self {
            store,
            api,
            subtasks_key: task_subtasks_key(task_id),
        }
    }
}

#[async_trait]
impl OptimisticMutation for PersistSubtaskPositions {
    type Input = Vec<Subtask>;
    type Output = ();
    type Context = SubtaskListContext;

    fn describe(&self) -> &'static str {
        "save subtask order"
    }

    fn on_mutate(&self, input: &Vec<Subtask>) -> DomainResult<SubtaskListContext> {
        let previous = self
            .store
            .get::<Vec<Subtask>>(&self.subtasks_key)
            .unwrap_or_default();

        let batch = input.clone();
        self.store
            .update::<Vec<Subtask>, _>(&self.subtasks_key, |subtasks| {
                for updated in &batch {
                    if let Some(subtask) = subtasks.iter_mut().find(|s| s.id == updated.id) {
                        *subtask = updated.clone();
                    }
                }
            });

        Ok(SubtaskListContext { previous })
    }

    async fn execute(&self, input: &Vec<Subtask>) -> DomainResult<()> {
        self.api.update_subtask_positions(input.clone()).await
    }

    fn on_error(&self, _input: &Vec<Subtask>, context: SubtaskListContext, _error: &DomainError) {
        self.store.set(&self.subtasks_key, context.previous);
    }

    fn on_success(&self, _input: &Vec<Subtask>, _context: SubtaskListContext, _output: &()) {
        self.store.invalidate(&self.subtasks_key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mutation::{MutationRunner, Notifier};
    use chrono::Utc;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct SilentNotifier;
    impl Notifier for SilentNotifier {
        fn success(&self, _message: &str) {}
        fn error(&self, _message: &str) {}
    }

    #[derive(Default)]
    struct FakeTaskApi {
        fail: AtomicBool,
    }

    #[async_trait]
    impl TaskApi for FakeTaskApi {
        async fn create_subtask(&self, subtask: NewSubtask) -> DomainResult<Subtask> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(DomainError::Remote("create failed".to_string()));
            }
            Ok(Subtask {
                id: "s-new".to_string(),
                task_id: subtask.task_id,
                title: subtask.title,
                done: false,
                position: subtask.position,
                assignees: subtask.assignees,
            })
        }

        async fn update_subtask(&self, subtask: Subtask) -> DomainResult<Subtask> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(DomainError::Remote("update failed".to_string()));
            }
            Ok(subtask)
        }

        async fn update_task_positions(&self, _tasks: Vec<Task>) -> DomainResult<()> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(DomainError::Remote("positions failed".to_string()));
            }
            Ok(())
        }

        async fn update_subtask_positions(&self, _subtasks: Vec<Subtask>) -> DomainResult<()> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(DomainError::Remote("positions failed".to_string()));
            }
            Ok(())
        }
    }

    fn task(id: &str, status: &str, position: i32) -> Task {
        Task {
            id: id.to_string(),
            order_id: "o1".to_string(),
            title: format!("task {id}"),
            status: status.to_string(),
            due_date: None,
            position,
            assignees: vec![],
            created_at: Utc::now(),
            deleted_on: None,
        }
    }

    fn subtask(id: &str, position: i32) -> Subtask {
        Subtask {
            id: id.to_string(),
            task_id: "t1".to_string(),
            title: format!("subtask {id}"),
            done: false,
            position,
            assignees: vec![],
        }
    }

    #[tokio::test]
    async fn created_subtask_lands_in_cache() {
        let store = CacheStore::new();
        store.set(&task_subtasks_key("t1"), Vec::<Subtask>::new());
        let runner = MutationRunner::new(
            CreateSubtask::new(store.clone(), Arc::new(FakeTaskApi::default()), "t1"),
            Arc::new(SilentNotifier),
        );

        runner
            .run(NewSubtask {
                task_id: "t1".to_string(),
                title: "new".to_string(),
                position: 0,
                assignees: vec![],
            })
            .await
            .unwrap();

        let subtasks: Vec<Subtask> = store.get(&task_subtasks_key("t1")).unwrap();
        assert_eq!(subtasks.len(), 1);
        assert_eq!(subtasks[0].id, "s-new");
    }

    #[tokio::test]
    async fn failed_subtask_update_rolls_back() {
        let api = Arc::new(FakeTaskApi::default());
        api.fail.store(true, Ordering::SeqCst);
        let store = CacheStore::new();
        store.set(&task_subtasks_key("t1"), vec![subtask("s1", 0)]);
        let runner = MutationRunner::new(
            UpdateSubtask::new(store.clone(), api, "t1"),
            Arc::new(SilentNotifier),
        );

        let mut changed = subtask("s1", 0);
        changed.title = "renamed".to_string();
        assert!(runner.run(changed).await.is_err());

        let subtasks: Vec<Subtask> = store.get(&task_subtasks_key("t1")).unwrap();
        assert_eq!(subtasks[0].title, "subtask s1");
    }

    #[tokio::test]
    async fn position_batch_is_mirrored_into_cache() {
        let store = CacheStore::new();
        store.set(
            &order_tasks_key("o1"),
            vec![task("t1", "todo", 0), task("t2", "todo", 1)],
        );
        let runner = MutationRunner::new(
            PersistTaskPositions::new(store.clone(), Arc::new(FakeTaskApi::default()), "o1"),
            Arc::new(SilentNotifier),
        );

        let mut moved = task("t1", "done", 0);
        moved.position = 0;
        let mut stayed = task("t2", "todo", 0);
        stayed.position = 0;
        runner.run(vec![moved, stayed]).await.unwrap();

        let tasks: Vec<Task> = store.get(&order_tasks_key("o1")).unwrap();
        assert_eq!(tasks[0].status, "done");
        assert_eq!(tasks[1].position, 0);
    }

    #[tokio::test]
    async fn failed_position_batch_restores_previous_order() {
        let api = Arc::new(FakeTaskApi::default());
        api.fail.store(true, Ordering::SeqCst);
        let store = CacheStore::new();
        store.set(
            &order_tasks_key("o1"),
            vec![task("t1", "todo", 0), task("t2", "todo", 1)],
        );
        let runner = MutationRunner::new(
            PersistTaskPositions::new(store.clone(), api, "o1"),
            Arc::new(SilentNotifier),
        );

        let mut moved = task("t1", "done", 5);
        moved.position = 5;
        assert!(runner.run(vec![moved]).await.is_err());

        let tasks: Vec<Task> = store.get(&order_tasks_key("o1")).unwrap();
        assert_eq!(tasks[0].status, "todo");
        assert_eq!(tasks[0].position, 0);
    }
}

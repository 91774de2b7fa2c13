//! Single-slot async operation wrapper
//!
//! Tracks one logical operation (extract details, create record) as
//! `{ status, data, error }` and publishes every change on a watch channel.
//!
//! **Overlap policy:** the latest invocation wins. Each `run` takes a sequence
//! number; when an older invocation settles after a newer one started, its
//! result is dropped without touching state and without a notice.
//!
//! **Stale-while-revalidate:** `data` keeps the last successful value while a
//! new invocation is loading or after it fails. `TaskState::result` only
//! exposes it while status is `Succeeded`.
//!
//! **Detach:** once detached (owner gone), in-flight invocations still run to
//! completion but their results are never applied and no notice is sent.

use crate::types::Notifier;
use std::fmt::Display;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

/// Lifecycle of the most recent invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskStatus {
    #[default]
    Idle,
    Loading,
    Succeeded,
    Failed,
}

/// Observable state of an [`AsyncTask`]
#[derive(Debug, Clone, PartialEq)]
pub struct TaskState<T> {
    pub status: TaskStatus,
    /// Last successful value (kept across later loads and failures)
    pub data: Option<T>,
    /// Message of the most recent failure; cleared when a new run starts
    pub error: Option<String>,
}

impl<T> Default for TaskState<T> {
    fn default() -> Self {
        Self {
            status: TaskStatus::Idle,
            data: None,
            error: None,
        }
    }
}

impl<T> TaskState<T> {
    /// Fresh result of the latest invocation, if it succeeded
    pub fn result(&self) -> Option<&T> {
        match self.status {
            TaskStatus::Succeeded => self.data.as_ref(),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.status == TaskStatus::Loading
    }
}

/// What a single `run` call ended with
#[derive(Debug, PartialEq)]
pub enum TaskOutcome<T, E> {
    /// This invocation was the latest and succeeded; state updated
    Completed(T),
    /// This invocation was the latest and failed; state updated, notice sent
    Failed(E),
    /// A newer invocation started first; result dropped
    Superseded,
    /// The task was detached while in flight; result dropped
    Detached,
}

/// Wrapper around one repeatable async operation
///
/// Cloning yields another handle to the same task.
#[derive(Clone)]
pub struct AsyncTask<T> {
    name: &'static str,
    state: Arc<watch::Sender<TaskState<T>>>,
    latest: Arc<AtomicU64>,
    notifier: Arc<dyn Notifier>,
    detached: CancellationToken,
}

impl<T> AsyncTask<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new(name: &'static str, notifier: Arc<dyn Notifier>) -> Self {
        let (tx, _rx) = watch::channel(TaskState::default());
        Self {
            name,
            state: Arc::new(tx),
            latest: Arc::new(AtomicU64::new(0)),
            notifier,
            detached: CancellationToken::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Receiver that observes every state transition
    pub fn subscribe(&self) -> watch::Receiver<TaskState<T>> {
        self.state.subscribe()
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> TaskState<T> {
        self.state.borrow().clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading()
    }

    /// Execute `action` as the newest invocation
    ///
    /// Failures of the latest invocation produce exactly one error notice
    /// carrying the error's display text. The caller gets the error back in
    /// [`TaskOutcome::Failed`] and must not notify again.
    pub async fn run<F, E>(&self, action: F) -> TaskOutcome<T, E>
    where
        F: Future<Output = Result<T, E>>,
        E: Display,
    {
        if self.detached.is_cancelled() {
            debug!(task = self.name, "Run requested on detached task");
            return TaskOutcome::Detached;
        }

        let seq = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.send_modify(|state| {
            state.status = TaskStatus::Loading;
            state.error = None;
        });
        debug!(task = self.name, seq, "Task started");

        let result = action.await;

        if self.detached.is_cancelled() {
            debug!(task = self.name, seq, "Task settled after detach, result dropped");
            return TaskOutcome::Detached;
        }

        if self.latest.load(Ordering::SeqCst) != seq {
            debug!(task = self.name, seq, "Task superseded by newer invocation");
            return TaskOutcome::Superseded;
        }

        match result {
            Ok(value) => {
                self.state.send_modify(|state| {
                    state.status = TaskStatus::Succeeded;
                    state.data = Some(value.clone());
                    state.error = None;
                });
                debug!(task = self.name, seq, "Task succeeded");
                TaskOutcome::Completed(value)
            }
            Err(e) => {
                let message = e.to_string();
                error!(task = self.name, seq, error = %message, "Task failed");
                self.state.send_modify(|state| {
                    state.status = TaskStatus::Failed;
                    state.error = Some(message.clone());
                });
                self.notifier.error(&message);
                TaskOutcome::Failed(e)
            }
        }
    }

    /// Replace `data` locally without running the action
    pub fn set_data(&self, value: Option<T>) {
        if self.detached.is_cancelled() {
            return;
        }
        self.state.send_modify(|state| state.data = value);
    }

    /// Stop applying results; in-flight work finishes but is ignored
    pub fn detach(&self) {
        if !self.detached.is_cancelled() {
            debug!(task = self.name, "Task detached");
            self.detached.cancel();
        }
    }

    pub fn is_detached(&self) -> bool {
        self.detached.is_cancelled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::mock::RecordingNotifier;
    use carlot_common::events::NoticeLevel;
    use std::time::Duration;

    fn task() -> (AsyncTask<u32>, Arc<RecordingNotifier>) {
        let notifier = Arc::new(RecordingNotifier::default());
        (AsyncTask::new("test", notifier.clone()), notifier)
    }

    #[tokio::test]
    async fn test_success_updates_state() {
        let (task, notifier) = task();
        assert_eq!(task.snapshot().status, TaskStatus::Idle);

        let outcome = task.run(async { Ok::<_, String>(7) }).await;
        assert_eq!(outcome, TaskOutcome::Completed(7));

        let state = task.snapshot();
        assert_eq!(state.status, TaskStatus::Succeeded);
        assert_eq!(state.result(), Some(&7));
        assert_eq!(notifier.count(), 0);
    }

    #[tokio::test]
    async fn test_failure_notifies_once_and_keeps_stale_data() {
        let (task, notifier) = task();
        task.run(async { Ok::<_, String>(1) }).await;

        let outcome = task.run(async { Err::<u32, _>("boom".to_string()) }).await;
        assert_eq!(outcome, TaskOutcome::Failed("boom".to_string()));

        let state = task.snapshot();
        assert_eq!(state.status, TaskStatus::Failed);
        assert_eq!(state.error.as_deref(), Some("boom"));
        assert_eq!(state.data, Some(1));
        assert_eq!(state.result(), None);
        assert_eq!(notifier.messages(NoticeLevel::Error), vec!["boom".to_string()]);
    }

    #[tokio::test]
    async fn test_loading_is_observable() {
        let (task, _) = task();
        let mut rx = task.subscribe();
        let runner = task.clone();

        let handle = tokio::spawn(async move {
            runner
                .run(async {
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    Ok::<_, String>(3)
                })
                .await
        });

        rx.changed().await.unwrap();
        assert!(rx.borrow().is_loading());
        handle.await.unwrap();
        assert_eq!(task.snapshot().status, TaskStatus::Succeeded);
    }

    #[tokio::test]
    async fn test_detached_task_ignores_results() {
        let (task, notifier) = task();
        task.detach();
        task.detach();
        assert!(task.is_detached());

        let outcome = task.run(async { Err::<u32, _>("late".to_string()) }).await;
        assert_eq!(outcome, TaskOutcome::Detached);
        assert_eq!(task.snapshot().status, TaskStatus::Idle);
        assert_eq!(notifier.count(), 0);
    }

    #[tokio::test]
    async fn test_set_data() {
        let (task, _) = task();
        task.set_data(Some(9));
        assert_eq!(task.snapshot().data, Some(9));
        assert_eq!(task.snapshot().result(), None);
    }
}

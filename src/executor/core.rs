use super::worker::Worker;
use crate::builder::{ExecutorBuilder, Teardown};
use crate::task::state::Shared;
use crate::task::{Task, TaskError, TaskId};

use log::{debug, trace, warn};
use parking_lot::Mutex;

use std::any::Any;
use std::error::Error;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Thread-per-task executor.
///
/// The `Executor` is responsible for:
/// - issuing task ids,
/// - running each submitted computation on its own thread,
/// - collecting completed outcomes until they are polled,
/// - suppressing the outcomes of cancelled tasks.
///
/// Submission never waits for the computation, and [`try_pop`] never
/// blocks. Completed tasks are returned in no particular order, each
/// one exactly once.
///
/// Cancellation works at the result level: a cancelled computation
/// still runs to completion, only its outcome is discarded. Cancelling
/// never evicts an outcome that has already been recorded.
///
/// # Examples
///
/// ```rust
/// use spindle::Executor;
/// use std::time::Duration;
///
/// let executor = Executor::new();
/// let id = executor.submit(|| 6 * 7);
///
/// let task = executor
///     .pop_timeout::<i32>(Duration::from_secs(5))
///     .expect("task should complete");
///
/// assert_eq!(task.id(), id);
/// assert_eq!(task.value(), Some(&42));
/// ```
///
/// [`try_pop`]: Executor::try_pop
pub struct Executor {
    /// Registry and cancellation state, shared weakly with task threads.
    shared: Arc<Shared>,

    /// Prefix of task thread names.
    thread_name: String,

    /// Stack size of task threads.
    stack_size: Option<usize>,

    teardown: Teardown,

    /// Handles of task threads still to be joined.
    ///
    /// Only populated under [`Teardown::Join`].
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Executor {
    /// Creates an executor with the default configuration.
    pub fn new() -> Self {
        ExecutorBuilder::new().build()
    }

    /// Returns a builder to configure a new executor.
    pub fn builder() -> ExecutorBuilder {
        ExecutorBuilder::new()
    }

    pub(crate) fn from_builder(builder: ExecutorBuilder) -> Self {
        Self {
            shared: Arc::new(Shared::new()),
            thread_name: builder.thread_name,
            stack_size: builder.stack_size,
            teardown: builder.teardown,
            handles: Mutex::new(Vec::new()),
        }
    }

    /// Submits a computation and returns its id immediately.
    ///
    /// The computation runs on a dedicated thread. Its value, or the
    /// panic that ended it, is later retrieved with
    /// [`try_pop::<T>`](Executor::try_pop).
    pub fn submit<T, F>(&self, computation: F) -> TaskId
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        self.launch(move || Ok(computation()))
    }

    /// Submits a fallible computation and returns its id immediately.
    ///
    /// An `Err` returned by the computation is delivered as
    /// [`TaskError::Failed`], the same way a panic is delivered as
    /// [`TaskError::Panicked`].
    pub fn submit_fallible<T, E, F>(&self, computation: F) -> TaskId
    where
        T: Send + 'static,
        E: Into<Box<dyn Error + Send + Sync>>,
        F: FnOnce() -> Result<T, E> + Send + 'static,
    {
        self.launch(move || computation().map_err(|err| TaskError::Failed(err.into())))
    }

    /// Allocates an id and starts `computation` on a new thread.
    ///
    /// If no thread can be created, the failure is recorded as the
    /// task's outcome so that submission stays infallible.
    fn launch<T, F>(&self, computation: F) -> TaskId
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T, TaskError> + Send + 'static,
    {
        let id = self.shared.allocate();
        let worker = Worker::new::<T>(id, &self.shared);

        let name = format!("{}-{}", self.thread_name, id.as_u64());
        let mut builder = thread::Builder::new().name(name);
        if let Some(size) = self.stack_size {
            builder = builder.stack_size(size);
        }

        match builder.spawn(move || worker.run(computation)) {
            Ok(handle) => {
                trace!("task {id} submitted");

                if self.teardown == Teardown::Join {
                    let mut handles = self.handles.lock();
                    handles.retain(|h| !h.is_finished());
                    handles.push(handle);
                }
            }
            Err(err) => {
                warn!("task {id} could not be spawned: {err}");

                Worker::new::<T>(id, &self.shared).finish(Err(TaskError::Spawn(err)));
            }
        }

        id
    }

    /// Retrieves one completed task whose result type is `T`.
    ///
    /// This never blocks. `None` is returned when no such task is
    /// ready, or when the registry is momentarily locked by a task
    /// recording its outcome or by another caller.
    ///
    /// Only tasks submitted with result type `T` are considered; tasks
    /// of other types stay available to their own pollers. Which ready
    /// task is returned is unspecified.
    pub fn try_pop<T: Any>(&self) -> Option<Task<T>> {
        self.shared.try_take::<T>()
    }

    /// Retrieves one completed task of any result type, without
    /// blocking.
    ///
    /// The value can be recovered with [`Task::downcast`].
    pub fn try_pop_any(&self) -> Option<Task<Box<dyn Any + Send>>> {
        self.shared.try_take_any()
    }

    /// Waits up to `timeout` for a completed task whose result type is
    /// `T`.
    ///
    /// Unlike [`try_pop`](Executor::try_pop), this blocks the calling
    /// thread.
    pub fn pop_timeout<T: Any>(&self, timeout: Duration) -> Option<Task<T>> {
        self.shared.take_until::<T>(Instant::now() + timeout)
    }

    /// Cancels task `id`.
    ///
    /// If the task has not recorded its outcome yet, that outcome will
    /// be discarded. An outcome already recorded stays retrievable.
    ///
    /// An id that has not been issued yet may be cancelled ahead of
    /// time: the task that later receives it is suppressed, unless
    /// [`cancel_all`](Executor::cancel_all) runs in between.
    pub fn cancel(&self, id: TaskId) {
        self.shared.cancel(id);
        debug!("task {id} cancelled");
    }

    /// Cancels every task issued so far.
    ///
    /// Outcomes recorded before this call stay retrievable, and tasks
    /// submitted afterwards are unaffected. Only outcomes of earlier
    /// tasks that have yet to be recorded are discarded.
    pub fn cancel_all(&self) {
        let mark = self.shared.cancel_all();
        debug!("tasks below #{mark} cancelled");
    }

    /// Returns `true` if the outcome of task `id` would be discarded
    /// were it recorded now.
    pub fn is_cancelled(&self, id: TaskId) -> bool {
        self.shared.is_cancelled(id)
    }

    /// Number of completed tasks awaiting retrieval.
    ///
    /// This is a hint: tasks may complete or be retrieved concurrently.
    pub fn pending(&self) -> usize {
        self.shared.pending()
    }

    /// Returns the id the next submission will receive.
    ///
    /// Every id strictly below this value has been issued.
    pub fn issued(&self) -> u64 {
        self.shared.issued()
    }
}

impl Default for Executor {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Executor {
    /// Tears down the executor.
    ///
    /// This performs the following steps:
    /// 1. Cancels every task issued so far
    /// 2. Joins task threads when configured with [`Teardown::Join`]
    ///
    /// Detached task threads keep running, and their outcomes are
    /// dropped on completion.
    fn drop(&mut self) {
        self.cancel_all();

        let handles = std::mem::take(self.handles.get_mut());
        match self.teardown {
            Teardown::Detach => debug!("executor dropped, detaching task threads"),
            Teardown::Join => debug!("executor dropped, joining {} task thread(s)", handles.len()),
        }

        let current = thread::current().id();
        for handle in handles {
            // Dropped from one of its own tasks; that thread cannot join itself.
            if handle.thread().id() == current {
                continue;
            }

            let _ = handle.join();
        }
    }
}

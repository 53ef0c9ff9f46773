use crate::task::state::{ErasedOutcome, Shared};
use crate::task::{TaskError, TaskId};

use std::any::{Any, TypeId};
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Weak};

/// The execution side of a single task.
///
/// A `Worker` is moved onto the dedicated thread of its task. It runs
/// the computation once and hands the outcome to the shared state.
///
/// It only holds a weak reference to that state: once the executor has
/// been dropped, finishing becomes a no-op.
pub(crate) struct Worker {
    /// Identifier of the task being executed.
    id: TaskId,

    /// Result type declared at submission.
    type_id: TypeId,

    /// Completion state of the owning executor.
    shared: Weak<Shared>,
}

impl Worker {
    /// Creates the worker for task `id`, producing values of type `T`.
    pub(crate) fn new<T: Any>(id: TaskId, shared: &Arc<Shared>) -> Self {
        Self {
            id,
            type_id: TypeId::of::<T>(),
            shared: Arc::downgrade(shared),
        }
    }

    /// Runs `computation` to completion and records its outcome.
    ///
    /// A panic is caught and recorded as [`TaskError::Panicked`]; it
    /// never unwinds past the worker.
    pub(crate) fn run<T, F>(self, computation: F)
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T, TaskError>,
    {
        let outcome = match panic::catch_unwind(AssertUnwindSafe(computation)) {
            Ok(Ok(value)) => Ok(Box::new(value) as Box<dyn Any + Send>),
            Ok(Err(err)) => Err(err),
            Err(payload) => Err(TaskError::from_panic(payload)),
        };

        self.finish(outcome);
    }

    /// Hands `outcome` to the executor, if it is still alive.
    pub(crate) fn finish(self, outcome: ErasedOutcome) {
        if let Some(shared) = self.shared.upgrade() {
            shared.record(self.id, self.type_id, outcome);
        }
    }
}

use super::TaskId;

use std::any::Any;
use std::error::Error;
use std::io;

/// Failure payload of a task.
///
/// Failures raised inside a computation are never propagated to the
/// submitting thread. They are captured and delivered through the
/// same polling channel as successful values.
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    /// The computation panicked.
    #[error("task panicked: {message}")]
    Panicked {
        /// Message extracted from the panic payload.
        message: String,
    },

    /// A fallible computation returned an error.
    #[error("task failed: {0}")]
    Failed(#[source] Box<dyn Error + Send + Sync>),

    /// No execution unit could be created for the task.
    #[error("failed to spawn task thread: {0}")]
    Spawn(#[source] io::Error),
}

impl TaskError {
    /// Builds a [`TaskError::Panicked`] from a payload caught by
    /// [`std::panic::catch_unwind`].
    pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&'static str>() {
            (*s).to_owned()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "Box<dyn Any>".to_owned()
        };

        TaskError::Panicked { message }
    }
}

/// A completed task, as returned by a poll.
///
/// Every delivered task carries exactly one outcome: either the value
/// produced by the computation or the [`TaskError`] that ended it.
#[derive(Debug)]
pub struct Task<T> {
    id: TaskId,
    outcome: Result<T, TaskError>,
}

impl<T> Task<T> {
    pub(crate) fn new(id: TaskId, outcome: Result<T, TaskError>) -> Self {
        Self { id, outcome }
    }

    /// Identifier returned by the submission that produced this task.
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Returns `true` if the computation produced a value.
    pub fn is_value(&self) -> bool {
        self.outcome.is_ok()
    }

    /// Returns `true` if the computation failed.
    pub fn is_failure(&self) -> bool {
        self.outcome.is_err()
    }

    /// The produced value, if any.
    pub fn value(&self) -> Option<&T> {
        self.outcome.as_ref().ok()
    }

    /// The failure, if any.
    pub fn error(&self) -> Option<&TaskError> {
        self.outcome.as_ref().err()
    }

    /// Consumes the task and returns its outcome.
    pub fn into_result(self) -> Result<T, TaskError> {
        self.outcome
    }

    /// Consumes the task and returns its identifier and outcome.
    pub fn into_parts(self) -> (TaskId, Result<T, TaskError>) {
        (self.id, self.outcome)
    }
}

impl Task<Box<dyn Any + Send>> {
    /// Attempts to recover the typed value of an untyped task.
    ///
    /// Failures carry no value and always convert. On a type mismatch
    /// the untyped task is handed back unchanged.
    pub fn downcast<T: Any>(self) -> Result<Task<T>, Self> {
        match self.outcome {
            Ok(value) => match value.downcast::<T>() {
                Ok(value) => Ok(Task::new(self.id, Ok(*value))),
                Err(value) => Err(Task::new(self.id, Ok(value))),
            },
            Err(err) => Ok(Task::new(self.id, Err(err))),
        }
    }
}

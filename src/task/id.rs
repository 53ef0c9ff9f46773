use std::fmt;

/// Identifier of a submitted task.
///
/// Identifiers are issued by an [`Executor`](crate::Executor) in strictly
/// increasing order, starting at `0`, and are never reused for the
/// lifetime of that executor, cancellation included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(pub(crate) u64);

impl TaskId {
    /// Returns the raw numeric value of the identifier.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl From<TaskId> for u64 {
    fn from(id: TaskId) -> Self {
        id.0
    }
}

impl From<u64> for TaskId {
    fn from(id: u64) -> Self {
        TaskId(id)
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

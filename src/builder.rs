use crate::Executor;

/// Default prefix of task thread names.
pub(crate) const DEFAULT_THREAD_NAME: &str = "spindle-task";

/// What an [`Executor`] does with running tasks when it is dropped.
///
/// In both cases every task issued so far is cancelled first, so no
/// outcome is recorded after the drop begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Teardown {
    /// Leave running tasks alone.
    ///
    /// Their threads run to completion unobserved; recording their
    /// outcome becomes a no-op once the executor is gone.
    #[default]
    Detach,

    /// Wait for every running task thread to finish.
    Join,
}

/// Builder for configuring and creating an executor.
///
/// `ExecutorBuilder` allows customizing how task threads are created
/// and how the executor tears down.
///
/// # Examples
///
/// ```rust
/// use spindle::{ExecutorBuilder, Teardown};
///
/// let executor = ExecutorBuilder::new()
///     .thread_name("resizer")
///     .teardown(Teardown::Join)
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct ExecutorBuilder {
    /// Prefix of task thread names; the task id is appended.
    pub(crate) thread_name: String,

    /// Stack size of task threads, platform default when `None`.
    pub(crate) stack_size: Option<usize>,

    pub(crate) teardown: Teardown,
}

impl ExecutorBuilder {
    /// Creates a new `ExecutorBuilder` with default configuration.
    ///
    /// Task threads are named `spindle-task-<id>`, use the platform
    /// stack size, and are detached on teardown.
    pub fn new() -> Self {
        Self {
            thread_name: DEFAULT_THREAD_NAME.to_owned(),
            stack_size: None,
            teardown: Teardown::Detach,
        }
    }

    /// Sets the prefix used to name task threads.
    ///
    /// A task with id `7` runs on a thread named `<prefix>-7`.
    ///
    /// # Panics
    ///
    /// Panics if `prefix` contains a NUL byte.
    pub fn thread_name(mut self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        assert!(!prefix.contains('\0'), "thread_name must not contain NUL bytes");

        self.thread_name = prefix;
        self
    }

    /// Sets the stack size, in bytes, of task threads.
    ///
    /// # Panics
    ///
    /// Panics if `bytes == 0`.
    pub fn stack_size(mut self, bytes: usize) -> Self {
        assert!(bytes > 0, "stack_size must be > 0");

        self.stack_size = Some(bytes);
        self
    }

    /// Sets the teardown behavior of the executor.
    pub fn teardown(mut self, teardown: Teardown) -> Self {
        self.teardown = teardown;
        self
    }

    /// Builds the executor with the configured options.
    pub fn build(self) -> Executor {
        Executor::from_builder(self)
    }
}

impl Default for ExecutorBuilder {
    /// Creates a default `ExecutorBuilder`.
    fn default() -> Self {
        Self::new()
    }
}

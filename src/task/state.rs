use super::{Task, TaskError, TaskId};

use parking_lot::{Condvar, Mutex, MutexGuard};

use std::any::{Any, TypeId};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Instant;

/// Outcome of a task with its result type erased.
pub(crate) type ErasedOutcome = Result<Box<dyn Any + Send>, TaskError>;

/// A recorded, not yet retrieved, outcome.
struct Entry {
    /// Result type declared at submission.
    ///
    /// Failures carry no value, so the declared type is what routes
    /// them to the poller expecting that type.
    type_id: TypeId,

    outcome: ErasedOutcome,
}

/// State guarded by the executor's critical section.
///
/// Registry, cancellation set and low-water mark live under one lock
/// so that recording and cancelling are observed atomically relative
/// to each other.
struct Inner {
    /// Completed outcomes keyed by raw task id.
    registry: HashMap<u64, Entry>,

    /// Ids cancelled individually since the last bulk cancellation.
    cancelled: HashSet<u64>,

    /// Every id strictly below this mark is cancelled.
    low_water_mark: u64,
}

impl Inner {
    fn is_cancelled(&self, id: u64) -> bool {
        id < self.low_water_mark || self.cancelled.contains(&id)
    }
}

/// State shared between an executor and its execution units.
///
/// Execution units only ever hold a `Weak` reference to it, so the
/// executor alone decides its lifetime.
pub(crate) struct Shared {
    /// Next id to issue.
    next_id: AtomicU64,

    /// Number of entries in the registry.
    ///
    /// Read without the lock as a hint only; the locked registry is
    /// authoritative.
    pending: AtomicUsize,

    inner: Mutex<Inner>,

    /// Notified every time an outcome is recorded.
    ready: Condvar,
}

impl Shared {
    pub(crate) fn new() -> Self {
        Self {
            next_id: AtomicU64::new(0),
            pending: AtomicUsize::new(0),
            inner: Mutex::new(Inner {
                registry: HashMap::new(),
                cancelled: HashSet::new(),
                low_water_mark: 0,
            }),
            ready: Condvar::new(),
        }
    }

    /// Issues a fresh task id. Never blocks.
    pub(crate) fn allocate(&self) -> TaskId {
        TaskId(self.next_id.fetch_add(1, Ordering::AcqRel))
    }

    /// Returns the next id that will be issued.
    pub(crate) fn issued(&self) -> u64 {
        self.next_id.load(Ordering::Acquire)
    }

    pub(crate) fn pending(&self) -> usize {
        self.pending.load(Ordering::Relaxed)
    }

    /// Records the outcome of task `id`.
    ///
    /// Every execution unit funnels its value or failure through here
    /// exactly once. Outcomes of cancelled ids are dropped silently.
    pub(crate) fn record(&self, id: TaskId, type_id: TypeId, outcome: ErasedOutcome) {
        let mut inner = self.inner.lock();

        if inner.is_cancelled(id.0) {
            return;
        }

        inner.registry.insert(id.0, Entry { type_id, outcome });
        self.pending.fetch_add(1, Ordering::Relaxed);
        drop(inner);

        self.ready.notify_all();
    }

    /// Suppresses any outcome recorded for `id` from now on.
    ///
    /// An outcome already sitting in the registry is left untouched.
    pub(crate) fn cancel(&self, id: TaskId) {
        self.inner.lock().cancelled.insert(id.0);
    }

    /// Cancels every id issued so far and returns the new mark.
    ///
    /// Only future recordings are suppressed: the registry is not
    /// purged, and ids issued after this call are unaffected.
    pub(crate) fn cancel_all(&self) -> u64 {
        let mut inner = self.inner.lock();

        let mark = self.issued();
        inner.low_water_mark = mark;
        inner.cancelled.clear();

        mark
    }

    pub(crate) fn is_cancelled(&self, id: TaskId) -> bool {
        self.inner.lock().is_cancelled(id.0)
    }

    /// Removes one completed task of result type `T`, without blocking.
    ///
    /// Returns `None` when nothing of that type is ready or when the
    /// critical section is currently held by someone else.
    pub(crate) fn try_take<T: Any>(&self) -> Option<Task<T>> {
        if self.pending() == 0 {
            return None;
        }

        let mut inner = self.inner.try_lock()?;
        self.remove(&mut inner, Some(TypeId::of::<T>()))
            .and_then(|task| task.downcast::<T>().ok())
    }

    /// Removes one completed task of any result type, without blocking.
    pub(crate) fn try_take_any(&self) -> Option<Task<Box<dyn Any + Send>>> {
        if self.pending() == 0 {
            return None;
        }

        let mut inner = self.inner.try_lock()?;
        self.remove(&mut inner, None)
    }

    /// Waits until a task of result type `T` is ready or `deadline`
    /// passes.
    pub(crate) fn take_until<T: Any>(&self, deadline: Instant) -> Option<Task<T>> {
        let wanted = Some(TypeId::of::<T>());
        let mut inner = self.inner.lock();

        loop {
            if let Some(task) = self.remove(&mut inner, wanted) {
                return task.downcast::<T>().ok();
            }

            if self.ready.wait_until(&mut inner, deadline).timed_out() {
                return self
                    .remove(&mut inner, wanted)
                    .and_then(|task| task.downcast::<T>().ok());
            }
        }
    }

    /// Removes an arbitrary entry, restricted to `wanted` when given.
    ///
    /// The declared type of a removed entry always matches `wanted`, so
    /// the callers' downcasts cannot fail.
    fn remove(
        &self,
        inner: &mut MutexGuard<'_, Inner>,
        wanted: Option<TypeId>,
    ) -> Option<Task<Box<dyn Any + Send>>> {
        let id = inner
            .registry
            .iter()
            .find(|(_, entry)| wanted.is_none_or(|type_id| entry.type_id == type_id))
            .map(|(id, _)| *id)?;

        let entry = inner.registry.remove(&id)?;
        self.pending.fetch_sub(1, Ordering::Relaxed);

        Some(Task::new(TaskId(id), entry.outcome))
    }
}

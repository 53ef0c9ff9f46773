//! Task primitives.
//!
//! This module defines what the executor hands back to its callers and
//! the state it shares with running tasks:
//! - task identifiers,
//! - completed tasks and their outcomes,
//! - the completion registry and cancellation bookkeeping.
//!
//! Most users interact with [`TaskId`], [`Task`] and [`TaskError`]
//! through [`Executor`](crate::Executor).

mod id;
mod outcome;

pub(crate) mod state;

pub use id::TaskId;
pub use outcome::{Task, TaskError};

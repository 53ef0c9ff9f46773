//! Task executor implementation.
//!
//! This module contains the components responsible for running
//! submitted computations and collecting their outcomes.
//!
//! It is composed of:
//! - `core`: the executor itself, its submission, polling and
//!   cancellation operations, and its teardown,
//! - `worker`: the per-task execution side that runs a computation
//!   on its dedicated thread and records the outcome.

pub(crate) mod core;
pub(crate) mod worker;

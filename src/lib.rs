//! # Spindle
//!
//! **Spindle** is a lightweight thread-per-task executor for Rust.
//!
//! A single producer submits plain closures without ever waiting on
//! them; each closure runs on its own thread. A consumer later polls
//! for completed results without blocking when none are ready.
//!
//! Spindle keeps its surface deliberately small:
//!
//! - **Non-blocking submission** returning a monotonically increasing [`TaskId`]
//! - **Non-blocking polling** of completed tasks, in no particular order
//! - **Captured failures**: panics and `Err` results are delivered as outcomes
//! - **Result-level cancellation** of single tasks or of everything issued so far
//!
//! ## Quick Start
//!
//! ```rust
//! use spindle::Executor;
//! use std::time::Duration;
//!
//! let executor = Executor::new();
//!
//! for n in 1..=3u32 {
//!     executor.submit(move || n * 10);
//! }
//!
//! let mut total = 0;
//! for _ in 0..3 {
//!     let task = executor
//!         .pop_timeout::<u32>(Duration::from_secs(5))
//!         .expect("task should complete");
//!
//!     total += task.into_result().expect("task should not fail");
//! }
//!
//! assert_eq!(total, 60);
//! ```
//!
//! ## Cancellation
//!
//! Cancelling never interrupts a computation. It only discards the
//! outcome the task would record afterwards; outcomes already recorded
//! stay retrievable. [`Executor::cancel_all`] applies the same rule to
//! every task issued so far, without affecting later submissions.
//!
//! ## Getting Started
//!
//! Add Spindle to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! spindle = { git = "https://github.com/Nebula-ecosystem/Spindle" }
//! ```

mod builder;
mod executor;

pub mod task;

pub use builder::{ExecutorBuilder, Teardown};
pub use executor::core::Executor;
pub use task::{Task, TaskError, TaskId};

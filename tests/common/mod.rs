#![allow(dead_code)]

use spindle::Executor;

use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::{Duration, Instant};

/// Generous upper bound for anything expected to happen.
pub const PATIENCE: Duration = Duration::from_secs(5);

/// How long to wait for something expected *not* to happen.
pub const GRACE: Duration = Duration::from_millis(150);

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A gate a task blocks on until the test opens it.
pub fn gate() -> (Sender<()>, Receiver<()>) {
    mpsc::channel()
}

/// Spins until the executor reports `n` pending outcomes.
pub fn wait_for_pending(executor: &Executor, n: usize) {
    let deadline = Instant::now() + PATIENCE;

    while executor.pending() != n {
        assert!(
            Instant::now() < deadline,
            "expected {} pending task(s), found {}",
            n,
            executor.pending()
        );
        thread::sleep(Duration::from_millis(1));
    }
}

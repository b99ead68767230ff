//! Bounded waits on background threads.

use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(2);

/// Join `handle` if it finishes within `timeout`, otherwise detach it.
///
/// Returns `true` when the thread was joined.
pub(crate) fn join_within(handle: JoinHandle<()>, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    while !handle.is_finished() {
        if Instant::now() >= deadline {
            let name = handle.thread().name().unwrap_or("unnamed").to_string();
            tracing::warn!(thread = %name, ?timeout, "background thread did not stop in time, detaching");
            return false;
        }
        thread::sleep(POLL_INTERVAL);
    }
    if handle.join().is_err() {
        tracing::error!("background thread panicked");
    }
    true
}

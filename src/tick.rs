//! # Shared logical tick counter.
//!
//! [`TickCounter`] is the only state mutated by more than one execution context:
//! the [`Ticker`](crate::tasks::Ticker) writes it, the
//! [`Dispatcher`](crate::tasks::Dispatcher) reads it.
//!
//! ## Rules
//! - Every access goes through one mutex with a **bounded** acquisition
//!   (`parking_lot::Mutex::try_lock_for`); a caller that cannot get it in time
//!   abandons the operation with [`LockTimeout`].
//! - The guard never escapes a call: `advance` and `snapshot` lock, act, release.
//! - The value only grows by one per successful `advance`, starting at zero.

use std::time::Duration;

use parking_lot::Mutex;

use crate::error::LockTimeout;

/// Mutex-guarded logical clock.
#[derive(Debug, Default)]
pub struct TickCounter {
    value: Mutex<u64>,
}

impl TickCounter {
    /// Creates a counter at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Increments the counter by one and returns the new value.
    pub fn advance(&self, wait: Duration) -> Result<u64, LockTimeout> {
        let mut guard = self
            .value
            .try_lock_for(wait)
            .ok_or(LockTimeout { waited: wait })?;
        *guard += 1;
        Ok(*guard)
    }

    /// Copies the current value out; the lock is released before returning.
    pub fn snapshot(&self, wait: Duration) -> Result<u64, LockTimeout> {
        self.value
            .try_lock_for(wait)
            .map(|guard| *guard)
            .ok_or(LockTimeout { waited: wait })
    }

    /// Holds the lock until the returned guard is dropped.
    #[cfg(test)]
    pub(crate) fn hold(&self) -> parking_lot::MutexGuard<'_, u64> {
        self.value.lock()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::thread;

    use proptest::prelude::*;

    use super::*;

    const WAIT: Duration = Duration::from_millis(1);

    #[test]
    fn starts_at_zero() {
        let counter = TickCounter::new();
        assert_eq!(counter.snapshot(WAIT), Ok(0));
    }

    #[test]
    fn contended_lock_times_out_without_mutation() {
        let counter = TickCounter::new();
        counter.advance(WAIT).unwrap();
        {
            let _held = counter.hold();
            let other = thread::scope(|s| {
                s.spawn(|| (counter.advance(WAIT), counter.snapshot(WAIT)))
                    .join()
                    .unwrap()
            });
            assert_eq!(other.0, Err(LockTimeout { waited: WAIT }));
            assert_eq!(other.1, Err(LockTimeout { waited: WAIT }));
        }
        assert_eq!(counter.snapshot(WAIT), Ok(1));
    }

    #[test]
    fn concurrent_writer_and_readers_see_consistent_values() {
        let counter = Arc::new(TickCounter::new());
        let successes = Arc::new(AtomicU64::new(0));
        let wait = Duration::from_millis(50);

        let writer = {
            let counter = Arc::clone(&counter);
            let successes = Arc::clone(&successes);
            thread::spawn(move || {
                for _ in 0..5_000 {
                    if counter.advance(wait).is_ok() {
                        successes.fetch_add(1, Ordering::Relaxed);
                    }
                }
            })
        };

        let readers: Vec<_> = (0..3)
            .map(|_| {
                let counter = Arc::clone(&counter);
                thread::spawn(move || {
                    let mut last = 0;
                    for _ in 0..5_000 {
                        if let Ok(v) = counter.snapshot(wait) {
                            assert!(v >= last, "observed {v} after {last}");
                            assert!(v <= 5_000);
                            last = v;
                        }
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for r in readers {
            r.join().unwrap();
        }
        assert_eq!(
            counter.snapshot(wait).unwrap(),
            successes.load(Ordering::Relaxed)
        );
    }

    proptest! {
        #[test]
        fn n_advances_add_exactly_n(start in 0u64..64, n in 0u64..256) {
            let counter = TickCounter::new();
            for _ in 0..start {
                counter.advance(WAIT).unwrap();
            }
            let before = counter.snapshot(WAIT).unwrap();
            let mut prev = before;
            for _ in 0..n {
                let next = counter.advance(WAIT).unwrap();
                prop_assert_eq!(next, prev + 1);
                prev = next;
            }
            prop_assert_eq!(counter.snapshot(WAIT).unwrap(), before + n);
        }
    }
}

use anyhow::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Fixed delay between poll attempts.
pub const RETRY_DELAY: Duration = Duration::from_secs(2);

/// Shared cancellation flag. Polling has no failure state of its own, so
/// stopping a pending poll is always an external decision (app teardown).
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Retry `fetch` until it succeeds. Every error — transport, protocol, or
/// parse — schedules one retry after `delay`; the next attempt only starts
/// once the previous one has completed, so at most one request is in flight.
/// Returns None only when cancelled or when `max_attempts` (None =
/// unlimited) runs out.
pub fn poll_until_success<T>(
    mut fetch: impl FnMut() -> Result<T>,
    delay: Duration,
    max_attempts: Option<u32>,
    cancel: &CancelToken,
) -> Option<T> {
    let mut attempts: u32 = 0;
    loop {
        if cancel.is_cancelled() {
            return None;
        }
        match fetch() {
            Ok(value) => return Some(value),
            Err(_) => {
                attempts = attempts.saturating_add(1);
                if let Some(max) = max_attempts {
                    if attempts >= max {
                        return None;
                    }
                }
                if cancel.is_cancelled() {
                    return None;
                }
                thread::sleep(delay);
            }
        }
    }
}

/// A background poll against an idempotent GET. On success the wrapped
/// event is sent exactly once and the worker exits; the owner then drops
/// the poller. Dropping a pending poller cancels it.
pub struct Poller {
    cancel: CancelToken,
}

impl Poller {
    pub fn spawn<T, E, F, W>(
        mut fetch: F,
        tx: mpsc::Sender<E>,
        wrap: W,
        delay: Duration,
        max_attempts: Option<u32>,
    ) -> Self
    where
        T: Send + 'static,
        E: Send + 'static,
        F: FnMut() -> Result<T> + Send + 'static,
        W: FnOnce(T) -> E + Send + 'static,
    {
        let cancel = CancelToken::new();
        let token = cancel.clone();
        thread::spawn(move || {
            if let Some(value) = poll_until_success(&mut fetch, delay, max_attempts, &token) {
                let _ = tx.send(wrap(value));
            }
        });
        Poller { cancel }
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::cell::Cell;

    #[test]
    fn succeeds_after_two_retries() {
        let calls = Cell::new(0u32);
        let result = poll_until_success(
            || {
                calls.set(calls.get() + 1);
                match calls.get() {
                    1 | 2 => Err(anyhow!("error")),
                    _ => Ok("ready"),
                }
            },
            Duration::ZERO,
            None,
            &CancelToken::new(),
        );
        assert_eq!(result, Some("ready"));
        // Exactly two retries, no further requests after success
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn immediate_success_needs_one_attempt() {
        let calls = Cell::new(0u32);
        let result = poll_until_success(
            || {
                calls.set(calls.get() + 1);
                Ok(())
            },
            Duration::ZERO,
            None,
            &CancelToken::new(),
        );
        assert!(result.is_some());
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn max_attempts_bounds_the_loop() {
        let calls = Cell::new(0u32);
        let result: Option<()> = poll_until_success(
            || {
                calls.set(calls.get() + 1);
                Err(anyhow!("down"))
            },
            Duration::ZERO,
            Some(5),
            &CancelToken::new(),
        );
        assert!(result.is_none());
        assert_eq!(calls.get(), 5);
    }

    #[test]
    fn cancellation_stops_before_first_attempt() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let calls = Cell::new(0u32);
        let result: Option<()> = poll_until_success(
            || {
                calls.set(calls.get() + 1);
                Err(anyhow!("down"))
            },
            Duration::ZERO,
            None,
            &cancel,
        );
        assert!(result.is_none());
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn spawned_poller_delivers_exactly_once() {
        let (tx, rx) = mpsc::channel();
        let calls = Arc::new(AtomicBool::new(false));
        let seen = calls.clone();
        let _poller = Poller::spawn(
            move || {
                if seen.swap(true, Ordering::SeqCst) {
                    Err(anyhow!("only one success expected"))
                } else {
                    Ok(42)
                }
            },
            tx,
            |n| n,
            Duration::ZERO,
            None,
        );
        assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), 42);
        // Worker exited after the success — the channel closes
        assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
    }
}

//! Registry of requests sent but not yet completed.
//!
//! The foreground adds an id before writing its request and the receive loop
//! removes it when the matching `/done` arrives. Shutdown blocks on the
//! condition variable until the set drains or the receive loop stops.

use std::collections::HashSet;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use mgctl_protocol::RequestId;

#[derive(Debug, Default)]
struct State {
    ids: HashSet<RequestId>,
    reader_stopped: bool,
}

/// Outcome of waiting for the registry to drain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Drain {
    /// Every request completed.
    Drained,
    /// The receive loop stopped while requests were still pending.
    ReaderStopped { outstanding: Vec<RequestId> },
    /// The timeout elapsed first.
    TimedOut { outstanding: Vec<RequestId> },
}

/// Thread-safe set of in-flight request ids.
#[derive(Debug, Default)]
pub(crate) struct PendingRequests {
    state: Mutex<State>,
    changed: Condvar,
}

impl PendingRequests {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Records `id` as pending. Adding a present id leaves the set unchanged.
    pub(crate) fn add(&self, id: RequestId) {
        self.lock().ids.insert(id);
    }

    /// Removes `id`, returning whether it was pending.
    pub(crate) fn remove(&self, id: RequestId) -> bool {
        let mut state = self.lock();
        let found = state.ids.remove(&id);
        if found && state.ids.is_empty() {
            self.changed.notify_all();
        }
        found
    }

    pub(crate) fn len(&self) -> usize {
        self.lock().ids.len()
    }

    /// Marks the receive loop as stopped; no further removals will happen.
    pub(crate) fn close(&self) {
        self.lock().reader_stopped = true;
        self.changed.notify_all();
    }

    /// Blocks until no request is pending, the reader stops, or `timeout`
    /// elapses. `None`, or a timeout too large to express as an instant,
    /// waits without bound.
    pub(crate) fn wait_drained(&self, timeout: Option<Duration>) -> Drain {
        let deadline = timeout.and_then(|limit| Instant::now().checked_add(limit));
        let mut state = self.lock();
        loop {
            if state.ids.is_empty() {
                return Drain::Drained;
            }
            if state.reader_stopped {
                return Drain::ReaderStopped {
                    outstanding: sorted(&state.ids),
                };
            }
            state = match deadline {
                None => self
                    .changed
                    .wait(state)
                    .unwrap_or_else(PoisonError::into_inner),
                Some(at) => {
                    let now = Instant::now();
                    if now >= at {
                        return Drain::TimedOut {
                            outstanding: sorted(&state.ids),
                        };
                    }
                    self.changed
                        .wait_timeout(state, at.saturating_duration_since(now))
                        .unwrap_or_else(PoisonError::into_inner)
                        .0
                }
            };
        }
    }
}

fn sorted(ids: &HashSet<RequestId>) -> Vec<RequestId> {
    let mut outstanding: Vec<RequestId> = ids.iter().copied().collect();
    outstanding.sort_unstable();
    outstanding
}

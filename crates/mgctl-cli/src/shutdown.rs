//! Ordered teardown of a session.
//!
//! The coordinator suspends on the pending registry rather than polling it,
//! then raises the shutdown flag and closes the connection so the receive
//! loop's blocked read returns and the loop can be joined.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tracing::{debug, warn};

use crate::errors::{AppError, join_ids};
use crate::pending::{Drain, PendingRequests};
use crate::receiver::ReceiverExit;
use crate::transport::Connection;

const SHUTDOWN_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::shutdown");

/// Releases the connection so the receive loop unblocks.
pub(crate) trait Closer {
    fn close(&self) -> io::Result<()>;
}

impl Closer for Connection {
    fn close(&self) -> io::Result<()> {
        Self::close(self)
    }
}

/// Waits for outstanding requests and then closes the connection.
pub(crate) struct ShutdownCoordinator<'a, C> {
    pending: &'a PendingRequests,
    shutdown: &'a AtomicBool,
    closer: C,
    timeout: Option<Duration>,
}

impl<'a, C: Closer> ShutdownCoordinator<'a, C> {
    pub(crate) const fn new(
        pending: &'a PendingRequests,
        shutdown: &'a AtomicBool,
        closer: C,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            pending,
            shutdown,
            closer,
            timeout,
        }
    }

    /// Blocks until every request completed, the receive loop stopped, or the
    /// timeout elapsed; the connection is closed in all three cases.
    pub(crate) fn finish(self) -> Drain {
        debug!(
            target: SHUTDOWN_TARGET,
            pending = self.pending.len(),
            timeout_secs = self.timeout.as_ref().map(Duration::as_secs),
            "waiting for outstanding requests"
        );
        let drain = self.pending.wait_drained(self.timeout);
        self.close();
        drain
    }

    /// Closes the connection without waiting.
    pub(crate) fn abort(self) {
        debug!(
            target: SHUTDOWN_TARGET,
            pending = self.pending.len(),
            "closing connection without waiting"
        );
        self.close();
    }

    fn close(&self) {
        self.shutdown.store(true, Ordering::Release);
        if let Err(error) = self.closer.close() {
            warn!(
                target: SHUTDOWN_TARGET,
                error = %error,
                "failed to close connection"
            );
        }
    }
}

/// Maps the drain outcome onto the session result.
pub(crate) fn outcome(drain: Drain, exit: &ReceiverExit) -> Result<(), AppError> {
    match drain {
        Drain::Drained => Ok(()),
        Drain::ReaderStopped { outstanding } => Err(AppError::RequestsOutstanding {
            reason: exit.to_string(),
            count: outstanding.len(),
            ids: join_ids(&outstanding),
        }),
        Drain::TimedOut { outstanding } => Err(AppError::WaitTimedOut {
            count: outstanding.len(),
            ids: join_ids(&outstanding),
        }),
    }
}

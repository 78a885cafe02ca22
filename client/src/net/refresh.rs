//! Single-flight gate for access-token refresh.
//!
//! DESIGN
//! ======
//! The first request to fail with an expired token becomes the leader and
//! performs the refresh. Requests failing while it runs queue a `oneshot`
//! continuation and await the leader's outcome instead of refreshing again.
//! The lock is only held for flag/queue bookkeeping, never across an await.
//!
//! A leader settles explicitly; if its future is dropped first, the lease's
//! `Drop` clears the flag and rejects the queue with `RefreshAbandoned`, so a
//! cancelled leader cannot wedge later requests.

#[cfg(test)]
#[path = "refresh_test.rs"]
mod refresh_test;

use std::sync::Mutex;

use tokio::sync::oneshot;

use super::error::ApiError;

pub(crate) type RefreshOutcome = Result<(), ApiError>;

#[derive(Default)]
pub(crate) struct RefreshGate {
    inner: Mutex<GateInner>,
}

#[derive(Default)]
struct GateInner {
    in_progress: bool,
    queue: Vec<oneshot::Sender<RefreshOutcome>>,
}

pub(crate) enum Ticket<'a> {
    Leader(RefreshLease<'a>),
    Follower(oneshot::Receiver<RefreshOutcome>),
}

impl RefreshGate {
    /// Become the refresh leader, or join the queue behind the current one.
    pub(crate) fn acquire(&self) -> Ticket<'_> {
        let mut inner = self
            .inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if inner.in_progress {
            let (tx, rx) = oneshot::channel();
            inner.queue.push(tx);
            return Ticket::Follower(rx);
        }
        inner.in_progress = true;
        Ticket::Leader(RefreshLease { gate: self, settled: false })
    }

    pub(crate) fn in_progress(&self) -> bool {
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .in_progress
    }

    #[cfg(test)]
    pub(crate) fn queued(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .queue
            .len()
    }

    fn release(&self, outcome: &RefreshOutcome) {
        let waiters = {
            let mut inner = self
                .inner
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            inner.in_progress = false;
            std::mem::take(&mut inner.queue)
        };
        tracing::debug!(waiters = waiters.len(), ok = outcome.is_ok(), "refresh settled");
        for waiter in waiters {
            // A waiter whose request was dropped no longer listens.
            let _ = waiter.send(outcome.clone());
        }
    }
}

/// Proof of refresh leadership. Settle it with the refresh outcome.
pub(crate) struct RefreshLease<'a> {
    gate: &'a RefreshGate,
    settled: bool,
}

impl RefreshLease<'_> {
    /// Clear the in-progress flag and hand `outcome` to every queued request.
    pub(crate) fn settle(mut self, outcome: &RefreshOutcome) {
        self.settled = true;
        self.gate.release(outcome);
    }
}

impl Drop for RefreshLease<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.gate.release(&Err(ApiError::RefreshAbandoned));
        }
    }
}

/// Await a queued continuation.
pub(crate) async fn wait(rx: oneshot::Receiver<RefreshOutcome>) -> RefreshOutcome {
    rx.await.unwrap_or(Err(ApiError::RefreshAbandoned))
}

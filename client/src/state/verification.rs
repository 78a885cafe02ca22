//! Push signal for emailed booking verification.
//!
//! DESIGN
//! ======
//! A submitted booking is only confirmed after the customer opens the link
//! mailed to them. Whatever handles that link (a CLI command, a web callback)
//! calls [`VerificationBus::confirm`]; the wizard awaits the signal with an
//! upper bound instead of polling shared state.

#[cfg(test)]
#[path = "verification_test.rs"]
mod verification_test;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerificationError {
    #[error("timed out waiting for booking verification")]
    TimedOut,
    #[error("verification signal closed")]
    Closed,
}

#[async_trait]
pub trait VerificationSignal: Send + Sync {
    /// Wait for confirmation and return the message to show the customer.
    async fn wait_confirmed(&self, timeout: Duration) -> Result<String, VerificationError>;
}

/// In-process [`VerificationSignal`]. Clones share the same signal.
#[derive(Clone)]
pub struct VerificationBus {
    tx: Arc<watch::Sender<Option<String>>>,
}

impl Default for VerificationBus {
    fn default() -> Self {
        Self::new()
    }
}

impl VerificationBus {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    /// Mark the pending booking as verified and wake every waiter.
    pub fn confirm(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::info!(%message, "booking verified");
        self.tx.send_replace(Some(message));
    }

    /// Forget a previous confirmation before the next booking.
    pub fn reset(&self) {
        self.tx.send_replace(None);
    }

    #[must_use]
    pub fn is_confirmed(&self) -> bool {
        self.tx.borrow().is_some()
    }
}

#[async_trait]
impl VerificationSignal for VerificationBus {
    async fn wait_confirmed(&self, timeout: Duration) -> Result<String, VerificationError> {
        let mut rx = self.tx.subscribe();
        let outcome = tokio::time::timeout(timeout, rx.wait_for(Option::is_some)).await;
        match outcome {
            Ok(Ok(message)) => Ok(message.clone().unwrap_or_default()),
            Ok(Err(_)) => Err(VerificationError::Closed),
            Err(_) => Err(VerificationError::TimedOut),
        }
    }
}

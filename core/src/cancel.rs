//! Composite cancellation with attribution.
//!
//! `ComposedCancel` merges an optional caller token with a deadline into one
//! effective token. The first source to fire is recorded as a
//! `CancelReason`; later firings are no-ops. The timer lives inside the
//! future returned by `watch`, so it is dropped together with the call that
//! awaits it. Dropping a `ComposedCancel` releases the effective token
//! (cancels it without recording a reason).

use std::sync::OnceLock;
use std::time::Duration;

use tokio::time::{sleep_until, Instant};
use tokio_util::sync::{CancellationToken, DropGuard};

/// Which source cancelled a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// The caller's own token fired.
    Caller,
    /// The timeout policy's deadline passed.
    Timeout,
}

#[derive(Debug)]
pub struct ComposedCancel {
    effective: CancellationToken,
    external: Option<CancellationToken>,
    deadline: Instant,
    reason: OnceLock<CancelReason>,
    _release: DropGuard,
}

impl ComposedCancel {
    /// Compose `external` with a timer of length `timeout` starting now.
    ///
    /// An external token that is already cancelled cancels the effective
    /// token immediately.
    pub fn compose(external: Option<&CancellationToken>, timeout: Duration) -> Self {
        let effective = CancellationToken::new();
        let composed = Self {
            _release: effective.clone().drop_guard(),
            effective,
            external: external.cloned(),
            deadline: Instant::now() + timeout,
            reason: OnceLock::new(),
        };
        if external.is_some_and(CancellationToken::is_cancelled) {
            composed.fire(CancelReason::Caller);
        }
        composed
    }

    /// The effective token to hand to the transport.
    pub fn token(&self) -> CancellationToken {
        self.effective.clone()
    }

    pub fn reason(&self) -> Option<CancelReason> {
        self.reason.get().copied()
    }

    pub fn timed_out(&self) -> bool {
        self.reason() == Some(CancelReason::Timeout)
    }

    /// Wait until either source fires, record it, and cancel the effective
    /// token. Resolves to the reason that won.
    pub async fn watch(&self) -> CancelReason {
        if let Some(reason) = self.reason() {
            return reason;
        }
        let fired = match &self.external {
            // Caller wins a tie: only a timer that fired on its own is systemic.
            Some(external) => tokio::select! {
                biased;
                _ = external.cancelled() => CancelReason::Caller,
                _ = sleep_until(self.deadline) => CancelReason::Timeout,
            },
            None => {
                sleep_until(self.deadline).await;
                CancelReason::Timeout
            }
        };
        self.fire(fired)
    }

    /// Record `reason` if nothing fired yet. Returns the reason in effect.
    fn fire(&self, reason: CancelReason) -> CancelReason {
        let winner = *self.reason.get_or_init(|| reason);
        self.effective.cancel();
        winner
    }
}

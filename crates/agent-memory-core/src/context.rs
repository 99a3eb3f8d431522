//! Cancellation and deadline context for memory operations.

use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

/// Context passed to every memory operation.
///
/// The in-memory backend never blocks and ignores it. Backends that do
/// block (file, network) are expected to stop work once [`is_done`]
/// reports true.
///
/// [`is_done`]: MemoryContext::is_done
#[derive(Debug, Clone, Default)]
pub struct MemoryContext {
    /// Cancellation token shared with the caller.
    cancellation: CancellationToken,

    /// Point in time after which the operation should give up.
    deadline: Option<Instant>,
}

impl MemoryContext {
    /// Context that is never cancelled and has no deadline.
    #[must_use]
    pub fn background() -> Self {
        Self::default()
    }

    /// Context bound to an existing cancellation token.
    #[must_use]
    pub fn with_cancellation(token: CancellationToken) -> Self {
        Self {
            cancellation: token,
            deadline: None,
        }
    }

    /// Context with a deadline `timeout` from now.
    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::background().deadline_at(Instant::now() + timeout)
    }

    /// Context with an absolute deadline.
    #[must_use]
    pub fn with_deadline(deadline: Instant) -> Self {
        Self::background().deadline_at(deadline)
    }

    /// Set or replace the deadline.
    #[must_use]
    pub fn deadline_at(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Child context: cancelled when this one is, with the same deadline.
    #[must_use]
    pub fn child(&self) -> Self {
        Self {
            cancellation: self.cancellation.child_token(),
            deadline: self.deadline,
        }
    }

    /// The underlying cancellation token.
    #[must_use]
    pub const fn token(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.cancellation.cancel();
    }

    /// Whether cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// The deadline, if any.
    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Whether the deadline has passed.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Whether the operation should stop (cancelled or expired).
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.is_cancelled() || self.is_expired()
    }
}

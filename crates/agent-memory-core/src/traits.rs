//! Core trait for session memory backends.

use std::collections::BTreeSet;

use async_trait::async_trait;
use thiserror::Error;

use crate::{GetCriteria, ItemType, MemoryContext, RunItem, RunResult};

/// Memory error.
///
/// Unknown sessions are never an error: they read as empty.
#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Memory error: {0}")]
    Internal(String),
}

impl MemoryError {
    /// Error for an empty session identifier.
    #[must_use]
    pub fn empty_session_id() -> Self {
        Self::InvalidArgument("session ID cannot be empty".to_string())
    }
}

/// Reject empty session identifiers.
///
/// # Errors
/// Returns [`MemoryError::InvalidArgument`] if `session_id` is empty.
pub fn validate_session_id(session_id: &str) -> Result<(), MemoryError> {
    if session_id.is_empty() {
        Err(MemoryError::empty_session_id())
    } else {
        Ok(())
    }
}

/// Trait for session memory backends.
///
/// Each session is an ordered, append-only list of [`RunItem`]s. Sessions
/// exist from their first `add` until they are cleared.
#[async_trait]
pub trait Memory: Send + Sync {
    /// Append a turn's items, then its final output as an assistant message.
    async fn add(
        &self,
        ctx: &MemoryContext,
        session_id: &str,
        result: &RunResult,
    ) -> Result<(), MemoryError>;

    /// Retrieve items matching `criteria` (`None` = everything, in order).
    async fn get(
        &self,
        ctx: &MemoryContext,
        session_id: &str,
        criteria: Option<&GetCriteria>,
    ) -> Result<Vec<RunItem>, MemoryError>;

    /// Remove a session entirely.
    async fn clear(&self, ctx: &MemoryContext, session_id: &str) -> Result<(), MemoryError>;

    /// Remove every session.
    async fn clear_all(&self, ctx: &MemoryContext) -> Result<(), MemoryError>;

    /// Number of items stored for a session.
    async fn size(&self, ctx: &MemoryContext, session_id: &str) -> Result<usize, MemoryError>;

    /// Identifiers of all live sessions.
    async fn sessions(&self, ctx: &MemoryContext) -> Result<BTreeSet<String>, MemoryError>;

    /// Every item in a session, in insertion order.
    async fn get_all(
        &self,
        ctx: &MemoryContext,
        session_id: &str,
    ) -> Result<Vec<RunItem>, MemoryError> {
        self.get(ctx, session_id, None).await
    }

    /// The `n` most recently appended items, newest first.
    async fn get_recent(
        &self,
        ctx: &MemoryContext,
        session_id: &str,
        n: usize,
    ) -> Result<Vec<RunItem>, MemoryError> {
        self.get(ctx, session_id, Some(&GetCriteria::recent(n))).await
    }

    /// Items of the given types, in insertion order.
    async fn get_by_type(
        &self,
        ctx: &MemoryContext,
        session_id: &str,
        types: &[ItemType],
    ) -> Result<Vec<RunItem>, MemoryError> {
        self.get(ctx, session_id, Some(&GetCriteria::by_type(types)))
            .await
    }
}

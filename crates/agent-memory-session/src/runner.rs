//! Session runner: executes agent turns and records them into memory.

use agent_memory_core::{
    GetCriteria, MemoryContext, RunItem, RunResult,
    traits::{Memory, MemoryError, validate_session_id},
};
use async_trait::async_trait;
use thiserror::Error;

/// Turn execution error.
#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("Provider error: {0}")]
    Provider(String),
    #[error("Tool error: {0}")]
    Tool(String),
    #[error("Turn failed: {0}")]
    Failed(String),
}

/// Trait for the engine that runs one agent turn.
///
/// Given the input and prior history, produce the turn's items and final output.
#[async_trait]
pub trait TurnExecutor: Send + Sync {
    async fn run_turn(
        &self,
        ctx: &MemoryContext,
        input: &str,
        history: &[RunItem],
    ) -> Result<RunResult, ExecutorError>;
}

/// Session runner error.
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("Memory error: {0}")]
    Memory(#[from] MemoryError),
    #[error("Executor error: {0}")]
    Executor(#[from] ExecutorError),
    #[error("Turn cancelled")]
    Cancelled,
    #[error("Turn deadline exceeded")]
    DeadlineExceeded,
}

/// Runner configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunnerConfig {
    /// How many prior items to hand the executor (0 = full history).
    pub history_limit: usize,
}

/// Runs turns for sessions and records each result into memory.
pub struct SessionRunner<M, E>
where
    M: Memory,
    E: TurnExecutor,
{
    memory: M,
    executor: E,
    config: RunnerConfig,
}

impl<M, E> SessionRunner<M, E>
where
    M: Memory,
    E: TurnExecutor,
{
    /// Create a new session runner with default configuration.
    #[must_use]
    pub fn new(memory: M, executor: E) -> Self {
        Self::with_config(memory, executor, RunnerConfig::default())
    }

    /// Create a session runner with explicit configuration.
    #[must_use]
    pub fn with_config(memory: M, executor: E, config: RunnerConfig) -> Self {
        Self {
            memory,
            executor,
            config,
        }
    }

    /// The memory backend, for diagnostic reads.
    #[must_use]
    pub const fn memory(&self) -> &M {
        &self.memory
    }

    #[must_use]
    pub const fn config(&self) -> RunnerConfig {
        self.config
    }

    /// Run one turn for `session_id` and record it.
    ///
    /// A turn that is cancelled or expires before it is recorded leaves the
    /// session untouched.
    ///
    /// # Errors
    /// Returns error if the session ID is empty, the context is done,
    /// the executor fails, or memory rejects the result.
    pub async fn run(
        &self,
        ctx: &MemoryContext,
        session_id: &str,
        input: &str,
    ) -> Result<RunResult, RunnerError> {
        validate_session_id(session_id)?;
        check(ctx)?;

        let history = self.history(ctx, session_id).await?;
        let mut result = self.executor.run_turn(ctx, input, &history).await?;
        if result.input.is_empty() {
            result.input = input.to_string();
        }

        check(ctx)?;
        self.memory.add(ctx, session_id, &result).await?;

        tracing::info!(
            session_id,
            history = history.len(),
            recorded = result.recorded_len(),
            "Recorded turn"
        );
        Ok(result)
    }

    /// Prior items for a session in chronological order, capped by `history_limit`.
    ///
    /// # Errors
    /// Returns error if memory retrieval fails.
    pub async fn history(
        &self,
        ctx: &MemoryContext,
        session_id: &str,
    ) -> Result<Vec<RunItem>, MemoryError> {
        if self.config.history_limit == 0 {
            return self.memory.get(ctx, session_id, None).await;
        }

        let criteria = GetCriteria::recent(self.config.history_limit);
        let mut items = self.memory.get(ctx, session_id, Some(&criteria)).await?;
        items.reverse();
        Ok(items)
    }
}

fn check(ctx: &MemoryContext) -> Result<(), RunnerError> {
    if ctx.is_cancelled() {
        tracing::warn!("Turn cancelled before completion");
        return Err(RunnerError::Cancelled);
    }
    if ctx.is_expired() {
        tracing::warn!("Turn deadline exceeded");
        return Err(RunnerError::DeadlineExceeded);
    }
    Ok(())
}

//! Session memory storage and turn orchestration for agents.
//!
//! Provides:
//! - Storage implementations of [`Memory`](agent_memory_core::Memory) (in-memory)
//! - `SessionRunner` - Run agent turns and record them into memory

pub mod runner;
pub mod storage;

pub use runner::{ExecutorError, RunnerConfig, RunnerError, SessionRunner, TurnExecutor};

//! Core abstractions for session-scoped agent interaction memory.
//!
//! This crate provides the fundamental building blocks:
//! - `RunItem` - Typed record produced by an agent turn
//! - `RunResult` - Batch of records plus optional final output
//! - `GetCriteria` - Filter/order/limit parameters for retrieval
//! - `MemoryContext` - Cancellation and deadline token threaded through every call
//! - `Memory` trait - The storage contract backends implement

pub mod context;
pub mod item;
pub mod retrieval;
pub mod traits;

pub use context::MemoryContext;
pub use item::{ItemType, RunItem, RunResult};
pub use retrieval::GetCriteria;
pub use traits::{Memory, MemoryError};

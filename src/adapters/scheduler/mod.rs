//! Tick scheduler adapters.

mod in_memory;
mod tokio_runner;

pub use in_memory::{InMemoryScheduler, ScheduledEntry};
pub use tokio_runner::{HookFuture, HookHandler, TokioScheduler};

//! Rate limiter adapters.

mod in_memory;

pub use in_memory::{FixedWindowRateLimiter, DEFAULT_LIMIT, DEFAULT_WINDOW_SECS};

//! Ports: interfaces to external collaborators.

mod data_provider;
mod document_parser;
mod key_value_store;
mod rate_limiter;
mod tick_scheduler;

pub use data_provider::{DataProvider, ItemPage, ProviderError};
pub use document_parser::{DocumentParser, ParseError};
pub use key_value_store::{KeyValueStore, KeyValueStoreExt, StoreError};
pub use rate_limiter::{RateLimitDecision, RateLimitError, RateLimitStatus, RateLimiter};
pub use tick_scheduler::{ScheduleError, TickScheduler};

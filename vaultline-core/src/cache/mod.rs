//! Tag-aware query cache
//!
//! One entry per [`QueryKey`]. Entries are written in exactly three ways:
//! replaced when a fetch completes, patched after a confirmed mutation, and
//! marked stale by tag invalidation.

mod state;
mod store;
mod tag;

pub use state::{QueryState, ViewState};
pub use store::{FetchOutcome, FetchTicket, QueryStore};
pub use tag::{CachedData, Endpoint, FromCache, QueryKey, ResourceTag};

//! Service layer - business logic orchestration
//!
//! Services coordinate the cache, the API port and the event log.

pub mod logging;
mod mutation;
mod query;

pub use logging::{EntryPoint, LogEntry, LogEvent, LogSummary, LoggingService};
pub use mutation::{CreateLoanMutation, CreateTransactionMutation, MutationState};
pub use query::{QueryClient, QueryHandle};

//! Port definitions (hexagonal architecture)
//!
//! Ports define the interfaces for external dependencies. The query layer
//! depends only on these traits, not on concrete implementations.

mod fintech_api;

pub use fintech_api::{ApiResult, FintechApi};

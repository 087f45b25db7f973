//! Per-subscriber view of a cache entry

use chrono::{DateTime, Utc};

use super::tag::FromCache;
use crate::domain::result::ApiError;

/// Snapshot of one query as a view sees it
#[derive(Debug, Clone, PartialEq)]
pub struct QueryState<T> {
    pub data: Option<T>,
    /// No data yet and a fetch is in flight
    pub is_loading: bool,
    /// Any fetch in flight, including background refetches
    pub is_fetching: bool,
    pub error: Option<ApiError>,
    /// When the shown data arrived
    pub fulfilled_at: Option<DateTime<Utc>>,
    /// Invalidated and not yet refetched
    pub is_stale: bool,
}

impl<T> Default for QueryState<T> {
    fn default() -> Self {
        Self {
            data: None,
            is_loading: false,
            is_fetching: false,
            error: None,
            fulfilled_at: None,
            is_stale: false,
        }
    }
}

/// The one thing a view should render for a query
#[derive(Debug, PartialEq)]
pub enum ViewState<'a, T> {
    Loading,
    Error(&'a ApiError),
    Empty,
    Populated(&'a T),
}

impl<T: FromCache> QueryState<T> {
    /// Pick the render state. An error always wins over data.
    pub fn view(&self) -> ViewState<'_, T> {
        if let Some(error) = &self.error {
            return ViewState::Error(error);
        }
        match &self.data {
            Some(data) if data.is_empty_value() => ViewState::Empty,
            Some(data) => ViewState::Populated(data),
            None => ViewState::Loading,
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.data.is_some()
    }
}

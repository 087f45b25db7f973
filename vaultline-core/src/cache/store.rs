//! Keyed query cache with sequence-guarded writes
//!
//! The store is plain synchronous bookkeeping. Callers hold it behind a
//! mutex, take a [`FetchTicket`] before going to the network and hand the
//! ticket back with the result. A result is applied only if its ticket is
//! newer than the last one applied for that key.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use super::state::QueryState;
use super::tag::{CachedData, FromCache, QueryKey, ResourceTag};
use crate::domain::result::ApiError;

/// Permission to write one fetch result back into the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub key: QueryKey,
    pub seq: u64,
}

/// What happened to a completed fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Applied,
    /// A newer request for the same key was already applied
    Discarded,
}

struct Entry {
    data: Option<CachedData>,
    error: Option<ApiError>,
    fulfilled_at: Option<DateTime<Utc>>,
    last_applied: u64,
    /// Issued tickets that can still be applied
    in_flight: Vec<u64>,
    stale: bool,
    subscribers: usize,
    version: watch::Sender<u64>,
}

impl Entry {
    fn new() -> Self {
        let (version, _) = watch::channel(0);
        Self {
            data: None,
            error: None,
            fulfilled_at: None,
            last_applied: 0,
            in_flight: Vec::new(),
            stale: false,
            subscribers: 0,
            version,
        }
    }

    fn is_fetching(&self) -> bool {
        !self.in_flight.is_empty()
    }

    /// Needs a network round trip before it can be served
    fn needs_fetch(&self) -> bool {
        self.data.is_none() || self.stale || self.error.is_some()
    }

    fn notify(&self) {
        self.version.send_modify(|v| *v = v.wrapping_add(1));
    }
}

/// The query cache
#[derive(Default)]
pub struct QueryStore {
    entries: HashMap<QueryKey, Entry>,
    next_seq: u64,
}

impl QueryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry_mut(&mut self, key: &QueryKey) -> &mut Entry {
        self.entries.entry(key.clone()).or_insert_with(Entry::new)
    }

    /// Register a subscriber
    ///
    /// Returns the change receiver, plus a ticket when the caller must start
    /// a fetch. No ticket is issued when the cached entry is fresh, or when a
    /// fetch is in flight and the entry has not been invalidated since it
    /// started.
    pub fn subscribe(&mut self, key: &QueryKey) -> (watch::Receiver<u64>, Option<FetchTicket>) {
        let entry = self.entry_mut(key);
        entry.subscribers += 1;
        let receiver = entry.version.subscribe();
        // `begin_fetch` clears `stale`, so a stale entry's in-flight requests
        // all predate the invalidation
        let start = entry.needs_fetch() && (!entry.is_fetching() || entry.stale);

        let ticket = start.then(|| self.begin_fetch(key));
        (receiver, ticket)
    }

    pub fn unsubscribe(&mut self, key: &QueryKey) {
        if let Some(entry) = self.entries.get_mut(key) {
            entry.subscribers = entry.subscribers.saturating_sub(1);
        }
    }

    /// Issue a new ticket for `key`, regardless of what is in flight
    pub fn begin_fetch(&mut self, key: &QueryKey) -> FetchTicket {
        self.next_seq += 1;
        let seq = self.next_seq;

        let entry = self.entry_mut(key);
        entry.in_flight.push(seq);
        entry.stale = false;
        entry.notify();

        FetchTicket {
            key: key.clone(),
            seq,
        }
    }

    /// Write a fetch result back
    ///
    /// Success replaces the data and clears any error. Failure records the
    /// error and keeps the previous data.
    pub fn complete_fetch(
        &mut self,
        ticket: &FetchTicket,
        result: Result<CachedData, ApiError>,
        now: DateTime<Utc>,
    ) -> FetchOutcome {
        let entry = self.entry_mut(&ticket.key);
        entry.in_flight.retain(|s| *s != ticket.seq);

        if ticket.seq <= entry.last_applied {
            return FetchOutcome::Discarded;
        }

        entry.last_applied = ticket.seq;
        entry.in_flight.retain(|s| *s > ticket.seq);
        match result {
            Ok(data) => {
                entry.data = Some(data);
                entry.error = None;
                entry.fulfilled_at = Some(now);
            }
            Err(error) => entry.error = Some(error),
        }
        entry.notify();
        FetchOutcome::Applied
    }

    /// Edit cached data in place
    ///
    /// Does nothing and returns `false` when the key has no data.
    pub fn patch(&mut self, key: &QueryKey, f: impl FnOnce(&mut CachedData)) -> bool {
        match self.entries.get_mut(key) {
            Some(entry) => match entry.data.as_mut() {
                Some(data) => {
                    f(data);
                    entry.notify();
                    true
                }
                None => false,
            },
            None => false,
        }
    }

    /// Mark every entry providing `tag` stale
    ///
    /// Entries with live subscribers get a new ticket right away; the rest
    /// refetch on their next subscribe.
    pub fn invalidate(&mut self, tag: ResourceTag) -> Vec<FetchTicket> {
        let mut keys: Vec<QueryKey> = self
            .entries
            .keys()
            .filter(|k| k.endpoint.provides().contains(&tag))
            .cloned()
            .collect();
        keys.sort();

        let mut tickets = Vec::new();
        for key in keys {
            let live = match self.entries.get_mut(&key) {
                Some(entry) => {
                    entry.stale = true;
                    entry.notify();
                    entry.subscribers > 0
                }
                None => false,
            };
            if live {
                tickets.push(self.begin_fetch(&key));
            }
        }
        tickets
    }

    /// Typed snapshot for a subscriber
    pub fn state<T: FromCache>(&self, key: &QueryKey) -> QueryState<T> {
        let Some(entry) = self.entries.get(key) else {
            return QueryState::default();
        };

        let data = entry.data.as_ref().and_then(T::from_cache).cloned();
        let is_fetching = entry.is_fetching();
        QueryState {
            is_loading: is_fetching && data.is_none(),
            data,
            is_fetching,
            error: entry.error.clone(),
            fulfilled_at: entry.fulfilled_at,
            is_stale: entry.stale,
        }
    }

    pub fn data(&self, key: &QueryKey) -> Option<&CachedData> {
        self.entries.get(key).and_then(|e| e.data.as_ref())
    }

    pub fn is_stale(&self, key: &QueryKey) -> bool {
        self.entries.get(key).map(|e| e.stale).unwrap_or(false)
    }

    pub fn subscriber_count(&self, key: &QueryKey) -> usize {
        self.entries.get(key).map(|e| e.subscribers).unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

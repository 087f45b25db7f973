//! Query service - cached, self-fetching reads
//!
//! A [`QueryClient`] owns the shared [`QueryStore`] and the API port. Views
//! subscribe with a typed [`QueryHandle`], read [`QueryState`] snapshots and
//! wait for changes. Network calls run on spawned tokio tasks; the store lock
//! is only taken for bookkeeping, never across an `.await`.

use std::future::Future;
use std::marker::PhantomData;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;

use super::logging::{events, LogEvent, LoggingService};
use crate::adapters::http::DEFAULT_TIMEOUT;
use crate::cache::{
    CachedData, Endpoint, FetchOutcome, FetchTicket, FromCache, QueryKey, QueryState, QueryStore,
    ResourceTag,
};
use crate::domain::result::ApiError;
use crate::domain::{ActiveLoan, Loan, Transaction, TransactionStats, User};
use crate::ports::{ApiResult, FintechApi};

/// Shared entry point for queries and mutations
///
/// Cheap to clone; clones share the same cache.
#[derive(Clone)]
pub struct QueryClient {
    api: Arc<dyn FintechApi>,
    store: Arc<Mutex<QueryStore>>,
    logger: Option<Arc<LoggingService>>,
    timeout: Duration,
}

impl QueryClient {
    pub fn new(api: Arc<dyn FintechApi>) -> Self {
        Self {
            api,
            store: Arc::new(Mutex::new(QueryStore::new())),
            logger: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_logger(mut self, logger: Arc<LoggingService>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Upper bound for every fetch and mutation
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn api_name(&self) -> &str {
        self.api.name()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Subscribe to the endpoint that serves `T`
    ///
    /// Must be called inside a tokio runtime: a fetch is spawned when the
    /// entry is missing, stale or errored, unless a request started after
    /// the last invalidation is already in flight.
    pub fn query<T: FromCache>(&self, arg: Option<&str>) -> QueryHandle<T> {
        let key = QueryKey {
            endpoint: T::ENDPOINT,
            arg: arg.map(str::to_string),
        };

        let (receiver, ticket) = self.lock().subscribe(&key);
        if let Some(ticket) = ticket {
            self.spawn_fetch(ticket);
        }

        QueryHandle {
            client: self.clone(),
            key,
            receiver,
            _marker: PhantomData,
        }
    }

    pub fn user_account_overview(&self, user_id: &str) -> QueryHandle<User> {
        self.query(Some(user_id))
    }

    pub fn transactions(&self) -> QueryHandle<Vec<Transaction>> {
        self.query(None)
    }

    pub fn loan_history(&self) -> QueryHandle<Vec<Loan>> {
        self.query(None)
    }

    pub fn active_loans(&self) -> QueryHandle<Vec<ActiveLoan>> {
        self.query(None)
    }

    pub fn transaction_stats(&self, user_id: &str) -> QueryHandle<TransactionStats> {
        self.query(Some(user_id))
    }

    /// Re-issue the request for `key` even if a fetch is in flight
    pub fn refetch(&self, key: &QueryKey) {
        let ticket = self.lock().begin_fetch(key);
        self.spawn_fetch(ticket);
    }

    /// Mark everything providing `tag` stale and refetch what is watched
    pub fn invalidate(&self, tag: ResourceTag) {
        let tickets = self.lock().invalidate(tag);
        self.log(
            LogEvent::new(events::TAG_INVALIDATED).with_resource(tag.as_str()),
        );
        for ticket in tickets {
            self.spawn_fetch(ticket);
        }
    }

    /// Edit cached data for `key`; a no-op when nothing is cached
    pub fn patch(&self, key: &QueryKey, f: impl FnOnce(&mut CachedData)) -> bool {
        let patched = self.lock().patch(key, f);
        if patched {
            self.log(LogEvent::new(events::CACHE_PATCHED).with_resource(key.to_string()));
        }
        patched
    }

    /// Current state of `key` without subscribing
    pub fn peek<T: FromCache>(&self, key: &QueryKey) -> QueryState<T> {
        self.lock().state(key)
    }

    pub fn subscriber_count(&self, key: &QueryKey) -> usize {
        self.lock().subscriber_count(key)
    }

    /// Run a request under the client timeout
    pub(crate) async fn run<T, F>(&self, request: F) -> ApiResult<T>
    where
        F: Future<Output = ApiResult<T>>,
    {
        match tokio::time::timeout(self.timeout, request).await {
            Ok(result) => result,
            Err(_) => Err(ApiError::Timeout {
                after: self.timeout,
            }),
        }
    }

    pub(crate) fn api(&self) -> &dyn FintechApi {
        self.api.as_ref()
    }

    /// Logging failures never fail the operation
    pub(crate) fn log(&self, event: LogEvent) {
        if let Some(logger) = &self.logger {
            let _ = logger.log(event);
        }
    }

    fn lock(&self) -> MutexGuard<'_, QueryStore> {
        self.store.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn spawn_fetch(&self, ticket: FetchTicket) {
        let client = self.clone();
        tokio::spawn(async move {
            let result = client.fetch(&ticket.key).await;
            client.finish_fetch(&ticket, result);
        });
    }

    async fn fetch(&self, key: &QueryKey) -> ApiResult<CachedData> {
        let api = self.api();
        self.run(async {
            match key.endpoint {
                Endpoint::UserAccountOverview => api
                    .get_user_account_overview(key.arg())
                    .await
                    .map(CachedData::User),
                Endpoint::Transactions => api.get_transactions().await.map(CachedData::Transactions),
                Endpoint::LoanHistory => api.get_loan_history().await.map(CachedData::Loans),
                Endpoint::ActiveLoans => api.get_active_loans().await.map(CachedData::ActiveLoans),
                Endpoint::TransactionStats => api
                    .get_transaction_stats(key.arg())
                    .await
                    .map(CachedData::Stats),
            }
        })
        .await
    }

    fn finish_fetch(&self, ticket: &FetchTicket, result: ApiResult<CachedData>) {
        let failure = result.as_ref().err().cloned();
        let outcome = self.lock().complete_fetch(ticket, result, Utc::now());

        let event = match (outcome, failure) {
            (FetchOutcome::Discarded, _) => LogEvent::new(events::QUERY_DISCARDED),
            (FetchOutcome::Applied, None) => LogEvent::new(events::QUERY_FULFILLED),
            (FetchOutcome::Applied, Some(error)) => {
                LogEvent::new(events::QUERY_FAILED).with_api_error(&error)
            }
        };
        self.log(event.with_resource(ticket.key.endpoint.name()));
    }
}

/// A live subscription to one query
///
/// Dropping the handle unsubscribes it; nothing is delivered to it after.
pub struct QueryHandle<T: FromCache> {
    client: QueryClient,
    key: QueryKey,
    receiver: watch::Receiver<u64>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: FromCache> QueryHandle<T> {
    pub fn key(&self) -> &QueryKey {
        &self.key
    }

    pub fn state(&self) -> QueryState<T> {
        self.client.lock().state(&self.key)
    }

    /// Retry or reload, keeping the current data visible meanwhile
    pub fn refetch(&self) {
        self.client.refetch(&self.key);
    }

    /// Wait for the next change to this entry
    pub async fn changed(&mut self) -> QueryState<T> {
        let _ = self.receiver.changed().await;
        self.state()
    }

    /// Wait until no fetch is in flight and return that state
    pub async fn settled(&mut self) -> QueryState<T> {
        loop {
            let state = self.state();
            if !state.is_fetching {
                return state;
            }
            if self.receiver.changed().await.is_err() {
                return self.state();
            }
        }
    }
}

impl<T: FromCache> Drop for QueryHandle<T> {
    fn drop(&mut self) {
        self.client.lock().unsubscribe(&self.key);
    }
}

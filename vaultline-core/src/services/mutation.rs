//! Mutation service - writes that update the cache after the server confirms
//!
//! Loan creation patches the cached loan history in place. Transaction
//! creation invalidates the `Transaction` tag, which refreshes both the
//! transaction list and the stats.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;

use super::logging::{events, LogEvent};
use super::query::QueryClient;
use crate::cache::{CachedData, Endpoint, QueryKey, ResourceTag};
use crate::domain::result::ApiError;
use crate::domain::{Loan, LoanRequest, NewLoan, NewTransaction, Transaction};
use crate::ports::ApiResult;

/// Progress of the most recent call of a mutation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MutationState<T> {
    pub is_loading: bool,
    pub data: Option<T>,
    pub error: Option<ApiError>,
}

impl<T> Default for MutationState<T> {
    fn default() -> Self {
        Self {
            is_loading: false,
            data: None,
            error: None,
        }
    }
}

/// Shared bookkeeping for both mutations
struct Tracker<T> {
    name: &'static str,
    state: watch::Sender<MutationState<T>>,
}

impl<T: Clone> Tracker<T> {
    fn new(name: &'static str) -> Self {
        let (state, _) = watch::channel(MutationState::default());
        Self { name, state }
    }

    fn start(&self) {
        self.state.send_modify(|s| {
            s.is_loading = true;
            s.error = None;
        });
    }

    fn finish(&self, client: &QueryClient, result: &ApiResult<T>) {
        let event = match result {
            Ok(_) => LogEvent::new(events::MUTATION_FULFILLED),
            Err(error) => LogEvent::new(events::MUTATION_FAILED).with_api_error(error),
        };
        client.log(event.with_resource(self.name));

        self.state.send_modify(|s| {
            s.is_loading = false;
            match result {
                Ok(data) => {
                    s.data = Some(data.clone());
                    s.error = None;
                }
                Err(error) => s.error = Some(error.clone()),
            }
        });
    }
}

/// `POST /loans`, then prepend the new loan to the cached history
pub struct CreateLoanMutation {
    client: QueryClient,
    tracker: Tracker<Loan>,
}

impl CreateLoanMutation {
    pub fn new(client: QueryClient) -> Self {
        Self {
            client,
            tracker: Tracker::new("create_loan"),
        }
    }

    pub fn state(&self) -> MutationState<Loan> {
        self.tracker.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<MutationState<Loan>> {
        self.tracker.state.subscribe()
    }

    pub async fn execute(&self, request: &LoanRequest) -> ApiResult<Loan> {
        self.execute_at(request, Utc::now()).await
    }

    /// Same as [`execute`](Self::execute) with an explicit clock
    ///
    /// Invalid requests fail with `ApiError::Validation` before anything is
    /// sent. On failure the cache is left untouched.
    pub async fn execute_at(&self, request: &LoanRequest, now: DateTime<Utc>) -> ApiResult<Loan> {
        self.tracker.start();

        let result = match request.validate() {
            Ok(()) => {
                let payload = NewLoan::from_request(request, now);
                self.client.run(self.client.api().create_loan(&payload)).await
            }
            Err(error) => Err(error),
        };

        if let Ok(loan) = &result {
            self.client
                .patch(&QueryKey::new(Endpoint::LoanHistory), |data| {
                    if let CachedData::Loans(loans) = data {
                        loans.insert(0, loan.clone());
                    }
                });
        }

        self.tracker.finish(&self.client, &result);
        result
    }
}

/// `POST /transactions`, then refresh everything tagged `Transaction`
pub struct CreateTransactionMutation {
    client: QueryClient,
    tracker: Tracker<Transaction>,
}

impl CreateTransactionMutation {
    pub fn new(client: QueryClient) -> Self {
        Self {
            client,
            tracker: Tracker::new("create_transaction"),
        }
    }

    pub fn state(&self) -> MutationState<Transaction> {
        self.tracker.state.borrow().clone()
    }

    pub async fn execute(&self, transaction: &NewTransaction) -> ApiResult<Transaction> {
        self.tracker.start();

        let result = match transaction.validate() {
            Ok(()) => {
                self.client
                    .run(self.client.api().create_transaction(transaction))
                    .await
            }
            Err(error) => Err(error),
        };

        if result.is_ok() {
            self.client.invalidate(ResourceTag::Transaction);
        }

        self.tracker.finish(&self.client, &result);
        result
    }
}

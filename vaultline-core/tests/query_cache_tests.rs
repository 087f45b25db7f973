//! Query cache and mutation integration tests
//!
//! The backend is a scripted `FintechApi`: every GET parks on a oneshot
//! channel and the test decides when, and with what, it resolves. That makes
//! in-flight states and request races deterministic.
//!
//! Run with: cargo test --test query_cache_tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;
use tempfile::TempDir;
use tokio::sync::{mpsc, oneshot};

use vaultline_core::cache::{CachedData, Endpoint, QueryKey, ResourceTag, ViewState};
use vaultline_core::domain::result::ApiError;
use vaultline_core::domain::{
    ActiveLoan, Loan, LoanRequest, LoanStatus, NewLoan, NewTransaction, Transaction,
    TransactionStats, TransactionType, User,
};
use vaultline_core::ports::{ApiResult, FintechApi};
use vaultline_core::services::{
    CreateLoanMutation, CreateTransactionMutation, EntryPoint, LoggingService, QueryClient,
};

// ============================================================================
// Scripted backend
// ============================================================================

type Responder = oneshot::Sender<ApiResult<CachedData>>;
type Requests = mpsc::UnboundedReceiver<(Endpoint, Responder)>;

struct ScriptedApi {
    requests: mpsc::UnboundedSender<(Endpoint, Responder)>,
    create_loan_result: Mutex<Option<ApiResult<Loan>>>,
    posts: AtomicUsize,
}

impl ScriptedApi {
    fn new() -> (Arc<Self>, Requests) {
        let (tx, rx) = mpsc::unbounded_channel();
        let api = Arc::new(Self {
            requests: tx,
            create_loan_result: Mutex::new(None),
            posts: AtomicUsize::new(0),
        });
        (api, rx)
    }

    fn fail_next_loan(&self, error: ApiError) {
        *self.create_loan_result.lock().unwrap() = Some(Err(error));
    }

    fn posts(&self) -> usize {
        self.posts.load(Ordering::SeqCst)
    }

    async fn park(&self, endpoint: Endpoint) -> ApiResult<CachedData> {
        let (tx, rx) = oneshot::channel();
        let _ = self.requests.send((endpoint, tx));
        rx.await
            .unwrap_or_else(|_| Err(ApiError::transport("request abandoned")))
    }
}

fn wrong_shape(data: CachedData) -> ApiError {
    ApiError::decode(format!("unexpected {} payload", data.endpoint()))
}

#[async_trait]
impl FintechApi for ScriptedApi {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn get_user_account_overview(&self, _user_id: &str) -> ApiResult<User> {
        match self.park(Endpoint::UserAccountOverview).await? {
            CachedData::User(u) => Ok(u),
            other => Err(wrong_shape(other)),
        }
    }

    async fn get_transactions(&self) -> ApiResult<Vec<Transaction>> {
        match self.park(Endpoint::Transactions).await? {
            CachedData::Transactions(v) => Ok(v),
            other => Err(wrong_shape(other)),
        }
    }

    async fn get_loan_history(&self) -> ApiResult<Vec<Loan>> {
        match self.park(Endpoint::LoanHistory).await? {
            CachedData::Loans(v) => Ok(v),
            other => Err(wrong_shape(other)),
        }
    }

    async fn get_active_loans(&self) -> ApiResult<Vec<ActiveLoan>> {
        match self.park(Endpoint::ActiveLoans).await? {
            CachedData::ActiveLoans(v) => Ok(v),
            other => Err(wrong_shape(other)),
        }
    }

    async fn get_transaction_stats(&self, _user_id: &str) -> ApiResult<TransactionStats> {
        match self.park(Endpoint::TransactionStats).await? {
            CachedData::Stats(s) => Ok(s),
            other => Err(wrong_shape(other)),
        }
    }

    async fn create_loan(&self, loan: &NewLoan) -> ApiResult<Loan> {
        self.posts.fetch_add(1, Ordering::SeqCst);
        let scripted = self.create_loan_result.lock().unwrap().take();
        scripted.unwrap_or_else(|| Ok(loan.clone().into_loan("9", Utc::now())))
    }

    async fn create_transaction(&self, transaction: &NewTransaction) -> ApiResult<Transaction> {
        self.posts.fetch_add(1, Ordering::SeqCst);
        Ok(Transaction {
            id: "99".to_string(),
            date: transaction.date.clone(),
            amount: transaction.amount,
            kind: transaction.kind,
            description: transaction.description.clone(),
            category: transaction.category.clone(),
            created_at: String::new(),
            updated_at: String::new(),
        })
    }
}

// ============================================================================
// Test Helpers
// ============================================================================

async fn next_request(requests: &mut Requests) -> (Endpoint, Responder) {
    tokio::time::timeout(Duration::from_secs(5), requests.recv())
        .await
        .expect("timed out waiting for a request")
        .expect("request channel closed")
}

async fn expect_request(requests: &mut Requests, endpoint: Endpoint) -> Responder {
    let (got, responder) = next_request(requests).await;
    assert_eq!(got, endpoint);
    responder
}

/// Let spawned fetch tasks run to completion
async fn drain_tasks() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}

fn loan(id: &str, amount: i64) -> Loan {
    Loan {
        id: id.to_string(),
        amount: Decimal::from(amount),
        tenure: 12,
        status: LoanStatus::Active,
        purpose: format!("Existing loan {}", id),
        start_date: "2024-01-01T00:00:00.000Z".to_string(),
        end_date: "2024-12-26T00:00:00.000Z".to_string(),
        interest_rate: Decimal::new(85, 1),
        created_at: String::new(),
        updated_at: String::new(),
    }
}

fn tx(id: &str, amount: i64) -> Transaction {
    Transaction {
        id: id.to_string(),
        date: "2024-01-01".to_string(),
        amount: Decimal::from(amount),
        kind: TransactionType::Credit,
        description: String::new(),
        category: String::new(),
        created_at: String::new(),
        updated_at: String::new(),
    }
}

fn ids(loans: &[Loan]) -> Vec<&str> {
    loans.iter().map(|l| l.id.as_str()).collect()
}

fn valid_request() -> LoanRequest {
    LoanRequest::new(Decimal::from(1000), 12, "Home renovation project")
}

/// Client with loan history already cached as `[A, B]`
async fn client_with_history() -> (Arc<ScriptedApi>, Requests, QueryClient) {
    let (api, mut requests) = ScriptedApi::new();
    let client = QueryClient::new(api.clone());

    let mut handle = client.loan_history();
    expect_request(&mut requests, Endpoint::LoanHistory)
        .await
        .send(Ok(CachedData::Loans(vec![loan("A", 5000), loan("B", 1500)])))
        .unwrap();
    handle.settled().await;

    (api, requests, client)
}

// ============================================================================
// Query lifecycle
// ============================================================================

#[tokio::test]
async fn test_first_fetch_loading_then_refetch_keeps_data() {
    let (api, mut requests) = ScriptedApi::new();
    let client = QueryClient::new(api);

    let mut handle = client.loan_history();
    let state = handle.state();
    assert!(state.is_loading);
    assert!(state.is_fetching);
    assert!(state.data.is_none());
    assert_eq!(state.view(), ViewState::Loading);

    expect_request(&mut requests, Endpoint::LoanHistory)
        .await
        .send(Ok(CachedData::Loans(vec![loan("A", 5000)])))
        .unwrap();

    let state = handle.settled().await;
    assert!(!state.is_loading);
    assert!(!state.is_fetching);
    assert_eq!(ids(state.data.as_ref().unwrap()), vec!["A"]);
    let first_fulfilled = state.fulfilled_at.unwrap();

    handle.refetch();
    let state = handle.state();
    assert!(state.is_fetching);
    assert!(!state.is_loading);
    assert_eq!(ids(state.data.as_ref().unwrap()), vec!["A"]);
    assert!(matches!(state.view(), ViewState::Populated(_)));

    expect_request(&mut requests, Endpoint::LoanHistory)
        .await
        .send(Ok(CachedData::Loans(vec![loan("A", 5000), loan("C", 700)])))
        .unwrap();

    let state = handle.settled().await;
    assert_eq!(ids(state.data.as_ref().unwrap()), vec!["A", "C"]);
    assert!(state.fulfilled_at.unwrap() >= first_fulfilled);
}

#[tokio::test]
async fn test_concurrent_subscribers_share_one_request() {
    let (api, mut requests) = ScriptedApi::new();
    let client = QueryClient::new(api);

    let mut first = client.transactions();
    let mut second = client.transactions();

    expect_request(&mut requests, Endpoint::Transactions)
        .await
        .send(Ok(CachedData::Transactions(vec![tx("1", 10)])))
        .unwrap();

    assert_eq!(first.settled().await.data.unwrap().len(), 1);
    assert_eq!(second.settled().await.data.unwrap().len(), 1);
    assert!(requests.try_recv().is_err());

    // Fresh entry: a third subscriber is served from cache
    let third = client.transactions();
    assert!(!third.state().is_fetching);
    assert!(requests.try_recv().is_err());
}

#[tokio::test]
async fn test_error_surfaces_and_refetch_clears_it() {
    let (api, mut requests) = ScriptedApi::new();
    let client = QueryClient::new(api);

    let mut handle = client.transactions();
    expect_request(&mut requests, Endpoint::Transactions)
        .await
        .send(Err(ApiError::server(500, "Internal Server Error")))
        .unwrap();

    let state = handle.settled().await;
    match state.view() {
        ViewState::Error(err) => assert_eq!(err.status_code(), Some(500)),
        other => panic!("expected error view, got {:?}", other),
    }

    handle.refetch();
    expect_request(&mut requests, Endpoint::Transactions)
        .await
        .send(Ok(CachedData::Transactions(Vec::new())))
        .unwrap();

    let state = handle.settled().await;
    assert!(state.error.is_none());
    assert_eq!(state.view(), ViewState::Empty);
}

#[tokio::test]
async fn test_stale_response_is_discarded() {
    let dir = TempDir::new().unwrap();
    let logger = Arc::new(LoggingService::new(dir.path(), EntryPoint::Library, "test").unwrap());
    let (api, mut requests) = ScriptedApi::new();
    let client = QueryClient::new(api).with_logger(Arc::clone(&logger));

    let mut handle = client.transactions();
    let older = expect_request(&mut requests, Endpoint::Transactions).await;
    handle.refetch();
    let newer = expect_request(&mut requests, Endpoint::Transactions).await;

    newer
        .send(Ok(CachedData::Transactions(vec![tx("new", 2)])))
        .unwrap();
    let state = handle.settled().await;
    assert_eq!(state.data.as_ref().unwrap()[0].id, "new");

    older
        .send(Ok(CachedData::Transactions(vec![tx("old", 1)])))
        .unwrap();
    drain_tasks().await;

    let state = handle.state();
    assert_eq!(state.data.as_ref().unwrap()[0].id, "new");
    assert!(!state.is_fetching);

    let events: Vec<String> = logger
        .get_recent(10)
        .unwrap()
        .into_iter()
        .map(|e| e.event)
        .collect();
    assert!(events.contains(&"query_discarded".to_string()));
    assert!(events.contains(&"query_fulfilled".to_string()));
}

#[tokio::test]
async fn test_dropped_handle_unsubscribes_but_result_is_cached() {
    let (api, mut requests) = ScriptedApi::new();
    let client = QueryClient::new(api);
    let key = QueryKey::new(Endpoint::ActiveLoans);

    let handle = client.active_loans();
    let responder = expect_request(&mut requests, Endpoint::ActiveLoans).await;
    drop(handle);
    assert_eq!(client.subscriber_count(&key), 0);

    responder.send(Ok(CachedData::ActiveLoans(Vec::new()))).unwrap();
    drain_tasks().await;

    // Late result landed in the cache, so a new subscriber needs no request
    let handle = client.active_loans();
    assert_eq!(handle.state().data, Some(Vec::new()));
    assert!(requests.try_recv().is_err());
}

// ============================================================================
// Tag invalidation
// ============================================================================

#[tokio::test]
async fn test_invalidation_refetches_live_subscribers_only() {
    let (api, mut requests) = ScriptedApi::new();
    let client = QueryClient::new(api);
    let stats_key = QueryKey::with_arg(Endpoint::TransactionStats, "1");

    let mut txs = client.transactions();
    expect_request(&mut requests, Endpoint::Transactions)
        .await
        .send(Ok(CachedData::Transactions(vec![tx("1", 10)])))
        .unwrap();
    txs.settled().await;

    {
        let mut stats = client.transaction_stats("1");
        expect_request(&mut requests, Endpoint::TransactionStats)
            .await
            .send(Ok(CachedData::Stats(TransactionStats::new(
                Decimal::from(10),
                Decimal::ZERO,
            ))))
            .unwrap();
        stats.settled().await;
    }

    let mut loans = client.loan_history();
    expect_request(&mut requests, Endpoint::LoanHistory)
        .await
        .send(Ok(CachedData::Loans(Vec::new())))
        .unwrap();
    loans.settled().await;

    client.invalidate(ResourceTag::Transaction);

    // Only the watched transaction list goes back to the network
    let state = txs.state();
    assert!(state.is_fetching);
    assert_eq!(state.data.as_ref().unwrap().len(), 1);
    expect_request(&mut requests, Endpoint::Transactions)
        .await
        .send(Ok(CachedData::Transactions(vec![tx("1", 10), tx("2", 5)])))
        .unwrap();
    assert_eq!(txs.settled().await.data.unwrap().len(), 2);
    assert!(requests.try_recv().is_err());

    // Unrelated tag untouched
    assert!(!loans.state().is_stale);

    // The unwatched stats entry is stale and refetches on next subscribe
    assert!(client.peek::<TransactionStats>(&stats_key).is_stale);
    let _stats = client.transaction_stats("1");
    expect_request(&mut requests, Endpoint::TransactionStats).await;
}

#[tokio::test]
async fn test_resubscribe_after_invalidation_refetches_past_older_request() {
    let (api, mut requests) = ScriptedApi::new();
    let client = QueryClient::new(api);
    let key = QueryKey::new(Endpoint::Transactions);

    let handle = client.transactions();
    let older = expect_request(&mut requests, Endpoint::Transactions).await;
    drop(handle);

    // Unwatched, so this only marks the entry stale
    client.invalidate(ResourceTag::Transaction);
    assert!(requests.try_recv().is_err());

    let mut handle = client.transactions();
    older
        .send(Ok(CachedData::Transactions(vec![tx("before", 1)])))
        .unwrap();

    // The response from before the invalidation must not settle the entry
    let newer = expect_request(&mut requests, Endpoint::Transactions).await;
    newer
        .send(Ok(CachedData::Transactions(vec![tx("before", 1), tx("after", 2)])))
        .unwrap();

    let state = handle.settled().await;
    assert!(!state.is_stale);
    assert!(!state.is_fetching);
    assert_eq!(state.data.unwrap().len(), 2);
    assert!(!client.peek::<Vec<Transaction>>(&key).is_stale);
}

// ============================================================================
// Mutations
// ============================================================================

#[tokio::test]
async fn test_create_loan_prepends_on_success() {
    let (api, mut requests, client) = client_with_history().await;
    let history = client.loan_history();
    let mutation = CreateLoanMutation::new(client.clone());

    let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
    let created = mutation.execute_at(&valid_request(), now).await.unwrap();

    assert_eq!(created.id, "9");
    assert_eq!(created.status, LoanStatus::Pending);
    assert_eq!(created.start_date, "2024-06-01T12:00:00.000Z");
    assert_eq!(api.posts(), 1);

    let state = history.state();
    assert_eq!(ids(state.data.as_ref().unwrap()), vec!["9", "A", "B"]);
    assert!(!state.is_fetching);
    assert!(requests.try_recv().is_err(), "patch must not refetch");

    let mutation_state = mutation.state();
    assert!(!mutation_state.is_loading);
    assert_eq!(mutation_state.data, Some(created));
    assert!(mutation_state.error.is_none());
}

#[tokio::test]
async fn test_create_loan_failure_leaves_cache_untouched() {
    let (api, _requests, client) = client_with_history().await;
    let history = client.loan_history();
    let mutation = CreateLoanMutation::new(client.clone());

    api.fail_next_loan(ApiError::server(503, "Service temporarily unavailable"));
    let err = mutation.execute(&valid_request()).await.unwrap_err();

    assert_eq!(err.status_code(), Some(503));
    assert_eq!(ids(history.state().data.as_ref().unwrap()), vec!["A", "B"]);
    assert_eq!(mutation.state().error, Some(err));
    assert!(mutation.state().data.is_none());
}

#[tokio::test]
async fn test_create_loan_without_cached_history_is_noop_patch() {
    let (api, mut requests) = ScriptedApi::new();
    let client = QueryClient::new(api.clone());
    let mutation = CreateLoanMutation::new(client.clone());

    mutation.execute(&valid_request()).await.unwrap();

    assert_eq!(api.posts(), 1);
    let state = client.peek::<Vec<Loan>>(&QueryKey::new(Endpoint::LoanHistory));
    assert!(state.data.is_none());
    assert!(requests.try_recv().is_err());
}

#[tokio::test]
async fn test_validation_blocks_post() {
    let (api, _requests, client) = client_with_history().await;
    let mutation = CreateLoanMutation::new(client.clone());

    let request = LoanRequest::new(Decimal::from(100), 2, "short");
    let err = mutation.execute(&request).await.unwrap_err();

    match &err {
        ApiError::Validation(fields) => {
            assert!(fields.get("amount").is_some());
            assert!(fields.get("tenure").is_some());
            assert!(fields.get("purpose").is_some());
        }
        other => panic!("expected validation error, got {:?}", other),
    }
    assert_eq!(api.posts(), 0);
    let history = client.peek::<Vec<Loan>>(&QueryKey::new(Endpoint::LoanHistory));
    assert_eq!(ids(history.data.as_ref().unwrap()), vec!["A", "B"]);
}

#[tokio::test]
async fn test_create_transaction_refreshes_list_and_stats() {
    let (api, mut requests) = ScriptedApi::new();
    let client = QueryClient::new(api.clone());

    let mut txs = client.transactions();
    let mut stats = client.transaction_stats("1");
    for _ in 0..2 {
        let (endpoint, responder) = next_request(&mut requests).await;
        let data = match endpoint {
            Endpoint::Transactions => CachedData::Transactions(Vec::new()),
            Endpoint::TransactionStats => {
                CachedData::Stats(TransactionStats::new(Decimal::ZERO, Decimal::ZERO))
            }
            other => panic!("unexpected request for {}", other),
        };
        responder.send(Ok(data)).unwrap();
    }
    txs.settled().await;
    stats.settled().await;

    let mutation = CreateTransactionMutation::new(client.clone());
    mutation
        .execute(&NewTransaction {
            date: "2024-06-01".to_string(),
            amount: Decimal::from(40),
            kind: TransactionType::Credit,
            description: "Refund".to_string(),
            category: "Shopping".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(api.posts(), 1);

    let mut refreshed = Vec::new();
    for _ in 0..2 {
        let (endpoint, responder) = next_request(&mut requests).await;
        refreshed.push(endpoint);
        let data = match endpoint {
            Endpoint::Transactions => CachedData::Transactions(vec![tx("99", 40)]),
            _ => CachedData::Stats(TransactionStats::new(Decimal::from(40), Decimal::ZERO)),
        };
        responder.send(Ok(data)).unwrap();
    }
    refreshed.sort();
    assert_eq!(refreshed, vec![Endpoint::Transactions, Endpoint::TransactionStats]);

    assert_eq!(txs.settled().await.data.unwrap().len(), 1);
    assert_eq!(stats.settled().await.data.unwrap().net_balance, Decimal::from(40));
}

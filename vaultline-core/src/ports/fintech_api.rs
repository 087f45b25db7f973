//! Dashboard API port
//!
//! The remote REST API is the source of truth for every resource. The query
//! and mutation layers talk to it only through this trait, so the HTTP
//! adapter, the demo adapter and test fakes are interchangeable.

use async_trait::async_trait;

use crate::domain::{
    ActiveLoan, Loan, NewLoan, NewTransaction, Transaction, TransactionStats, User,
};
use crate::domain::result::ApiError;

pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[async_trait]
pub trait FintechApi: Send + Sync {
    /// Backend name for logs (e.g. "http", "demo")
    fn name(&self) -> &str;

    /// `GET /userAccountOverview/{id}`
    async fn get_user_account_overview(&self, user_id: &str) -> ApiResult<User>;

    /// `GET /transactions`
    async fn get_transactions(&self) -> ApiResult<Vec<Transaction>>;

    /// `GET /loans`
    async fn get_loan_history(&self) -> ApiResult<Vec<Loan>>;

    /// `GET /activeLoans`
    async fn get_active_loans(&self) -> ApiResult<Vec<ActiveLoan>>;

    /// `GET /transactionStats/{id}`
    async fn get_transaction_stats(&self, user_id: &str) -> ApiResult<TransactionStats>;

    /// `POST /loans`, returns the stored loan with server-assigned fields
    async fn create_loan(&self, loan: &NewLoan) -> ApiResult<Loan>;

    /// `POST /transactions`
    async fn create_transaction(&self, transaction: &NewTransaction) -> ApiResult<Transaction>;
}

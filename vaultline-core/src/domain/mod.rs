//! Core domain entities
//!
//! Read-only mirrors of the dashboard API resources plus the payloads the
//! client sends. Pure data with validation logic - no I/O.

mod active_loan;
mod loan;
pub mod money;
pub mod result;
mod stats;
mod transaction;
mod user;

pub use active_loan::{ActiveLoan, PaymentSchedule};
pub use loan::{
    Loan, LoanRequest, LoanStatus, NewLoan, DEFAULT_INTEREST_RATE, MAX_LOAN_AMOUNT,
    MAX_PURPOSE_LEN, MAX_TENURE_MONTHS, MIN_LOAN_AMOUNT, MIN_PURPOSE_LEN, MIN_TENURE_MONTHS,
};
pub use stats::TransactionStats;
pub use transaction::{parse_timestamp, NewTransaction, Transaction, TransactionType};
pub use user::User;

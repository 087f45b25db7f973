//! Demo data provider
//!
//! In-memory stand-in for the dashboard API so the CLI works without a
//! backend:
//! - one user with a checking account
//! - 90 days of transactions with realistic monthly patterns
//! - a loan history and one active loan with a repayment schedule
//!
//! Created loans and transactions are kept in memory for the life of the
//! process and are visible to subsequent reads.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Datelike, DateTime, NaiveDate, SecondsFormat, Utc};
use rust_decimal::Decimal;

use crate::domain::result::ApiError;
use crate::domain::{
    ActiveLoan, Loan, LoanStatus, NewLoan, NewTransaction, PaymentSchedule, Transaction,
    TransactionStats, TransactionType, User, DEFAULT_INTEREST_RATE,
};
use crate::ports::{ApiResult, FintechApi};

pub const DEMO_USER_ID: &str = "1";

/// Generate the demo user
pub fn generate_demo_user(now: DateTime<Utc>) -> User {
    let stamp = now.to_rfc3339_opts(SecondsFormat::Millis, true);
    User {
        id: DEMO_USER_ID.to_string(),
        name: "Ada Obi".to_string(),
        email: "ada.obi@example.com".to_string(),
        account_balance: Decimal::new(1_548_275, 2), // $15,482.75
        account_number: "0123456789".to_string(),
        created_at: "2023-02-14T09:00:00.000Z".to_string(),
        updated_at: stamp,
    }
}

/// Generate 90 days of demo transactions ending at `today`
pub fn generate_demo_transactions(today: NaiveDate) -> Vec<Transaction> {
    let mut transactions = Vec::new();

    for days_ago in 0..90i64 {
        let date = today - chrono::Duration::days(days_ago);
        let day_of_month = date.day();

        // Paycheck on the 1st and 15th
        if day_of_month == 1 || day_of_month == 15 {
            transactions.push(demo_transaction(
                date,
                Decimal::new(325_000, 2), // $3,250.00
                TransactionType::Credit,
                "Salary deposit",
                "Income",
            ));
        }

        if day_of_month == 5 {
            transactions.push(demo_transaction(
                date,
                Decimal::new(180_000, 2), // $1,800.00
                TransactionType::Debit,
                "Apartment rent",
                "Housing",
            ));
        }

        if day_of_month == 10 {
            transactions.push(demo_transaction(
                date,
                Decimal::new(45_000, 2),
                TransactionType::Debit,
                "Loan repayment",
                "Loans",
            ));
        }

        if day_of_month == 12 {
            transactions.push(demo_transaction(
                date,
                Decimal::new(12_500, 2),
                TransactionType::Debit,
                "Electricity and water",
                "Utilities",
            ));
        }

        // Groceries every 4 days
        if days_ago % 4 == 0 {
            let amounts = [8523i64, 6745, 9234, 7100, 5899];
            transactions.push(demo_transaction(
                date,
                Decimal::new(amounts[days_ago as usize % amounts.len()], 2),
                TransactionType::Debit,
                "Grocery store",
                "Food",
            ));
        }

        // Freelance income now and then
        if days_ago % 17 == 3 {
            transactions.push(demo_transaction(
                date,
                Decimal::new(60_000, 2),
                TransactionType::Credit,
                "Freelance design invoice",
                "Income",
            ));
        }

        if days_ago % 6 == 2 {
            let outings = [
                ("Coffee shop", 650i64),
                ("Cinema tickets", 2400),
                ("Dinner with friends", 5800),
            ];
            let (name, amount) = outings[days_ago as usize % outings.len()];
            transactions.push(demo_transaction(
                date,
                Decimal::new(amount, 2),
                TransactionType::Debit,
                name,
                "Entertainment",
            ));
        }
    }

    for (i, tx) in transactions.iter_mut().enumerate() {
        tx.id = (i + 1).to_string();
    }
    transactions
}

fn demo_transaction(
    date: NaiveDate,
    amount: Decimal,
    kind: TransactionType,
    description: &str,
    category: &str,
) -> Transaction {
    let stamp = format!("{}T12:00:00.000Z", date);
    Transaction {
        id: String::new(),
        date: date.to_string(),
        amount,
        kind,
        description: description.to_string(),
        category: category.to_string(),
        created_at: stamp.clone(),
        updated_at: stamp,
    }
}

/// Generate the demo loan history
pub fn generate_demo_loans() -> Vec<Loan> {
    vec![
        Loan {
            id: "2".to_string(),
            amount: Decimal::from(5000),
            tenure: 12,
            status: LoanStatus::Active,
            purpose: "Stock for a small retail business".to_string(),
            start_date: "2024-03-01T00:00:00.000Z".to_string(),
            end_date: "2025-02-24T00:00:00.000Z".to_string(),
            interest_rate: DEFAULT_INTEREST_RATE,
            created_at: "2024-03-01T00:00:00.000Z".to_string(),
            updated_at: "2024-03-01T00:00:00.000Z".to_string(),
        },
        Loan {
            id: "1".to_string(),
            amount: Decimal::from(1500),
            tenure: 6,
            status: LoanStatus::Completed,
            purpose: "Laptop for freelance work".to_string(),
            start_date: "2023-06-01T00:00:00.000Z".to_string(),
            end_date: "2023-11-28T00:00:00.000Z".to_string(),
            interest_rate: DEFAULT_INTEREST_RATE,
            created_at: "2023-06-01T00:00:00.000Z".to_string(),
            updated_at: "2023-11-28T00:00:00.000Z".to_string(),
        },
    ]
}

/// Generate the demo active loans
pub fn generate_demo_active_loans() -> Vec<ActiveLoan> {
    vec![ActiveLoan {
        id: "2".to_string(),
        amount: Decimal::from(5000),
        outstanding_amount: Decimal::new(320_000, 2),
        tenure: Some(12),
        remaining_tenure: Some(8),
        status: Some(LoanStatus::Active),
        purpose: "Stock for a small retail business".to_string(),
        loan_type: Some("business".to_string()),
        start_date: Some("2024-03-01T00:00:00.000Z".to_string()),
        end_date: "2025-02-24T00:00:00.000Z".to_string(),
        interest_rate: DEFAULT_INTEREST_RATE,
        payment_schedule: Some(PaymentSchedule {
            next_payment_amount: Decimal::from(450),
            days_until_next_payment: 12,
            is_overdue: false,
            last_payment_date: Some("2024-06-10T00:00:00.000Z".to_string()),
        }),
        monthly_payment: Some(Decimal::from(450)),
        total_paid: Some(Decimal::from(1800)),
        total_remaining: Some(Decimal::from(3600)),
        created_at: "2024-03-01T00:00:00.000Z".to_string(),
        updated_at: "2024-06-10T00:00:00.000Z".to_string(),
    }]
}

struct DemoState {
    user: User,
    transactions: Vec<Transaction>,
    loans: Vec<Loan>,
    active_loans: Vec<ActiveLoan>,
}

/// Demo implementation of [`FintechApi`]
pub struct DemoApi {
    state: Mutex<DemoState>,
    latency: Duration,
}

impl DemoApi {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            state: Mutex::new(DemoState {
                user: generate_demo_user(now),
                transactions: generate_demo_transactions(now.date_naive()),
                loans: generate_demo_loans(),
                active_loans: generate_demo_active_loans(),
            }),
            latency: Duration::ZERO,
        }
    }

    /// Delay every call, so loading states are visible
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    async fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }

    fn read<T>(&self, f: impl FnOnce(&DemoState) -> T) -> ApiResult<T> {
        let state = self
            .state
            .lock()
            .map_err(|_| ApiError::transport("demo state is poisoned"))?;
        Ok(f(&state))
    }

    fn write<T>(&self, f: impl FnOnce(&mut DemoState) -> T) -> ApiResult<T> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| ApiError::transport("demo state is poisoned"))?;
        Ok(f(&mut state))
    }
}

impl Default for DemoApi {
    fn default() -> Self {
        Self::new()
    }
}

/// Next numeric id after the largest one in use
fn next_id<'a>(ids: impl Iterator<Item = &'a str>) -> String {
    let max = ids.filter_map(|id| id.parse::<u64>().ok()).max().unwrap_or(0);
    (max + 1).to_string()
}

#[async_trait]
impl FintechApi for DemoApi {
    fn name(&self) -> &str {
        "demo"
    }

    async fn get_user_account_overview(&self, user_id: &str) -> ApiResult<User> {
        self.simulate_latency().await;
        let user = self.read(|s| s.user.clone())?;
        if user.id != user_id {
            return Err(ApiError::server(404, format!("User {} not found", user_id)));
        }
        Ok(user)
    }

    async fn get_transactions(&self) -> ApiResult<Vec<Transaction>> {
        self.simulate_latency().await;
        self.read(|s| s.transactions.clone())
    }

    async fn get_loan_history(&self) -> ApiResult<Vec<Loan>> {
        self.simulate_latency().await;
        self.read(|s| s.loans.clone())
    }

    async fn get_active_loans(&self) -> ApiResult<Vec<ActiveLoan>> {
        self.simulate_latency().await;
        self.read(|s| s.active_loans.clone())
    }

    async fn get_transaction_stats(&self, user_id: &str) -> ApiResult<TransactionStats> {
        self.simulate_latency().await;
        if user_id != DEMO_USER_ID {
            return Err(ApiError::server(404, format!("User {} not found", user_id)));
        }
        self.read(|s| TransactionStats::from_transactions(&s.transactions))
    }

    async fn create_loan(&self, loan: &NewLoan) -> ApiResult<Loan> {
        self.simulate_latency().await;
        let now = Utc::now();
        self.write(|s| {
            let id = next_id(s.loans.iter().map(|l| l.id.as_str()));
            let created = loan.clone().into_loan(id, now);
            s.loans.insert(0, created.clone());
            created
        })
    }

    async fn create_transaction(&self, transaction: &NewTransaction) -> ApiResult<Transaction> {
        self.simulate_latency().await;
        let stamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        self.write(|s| {
            let created = Transaction {
                id: next_id(s.transactions.iter().map(|t| t.id.as_str())),
                date: transaction.date.clone(),
                amount: transaction.amount,
                kind: transaction.kind,
                description: transaction.description.clone(),
                category: transaction.category.clone(),
                created_at: stamp.clone(),
                updated_at: stamp,
            };
            s.transactions.insert(0, created.clone());
            created
        })
    }
}

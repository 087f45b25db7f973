//! Loan domain model and the loan request form

use std::fmt;

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::money;
use super::result::{ApiError, ValidationErrors};

pub const MIN_LOAN_AMOUNT: i64 = 500;
pub const MAX_LOAN_AMOUNT: i64 = 40_000;
pub const MIN_TENURE_MONTHS: u32 = 3;
pub const MAX_TENURE_MONTHS: u32 = 60;
pub const MIN_PURPOSE_LEN: usize = 10;
pub const MAX_PURPOSE_LEN: usize = 500;

/// Rate quoted on every new request (percent APR)
pub const DEFAULT_INTEREST_RATE: Decimal = Decimal::from_parts(85, 0, 0, false, 1);

/// Tenure is converted to an end date using 30-day months
const DAYS_PER_MONTH: i64 = 30;

/// Loan lifecycle status. Transitions are owned by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoanStatus {
    Pending,
    Active,
    Completed,
}

impl LoanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoanStatus::Pending => "pending",
            LoanStatus::Active => "active",
            LoanStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A loan in the user's history (`/loans`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Loan {
    pub id: String,
    #[serde(with = "money")]
    pub amount: Decimal,
    /// Months
    pub tenure: u32,
    pub status: LoanStatus,
    pub purpose: String,
    pub start_date: String,
    pub end_date: String,
    #[serde(with = "money")]
    pub interest_rate: Decimal,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

/// Body of `POST /loans`: a loan minus `id`, `createdAt`, `updatedAt`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLoan {
    #[serde(with = "money")]
    pub amount: Decimal,
    pub tenure: u32,
    pub status: LoanStatus,
    pub purpose: String,
    pub start_date: String,
    pub end_date: String,
    #[serde(with = "money")]
    pub interest_rate: Decimal,
}

impl NewLoan {
    /// Expand a validated request into the payload sent to the server
    ///
    /// New loans always start `pending`, begin at `now` and end `tenure`
    /// 30-day months later. An end date past chrono's range clamps to the
    /// latest representable instant.
    pub fn from_request(request: &LoanRequest, now: DateTime<Utc>) -> Self {
        let end = Duration::try_days(i64::from(request.tenure) * DAYS_PER_MONTH)
            .and_then(|span| now.checked_add_signed(span))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        Self {
            amount: request.amount,
            tenure: request.tenure,
            status: LoanStatus::Pending,
            purpose: request.purpose.trim().to_string(),
            start_date: now.to_rfc3339_opts(SecondsFormat::Millis, true),
            end_date: end.to_rfc3339_opts(SecondsFormat::Millis, true),
            interest_rate: DEFAULT_INTEREST_RATE,
        }
    }

    /// Materialize the loan the server would return for this payload
    pub fn into_loan(self, id: impl Into<String>, now: DateTime<Utc>) -> Loan {
        let stamp = now.to_rfc3339_opts(SecondsFormat::Millis, true);
        Loan {
            id: id.into(),
            amount: self.amount,
            tenure: self.tenure,
            status: self.status,
            purpose: self.purpose,
            start_date: self.start_date,
            end_date: self.end_date,
            interest_rate: self.interest_rate,
            created_at: stamp.clone(),
            updated_at: stamp,
        }
    }
}

/// What the user fills in when requesting a loan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanRequest {
    pub amount: Decimal,
    pub tenure: u32,
    pub purpose: String,
}

impl LoanRequest {
    pub fn new(amount: Decimal, tenure: u32, purpose: impl Into<String>) -> Self {
        Self {
            amount,
            tenure,
            purpose: purpose.into(),
        }
    }

    /// Validate every field, reporting all failures together
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut errors = ValidationErrors::new();

        if self.amount < Decimal::from(MIN_LOAN_AMOUNT) {
            errors.add("amount", format!("Minimum loan amount is ${}", MIN_LOAN_AMOUNT));
        } else if self.amount > Decimal::from(MAX_LOAN_AMOUNT) {
            errors.add("amount", "Maximum loan amount is $40,000");
        }

        if self.tenure < MIN_TENURE_MONTHS {
            errors.add("tenure", format!("Minimum tenure is {} months", MIN_TENURE_MONTHS));
        } else if self.tenure > MAX_TENURE_MONTHS {
            errors.add("tenure", format!("Maximum tenure is {} months", MAX_TENURE_MONTHS));
        }

        let purpose = self.purpose.trim();
        let len = purpose.chars().count();
        if purpose.is_empty() {
            errors.add("purpose", "Purpose is required");
        } else if len < MIN_PURPOSE_LEN {
            errors.add("purpose", "Please provide more detail about the purpose");
        } else if len > MAX_PURPOSE_LEN {
            errors.add(
                "purpose",
                format!("Purpose cannot exceed {} characters", MAX_PURPOSE_LEN),
            );
        }

        errors.into_result()
    }
}

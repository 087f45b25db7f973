//! Active loan model with repayment schedule

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::loan::LoanStatus;
use super::money;

/// Upcoming repayment details for an active loan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSchedule {
    #[serde(with = "money")]
    pub next_payment_amount: Decimal,
    pub days_until_next_payment: i64,
    #[serde(default)]
    pub is_overdue: bool,
    #[serde(default)]
    pub last_payment_date: Option<String>,
}

/// A loan currently being repaid (`/activeLoans`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveLoan {
    pub id: String,
    #[serde(with = "money")]
    pub amount: Decimal,
    #[serde(with = "money")]
    pub outstanding_amount: Decimal,
    #[serde(default)]
    pub tenure: Option<u32>,
    #[serde(default)]
    pub remaining_tenure: Option<u32>,
    #[serde(default)]
    pub status: Option<LoanStatus>,
    pub purpose: String,
    /// e.g. "personal", "auto", "business"
    #[serde(default)]
    pub loan_type: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    pub end_date: String,
    #[serde(with = "money")]
    pub interest_rate: Decimal,
    #[serde(default)]
    pub payment_schedule: Option<PaymentSchedule>,
    #[serde(default, with = "money::option")]
    pub monthly_payment: Option<Decimal>,
    #[serde(default, with = "money::option")]
    pub total_paid: Option<Decimal>,
    #[serde(default, with = "money::option")]
    pub total_remaining: Option<Decimal>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

impl ActiveLoan {
    /// Amount repaid so far. Falls back to `amount - outstanding` when the
    /// server does not send a total.
    pub fn amount_paid(&self) -> Decimal {
        self.total_paid
            .unwrap_or_else(|| (self.amount - self.outstanding_amount).max(Decimal::ZERO))
    }

    /// Repayment progress in percent, clamped to 0..=100
    pub fn progress_percent(&self) -> Decimal {
        if self.amount <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        let pct = self.amount_paid() / self.amount * Decimal::ONE_HUNDRED;
        pct.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED).round_dp(1)
    }

    pub fn is_overdue(&self) -> bool {
        self.payment_schedule
            .as_ref()
            .map(|s| s.is_overdue)
            .unwrap_or(false)
    }
}

//! Income / expense aggregate

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::money;
use super::transaction::{Transaction, TransactionType};

/// Totals shown above the transaction table
///
/// Served precomputed by `/transactionStats/{id}`; `from_transactions`
/// derives the same figures locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionStats {
    #[serde(with = "money")]
    pub total_income: Decimal,
    #[serde(with = "money")]
    pub total_expenses: Decimal,
    #[serde(with = "money")]
    pub net_balance: Decimal,
}

impl TransactionStats {
    pub fn new(total_income: Decimal, total_expenses: Decimal) -> Self {
        Self {
            total_income,
            total_expenses,
            net_balance: total_income - total_expenses,
        }
    }

    /// Sum credits into income and debits into expenses
    ///
    /// Amounts are summed as given, so a negative debit lowers the expense
    /// total.
    pub fn from_transactions(transactions: &[Transaction]) -> Self {
        let (income, expenses) = transactions.iter().fold(
            (Decimal::ZERO, Decimal::ZERO),
            |(income, expenses), tx| match tx.kind {
                TransactionType::Credit => (income + tx.amount, expenses),
                TransactionType::Debit => (income, expenses + tx.amount),
            },
        );
        Self::new(income, expenses)
    }

    /// Whether `net_balance` agrees with the two totals
    pub fn is_consistent(&self) -> bool {
        self.total_income - self.total_expenses == self.net_balance
    }
}

//! Transaction filter/sort pipeline
//!
//! Pure functions over a borrowed slice. The input is never reordered; the
//! output is a fresh vector of references.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::{Transaction, TransactionType};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionFilter {
    #[default]
    All,
    Credit,
    Debit,
}

impl TransactionFilter {
    pub fn matches(&self, tx: &Transaction) -> bool {
        match self {
            TransactionFilter::All => true,
            TransactionFilter::Credit => tx.kind == TransactionType::Credit,
            TransactionFilter::Debit => tx.kind == TransactionType::Debit,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionFilter::All => "all",
            TransactionFilter::Credit => "credit",
            TransactionFilter::Debit => "debit",
        }
    }
}

impl fmt::Display for TransactionFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(TransactionFilter::All),
            "credit" => Ok(TransactionFilter::Credit),
            "debit" => Ok(TransactionFilter::Debit),
            other => Err(format!("unknown filter '{}' (expected all, credit or debit)", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortField {
    Date,
    Amount,
    Type,
}

impl SortField {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortField::Date => "date",
            SortField::Amount => "amount",
            SortField::Type => "type",
        }
    }

    /// Ascending comparison of two transactions on this field
    ///
    /// Unparseable dates sort before every parseable one.
    pub fn compare(&self, a: &Transaction, b: &Transaction) -> Ordering {
        match self {
            SortField::Date => a.timestamp().cmp(&b.timestamp()),
            SortField::Amount => a.amount.cmp(&b.amount),
            SortField::Type => a.kind.as_str().cmp(b.kind.as_str()),
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "date" => Ok(SortField::Date),
            "amount" => Ok(SortField::Amount),
            "type" => Ok(SortField::Type),
            other => Err(format!("unknown sort field '{}' (expected date, amount or type)", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortDirection::Asc),
            "desc" | "descending" => Ok(SortDirection::Desc),
            other => Err(format!("unknown direction '{}' (expected asc or desc)", other)),
        }
    }
}

/// Which column the table is sorted by, and which way
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortState {
    pub field: SortField,
    pub direction: SortDirection,
}

impl Default for SortState {
    /// Newest first
    fn default() -> Self {
        Self {
            field: SortField::Date,
            direction: SortDirection::Desc,
        }
    }
}

impl SortState {
    pub fn new(field: SortField, direction: SortDirection) -> Self {
        Self { field, direction }
    }

    /// Click on a column header: same column flips, a new column starts ascending
    pub fn toggle(&mut self, field: SortField) {
        if self.field == field {
            self.direction = self.direction.flipped();
        } else {
            self.field = field;
            self.direction = SortDirection::Asc;
        }
    }

    pub fn compare(&self, a: &Transaction, b: &Transaction) -> Ordering {
        let ordering = self.field.compare(a, b);
        match self.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

/// Keep the transactions matching `filter`, in their original order
pub fn filter<'a>(transactions: &'a [Transaction], filter: TransactionFilter) -> Vec<&'a Transaction> {
    transactions.iter().filter(|tx| filter.matches(tx)).collect()
}

/// Filter, then stable-sort
pub fn apply<'a>(
    transactions: &'a [Transaction],
    transaction_filter: TransactionFilter,
    sort: SortState,
) -> Vec<&'a Transaction> {
    let mut rows = filter(transactions, transaction_filter);
    rows.sort_by(|a, b| sort.compare(a, b));
    rows
}

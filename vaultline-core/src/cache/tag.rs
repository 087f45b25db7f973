//! Endpoints, resource tags and cache keys

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::{ActiveLoan, Loan, Transaction, TransactionStats, User};

/// Kind of server resource a mutation can make stale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceTag {
    User,
    Transaction,
    Loan,
    ActiveLoan,
}

impl ResourceTag {
    pub const ALL: [ResourceTag; 4] = [
        ResourceTag::User,
        ResourceTag::Transaction,
        ResourceTag::Loan,
        ResourceTag::ActiveLoan,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceTag::User => "user",
            ResourceTag::Transaction => "transaction",
            ResourceTag::Loan => "loan",
            ResourceTag::ActiveLoan => "active_loan",
        }
    }

    /// Endpoints whose cached results carry this tag
    pub fn providers(self) -> Vec<Endpoint> {
        Endpoint::ALL
            .into_iter()
            .filter(|e| e.provides().contains(&self))
            .collect()
    }
}

impl fmt::Display for ResourceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A read endpoint of the dashboard API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Endpoint {
    UserAccountOverview,
    Transactions,
    LoanHistory,
    ActiveLoans,
    TransactionStats,
}

impl Endpoint {
    pub const ALL: [Endpoint; 5] = [
        Endpoint::UserAccountOverview,
        Endpoint::Transactions,
        Endpoint::LoanHistory,
        Endpoint::ActiveLoans,
        Endpoint::TransactionStats,
    ];

    /// Tags this endpoint's results are invalidated by
    pub fn provides(&self) -> &'static [ResourceTag] {
        match self {
            Endpoint::UserAccountOverview => &[ResourceTag::User],
            Endpoint::Transactions => &[ResourceTag::Transaction],
            Endpoint::LoanHistory => &[ResourceTag::Loan],
            Endpoint::ActiveLoans => &[ResourceTag::ActiveLoan],
            Endpoint::TransactionStats => &[ResourceTag::Transaction],
        }
    }

    /// Stable name used in logs and keys
    pub fn name(&self) -> &'static str {
        match self {
            Endpoint::UserAccountOverview => "userAccountOverview",
            Endpoint::Transactions => "transactions",
            Endpoint::LoanHistory => "loans",
            Endpoint::ActiveLoans => "activeLoans",
            Endpoint::TransactionStats => "transactionStats",
        }
    }

    /// Whether the endpoint path takes an id segment
    pub fn takes_arg(&self) -> bool {
        matches!(
            self,
            Endpoint::UserAccountOverview | Endpoint::TransactionStats
        )
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Cache key: one entry per endpoint and argument
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey {
    pub endpoint: Endpoint,
    pub arg: Option<String>,
}

impl QueryKey {
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            arg: None,
        }
    }

    pub fn with_arg(endpoint: Endpoint, arg: impl Into<String>) -> Self {
        Self {
            endpoint,
            arg: Some(arg.into()),
        }
    }

    pub fn arg(&self) -> &str {
        self.arg.as_deref().unwrap_or_default()
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.arg {
            Some(arg) => write!(f, "{}/{}", self.endpoint, arg),
            None => write!(f, "{}", self.endpoint),
        }
    }
}

/// A cached query result
#[derive(Debug, Clone, PartialEq)]
pub enum CachedData {
    User(User),
    Transactions(Vec<Transaction>),
    Loans(Vec<Loan>),
    ActiveLoans(Vec<ActiveLoan>),
    Stats(TransactionStats),
}

impl CachedData {
    /// Endpoint that produces this shape of data
    pub fn endpoint(&self) -> Endpoint {
        match self {
            CachedData::User(_) => Endpoint::UserAccountOverview,
            CachedData::Transactions(_) => Endpoint::Transactions,
            CachedData::Loans(_) => Endpoint::LoanHistory,
            CachedData::ActiveLoans(_) => Endpoint::ActiveLoans,
            CachedData::Stats(_) => Endpoint::TransactionStats,
        }
    }
}

/// Typed access to a [`CachedData`] variant
pub trait FromCache: Clone + Send + Sync + 'static {
    const ENDPOINT: Endpoint;

    fn from_cache(data: &CachedData) -> Option<&Self>;

    fn into_cache(self) -> CachedData;

    /// Whether this value renders as the empty state
    fn is_empty_value(&self) -> bool {
        false
    }
}

impl FromCache for User {
    const ENDPOINT: Endpoint = Endpoint::UserAccountOverview;

    fn from_cache(data: &CachedData) -> Option<&Self> {
        match data {
            CachedData::User(u) => Some(u),
            _ => None,
        }
    }

    fn into_cache(self) -> CachedData {
        CachedData::User(self)
    }
}

impl FromCache for Vec<Transaction> {
    const ENDPOINT: Endpoint = Endpoint::Transactions;

    fn from_cache(data: &CachedData) -> Option<&Self> {
        match data {
            CachedData::Transactions(v) => Some(v),
            _ => None,
        }
    }

    fn into_cache(self) -> CachedData {
        CachedData::Transactions(self)
    }

    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

impl FromCache for Vec<Loan> {
    const ENDPOINT: Endpoint = Endpoint::LoanHistory;

    fn from_cache(data: &CachedData) -> Option<&Self> {
        match data {
            CachedData::Loans(v) => Some(v),
            _ => None,
        }
    }

    fn into_cache(self) -> CachedData {
        CachedData::Loans(self)
    }

    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

impl FromCache for Vec<ActiveLoan> {
    const ENDPOINT: Endpoint = Endpoint::ActiveLoans;

    fn from_cache(data: &CachedData) -> Option<&Self> {
        match data {
            CachedData::ActiveLoans(v) => Some(v),
            _ => None,
        }
    }

    fn into_cache(self) -> CachedData {
        CachedData::ActiveLoans(self)
    }

    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

impl FromCache for TransactionStats {
    const ENDPOINT: Endpoint = Endpoint::TransactionStats;

    fn from_cache(data: &CachedData) -> Option<&Self> {
        match data {
            CachedData::Stats(s) => Some(s),
            _ => None,
        }
    }

    fn into_cache(self) -> CachedData {
        CachedData::Stats(self)
    }
}

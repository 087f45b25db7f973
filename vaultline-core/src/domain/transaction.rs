//! Transaction domain model

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::money;
use super::result::{ApiError, ValidationErrors};

/// Direction of money movement. The amount itself is unsigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Credit,
    Debit,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Credit => "credit",
            TransactionType::Debit => "debit",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "credit" => Ok(TransactionType::Credit),
            "debit" => Ok(TransactionType::Debit),
            other => Err(format!("unknown transaction type '{}'", other)),
        }
    }
}

/// A single account transaction as served by `/transactions`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    /// ISO-8601 date or timestamp
    pub date: String,
    #[serde(with = "money")]
    pub amount: Decimal,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

impl Transaction {
    /// Parsed `date`, or `None` when the server sent something unparseable
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.date)
    }
}

/// Parse an RFC 3339 timestamp or a bare `YYYY-MM-DD` date (as midnight UTC)
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Body of `POST /transactions`: a transaction minus server-assigned fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTransaction {
    pub date: String,
    #[serde(with = "money")]
    pub amount: Decimal,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub description: String,
    pub category: String,
}

impl NewTransaction {
    /// Check the payload before it is sent
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut errors = ValidationErrors::new();
        if self.amount <= Decimal::ZERO {
            errors.add("amount", "Amount must be greater than zero");
        }
        if parse_timestamp(&self.date).is_none() {
            errors.add("date", "Date must be YYYY-MM-DD or an RFC 3339 timestamp");
        }
        if self.description.trim().is_empty() {
            errors.add("description", "Description is required");
        }
        errors.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_type_field() {
        let tx: Transaction = serde_json::from_str(
            r#"{"id":"1","date":"2024-01-01","amount":100,"type":"credit",
                "description":"Salary deposit","category":"Income"}"#,
        )
        .unwrap();
        assert_eq!(tx.kind, TransactionType::Credit);
        assert_eq!(tx.amount, Decimal::new(100, 0));
        assert!(tx.created_at.is_empty());
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let result = serde_json::from_str::<Transaction>(
            r#"{"id":"1","date":"2024-01-01","amount":1,"type":"refund"}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let day = parse_timestamp("2024-01-02").unwrap();
        let ts = parse_timestamp("2024-01-02T10:30:00Z").unwrap();
        assert!(day < ts);
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn test_type_from_str() {
        assert_eq!("Debit".parse::<TransactionType>(), Ok(TransactionType::Debit));
        assert!("all".parse::<TransactionType>().is_err());
    }

    #[test]
    fn test_new_transaction_validation() {
        let tx = NewTransaction {
            date: "not a date".to_string(),
            amount: Decimal::ZERO,
            kind: TransactionType::Debit,
            description: " ".to_string(),
            category: "Food".to_string(),
        };
        match tx.validate() {
            Err(ApiError::Validation(fields)) => assert_eq!(fields.len(), 3),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_new_transaction_serializes_type() {
        let tx = NewTransaction {
            date: "2024-03-01".to_string(),
            amount: Decimal::new(2500, 2),
            kind: TransactionType::Debit,
            description: "Lunch".to_string(),
            category: "Food".to_string(),
        };
        let json = serde_json::to_value(&tx).unwrap();
        assert_eq!(json["type"], "debit");
        assert_eq!(json["amount"], serde_json::json!(25.0));
    }
}

//! User account overview model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::money;

/// Session user as returned by `/userAccountOverview/{id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(with = "money")]
    pub account_balance: Decimal,
    pub account_number: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

impl User {
    /// Account number with all but the last four digits masked
    pub fn masked_account_number(&self) -> String {
        let digits: Vec<char> = self.account_number.chars().collect();
        if digits.len() <= 4 {
            return self.account_number.clone();
        }
        let visible: String = digits[digits.len() - 4..].iter().collect();
        format!("{}{}", "*".repeat(digits.len() - 4), visible)
    }
}

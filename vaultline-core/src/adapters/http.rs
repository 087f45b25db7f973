//! Dashboard REST API client
//!
//! Talks JSON over HTTP to the dashboard backend. No authentication headers
//! are sent; the backend is addressed by a configurable base URL.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::domain::result::ApiError;
use crate::domain::{
    ActiveLoan, Loan, NewLoan, NewTransaction, Transaction, TransactionStats, User,
};
use crate::ports::{ApiResult, FintechApi};

/// Public mock backend the dashboard ships against
pub const DEFAULT_BASE_URL: &str = "https://my-json-server.typicode.com/osifojohn/fintech-core-server";

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP implementation of [`FintechApi`]
#[derive(Debug, Clone)]
pub struct HttpApi {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl HttpApi {
    /// Create a client against the default backend
    pub fn new() -> anyhow::Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL, DEFAULT_TIMEOUT)
    }

    /// Create a client with a custom base URL and timeout
    pub fn with_base_url(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/');
        if base_url.is_empty() {
            anyhow::bail!("API base URL cannot be empty");
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to create HTTP client: {}", e))?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let response = self
            .client
            .get(self.url(path))
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| self.map_request_error(e))?;

        Self::decode(Self::check_response_status(response).await?).await
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(|e| self.map_request_error(e))?;

        Self::decode(Self::check_response_status(response).await?).await
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> ApiResult<T> {
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ApiError::transport(format!("Failed to read response body: {}", e)))?;
        serde_json::from_slice(&bytes).map_err(|e| ApiError::decode(e.to_string()))
    }

    /// Map request errors to the transport/timeout taxonomy
    fn map_request_error(&self, error: reqwest::Error) -> ApiError {
        if error.is_timeout() {
            ApiError::Timeout {
                after: self.timeout,
            }
        } else if error.is_connect() {
            ApiError::transport("Unable to connect to the dashboard API")
        } else if error.is_decode() {
            ApiError::decode(error.to_string())
        } else {
            ApiError::transport(format!("Request failed: {}", error))
        }
    }

    /// Pass 2xx responses through, turn anything else into `ApiError::Server`
    async fn check_response_status(response: Response) -> ApiResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let reason = status.canonical_reason().unwrap_or("Unknown status").to_string();
        let body = response.text().await.unwrap_or_default();
        Err(ApiError::server(status.as_u16(), server_message(&body, &reason)))
    }
}

/// Pick a readable message out of an error body
///
/// Prefers a JSON `message` or `error` field, then a short plain-text body,
/// then the HTTP reason phrase.
fn server_message(body: &str, reason: &str) -> String {
    if let Ok(json) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["message", "error"] {
            if let Some(msg) = json.get(key).and_then(|v| v.as_str()) {
                if !msg.trim().is_empty() {
                    return msg.trim().to_string();
                }
            }
        }
    }
    let text = body.trim();
    if !text.is_empty() && text.len() <= 200 && !text.starts_with('<') {
        return text.to_string();
    }
    reason.to_string()
}

#[async_trait]
impl FintechApi for HttpApi {
    fn name(&self) -> &str {
        "http"
    }

    async fn get_user_account_overview(&self, user_id: &str) -> ApiResult<User> {
        self.get_json(&format!("userAccountOverview/{}", user_id)).await
    }

    async fn get_transactions(&self) -> ApiResult<Vec<Transaction>> {
        self.get_json("transactions").await
    }

    async fn get_loan_history(&self) -> ApiResult<Vec<Loan>> {
        self.get_json("loans").await
    }

    async fn get_active_loans(&self) -> ApiResult<Vec<ActiveLoan>> {
        self.get_json("activeLoans").await
    }

    async fn get_transaction_stats(&self, user_id: &str) -> ApiResult<TransactionStats> {
        self.get_json(&format!("transactionStats/{}", user_id)).await
    }

    async fn create_loan(&self, loan: &NewLoan) -> ApiResult<Loan> {
        self.post_json("loans", loan).await
    }

    async fn create_transaction(&self, transaction: &NewTransaction) -> ApiResult<Transaction> {
        self.post_json("transactions", transaction).await
    }
}

// =============================================================================
// Tests
// =============================================================================

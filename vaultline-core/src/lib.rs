//! Vaultline Core - data layer for a personal fintech dashboard
//!
//! The crate follows hexagonal architecture:
//!
//! - **domain**: API resources (User, Transaction, Loan, ...) and validation
//! - **ports**: the `FintechApi` trait the rest of the crate talks to
//! - **adapters**: HTTP client and in-memory demo backend
//! - **cache**: tag-aware query cache keyed by endpoint and argument
//! - **services**: query client, mutations and the event log
//! - **pipeline**: transaction filter/sort

pub mod adapters;
pub mod cache;
pub mod config;
pub mod domain;
pub mod format;
pub mod pipeline;
pub mod ports;
pub mod services;

mod log_migrations;

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;

use adapters::demo::DemoApi;
use adapters::http::HttpApi;
use config::Config;
use ports::FintechApi;
use services::{
    CreateLoanMutation, CreateTransactionMutation, EntryPoint, LoggingService, QueryClient,
};

pub use cache::{Endpoint, QueryKey, QueryState, ResourceTag, ViewState};
pub use domain::result::{ApiError, Error, OperationResult};
pub use domain::{
    ActiveLoan, Loan, LoanRequest, LoanStatus, NewLoan, NewTransaction, Transaction,
    TransactionStats, TransactionType, User,
};
pub use pipeline::{SortDirection, SortField, SortState, TransactionFilter};

/// Main context for Vaultline operations
///
/// Holds the configuration, the query client (shared cache plus backend)
/// and the event log.
pub struct VaultlineContext {
    pub config: Config,
    pub client: QueryClient,
    pub logger: Option<Arc<LoggingService>>,
}

impl VaultlineContext {
    /// Build a context from `data_dir`
    ///
    /// Demo mode swaps the HTTP backend for the in-memory one. A log database
    /// that cannot be opened disables logging rather than failing.
    pub fn new(data_dir: &Path, entry_point: EntryPoint) -> Result<Self> {
        let config = Config::load(data_dir)?;

        let api: Arc<dyn FintechApi> = if config.demo_mode {
            Arc::new(DemoApi::new())
        } else {
            Arc::new(HttpApi::with_base_url(
                &config.base_url,
                config.request_timeout,
            )?)
        };

        let logger = LoggingService::new(data_dir, entry_point, env!("CARGO_PKG_VERSION"))
            .ok()
            .map(Arc::new);

        Ok(Self::with_api(config, api, logger))
    }

    /// Build a context around an explicit backend
    pub fn with_api(
        config: Config,
        api: Arc<dyn FintechApi>,
        logger: Option<Arc<LoggingService>>,
    ) -> Self {
        let mut client = QueryClient::new(api).with_timeout(config.request_timeout);
        if let Some(logger) = &logger {
            client = client.with_logger(Arc::clone(logger));
        }
        Self {
            config,
            client,
            logger,
        }
    }

    pub fn create_loan(&self) -> CreateLoanMutation {
        CreateLoanMutation::new(self.client.clone())
    }

    pub fn create_transaction(&self) -> CreateTransactionMutation {
        CreateTransactionMutation::new(self.client.clone())
    }

    /// Record a CLI command; never fails
    pub fn log_command(&self, command: &str) {
        if let Some(logger) = &self.logger {
            let _ = logger.log_command(command);
        }
    }
}

//! CLI command implementations

pub mod config;
pub mod demo;
pub mod loans;
pub mod logs;
pub mod overview;
pub mod stats;
pub mod transactions;

use std::path::PathBuf;

use anyhow::{Context, Result};
use dialoguer::Confirm;
use tokio::runtime::Runtime;
use vaultline_core::cache::FromCache;
use vaultline_core::domain::result::ApiError;
use vaultline_core::services::{EntryPoint, QueryHandle};
use vaultline_core::{OperationResult, QueryState, VaultlineContext};

use crate::output;

/// Get the vaultline directory from environment or default
pub fn get_data_dir() -> Result<PathBuf> {
    vaultline_core::config::data_dir()
}

/// Get or create the vaultline context
pub fn get_context() -> Result<VaultlineContext> {
    let data_dir = get_data_dir()?;

    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("Failed to create vaultline directory: {:?}", data_dir))?;

    VaultlineContext::new(&data_dir, EntryPoint::Cli)
        .context("Failed to initialize vaultline context")
}

/// Runtime that drives queries; enter it before creating handles
pub fn runtime() -> Result<Runtime> {
    Runtime::new().context("Failed to start async runtime")
}

/// Both stdin and stdout are terminals
pub fn is_interactive() -> bool {
    atty::is(atty::Stream::Stdin) && atty::is(atty::Stream::Stdout)
}

/// Wait for a query to settle, with a spinner while nothing is cached
pub fn settle<T: FromCache>(rt: &Runtime, handle: &mut QueryHandle<T>, label: &str) -> QueryState<T> {
    let pb = handle.state().is_loading.then(|| output::spinner(label));
    let state = rt.block_on(handle.settled());
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }
    state
}

/// Default answer for the retry prompt, or `None` when retrying cannot help
///
/// Validation failures need different input, so they are never offered.
fn retry_default(err: &ApiError) -> Option<bool> {
    match err {
        ApiError::Validation(_) => None,
        other => Some(other.is_retryable()),
    }
}

/// Settle a query, offering a retry while it keeps failing
///
/// Prompts only on a terminal. Transient errors default to retrying.
pub fn load<T: FromCache>(
    rt: &Runtime,
    handle: &mut QueryHandle<T>,
    label: &str,
    json: bool,
) -> Result<QueryState<T>> {
    loop {
        let state = settle(rt, handle, label);
        let Some((err, default)) = state
            .error
            .as_ref()
            .and_then(|e| retry_default(e).map(|d| (e.to_string(), d)))
        else {
            return Ok(state);
        };
        if json || !is_interactive() {
            return Ok(state);
        }

        let retry = Confirm::new()
            .with_prompt(format!("Could not load {} ({}). Retry?", label, err))
            .default(default)
            .interact()?;
        if !retry {
            return Ok(state);
        }
        handle.refetch();
    }
}

/// `--json` body for a settled query
pub fn to_operation_result<T: FromCache>(state: QueryState<T>) -> OperationResult<T> {
    match (state.error, state.data) {
        (Some(err), _) => OperationResult::fail(err.to_string()),
        (None, Some(data)) => OperationResult::ok(data),
        (None, None) => OperationResult::fail("No data"),
    }
}

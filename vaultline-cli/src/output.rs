//! Output formatting utilities

use std::time::Duration;

use colored::Colorize;
use comfy_table::{presets::UTF8_FULL_CONDENSED, ContentArrangement, Table};
use indicatif::{ProgressBar, ProgressStyle};
use rust_decimal::Decimal;
use vaultline_core::format::format_usd;
use vaultline_core::ApiError;

/// Print a success message
pub fn success(msg: &str) {
    println!("{}", msg.green());
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{}", msg.red());
}

/// Print a warning message
pub fn warning(msg: &str) {
    println!("{}", msg.yellow());
}

/// Print an info message
pub fn info(msg: &str) {
    println!("{}", msg.cyan());
}

/// Create a styled table
pub fn create_table() -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Spinner shown while a query is loading; hidden when stderr is not a tty
pub fn spinner(msg: &str) -> ProgressBar {
    if atty::isnt(atty::Stream::Stderr) {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

/// Inline error block for a failed query or mutation
pub fn api_error(title: &str, err: &ApiError) {
    eprintln!("{}", title.red().bold());
    match err {
        ApiError::Validation(fields) => {
            for (field, message) in fields.iter() {
                eprintln!("  {}: {}", field.bold(), message);
            }
        }
        other => eprintln!("  {}", other),
    }
}

/// Signed, colored amount: credits green with `+`, debits red with `-`
pub fn signed_amount(amount: Decimal, credit: bool) -> String {
    let text = format_usd(amount.abs());
    if credit {
        format!("+{}", text).green().to_string()
    } else {
        format!("-{}", text).red().to_string()
    }
}

/// Amount colored by sign
pub fn balance(amount: Decimal) -> String {
    let text = format_usd(amount);
    if amount.is_sign_negative() && !amount.is_zero() {
        text.red().to_string()
    } else {
        text.green().to_string()
    }
}

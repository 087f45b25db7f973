//! Overview command - account snapshot

use anyhow::Result;
use chrono::Utc;
use colored::Colorize;
use serde_json::json;
use vaultline_core::format::{format_relative_time, format_usd};
use vaultline_core::ViewState;

use super::{get_context, load, runtime, to_operation_result};
use crate::output;

pub fn run(json: bool) -> Result<()> {
    let ctx = get_context()?;
    ctx.log_command("overview");
    let rt = runtime()?;
    let _guard = rt.enter();

    // Both queries start before either is awaited
    let mut user = ctx.client.user_account_overview(&ctx.config.user_id);
    let mut stats = ctx.client.transaction_stats(&ctx.config.user_id);

    let user_state = load(&rt, &mut user, "account", json)?;
    let stats_state = load(&rt, &mut stats, "summary", json)?;

    if json {
        let body = json!({
            "account": to_operation_result(user_state),
            "stats": to_operation_result(stats_state),
        });
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }

    match user_state.view() {
        ViewState::Loading => output::info("Loading account..."),
        ViewState::Error(err) => output::api_error("Could not load account", err),
        ViewState::Empty => println!("No account found."),
        ViewState::Populated(user) => {
            println!("{}", format!("Welcome back, {}", user.name).bold());
            println!();

            let mut table = output::create_table();
            table.add_row(vec!["Balance".to_string(), output::balance(user.account_balance)]);
            table.add_row(vec!["Account".to_string(), user.masked_account_number()]);
            table.add_row(vec!["Email".to_string(), user.email.clone()]);
            println!("{}", table);

            if let Some(at) = user_state.fulfilled_at {
                println!("{}", format!("Updated {}", format_relative_time(at, Utc::now())).dimmed());
            }
        }
    }

    println!();
    match stats_state.view() {
        ViewState::Loading => output::info("Loading summary..."),
        ViewState::Error(err) => output::api_error("Could not load summary", err),
        ViewState::Empty => println!("No activity yet."),
        ViewState::Populated(stats) => {
            println!(
                "Income {}   Expenses {}   Net {}",
                format_usd(stats.total_income).green(),
                format_usd(stats.total_expenses).red(),
                output::balance(stats.net_balance)
            );
        }
    }

    Ok(())
}

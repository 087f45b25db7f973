//! Stats command - income, expenses and net balance

use anyhow::Result;
use colored::Colorize;
use vaultline_core::format::format_usd;
use vaultline_core::ViewState;

use super::{get_context, load, runtime, to_operation_result};
use crate::output;

pub fn run(json: bool) -> Result<()> {
    let ctx = get_context()?;
    ctx.log_command("stats");
    let rt = runtime()?;
    let _guard = rt.enter();

    let mut stats = ctx.client.transaction_stats(&ctx.config.user_id);
    let state = load(&rt, &mut stats, "transaction stats", json)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&to_operation_result(state))?);
        return Ok(());
    }

    match state.view() {
        ViewState::Loading => output::info("Loading transaction stats..."),
        ViewState::Error(err) => output::api_error("Could not load transaction stats", err),
        ViewState::Empty => println!("No activity yet."),
        ViewState::Populated(stats) => {
            println!("{}", "Transaction Summary".bold());
            println!();

            let mut table = output::create_table();
            table.add_row(vec!["Total Income".to_string(), format_usd(stats.total_income).green().to_string()]);
            table.add_row(vec!["Total Expenses".to_string(), format_usd(stats.total_expenses).red().to_string()]);
            table.add_row(vec!["Net Balance".to_string(), output::balance(stats.net_balance)]);
            println!("{}", table);

            if !stats.is_consistent() {
                output::warning("Net balance does not equal income minus expenses");
            }
        }
    }

    Ok(())
}

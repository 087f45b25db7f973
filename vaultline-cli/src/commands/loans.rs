//! Loans command - history, active loans and loan requests

use anyhow::{bail, Result};
use clap::Subcommand;
use colored::Colorize;
use dialoguer::Input;
use rust_decimal::Decimal;
use vaultline_core::domain::{
    MAX_LOAN_AMOUNT, MAX_TENURE_MONTHS, MIN_LOAN_AMOUNT, MIN_TENURE_MONTHS,
};
use vaultline_core::format::format_usd;
use vaultline_core::{ActiveLoan, Loan, LoanRequest, LoanStatus, OperationResult, ViewState};

use super::{get_context, is_interactive, load, runtime, settle, to_operation_result};
use crate::output;

#[derive(Subcommand)]
pub enum LoansCommands {
    /// Show every loan, newest first
    History {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show loans being repaid and their next payment
    Active {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Request a new loan
    Request {
        /// Amount in dollars
        #[arg(long)]
        amount: Option<Decimal>,
        /// Repayment period in months
        #[arg(long)]
        tenure: Option<u32>,
        /// What the loan is for
        #[arg(long)]
        purpose: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn run(command: LoansCommands) -> Result<()> {
    match command {
        LoansCommands::History { json } => history(json),
        LoansCommands::Active { json } => active(json),
        LoansCommands::Request {
            amount,
            tenure,
            purpose,
            json,
        } => request(amount, tenure, purpose, json),
    }
}

fn status_cell(status: LoanStatus) -> String {
    match status {
        LoanStatus::Pending => status.as_str().yellow().to_string(),
        LoanStatus::Active => status.as_str().cyan().to_string(),
        LoanStatus::Completed => status.as_str().green().to_string(),
    }
}

fn short_date(raw: &str) -> String {
    vaultline_core::domain::parse_timestamp(raw)
        .map(|ts| ts.format("%b %d, %Y").to_string())
        .unwrap_or_else(|| raw.to_string())
}

fn loan_table(loans: &[Loan]) -> comfy_table::Table {
    let mut table = output::create_table();
    table.set_header(vec!["ID", "Purpose", "Amount", "Tenure", "Rate", "Status", "Start", "End"]);
    for loan in loans {
        table.add_row(vec![
            loan.id.clone(),
            loan.purpose.clone(),
            format_usd(loan.amount),
            format!("{} mo", loan.tenure),
            format!("{}%", loan.interest_rate),
            status_cell(loan.status),
            short_date(&loan.start_date),
            short_date(&loan.end_date),
        ]);
    }
    table
}

fn history(json: bool) -> Result<()> {
    let ctx = get_context()?;
    ctx.log_command("loans history");
    let rt = runtime()?;
    let _guard = rt.enter();

    let mut handle = ctx.client.loan_history();
    let state = load(&rt, &mut handle, "loan history", json)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&to_operation_result(state))?);
        return Ok(());
    }

    match state.view() {
        ViewState::Loading => output::info("Loading loan history..."),
        ViewState::Error(err) => output::api_error("Could not load loan history", err),
        ViewState::Empty => println!("No loans yet. Request one with 'vl loans request'."),
        ViewState::Populated(loans) => println!("{}", loan_table(loans)),
    }
    Ok(())
}

fn active_table(loans: &[ActiveLoan]) -> comfy_table::Table {
    let mut table = output::create_table();
    table.set_header(vec![
        "Purpose",
        "Type",
        "Outstanding",
        "Progress",
        "Next Payment",
        "Due",
        "Ends",
    ]);
    for loan in loans {
        let (next, due) = match &loan.payment_schedule {
            Some(s) if s.is_overdue => (
                format_usd(s.next_payment_amount),
                "overdue".red().bold().to_string(),
            ),
            Some(s) => (
                format_usd(s.next_payment_amount),
                format!("in {} days", s.days_until_next_payment),
            ),
            None => ("-".to_string(), "-".to_string()),
        };
        table.add_row(vec![
            loan.purpose.clone(),
            loan.loan_type.clone().unwrap_or_else(|| "-".to_string()),
            format!("{} of {}", format_usd(loan.outstanding_amount), format_usd(loan.amount)),
            format!("{}%", loan.progress_percent()),
            next,
            due,
            short_date(&loan.end_date),
        ]);
    }
    table
}

fn active(json: bool) -> Result<()> {
    let ctx = get_context()?;
    ctx.log_command("loans active");
    let rt = runtime()?;
    let _guard = rt.enter();

    let mut handle = ctx.client.active_loans();
    let state = load(&rt, &mut handle, "active loans", json)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&to_operation_result(state))?);
        return Ok(());
    }

    match state.view() {
        ViewState::Loading => output::info("Loading active loans..."),
        ViewState::Error(err) => output::api_error("Could not load active loans", err),
        ViewState::Empty => println!("No active loans."),
        ViewState::Populated(loans) => {
            println!("{}", active_table(loans));
            let overdue = loans.iter().filter(|l| l.is_overdue()).count();
            if overdue > 0 {
                output::warning(&format!("{} loan(s) have an overdue payment", overdue));
            }
        }
    }
    Ok(())
}

fn request(
    amount: Option<Decimal>,
    tenure: Option<u32>,
    purpose: Option<String>,
    json: bool,
) -> Result<()> {
    let prompt = !json && is_interactive();

    let amount = match amount {
        Some(a) => a,
        None if prompt => Input::<Decimal>::new()
            .with_prompt(format!(
                "Amount ({} - {})",
                format_usd(Decimal::from(MIN_LOAN_AMOUNT)),
                format_usd(Decimal::from(MAX_LOAN_AMOUNT))
            ))
            .interact_text()?,
        None => bail!("--amount is required"),
    };
    let tenure = match tenure {
        Some(t) => t,
        None if prompt => Input::<u32>::new()
            .with_prompt(format!(
                "Tenure in months ({} - {})",
                MIN_TENURE_MONTHS, MAX_TENURE_MONTHS
            ))
            .interact_text()?,
        None => bail!("--tenure is required"),
    };
    let purpose = match purpose {
        Some(p) => p,
        None if prompt => Input::<String>::new().with_prompt("Purpose").interact_text()?,
        None => bail!("--purpose is required"),
    };

    let ctx = get_context()?;
    ctx.log_command("loans request");
    let rt = runtime()?;
    let _guard = rt.enter();

    // Subscribe first so the new loan lands in an already-loaded history
    let mut history = ctx.client.loan_history();
    settle(&rt, &mut history, "loan history");

    let mutation = ctx.create_loan();
    let pb = output::spinner("Submitting loan request");
    let result = rt.block_on(mutation.execute(&LoanRequest::new(amount, tenure, purpose)));
    pb.finish_and_clear();

    if json {
        println!("{}", serde_json::to_string_pretty(&OperationResult::from(result))?);
        return Ok(());
    }

    let loan = match result {
        Ok(loan) => loan,
        Err(err) => {
            output::api_error("Loan request failed", &err);
            bail!("No loan was created");
        }
    };

    output::success(&format!(
        "Loan request for {} submitted (status: {})",
        format_usd(loan.amount),
        loan.status
    ));
    if let ViewState::Populated(loans) = history.state().view() {
        println!();
        println!("{}", loan_table(loans));
    }
    Ok(())
}

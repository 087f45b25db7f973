//! Vaultline CLI - your fintech dashboard in the terminal

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use vaultline_core::{SortDirection, SortField, TransactionFilter};

mod commands;
mod output;

use commands::{config, demo, loans, logs, overview, stats, transactions};

/// Vaultline - balances, transactions and loans in your terminal
#[derive(Parser)]
#[command(name = "vl", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the account snapshot and income/expense summary
    Overview {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List, filter and sort transactions
    Transactions {
        #[command(subcommand)]
        command: Option<transactions::TransactionCommands>,
        /// Show only credit or debit transactions
        #[arg(long, default_value = "all")]
        filter: TransactionFilter,
        /// Column to sort by (date, amount, type)
        #[arg(long)]
        sort: Option<SortField>,
        /// Sort direction (asc, desc)
        #[arg(long)]
        direction: Option<SortDirection>,
        /// Output format
        #[arg(long, default_value = "table")]
        format: String,
        /// Output as JSON (shorthand for --format json)
        #[arg(long)]
        json: bool,
        /// Re-sort and re-filter the table with prompts
        #[arg(long, short)]
        interactive: bool,
    },

    /// Show total income, expenses and net balance
    Stats {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Loan history, active loans and new loan requests
    Loans {
        #[command(subcommand)]
        command: loans::LoansCommands,
    },

    /// View and manage the event log
    Logs {
        #[command(subcommand)]
        command: logs::LogsCommands,
    },

    /// Manage demo mode
    Demo {
        #[command(subcommand)]
        command: Option<demo::DemoCommands>,
    },

    /// Show or change settings
    Config {
        #[command(subcommand)]
        command: config::ConfigCommands,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = run(cli);

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Overview { json } => overview::run(json),
        Commands::Transactions { command, filter, sort, direction, format, json, interactive } => {
            match command {
                Some(command) => transactions::run_command(command),
                None => {
                    let fmt = if json { "json".to_string() } else { format };
                    transactions::run(filter, sort, direction, &fmt, interactive)
                }
            }
        }
        Commands::Stats { json } => stats::run(json),
        Commands::Loans { command } => loans::run(command),
        Commands::Logs { command } => logs::run(command),
        Commands::Demo { command } => demo::run(command),
        Commands::Config { command } => config::run(command),
    }
}

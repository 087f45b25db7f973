//! Transactions command - filtered, sorted transaction list and new entries

use std::io;

use anyhow::{bail, Result};
use chrono::Utc;
use clap::Subcommand;
use colored::Colorize;
use dialoguer::{Input, Select};
use rust_decimal::Decimal;
use tokio::runtime::Runtime;
use vaultline_core::format::format_usd;
use vaultline_core::pipeline;
use vaultline_core::services::QueryHandle;
use vaultline_core::{
    NewTransaction, OperationResult, SortDirection, SortField, SortState, Transaction,
    TransactionFilter, TransactionType, ViewState,
};

use super::{get_context, is_interactive, load, runtime, settle, to_operation_result};
use crate::output;

#[derive(Subcommand)]
pub enum TransactionCommands {
    /// Record a new transaction
    Add {
        /// Amount (positive; the sign comes from --type)
        #[arg(long)]
        amount: Option<Decimal>,
        /// credit or debit
        #[arg(long = "type")]
        kind: Option<TransactionType>,
        /// What the transaction was for
        #[arg(long)]
        description: Option<String>,
        /// Category, e.g. Groceries
        #[arg(long, default_value = "Other")]
        category: String,
        /// Date (YYYY-MM-DD); defaults to today
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Resolve command line sort options against the default newest-first order
fn initial_sort(sort: Option<SortField>, direction: Option<SortDirection>) -> SortState {
    let mut state = SortState::default();
    if let Some(field) = sort {
        if field != state.field {
            state.toggle(field);
        }
    }
    if let Some(direction) = direction {
        state.direction = direction;
    }
    state
}

pub fn run(
    filter: TransactionFilter,
    sort: Option<SortField>,
    direction: Option<SortDirection>,
    format: &str,
    interactive: bool,
) -> Result<()> {
    if !matches!(format, "table" | "json" | "csv") {
        bail!("Unknown format '{}'. Use table, json or csv.", format);
    }

    let ctx = get_context()?;
    ctx.log_command("transactions");
    let rt = runtime()?;
    let _guard = rt.enter();

    let mut handle = ctx.client.transactions();
    let sort = initial_sort(sort, direction);

    if interactive {
        if !is_interactive() {
            bail!("--interactive needs a terminal");
        }
        return run_interactive(&rt, &mut handle, filter, sort);
    }

    let state = load(&rt, &mut handle, "transactions", format != "table")?;

    match format {
        "json" => {
            let result = to_operation_result(state).map_data(|txs| {
                pipeline::apply(&txs, filter, sort).into_iter().cloned().collect::<Vec<_>>()
            });
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        "csv" => {
            if let Some(err) = &state.error {
                bail!("Could not load transactions: {}", err);
            }
            let txs = state.data.unwrap_or_default();
            write_csv(&pipeline::apply(&txs, filter, sort))?;
        }
        _ => render(&state.view(), filter, sort),
    }

    Ok(())
}

fn render(view: &ViewState<'_, Vec<Transaction>>, filter: TransactionFilter, sort: SortState) {
    match view {
        ViewState::Loading => output::info("Loading transactions..."),
        ViewState::Error(err) => output::api_error("Could not load transactions", err),
        ViewState::Empty => println!("No transactions yet."),
        ViewState::Populated(txs) => {
            let rows = pipeline::apply(txs, filter, sort);
            if rows.is_empty() {
                println!("No {} transactions.", filter);
                return;
            }
            println!("{}", transaction_table(&rows, sort));
            println!(
                "{}",
                format!(
                    "{} of {} transactions | filter: {} | sorted by {} {}",
                    rows.len(),
                    txs.len(),
                    filter,
                    sort.field,
                    sort.direction
                )
                .dimmed()
            );
        }
    }
}

fn header(label: &str, field: SortField, sort: SortState) -> String {
    if sort.field != field {
        return label.to_string();
    }
    let arrow = match sort.direction {
        SortDirection::Asc => "↑",
        SortDirection::Desc => "↓",
    };
    format!("{} {}", label, arrow)
}

fn transaction_table(rows: &[&Transaction], sort: SortState) -> comfy_table::Table {
    let mut table = output::create_table();
    table.set_header(vec![
        header("Date", SortField::Date, sort),
        "Description".to_string(),
        "Category".to_string(),
        header("Type", SortField::Type, sort),
        header("Amount", SortField::Amount, sort),
    ]);

    for tx in rows {
        let date = tx
            .timestamp()
            .map(|ts| ts.format("%b %d, %Y").to_string())
            .unwrap_or_else(|| tx.date.clone());
        table.add_row(vec![
            date,
            tx.description.clone(),
            tx.category.clone(),
            tx.kind.to_string(),
            output::signed_amount(tx.amount, tx.kind == TransactionType::Credit),
        ]);
    }
    table
}

fn write_csv(rows: &[&Transaction]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(io::stdout());
    writer.write_record(["id", "date", "type", "description", "category", "amount"])?;
    for tx in rows {
        writer.write_record([
            tx.id.as_str(),
            tx.date.as_str(),
            tx.kind.as_str(),
            tx.description.as_str(),
            tx.category.as_str(),
            tx.amount.to_string().as_str(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn run_interactive(
    rt: &Runtime,
    handle: &mut QueryHandle<Vec<Transaction>>,
    mut filter: TransactionFilter,
    mut sort: SortState,
) -> Result<()> {
    const ACTIONS: [&str; 6] = [
        "Sort by date",
        "Sort by amount",
        "Sort by type",
        "Change filter",
        "Refresh",
        "Quit",
    ];
    const FILTERS: [TransactionFilter; 3] = [
        TransactionFilter::All,
        TransactionFilter::Credit,
        TransactionFilter::Debit,
    ];

    let mut state = load(rt, handle, "transactions", false)?;
    loop {
        render(&state.view(), filter, sort);
        println!();

        let choice = Select::new()
            .with_prompt("Action")
            .items(&ACTIONS)
            .default(0)
            .interact()?;

        match choice {
            0 => sort.toggle(SortField::Date),
            1 => sort.toggle(SortField::Amount),
            2 => sort.toggle(SortField::Type),
            3 => {
                let current = FILTERS.iter().position(|f| *f == filter).unwrap_or(0);
                let picked = Select::new()
                    .with_prompt("Show")
                    .items(&FILTERS.map(|f| f.as_str()))
                    .default(current)
                    .interact()?;
                filter = FILTERS[picked];
            }
            4 => {
                // Current rows stay visible until the refetch lands
                handle.refetch();
                state = settle(rt, handle, "transactions");
            }
            _ => return Ok(()),
        }
    }
}

pub fn run_command(command: TransactionCommands) -> Result<()> {
    match command {
        TransactionCommands::Add {
            amount,
            kind,
            description,
            category,
            date,
            json,
        } => add(amount, kind, description, category, date, json),
    }
}

fn add(
    amount: Option<Decimal>,
    kind: Option<TransactionType>,
    description: Option<String>,
    category: String,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    let prompt = !json && is_interactive();

    let amount = match amount {
        Some(a) => a,
        None if prompt => Input::<Decimal>::new().with_prompt("Amount").interact_text()?,
        None => bail!("--amount is required"),
    };
    let kind = match kind {
        Some(k) => k,
        None if prompt => {
            let kinds = [TransactionType::Credit, TransactionType::Debit];
            let picked = Select::new()
                .with_prompt("Type")
                .items(&kinds.map(|k| k.as_str()))
                .default(1)
                .interact()?;
            kinds[picked]
        }
        None => bail!("--type is required"),
    };
    let description = match description {
        Some(d) => d,
        None if prompt => Input::<String>::new().with_prompt("Description").interact_text()?,
        None => bail!("--description is required"),
    };
    let date = date.unwrap_or_else(|| Utc::now().format("%Y-%m-%d").to_string());

    let ctx = get_context()?;
    ctx.log_command("transactions add");
    let rt = runtime()?;
    let _guard = rt.enter();

    let new_tx = NewTransaction {
        date,
        amount,
        kind,
        description,
        category,
    };
    let result = rt.block_on(ctx.create_transaction().execute(&new_tx));

    if json {
        println!("{}", serde_json::to_string_pretty(&OperationResult::from(result))?);
        return Ok(());
    }

    let tx = match result {
        Ok(tx) => tx,
        Err(err) => {
            output::api_error("Could not add transaction", &err);
            bail!("Transaction was not recorded");
        }
    };
    output::success(&format!(
        "Recorded {} {} ({})",
        tx.kind,
        format_usd(tx.amount),
        tx.description
    ));

    // Stats were invalidated by the mutation, so this reads fresh figures
    let mut stats = ctx.client.transaction_stats(&ctx.config.user_id);
    let state = settle(&rt, &mut stats, "transaction stats");
    if let ViewState::Populated(stats) = state.view() {
        println!("Net balance is now {}", output::balance(stats.net_balance));
    }

    Ok(())
}

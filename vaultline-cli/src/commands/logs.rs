//! Logs command - view and manage the event log

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;
use dialoguer::Confirm;
use vaultline_core::services::logging::now_ms;
use vaultline_core::services::{EntryPoint, LoggingService};

use super::get_data_dir;
use crate::output;

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

#[derive(Subcommand)]
pub enum LogsCommands {
    /// Show recent log entries
    List {
        /// Number of entries to show
        #[arg(short, long, default_value = "50")]
        limit: usize,
        /// Show only errors
        #[arg(long)]
        errors: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Clear old log entries
    Clear {
        /// Delete logs older than N days
        #[arg(long, default_value = "30")]
        older_than_days: u64,
        /// Delete every entry regardless of age
        #[arg(long, conflicts_with = "older_than_days")]
        all: bool,
        /// Skip confirmation prompt
        #[arg(long, short = 'f')]
        force: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show log statistics and database path
    Stats {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn get_logging_service() -> Result<LoggingService> {
    let data_dir = get_data_dir()?;
    LoggingService::new(&data_dir, EntryPoint::Cli, env!("CARGO_PKG_VERSION"))
}

/// Epoch millis `days` before `now`, clamped instead of overflowing
fn cutoff_ms(now: i64, days: u64) -> i64 {
    let span = i64::try_from(days)
        .unwrap_or(i64::MAX)
        .saturating_mul(DAY_MS);
    now.saturating_sub(span)
}

fn format_timestamp(timestamp_ms: i64) -> String {
    use chrono::{TimeZone, Utc};
    Utc.timestamp_millis_opt(timestamp_ms)
        .single()
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| timestamp_ms.to_string())
}

pub fn run(command: LogsCommands) -> Result<()> {
    match command {
        LogsCommands::List { limit, errors, json } => {
            let service = get_logging_service()?;
            let entries = if errors {
                service.get_errors(limit)?
            } else {
                service.get_recent(limit)?
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
                return Ok(());
            }

            if entries.is_empty() {
                println!("No log entries found.");
                return Ok(());
            }

            let mut table = output::create_table();
            table.set_header(vec!["Time", "Entry", "Event", "Context", "Status", "Error"]);

            for entry in &entries {
                let context = [entry.command.as_deref(), entry.resource.as_deref()]
                    .iter()
                    .filter_map(|&s| s)
                    .collect::<Vec<_>>()
                    .join(", ");

                let error_indicator = if entry.error_message.is_some() {
                    "!".red().to_string()
                } else {
                    String::new()
                };

                table.add_row(vec![
                    format_timestamp(entry.timestamp),
                    entry.entry_point.clone(),
                    entry.event.clone(),
                    context,
                    entry.status_code.map(|s| s.to_string()).unwrap_or_default(),
                    error_indicator,
                ]);
            }

            println!("{}", table);

            if !errors {
                let errors_list = service.get_errors(3)?;
                if !errors_list.is_empty() {
                    println!();
                    println!("{}", "Recent Errors:".red().bold());
                    for err in &errors_list {
                        println!(
                            "  {} [{}]: {}",
                            format_timestamp(err.timestamp).dimmed(),
                            err.event,
                            err.error_message.as_deref().unwrap_or("Unknown error")
                        );
                    }
                }
            }
        }
        LogsCommands::Clear {
            older_than_days,
            all,
            force,
            json,
        } => {
            let service = get_logging_service()?;

            if !force && !json {
                let prompt = if all {
                    "Delete all log entries?".to_string()
                } else {
                    format!("Delete logs older than {} days?", older_than_days)
                };
                if !Confirm::new().with_prompt(prompt).default(false).interact()? {
                    println!("Cancelled.");
                    return Ok(());
                }
            }

            let deleted = if all {
                service.clear()?
            } else {
                service.delete_before(cutoff_ms(now_ms(), older_than_days))?
            };

            if json {
                println!("{}", serde_json::json!({ "deleted": deleted }));
            } else {
                output::success(&format!("Deleted {} log entries", deleted));
            }
        }
        LogsCommands::Stats { json } => {
            let service = get_logging_service()?;
            let summary = service.summary()?;
            let db_path = service.db_path().to_path_buf();
            let size_bytes = std::fs::metadata(&db_path).map(|m| m.len()).unwrap_or(0);

            if json {
                println!(
                    "{}",
                    serde_json::json!({
                        "total_entries": summary.total,
                        "error_count": summary.errors,
                        "sessions": summary.sessions,
                        "by_event": summary.by_event,
                        "database_path": db_path.to_string_lossy(),
                        "database_size_bytes": size_bytes
                    })
                );
            } else {
                println!("{}", "Log Statistics".bold());
                println!("  Total entries: {}", summary.total);
                println!("  Errors: {}", summary.errors);
                println!("  Sessions: {}", summary.sessions);
                println!("  Database: {}", db_path.display());
                println!("  Size: {} bytes", size_bytes);

                if !summary.by_event.is_empty() {
                    println!();
                    let mut table = output::create_table();
                    table.set_header(vec!["Event", "Count"]);
                    for (event, count) in &summary.by_event {
                        table.add_row(vec![event.clone(), count.to_string()]);
                    }
                    println!("{}", table);
                }
            }
        }
    }

    Ok(())
}

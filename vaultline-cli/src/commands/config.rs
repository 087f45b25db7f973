//! Config command - show and change settings

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;
use vaultline_core::config::Config;

use super::{get_context, get_data_dir};
use crate::output;

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the effective settings
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Change a setting, e.g. `vl config set api.baseUrl http://localhost:3000`
    Set {
        /// One of api.baseUrl, api.userId, api.timeoutSecs, app.demoMode
        key: String,
        value: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn run(command: ConfigCommands) -> Result<()> {
    let data_dir = get_data_dir()?;

    match command {
        ConfigCommands::Show { json } => {
            let config = Config::load(&data_dir)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&config)?);
                return Ok(());
            }

            let mut table = output::create_table();
            table.set_header(vec!["Setting", "Value"]);
            table.add_row(vec!["api.baseUrl".to_string(), config.base_url.clone()]);
            table.add_row(vec!["api.userId".to_string(), config.user_id.clone()]);
            table.add_row(vec![
                "api.timeoutSecs".to_string(),
                config.request_timeout.as_secs().to_string(),
            ]);
            table.add_row(vec!["app.demoMode".to_string(), config.demo_mode.to_string()]);
            println!("{}", table);
            println!("{}", format!("Data directory: {}", data_dir.display()).dimmed());
            match get_context() {
                Ok(ctx) => println!("{}", format!("Backend: {}", ctx.client.api_name()).dimmed()),
                Err(e) => output::warning(&format!("Backend unavailable: {:#}", e)),
            }
        }
        ConfigCommands::Set { key, value, json } => {
            let mut config = Config::load(&data_dir)?;
            if let Err(e) = config.set(&key, &value) {
                if json {
                    println!("{}", serde_json::json!({ "success": false, "error": e.to_string() }));
                    return Ok(());
                }
                output::error(&e.to_string());
                anyhow::bail!("Setting was not changed");
            }
            config.save(&data_dir)?;

            if json {
                println!("{}", serde_json::json!({ "success": true, "config": config }));
            } else {
                output::success(&format!("Set {} = {}", key, value));
            }
        }
    }

    Ok(())
}

//! Demo command - manage demo mode

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;
use vaultline_core::config::Config;

use super::get_data_dir;

#[derive(Subcommand)]
pub enum DemoCommands {
    /// Enable demo mode
    #[command(name = "on")]
    On,
    /// Disable demo mode
    #[command(name = "off")]
    Off,
    /// Show demo mode status
    Status,
}

pub fn run(command: Option<DemoCommands>) -> Result<()> {
    let data_dir = get_data_dir()?;
    std::fs::create_dir_all(&data_dir)?;
    let mut config = Config::load(&data_dir)?;

    match command {
        Some(DemoCommands::On) => {
            config.enable_demo_mode();
            config.save(&data_dir)?;
            println!("{}", "Demo mode enabled".green());
            println!("Commands now read generated sample data. Run 'vl overview' to take a look.");
            println!("{}", "Demo changes are regenerated on every run and never sent anywhere.".dimmed());
            Ok(())
        }
        Some(DemoCommands::Off) => {
            config.disable_demo_mode();
            config.save(&data_dir)?;
            println!("{}", "Demo mode disabled".yellow());
            println!("Using {}", config.base_url);
            Ok(())
        }
        Some(DemoCommands::Status) | None => {
            if config.demo_mode {
                println!("Demo mode is {}", "ON".green());
            } else {
                println!("Demo mode is {}", "OFF".yellow());
            }
            Ok(())
        }
    }
}

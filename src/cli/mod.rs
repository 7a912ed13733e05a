//! CLI module for the paintquote command-line interface.
//!
//! `Cli` and `Commands` describe the argument surface; each command group
//! lives in its own module.

mod catalog;
mod common;
pub mod completions;
pub mod onboard;
mod special;

pub use common::*;

use crate::services::ClassifyOptions;
use crate::utils::doctor::{CatalogDoctor, ValidationStatus};
use crate::utils::path::{format_path_for_display, get_log_dir};
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;
use tracing::info;

/// File name of the application log inside the log directory.
pub const LOG_FILE_NAME: &str = "paintquote.log";

/// Service catalog onboarding for painting businesses
#[derive(Parser, Debug)]
#[command(name = "paintquote", version, about = "Configure a painting service catalog step by step", long_about = None, disable_help_subcommand = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load a catalog into the store (the bundled reference catalog by default)
    Seed {
        /// JSON seed file with services, specialServices and surchargeFactors
        #[arg(short, long)]
        file: Option<PathBuf>,
        /// Clear the store before seeding
        #[arg(long)]
        reset: bool,
        /// Do not ask before clearing the store
        #[arg(short, long)]
        yes: bool,
    },
    /// List services
    Services(ServiceFilter),
    /// Show one service with its configuration
    Show {
        /// Service id
        id: String,
    },
    /// Walk through the main services and configure them
    Onboard {
        /// Start at this position (1-based) instead of the first service
        #[arg(short, long)]
        start: Option<usize>,
    },
    /// Show onboarding progress
    Status,
    /// Manage special services (site conditions)
    Special {
        #[command(subcommand)]
        command: SpecialCommand,
    },
    /// Run catalog diagnostics and optionally fix issues
    Doctor {
        /// Attempt to auto-fix detected issues
        #[arg(long)]
        fix: bool,
        /// Output results as JSON for scripting
        #[arg(long)]
        json: bool,
    },
    /// Shows the log file location
    Logs,
    /// Show the configuration, or change a setting
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommand>,
    },
    /// Generate shell completions
    Completions {
        /// Target shell (detected from the environment when omitted)
        shell: Option<Shell>,
    },
}

#[derive(Args, Debug, Default, Clone, Copy)]
#[group(multiple = false)]
pub struct ServiceFilter {
    /// Only main services
    #[arg(long)]
    pub main: bool,
    /// Only sub-services
    #[arg(long)]
    pub sub: bool,
    /// Only main services that are also sub-services
    #[arg(long)]
    pub dual: bool,
}

#[derive(Subcommand, Debug)]
pub enum SpecialCommand {
    /// List special services with their factors
    List,
    /// Set the factor of a special service
    Configure {
        /// Special service id
        id: String,
        /// Multiplier (prompted when omitted)
        #[arg(short, long)]
        factor: Option<f64>,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Change a setting (store_path, min_catalog_size, log_level)
    Set { key: String, value: String },
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        match self.command {
            Commands::Seed { file, reset, yes } => catalog::cmd_seed(file, reset, yes),
            Commands::Services(filter) => catalog::cmd_services(filter),
            Commands::Show { id } => catalog::cmd_show(&id),
            Commands::Onboard { start } => onboard::cmd_onboard(start),
            Commands::Status => catalog::cmd_status(),
            Commands::Special { command } => special::cmd_special(command),
            Commands::Doctor { fix, json } => Self::cmd_doctor(fix, json),
            Commands::Logs => Self::cmd_logs(),
            Commands::Config { command } => Self::cmd_config(command),
            Commands::Completions { shell } => completions::generate(shell),
        }
    }

    fn cmd_doctor(fix: bool, json: bool) -> Result<()> {
        info!("CLI: doctor command executed (fix: {})", fix);
        let mut ctx = CliContext::load()?;
        let options: ClassifyOptions = ctx.classify_options();

        let results = CatalogDoctor::new(&mut ctx.db, options, fix).run_diagnostics()?;
        drop(ctx);

        if json {
            println!("{}", serde_json::to_string_pretty(&results)?);
        } else {
            println!("\n🔍 Catalog diagnostics\n");
            let mut category = "";
            for result in &results {
                if result.category != category {
                    category = result.category.as_str();
                    println!("[{}]", category);
                }
                match result.status {
                    ValidationStatus::Pass => println!("   ✅ {}", result.message),
                    ValidationStatus::Warning => println!("   ⚠️  {}", result.message),
                    ValidationStatus::Error => println!("   ❌ {}", result.message),
                }
            }
            if !fix && results.iter().any(|r| r.fixable) {
                println!("\nRun 'paintquote doctor --fix' to repair fixable issues.");
            }
        }

        if results.iter().any(|r| r.status == ValidationStatus::Error) {
            std::process::exit(1);
        }
        Ok(())
    }

    fn cmd_logs() -> Result<()> {
        let log_file = get_log_dir().join(LOG_FILE_NAME);
        println!("{}", log_file.display());
        println!("View logs in real-time: tail -f {}", format_path_for_display(&log_file));
        Ok(())
    }

    fn cmd_config(command: Option<ConfigCommand>) -> Result<()> {
        let config_path = crate::utils::get_config_path();
        let mut config = crate::config::Config::load_or_create(&config_path)
            .context("Failed to load configuration")?;

        match command {
            None => {
                println!("{}", config_path.display());
                println!();
                print!("{}", toml::to_string_pretty(&config)?);
            }
            Some(ConfigCommand::Set { key, value }) => {
                config.set(&key, &value)?;
                config.save(&config_path)?;
                info!("Config updated: {} = {}", key, value);
                print_success(&format!("Set {} = {}", key, value));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_onboard_start() {
        let cli = Cli::try_parse_from(["paintquote", "onboard", "--start", "3"]).unwrap();
        assert!(matches!(cli.command, Commands::Onboard { start: Some(3) }));
    }

    #[test]
    fn test_service_filters_are_exclusive() {
        assert!(Cli::try_parse_from(["paintquote", "services", "--main", "--sub"]).is_err());
        let cli = Cli::try_parse_from(["paintquote", "services", "--dual"]).unwrap();
        assert!(matches!(cli.command, Commands::Services(ServiceFilter { dual: true, .. })));
    }

    #[test]
    fn test_parse_special_configure() {
        let cli = Cli::try_parse_from([
            "paintquote", "special", "configure", "sp-altbau", "--factor", "1.2",
        ])
        .unwrap();
        match cli.command {
            Commands::Special {
                command: SpecialCommand::Configure { id, factor },
            } => {
                assert_eq!(id, "sp-altbau");
                assert_eq!(factor, Some(1.2));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}

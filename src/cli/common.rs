//! Common CLI utilities shared across all CLI commands.
//!
//! This module provides:
//! - `CliContext`: Shared context holding the config and the open store
//! - Output helpers: `print_success`, `print_error`, `print_warning`, `print_info`
//! - Prompt helpers: `prompt_string`, `prompt_confirm`

use crate::config::Config;
use crate::services::ClassifyOptions;
use crate::store::Database;
use crate::utils::path::format_path_for_display;
use anyhow::{Context, Result};
use std::io::{self, Write};
use std::path::PathBuf;

/// Shared context for CLI commands.
///
/// Opening the context opens (and locks) the store for the lifetime of the
/// command.
pub struct CliContext {
    /// The loaded configuration
    pub config: Config,
    /// Path to the config file
    pub config_path: PathBuf,
    /// The catalog store
    pub db: Database,
}

impl CliContext {
    /// Load the configuration and open the store it points at.
    pub fn load() -> Result<Self> {
        let config_path = crate::utils::get_config_path();
        let config =
            Config::load_or_create(&config_path).context("Failed to load configuration")?;

        let store_dir = config.store_dir();
        let db = Database::open(&store_dir).with_context(|| {
            format!(
                "Failed to open catalog store at {}",
                format_path_for_display(&store_dir)
            )
        })?;

        Ok(Self {
            config,
            config_path,
            db,
        })
    }

    pub fn classify_options(&self) -> ClassifyOptions {
        ClassifyOptions {
            min_catalog_size: self.config.min_catalog_size,
        }
    }
}

// =============================================================================
// Output Helpers
// =============================================================================

/// Kind of a status line, selecting its prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Success,
    Error,
    Warning,
    Info,
}

impl MessageKind {
    fn prefix(self) -> &'static str {
        match self {
            Self::Success => "\u{2713}",
            Self::Error => "\u{2717}",
            Self::Warning => "\u{26A0}\u{FE0F}",
            Self::Info => "\u{2139}\u{FE0F}",
        }
    }
}

/// A status line as printed by the `print_*` helpers.
pub fn format_message(kind: MessageKind, msg: &str) -> String {
    format!("{} {}", kind.prefix(), msg)
}

/// Print a success message with a checkmark prefix.
pub fn print_success(msg: &str) {
    println!("{}", format_message(MessageKind::Success, msg));
}

/// Print an error message with an X prefix to stderr.
pub fn print_error(msg: &str) {
    eprintln!("{}", format_message(MessageKind::Error, msg));
}

/// Print a warning message with a warning sign prefix.
pub fn print_warning(msg: &str) {
    println!("{}", format_message(MessageKind::Warning, msg));
}

/// Print an info message with an info sign prefix.
pub fn print_info(msg: &str) {
    println!("{}", format_message(MessageKind::Info, msg));
}

// =============================================================================
// Prompt Helpers
// =============================================================================

/// Prompt the user for a string input with an optional default value.
///
/// # Returns
/// The user's input, or the default if they pressed Enter
pub fn prompt_string(label: &str, default: Option<&str>) -> Result<String> {
    if let Some(def) = default {
        print!("{} [{}]: ", label, def);
    } else {
        print!("{}: ", label);
    }
    io::stdout().flush().context("Failed to flush stdout")?;

    let mut input = String::new();
    io::stdin()
        .read_line(&mut input)
        .context("Failed to read input")?;

    Ok(answer_or_default(&input, default))
}

fn answer_or_default(input: &str, default: Option<&str>) -> String {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        default.unwrap_or("").to_string()
    } else {
        trimmed.to_string()
    }
}

/// Prompt the user for a yes/no confirmation.
///
/// # Returns
/// `true` if the user confirmed (y/yes/j/ja), `false` otherwise
pub fn prompt_confirm(message: &str) -> Result<bool> {
    print!("{} [y/N]: ", message);
    io::stdout().flush().context("Failed to flush stdout")?;

    let mut input = String::new();
    io::stdin()
        .read_line(&mut input)
        .context("Failed to read input")?;

    Ok(is_confirmation(&input))
}

fn is_confirmation(input: &str) -> bool {
    matches!(
        input.trim().to_lowercase().as_str(),
        "y" | "yes" | "j" | "ja"
    )
}

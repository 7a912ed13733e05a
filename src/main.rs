use anyhow::Result;
use clap::Parser;

use paintquote::cli::{print_error, Cli, LOG_FILE_NAME};
use paintquote::config::Config;
use paintquote::utils::{get_config_path, get_log_dir};

fn main() {
    if let Err(err) = run() {
        print_error(&format!("{:#}", err));
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    // Log level comes from RUST_LOG, then the config file
    let log_level = Config::load_or_create(&get_config_path())
        .map(|config| config.log_level)
        .unwrap_or_else(|_| "info".to_string());

    // Set up logging directory
    let log_dir = get_log_dir();
    std::fs::create_dir_all(&log_dir)?;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(&log_level))
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    // Write to file
    let file_appender = tracing_appender::rolling::never(&log_dir, LOG_FILE_NAME);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(non_blocking)
        .with_ansi(false) // Disable ANSI colors in file
        .init();

    let result = cli.execute();

    // Flush buffered log lines before exiting
    drop(guard);

    result
}

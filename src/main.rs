use anyhow::Result;
use clap::Parser;
use tracing_subscriber::fmt;

use cmdsentry::cli::{commands, Cli, Commands};
use cmdsentry::config::Config;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(None).unwrap_or_default();
    install_tracing(&config);

    match cli.command {
        Commands::Install => commands::install(),
        Commands::Uninstall => commands::uninstall(),
        Commands::Config => commands::config(),
        Commands::Check => commands::check(&config).await,
    }
}

/// Diagnostics go to stderr by default, or to `Config.logging.path` when
/// file logging is enabled; stdout is reserved for the `check` decision
/// document (SPEC_FULL.md §4.11).
fn install_tracing(config: &Config) {
    let log_path = config
        .logging
        .enabled
        .then(|| {
            config
                .logging
                .path
                .clone()
                .or_else(|| cmdsentry::config::default_log_path().map(|p| p.display().to_string()))
        })
        .flatten();

    match log_path {
        Some(path) => {
            if let Ok(file) = std::fs::OpenOptions::new().create(true).append(true).open(&path) {
                let _ = fmt().with_writer(file).with_ansi(false).try_init();
                return;
            }
            let _ = fmt().with_writer(std::io::stderr).try_init();
        }
        None => {
            let _ = fmt().with_writer(std::io::stderr).try_init();
        }
    }
}

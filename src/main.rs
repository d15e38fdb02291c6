use anyhow::Result;
use chrono::Local;
use clap::Parser;
use sift::app::App;
use sift::config::{self, Config, DEFAULT_CONFIG_PATH};
use sift::run_log::{LogLevel, RunLog};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "sift", version)]
#[command(about = "Formats and uploads images to a wordpress site")]
struct CliArgs {
    /// Image files to be processed and uploaded.
    #[arg(value_name = "FILE", required = true, num_args = 1..)]
    files: Vec<PathBuf>,

    /// Record verbose entries in the run log.
    #[arg(short, long)]
    verbose: bool,

    /// Record debug entries in the run log and print debug output.
    #[arg(short = 'D', long)]
    debug: bool,

    /// Config file.
    #[arg(short = 'C', long, value_name = "PATH", default_value = DEFAULT_CONFIG_PATH)]
    config: String,

    /// Run log destination, truncated at start.
    #[arg(long, value_name = "PATH", default_value = "sift.log")]
    log_file: PathBuf,

    /// Upload to an in-memory media library instead of the network.
    #[arg(long)]
    dry_run: bool,
}

impl CliArgs {
    fn log_level(&self) -> LogLevel {
        if self.debug {
            LogLevel::Debug
        } else if self.verbose {
            LogLevel::Verbose
        } else {
            LogLevel::Info
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C signal"),
        _ = terminate => info!("Received terminate signal"),
    }
}

/// Load the config file, recording a failure in the run log.
fn load_config(path: &Path, log: &RunLog) -> Option<Config> {
    match Config::load(path) {
        Ok(config) => Some(config),
        Err(e) => {
            error!("Failed to load config {}: {}", path.display(), e);
            log.error(format!("Failed to load config: {}", e));
            None
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();

    let default_filter = if args.debug { "sift=debug" } else { "sift=info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting sift {}", env!("CARGO_PKG_VERSION"));

    let log = match RunLog::create(&args.log_file, args.log_level()) {
        Ok(log) => Arc::new(log),
        Err(e) => {
            error!("Cannot create run log {}: {}", args.log_file.display(), e);
            std::process::exit(1);
        }
    };

    let config_path = config::expand_home(&args.config)?;
    log.verbose(format!("reading config file {}", config_path.display()));
    let Some(config) = load_config(&config_path, &log) else {
        log.flush()?;
        std::process::exit(1);
    };

    let app = match App::new(&config, args.dry_run, log.clone()) {
        Ok(app) => app,
        Err(e) => {
            error!("Failed to initialize application: {}", e);
            log.flush()?;
            std::process::exit(1);
        }
    };

    let today = Local::now().date_naive();
    tokio::select! {
        result = app.run(&args.files, today) => {
            log.flush()?;
            match result {
                Ok(report) => {
                    info!(
                        "Run complete: {} processed, {} failed",
                        report.processed.len(),
                        report.failures.len()
                    );
                    Ok(())
                }
                Err(e) => {
                    error!("Run aborted: {}", e);
                    std::process::exit(1);
                }
            }
        }
        _ = shutdown_signal() => {
            log.info("Interrupted, stopping");
            log.flush()?;
            std::process::exit(130);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_files_are_required() {
        assert!(CliArgs::try_parse_from(["sift"]).is_err());
    }

    #[test]
    fn test_flags_and_defaults() {
        let args = CliArgs::try_parse_from(["sift", "-v", "a.jpg", "b.png"]).unwrap();
        assert_eq!(args.files, vec![PathBuf::from("a.jpg"), PathBuf::from("b.png")]);
        assert_eq!(args.config, DEFAULT_CONFIG_PATH);
        assert_eq!(args.log_file, PathBuf::from("sift.log"));
        assert_eq!(args.log_level(), LogLevel::Verbose);
        assert!(!args.dry_run);
    }

    #[test]
    fn test_bad_config_is_logged_as_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sift.toml");
        std::fs::write(&path, "[image]\nmax_width = \"wide\"\n").unwrap();
        let log = RunLog::in_memory(LogLevel::Info);

        assert!(load_config(&path, &log).is_none());

        let entries = log.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].level, LogLevel::Error);
        assert!(entries[0].message.starts_with("Failed to load config"));
    }

    #[test]
    fn test_debug_wins_over_verbose() {
        let args =
            CliArgs::try_parse_from(["sift", "-v", "-D", "-C", "other.toml", "a.jpg"]).unwrap();
        assert_eq!(args.log_level(), LogLevel::Debug);
        assert_eq!(args.config, "other.toml");
    }
}

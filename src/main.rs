//! # Banshee - CLI Entry Point
//!
//! Command-line interface for the Banshee scanner.
//!
//! Commands:
//! - `scan`        - Run one scan pass and rewrite the ban lists
//! - `init-config` - Generate a default configuration file

use clap::{Parser, Subcommand};
use log::{error, info, LevelFilter};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use banshee::scanner::{ScanReport, Scanner};
use banshee::{BansheeConfig, BansheeError, BansheeResult};

/// Banshee - batch brute-force detector.
///
/// Scans logs for repeated failed logins, keeps an expiring ban backlog
/// between runs, and writes the current ban list wherever the printers
/// point. Built to run from cron.
#[derive(Parser, Debug)]
#[command(name = "banshee")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to configuration file.
    #[arg(short, long, default_value = "/etc/banshee.toml")]
    config: PathBuf,

    /// Only report errors.
    #[arg(short, long, conflicts_with_all = ["verbose", "debug"])]
    quiet: bool,

    /// Print informational messages.
    #[arg(short, long, conflicts_with = "debug")]
    verbose: bool,

    /// Print debugging info.
    #[arg(short, long)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run one scan pass and rewrite the ban lists.
    Scan,

    /// Generate a default configuration file.
    InitConfig,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.debug {
        LevelFilter::Debug
    } else if cli.verbose {
        LevelFilter::Info
    } else if cli.quiet {
        LevelFilter::Error
    } else {
        LevelFilter::Warn
    };
    // RUST_LOG still wins, for per-module filtering.
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    match cli.command {
        Commands::Scan => match cmd_scan(&cli.config) {
            Ok(report) if report.degraded() => {
                error!("Scan completed with failures, see above.");
                ExitCode::FAILURE
            }
            Ok(_) => ExitCode::SUCCESS,
            Err(e) => {
                error!("{}", e);
                ExitCode::FAILURE
            }
        },
        Commands::InitConfig => match cmd_init_config(&cli.config) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                error!("{}", e);
                ExitCode::FAILURE
            }
        },
    }
}

/// Run one scan pass: all diagnostics go to the log (stderr), so a printer
/// aimed at standard output stays clean for the pipeline.
fn cmd_scan(config_path: &Path) -> BansheeResult<ScanReport> {
    if !config_path.exists() {
        return Err(BansheeError::Config(format!(
            "configuration file not found: {}; run 'banshee init-config' to create one",
            config_path.display()
        )));
    }
    info!("Loading configuration from {}.", config_path.display());
    let config = BansheeConfig::from_file(config_path)?;
    Scanner::from_config(&config)?.run()
}

/// Generate a default configuration file.
fn cmd_init_config(config_path: &Path) -> BansheeResult<()> {
    if config_path.exists() {
        return Err(BansheeError::Config(format!(
            "Configuration file already exists: {}. Remove it first or use a different path.",
            config_path.display()
        )));
    }

    BansheeConfig::write_default(config_path)?;
    println!("Default configuration written to: {}", config_path.display());
    println!("Edit it to point the parsers at your logs and the printers at your ban lists.");
    println!();
    println!("Key sections:");
    println!("  [blacklist]  - backlog path, whitelist, bantime and threshold");
    println!("  [[parser]]   - one table per offense source (type = \"regex\" or \"blacklist\")");
    println!("  [[printer]]  - one table per ban-list output (type = \"simple\", \"formatted\" or \"json\")");

    Ok(())
}

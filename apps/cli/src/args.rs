use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "backup-audit",
    version,
    about = "Reconcile backup server audits against billed cloud storage"
)]
pub struct Cli {
    /// Config file (defaults to $HOME/.config/backup-audit/config.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// SQLite database path.
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,
    /// Log at debug level unless RUST_LOG is set.
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Load one day's exports, reconcile them and store the report.
    Run(RunArgs),
    /// Show or change stored setting overrides.
    Settings(SettingsArgs),
    /// Print a stored report.
    Show(ShowArgs),
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Report date (YYYY-MM-DD); the newest data folder when omitted.
    #[arg(long)]
    pub date: Option<NaiveDate>,
    /// Directory holding one folder of audit exports per date.
    #[arg(long)]
    pub audit_dir: Option<PathBuf>,
    /// Directory holding bucket utilization exports.
    #[arg(long)]
    pub utilization_dir: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct SettingsArgs {
    /// Store an override, e.g. `--set wasabi_cost_per_tb=7.99`.
    #[arg(long, value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub set: Vec<(String, String)>,
    /// Remove a stored override.
    #[arg(long, value_name = "KEY")]
    pub clear: Vec<String>,
}

#[derive(Debug, Args)]
pub struct ShowArgs {
    /// Report date; the newest stored report when omitted.
    #[arg(long)]
    pub date: Option<NaiveDate>,
    /// Also list the most recent pipeline runs.
    #[arg(long, default_value_t = 0)]
    pub runs: usize,
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got {raw}"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing key in {raw}"));
    }
    Ok((key.to_string(), value.trim().to_string()))
}

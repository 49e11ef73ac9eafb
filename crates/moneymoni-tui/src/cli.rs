//! Command-line arguments and the one-shot commands.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing::warn;

use moneymoni_core::models::{is_month_key, DateRange, TrendGrouping, TrendQuery};
use moneymoni_core::utils::{format_currency, month_bounds, parse_month_key};
use moneymoni_core::{ApiClient, Config, Navigator, QueryCache, Route};

use crate::build_session;

#[derive(Parser, Debug)]
#[command(name = "moneymoni")]
#[command(version)]
#[command(about = "Terminal client for the MoneyMoni household budget API")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Page the interface opens on (e.g. /budgets)
    #[arg(long, value_name = "PATH", default_value = "/")]
    pub open: String,
}

impl Cli {
    /// Start page for the interface. Unknown paths fall back to the dashboard.
    pub fn start_route(&self) -> Route {
        Route::from_path(&self.open)
    }
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// Print the backend health status
    Health,

    /// Print transactions as CSV
    ExportCsv {
        /// First day to include (YYYY-MM-DD)
        #[arg(value_name = "FROM", value_parser = parse_date)]
        from: Option<NaiveDate>,
        /// Last day to include (YYYY-MM-DD)
        #[arg(value_name = "TO", value_parser = parse_date)]
        to: Option<NaiveDate>,
    },

    /// Upload a transactions CSV (dry run unless --commit)
    ImportCsv {
        #[arg(value_name = "FILE")]
        path: PathBuf,
        /// Store the rows instead of only validating them
        #[arg(long)]
        commit: bool,
    },

    /// Print the monthly, split, and weekly trend reports as JSON
    Report {
        #[arg(value_name = "YYYYMM", value_parser = parse_month)]
        month: String,
    },

    /// Upload a receipt image for a transaction
    AttachReceipt {
        /// Transaction ID
        #[arg(value_name = "ID", value_parser = clap::value_parser!(i64).range(1..))]
        id: i64,
        #[arg(value_name = "FILE")]
        path: PathBuf,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum ConfigCommands {
    /// Show the path to the config file
    Path,
    /// Print the effective configuration
    Show,
    /// Write a default config file (if not present)
    Init,
}

fn parse_date(value: &str) -> std::result::Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| format!("invalid date '{}', expected YYYY-MM-DD", value))
}

fn parse_month(value: &str) -> std::result::Result<String, String> {
    if is_month_key(value) {
        Ok(value.to_string())
    } else {
        Err(format!("invalid month '{}', expected YYYYMM", value))
    }
}

fn export_range(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Result<DateRange> {
    if let (Some(from), Some(to)) = (from, to) {
        if from > to {
            bail!("FROM must not be after TO");
        }
    }
    Ok(DateRange::new(from, to))
}

// ============================================================================
// Dispatch
// ============================================================================

pub async fn run(command: Commands, config: &Config) -> Result<()> {
    let command = match command {
        Commands::Config { command } => return run_config(command, config),
        Commands::Health => return run_health(config).await,
        other => other,
    };

    let mut session = build_session(config, Navigator::new(Route::Login))?;
    let pin = rpassword::prompt_password("PIN: ").context("Failed to read PIN")?;
    session
        .login(pin.trim())
        .await
        .context("Login failed")?;

    let result = run_authenticated(command, session.api()).await;

    session.logout(&mut QueryCache::new()).await;
    result
}

async fn run_health(config: &Config) -> Result<()> {
    let session = build_session(config, Navigator::new(Route::Login))?;
    let status = session.api().health().await?;
    println!("{}", serde_json::to_string_pretty(&status)?);
    if !status.is_healthy() {
        bail!("Backend is unhealthy");
    }
    Ok(())
}

fn run_config(command: ConfigCommands, config: &Config) -> Result<()> {
    let path = Config::path()?;
    match command {
        ConfigCommands::Path => println!("{}", path.display()),
        ConfigCommands::Show => println!("{}", serde_json::to_string_pretty(config)?),
        ConfigCommands::Init => {
            if path.exists() {
                println!("Config already exists at {}", path.display());
            } else {
                Config::default().save()?;
                println!("Wrote default config to {}", path.display());
            }
        }
    }
    Ok(())
}

async fn run_authenticated(command: Commands, api: &ApiClient) -> Result<()> {
    match command {
        Commands::ExportCsv { from, to } => {
            let range = export_range(from, to)?;
            let csv = api.export_transactions_csv(&range).await?;
            print!("{}", csv);
        }
        Commands::ImportCsv { path, commit } => {
            let (name, bytes) = read_upload(&path)?;
            let result = api.import_transactions_csv(&name, bytes, !commit).await?;
            println!("{}", result.summary());
            for error in &result.errors {
                warn!(%error, "Import row rejected");
            }
        }
        Commands::Report { month } => {
            let first = parse_month_key(&month)
                .with_context(|| format!("Invalid month '{}'", month))?;
            let (from, to) = month_bounds(first);
            let range = DateRange::new(Some(from), Some(to));

            let trend_query = TrendQuery {
                from_date: Some(from),
                to_date: Some(to),
                group_by: TrendGrouping::Week,
            };

            let (monthly, split, trend) = futures::try_join!(
                api.monthly_report(&month),
                api.split_report(&range),
                api.trend_report(&trend_query),
            )?;
            eprintln!(
                "{}: income {}, expenses {}, net {}",
                month,
                format_currency(monthly.total_income),
                format_currency(monthly.total_expenses),
                format_currency(monthly.net())
            );
            let output = serde_json::json!({ "monthly": monthly, "split": split, "trend": trend });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Commands::AttachReceipt { id, path } => {
            let (name, bytes) = read_upload(&path)?;
            let transaction = api
                .get_transaction(id)
                .await
                .with_context(|| format!("Failed to look up transaction {}", id))?;
            let ack = api.upload_receipt(id, &name, bytes).await?;
            eprintln!(
                "{} {} {}",
                transaction.date,
                transaction.signed_amount_display(),
                transaction.memo_display()
            );
            println!("{}", ack.message);
        }
        Commands::Health | Commands::Config { .. } => {}
    }
    Ok(())
}

fn read_upload(path: &Path) -> Result<(String, Vec<u8>)> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());
    Ok((name, bytes))
}

mod commands;
mod config;
mod input;
mod output;
mod telemetry;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::bureau::BureauArgs;
use commands::collateral::CollateralArgs;
use commands::loan::{AnnuityArgs, FlatArgs};
use commands::scoring::{EvaluateArgs, ScoreArgs};

/// Microfinance credit decision calculations
#[derive(Parser)]
#[command(
    name = "cde",
    version,
    about = "Microfinance credit decision engine",
    long_about = "A CLI for loan-origination calculations with decimal precision. \
                  Builds flat and annuity schedules, values pledged collateral, \
                  grades SLIK bureau exports and produces the weighted 5C decision."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format (defaults to CDE_OUTPUT, then json)
    #[arg(long, global = true)]
    output: Option<OutputFormat>,
}

#[derive(Subcommand)]
enum Commands {
    /// Annuity schedule with optional interest-only grace and fees
    Annuity(AnnuityArgs),
    /// Flat-rate schedule with debt service ratio check
    Flat(FlatArgs),
    /// Value collateral items and compute the collateral score
    Collateral(CollateralArgs),
    /// Parse a raw SLIK export into facility records
    BureauParse(BureauArgs),
    /// Parse and grade a raw SLIK export
    BureauGrade(BureauArgs),
    /// Weighted 5C composite score and decision
    Score(ScoreArgs),
    /// Evaluate a full application end to end
    Evaluate(EvaluateArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    let cli = Cli::parse();

    let config = match config::AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    };
    if let Err(e) = telemetry::init(&config.log_level) {
        eprintln!("{}: {}", "warning".yellow().bold(), e);
    }

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Annuity(args) => commands::loan::run_annuity(args),
        Commands::Flat(args) => commands::loan::run_flat(args),
        Commands::Collateral(args) => commands::collateral::run_collateral(args),
        Commands::BureauParse(args) => commands::bureau::run_bureau_parse(args),
        Commands::BureauGrade(args) => commands::bureau::run_bureau_grade(args),
        Commands::Score(args) => commands::scoring::run_score(args),
        Commands::Evaluate(args) => commands::scoring::run_evaluate(args),
        Commands::Version => {
            println!("cde {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    let format = cli.output.unwrap_or(config.default_output);
    match result {
        Ok(value) => {
            output::format_output(&format, &value);
            process::exit(0);
        }
        Err(e) => {
            tracing::debug!(error = %e, "command failed");
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}

use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use credit_engine_core::amortization::annuity::{self, AnnuityInput, GraceKind};
use credit_engine_core::amortization::flat::{self, FlatInput};

use crate::input;

/// Arguments for an annuity (equal installment) schedule
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct AnnuityArgs {
    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Loan principal
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Annual interest rate in percent (12 = 12% p.a.)
    #[arg(long, alias = "rate")]
    pub annual_rate: Option<Decimal>,

    /// Term in months
    #[arg(long, alias = "months")]
    pub term_months: Option<u32>,

    /// Interest-only grace period at the start of the loan
    #[arg(long)]
    pub grace: bool,

    /// Grace length in months (default 3)
    #[arg(long)]
    pub grace_months: Option<u32>,

    /// Provision fee in percent of principal
    #[arg(long, default_value = "0")]
    pub provision_fee: Decimal,

    /// Flat administration fee
    #[arg(long, default_value = "0")]
    pub admin_fee: Decimal,
}

/// Arguments for a flat-rate schedule with DSR check
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct FlatArgs {
    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Loan principal
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Term in months
    #[arg(long, alias = "months")]
    pub term_months: Option<u32>,

    /// Flat rate per month in percent (1 = 1%/month)
    #[arg(long, alias = "rate")]
    pub monthly_rate: Option<Decimal>,

    /// Borrower monthly income for the DSR check
    #[arg(long, default_value = "0")]
    pub income: Decimal,

    /// Maximum debt service ratio in percent (default 35)
    #[arg(long)]
    pub max_dsr: Option<Decimal>,
}

pub fn run_annuity(args: AnnuityArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let annuity_input: AnnuityInput = if let Some(ref path) = args.input {
        input::file::read_structured(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        AnnuityInput {
            principal: args
                .principal
                .ok_or("--principal is required (or provide --input)")?,
            annual_rate_percent: args
                .annual_rate
                .ok_or("--annual-rate is required (or provide --input)")?,
            term_months: args
                .term_months
                .ok_or("--term-months is required (or provide --input)")?,
            grace: if args.grace {
                GraceKind::InterestOnly
            } else {
                GraceKind::None
            },
            grace_months: args.grace_months,
            provision_fee_percent: args.provision_fee,
            admin_fee: args.admin_fee,
        }
    };

    let result = annuity::build_annuity_schedule(&annuity_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_flat(args: FlatArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let flat_input: FlatInput = if let Some(ref path) = args.input {
        input::file::read_structured(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        FlatInput {
            principal: args
                .principal
                .ok_or("--principal is required (or provide --input)")?,
            term_months: args
                .term_months
                .ok_or("--term-months is required (or provide --input)")?,
            monthly_flat_rate_percent: args
                .monthly_rate
                .ok_or("--monthly-rate is required (or provide --input)")?,
            monthly_income: args.income,
            max_dsr_percent: args.max_dsr,
        }
    };

    let result = flat::build_flat_schedule(&flat_input)?;
    Ok(serde_json::to_value(result)?)
}

use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use credit_engine_core::scoring::composite::{score_composite, CompositeScoreInput, FiveCSurvey};
use credit_engine_core::scoring::evaluation::{evaluate_application, ApplicationInput};

use crate::input;

/// Arguments for the composite 5C score
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct ScoreArgs {
    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Character answers, four values 1-4
    #[arg(long, value_delimiter = ',')]
    pub character: Vec<i64>,

    /// Capital answers, three values 1-4
    #[arg(long, value_delimiter = ',')]
    pub capital: Vec<i64>,

    /// Capacity answers, three values 1-4
    #[arg(long, value_delimiter = ',')]
    pub capacity: Vec<i64>,

    /// Collateral score points
    #[arg(long, default_value = "0")]
    pub collateral_score: Decimal,

    /// Bureau score points
    #[arg(long, default_value = "0")]
    pub bureau_score: Decimal,

    /// Repayment capacity check passed
    #[arg(long)]
    pub repayment_approved: bool,

    /// Approval threshold (default 80)
    #[arg(long)]
    pub threshold: Option<Decimal>,
}

/// Arguments for a full application evaluation
#[derive(Args)]
pub struct EvaluateArgs {
    /// Path to JSON/YAML application file
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_score(args: ScoreArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let score_input: CompositeScoreInput = if let Some(ref path) = args.input {
        input::file::read_structured(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        CompositeScoreInput {
            survey: FiveCSurvey {
                character: answers(&args.character, "--character")?,
                capital: answers(&args.capital, "--capital")?,
                capacity: answers(&args.capacity, "--capacity")?,
            },
            collateral_score: args.collateral_score,
            bureau_score: args.bureau_score,
            repayment_approved: args.repayment_approved,
            approval_threshold: args.threshold,
        }
    };

    let result = score_composite(&score_input);
    Ok(serde_json::to_value(result)?)
}

pub fn run_evaluate(args: EvaluateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let application: ApplicationInput = if let Some(ref path) = args.input {
        input::file::read_structured(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err("Evaluate requires --input <file> or an application on stdin".into());
    };

    let result = evaluate_application(&application)?;
    Ok(serde_json::to_value(result)?)
}

fn answers<const N: usize>(
    values: &[i64],
    flag: &str,
) -> Result<[i64; N], Box<dyn std::error::Error>> {
    <[i64; N]>::try_from(values)
        .map_err(|_| format!("{flag} needs exactly {N} comma-separated answers").into())
}

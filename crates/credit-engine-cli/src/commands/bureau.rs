use clap::Args;
use serde_json::Value;

use credit_engine_core::bureau::grading::assess_bureau;
use credit_engine_core::bureau::parser::parse_bureau;

use crate::input;

/// Arguments for SLIK bureau commands
#[derive(Args)]
pub struct BureauArgs {
    /// Path to the raw bureau export (CSV/TSV/pipe text or JSON)
    #[arg(long)]
    pub file: Option<String>,

    /// Raw export passed inline
    #[arg(long, conflicts_with = "file")]
    pub text: Option<String>,
}

fn raw_text(args: &BureauArgs) -> Result<String, Box<dyn std::error::Error>> {
    if let Some(ref path) = args.file {
        input::file::read_text(path)
    } else if let Some(ref text) = args.text {
        Ok(text.clone())
    } else if let Some(text) = input::stdin::read_stdin_text()? {
        Ok(text)
    } else {
        Err("Bureau commands require --file, --text, or the export piped on stdin".into())
    }
}

/// Parse only: detected table plus typed facility records.
pub fn run_bureau_parse(args: BureauArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let raw = raw_text(&args)?;
    let result = parse_bureau(&raw);
    Ok(serde_json::to_value(result)?)
}

/// Parse and grade.
pub fn run_bureau_grade(args: BureauArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let raw = raw_text(&args)?;
    let result = assess_bureau(&raw);
    Ok(serde_json::to_value(result)?)
}

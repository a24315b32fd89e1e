use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use credit_engine_core::collateral::scoring::{evaluate_collateral, CollateralInput};
use credit_engine_core::collateral::valuation::CollateralItem;
use credit_engine_core::fields::record_from_json;

use crate::input;

/// Arguments for collateral valuation
#[derive(Args)]
pub struct CollateralArgs {
    /// Path to JSON/YAML input file
    #[arg(long)]
    pub input: Option<String>,

    /// Application plafond, used for items without their own limit
    #[arg(long)]
    pub plafond: Option<Decimal>,

    /// Treat items as loose form records (Indonesian or English field names)
    #[arg(long)]
    pub form: bool,
}

pub fn run_collateral(args: CollateralArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let data: Value = if let Some(ref path) = args.input {
        input::file::read_structured(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        data
    } else {
        return Err("Collateral requires --input <file> or JSON on stdin".into());
    };

    let mut collateral_input = if args.form {
        from_form_records(&data)?
    } else {
        serde_json::from_value::<CollateralInput>(data)?
    };
    if args.plafond.is_some() {
        collateral_input.plafond = args.plafond;
    }

    let result = evaluate_collateral(&collateral_input);
    Ok(serde_json::to_value(result)?)
}

/// `{"plafond": .., "items": [{..form fields..}]}` or a bare array of form records.
fn from_form_records(data: &Value) -> Result<CollateralInput, Box<dyn std::error::Error>> {
    let (items, plafond) = match data {
        Value::Array(items) => (items.as_slice(), None),
        Value::Object(map) => {
            let items = map
                .get("items")
                .and_then(Value::as_array)
                .map(Vec::as_slice)
                .ok_or("form input needs an \"items\" array")?;
            let plafond = map
                .get("plafond")
                .and_then(credit_engine_core::fields::decimal_from_value);
            (items, plafond)
        }
        _ => return Err("form input must be an object or array".into()),
    };

    let items: Vec<CollateralItem> = items
        .iter()
        .filter_map(Value::as_object)
        .map(|obj| CollateralItem::from_fields(&record_from_json(obj)))
        .collect();
    tracing::debug!(items = items.len(), "collateral form records converted");

    Ok(CollateralInput {
        items,
        plafond,
        coverage_multiple: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn form_records_become_typed_items() {
        let data = json!({
            "plafond": "10.000.000",
            "items": [{"jenis_agunan": "Tabungan", "saldo": "12.000.000"}]
        });
        let input = from_form_records(&data).unwrap();
        assert_eq!(input.items.len(), 1);
        assert!(matches!(input.items[0], CollateralItem::Savings(_)));
        assert_eq!(input.plafond, Some(Decimal::from(10_000_000)));
    }
}

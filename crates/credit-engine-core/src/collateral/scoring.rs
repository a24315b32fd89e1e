use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::fields::lenient_opt_decimal;
use crate::types::{saturating_sum, with_metadata, ComputationOutput, Money, Points};

use super::valuation::{value_item, CollateralItem, CollateralVerdict, DEFAULT_COVERAGE_MULTIPLE};

/// Score awarded when the product requires no collateral at all.
pub const WAIVED_COLLATERAL_POINTS: Points = dec!(15);

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CollateralInput {
    #[serde(default)]
    pub items: Vec<CollateralItem>,
    /// Application plafond; each item's own limit takes precedence.
    #[serde(default, deserialize_with = "lenient_opt_decimal")]
    pub plafond: Option<Money>,
    /// Overrides the 1.25x coverage multiple.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coverage_multiple: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollateralOutput {
    pub verdicts: Vec<CollateralVerdict>,
    /// True when no collateral was pledged and the fixed waiver score applies.
    pub waived: bool,
    pub approved_items: usize,
    pub total_liquidation_value: Money,
    pub collateral_score: Points,
}

/// Value every pledged item and derive the collateral score.
pub fn evaluate_collateral(input: &CollateralInput) -> ComputationOutput<CollateralOutput> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let coverage = input
        .coverage_multiple
        .filter(|m| *m > Decimal::ZERO)
        .unwrap_or(DEFAULT_COVERAGE_MULTIPLE);

    let verdicts: Vec<CollateralVerdict> = input
        .items
        .iter()
        .map(|item| value_item(item, input.plafond, coverage))
        .collect();

    for (idx, v) in verdicts.iter().enumerate() {
        if let Some(note) = &v.note {
            warnings.push(format!("Item {} ({}): {}", idx + 1, v.collateral_type, note));
        }
    }

    let score = collateral_score(&verdicts);
    let approved_items = verdicts
        .iter()
        .filter(|v| v.approval_status.is_approved())
        .count();
    tracing::debug!(items = verdicts.len(), approved_items, %score, "collateral evaluated");

    let output = CollateralOutput {
        waived: verdicts.is_empty(),
        approved_items,
        total_liquidation_value: saturating_sum(
            verdicts.iter().map(|v| v.liquidation_value),
        ),
        collateral_score: score,
        verdicts,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "coverage_multiple": coverage.to_string(),
        "plafond": input.plafond.map(|p| p.to_string()),
    });

    with_metadata(
        "Collateral Valuation (binding-ratio approval per type)",
        &assumptions,
        warnings,
        elapsed,
        output,
    )
}

/// No items: waiver score. Otherwise the best approved item's points, or 0.
pub fn collateral_score(verdicts: &[CollateralVerdict]) -> Points {
    if verdicts.is_empty() {
        return WAIVED_COLLATERAL_POINTS;
    }
    verdicts
        .iter()
        .filter(|v| v.approval_status.is_approved())
        .map(|v| v.score_points)
        .max()
        .unwrap_or(Decimal::ZERO)
}

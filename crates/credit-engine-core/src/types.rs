use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::CreditError;
use crate::CreditResult;

/// All monetary values (IDR). Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Rates expressed as decimals (0.01 = 1%).
pub type Rate = Decimal;

/// Values expressed as percentages (35 = 35%), matching how loan officers key them in.
pub type Percent = Decimal;

/// Score points contributed to the composite decision.
pub type Points = Decimal;

/// Per-item or per-component verdict. `Undetermined` means the inputs needed to
/// decide were never entered, which is distinct from a failing value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ApprovalStatus {
    Approve,
    Reject,
    #[default]
    Undetermined,
}

impl ApprovalStatus {
    pub fn from_check(passed: bool) -> Self {
        if passed {
            ApprovalStatus::Approve
        } else {
            ApprovalStatus::Reject
        }
    }

    pub fn is_approved(self) -> bool {
        self == ApprovalStatus::Approve
    }
}

impl std::fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApprovalStatus::Approve => write!(f, "Approve"),
            ApprovalStatus::Reject => write!(f, "Reject"),
            ApprovalStatus::Undetermined => write!(f, "Undetermined"),
        }
    }
}

/// Final two-way credit decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Decision {
    Approve,
    Reject,
}

impl Decision {
    pub fn from_check(passed: bool) -> Self {
        if passed {
            Decision::Approve
        } else {
            Decision::Reject
        }
    }
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Decision::Approve => write!(f, "Approve"),
            Decision::Reject => write!(f, "Reject"),
        }
    }
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}

/// Clamp a money-like input at zero, recording a warning when it was negative.
pub fn non_negative(field: &str, value: Decimal, warnings: &mut Vec<String>) -> Decimal {
    if value < Decimal::ZERO {
        tracing::warn!(field, %value, "negative input clamped to zero");
        warnings.push(format!("{field} was negative ({value}); treated as 0"));
        Decimal::ZERO
    } else {
        value
    }
}

/// Lift a `checked_*` result into `CreditResult`, naming the input that overflowed.
pub fn within_range(value: Option<Decimal>, field: &str) -> CreditResult<Decimal> {
    value.ok_or_else(|| CreditError::InvalidInput {
        field: field.to_string(),
        reason: "Value is too large to compute with 28-digit decimals.".into(),
    })
}

/// Sum that pins at `Decimal::MAX` instead of panicking; used for reported totals.
pub fn saturating_sum(values: impl IntoIterator<Item = Decimal>) -> Decimal {
    values
        .into_iter()
        .fold(Decimal::ZERO, |acc, v| acc.saturating_add(v))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_non_negative_clamps_and_warns() {
        let mut warnings = Vec::new();
        assert_eq!(non_negative("principal", dec!(-5), &mut warnings), Decimal::ZERO);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("principal"));
    }

    #[test]
    fn test_non_negative_passes_through() {
        let mut warnings = Vec::new();
        assert_eq!(non_negative("fee", dec!(12.5), &mut warnings), dec!(12.5));
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_within_range_names_field() {
        match within_range(Decimal::MAX.checked_mul(dec!(2)), "principal") {
            Err(CreditError::InvalidInput { field, .. }) => assert_eq!(field, "principal"),
            other => panic!("Expected InvalidInput, got {other:?}"),
        }
        assert_eq!(within_range(Some(dec!(3)), "principal").unwrap(), dec!(3));
    }

    #[test]
    fn test_saturating_sum_pins_at_max() {
        assert_eq!(saturating_sum([Decimal::MAX, Decimal::MAX]), Decimal::MAX);
        assert_eq!(saturating_sum([dec!(1.5), dec!(2)]), dec!(3.5));
    }

    #[test]
    fn test_status_display() {
        assert_eq!(ApprovalStatus::Undetermined.to_string(), "Undetermined");
        assert_eq!(Decision::from_check(false).to_string(), "Reject");
        assert!(ApprovalStatus::from_check(true).is_approved());
    }
}

//! Flat-rate repayment schedules.
//!
//! Interest is charged on the original principal every month, so principal,
//! interest and installment are constant for the whole term. The installment is
//! then tested against monthly income (DSR).

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::CreditError;
use crate::fields::{lenient_decimal, lenient_percent};
use crate::types::{non_negative, with_metadata, within_range, ComputationOutput, Money, Percent};
use crate::CreditResult;

use super::capacity::{assess_repayment_capacity, RepaymentCapacity};
use super::schedule::{AmortizationRow, AmortizationSchedule};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlatInput {
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub principal: Money,
    pub term_months: u32,
    /// Flat rate per month on original principal, e.g. 1 for 1%/month.
    #[serde(default, deserialize_with = "lenient_percent")]
    pub monthly_flat_rate_percent: Percent,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub monthly_income: Money,
    /// Overrides the 35% DSR ceiling.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_dsr_percent: Option<Percent>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlatOutput {
    pub interest_per_month: Money,
    pub principal_per_month: Money,
    pub installment: Money,
    pub repayment: RepaymentCapacity,
    pub schedule: AmortizationSchedule,
}

/// Build a flat-rate schedule and its debt-service-ratio verdict.
pub fn build_flat_schedule(input: &FlatInput) -> CreditResult<ComputationOutput<FlatOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.term_months == 0 {
        return Err(CreditError::InvalidInput {
            field: "term_months".into(),
            reason: "Loan term must be at least one month.".into(),
        });
    }

    let principal = non_negative("principal", input.principal, &mut warnings);
    let rate = non_negative(
        "monthly_flat_rate_percent",
        input.monthly_flat_rate_percent,
        &mut warnings,
    );
    let income = non_negative("monthly_income", input.monthly_income, &mut warnings);

    let months = input.term_months;
    let n = Decimal::from(months);
    let interest_per_month = within_range(
        principal
            .checked_mul(rate)
            .and_then(|v| v.checked_div(dec!(100))),
        "monthly_flat_rate_percent",
    )?;
    let principal_per_month = principal / n;
    let installment = within_range(
        principal_per_month.checked_add(interest_per_month),
        "monthly_flat_rate_percent",
    )?;
    let total_interest = within_range(
        interest_per_month.checked_mul(n),
        "monthly_flat_rate_percent",
    )?;
    let total_payment = within_range(
        principal.checked_add(total_interest),
        "monthly_flat_rate_percent",
    )?;

    let rows: Vec<AmortizationRow> = (1..=months)
        .map(|month| AmortizationRow {
            month,
            installment,
            interest_portion: interest_per_month,
            principal_portion: principal_per_month,
            remaining_balance: (principal - principal_per_month.saturating_mul(Decimal::from(month)))
                .max(Decimal::ZERO),
        })
        .collect();

    let repayment = assess_repayment_capacity(installment, income, input.max_dsr_percent);

    if income.is_zero() {
        warnings.push("Monthly income not provided; DSR reported as 0".into());
    }

    let output = FlatOutput {
        interest_per_month,
        principal_per_month,
        installment,
        repayment,
        schedule: AmortizationSchedule {
            rows,
            total_interest,
            total_payment,
            net_disbursement: principal,
        },
    };

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "interest_basis": "original principal",
        "max_dsr_percent": output.repayment.max_dsr_percent.to_string(),
    });

    Ok(with_metadata(
        "Flat-Rate Amortization with DSR check",
        &assumptions,
        warnings,
        elapsed,
        output,
    ))
}

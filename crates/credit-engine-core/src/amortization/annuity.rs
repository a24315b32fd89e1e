//! Annuity (equal-installment) repayment schedules.
//!
//! Covers:
//! 1. **Level payment** -- P·r·(1+r)^n / ((1+r)^n − 1), or P/n at a zero rate.
//! 2. **Interest-only grace** -- the first months pay interest only and do not
//!    reduce principal. The term is *not* extended, so the schedule can end with a
//!    residual balance; that residual is reported, never silently re-amortized.
//! 3. **Upfront fees** -- provision (percent of principal) and flat admin fee, which
//!    raise total payment and reduce net disbursement.
//!
//! All arithmetic uses `rust_decimal::Decimal`. No `f64`.

use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::CreditError;
use crate::fields::{lenient_decimal, lenient_percent};
use crate::types::{
    non_negative, with_metadata, within_range, ComputationOutput, Money, Percent, Rate,
};
use crate::CreditResult;

use super::schedule::{AmortizationRow, AmortizationSchedule};

/// Interest-only months applied when a grace period is requested.
pub const DEFAULT_GRACE_MONTHS: u32 = 3;

// ---------------------------------------------------------------------------
// Input / Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GraceKind {
    #[default]
    None,
    InterestOnly,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnuityInput {
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub principal: Money,
    #[serde(default, deserialize_with = "lenient_percent")]
    pub annual_rate_percent: Percent,
    pub term_months: u32,
    #[serde(default)]
    pub grace: GraceKind,
    /// Overrides `DEFAULT_GRACE_MONTHS`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grace_months: Option<u32>,
    #[serde(default, deserialize_with = "lenient_percent")]
    pub provision_fee_percent: Percent,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub admin_fee: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnuityOutput {
    pub monthly_rate: Rate,
    /// Level installment outside the grace period.
    pub payment: Money,
    pub provision_fee_amount: Money,
    /// Balance left after the final month; non-zero only when grace was used.
    pub residual_balance: Money,
    pub schedule: AmortizationSchedule,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Build a month-by-month annuity schedule with optional interest-only grace.
pub fn build_annuity_schedule(
    input: &AnnuityInput,
) -> CreditResult<ComputationOutput<AnnuityOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.term_months == 0 {
        return Err(CreditError::InvalidInput {
            field: "term_months".into(),
            reason: "Loan term must be at least one month.".into(),
        });
    }

    let principal = non_negative("principal", input.principal, &mut warnings);
    let annual_rate = non_negative("annual_rate_percent", input.annual_rate_percent, &mut warnings);
    let provision_pct = non_negative(
        "provision_fee_percent",
        input.provision_fee_percent,
        &mut warnings,
    );
    let admin_fee = non_negative("admin_fee", input.admin_fee, &mut warnings);

    let months = input.term_months;
    let grace_months = match input.grace {
        GraceKind::None => 0,
        GraceKind::InterestOnly => input.grace_months.unwrap_or(DEFAULT_GRACE_MONTHS),
    };

    let monthly_rate = annual_rate / dec!(100) / dec!(12);
    let payment = level_payment(principal, monthly_rate, months)?;

    let mut rows = Vec::with_capacity(months as usize);
    let mut balance = principal;
    let mut total_interest = Decimal::ZERO;
    let mut total_installments = Decimal::ZERO;

    for month in 1..=months {
        let interest = within_range(balance.checked_mul(monthly_rate), "principal")?;
        let (installment, principal_portion) = if month <= grace_months {
            (interest, Decimal::ZERO)
        } else {
            (payment, payment - interest)
        };

        balance = (balance - principal_portion).max(Decimal::ZERO);
        total_interest = within_range(total_interest.checked_add(interest), "principal")?;
        total_installments =
            within_range(total_installments.checked_add(installment), "principal")?;

        rows.push(AmortizationRow {
            month,
            installment,
            interest_portion: interest,
            principal_portion,
            remaining_balance: balance,
        });
    }

    let provision_fee_amount = within_range(
        principal
            .checked_mul(provision_pct)
            .and_then(|v| v.checked_div(dec!(100))),
        "provision_fee_percent",
    )?;
    let total_payment = within_range(
        provision_fee_amount
            .checked_add(admin_fee)
            .and_then(|v| v.checked_add(total_installments)),
        "admin_fee",
    )?;
    let net_disbursement = within_range(
        principal
            .checked_sub(provision_fee_amount)
            .and_then(|v| v.checked_sub(admin_fee)),
        "admin_fee",
    )?;

    if grace_months > 0 && balance.round_dp(2) > Decimal::ZERO {
        tracing::warn!(%balance, grace_months, "grace period leaves residual balance at term end");
        warnings.push(format!(
            "Interest-only grace of {grace_months} month(s) does not extend the term; \
             residual balance {} remains after month {months}",
            balance.round_dp(2)
        ));
    }
    if net_disbursement < Decimal::ZERO {
        warnings.push("Fees exceed principal; net disbursement is negative".into());
    }

    let output = AnnuityOutput {
        monthly_rate,
        payment,
        provision_fee_amount,
        residual_balance: balance,
        schedule: AmortizationSchedule {
            rows,
            total_interest,
            total_payment,
            net_disbursement,
        },
    };

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "grace_months": grace_months,
        "rate_convention": "annual_rate_percent / 100 / 12",
    });

    Ok(with_metadata(
        "Annuity Amortization (level payment, interest-only grace)",
        &assumptions,
        warnings,
        elapsed,
        output,
    ))
}

/// Level annuity payment; straight-line when the rate is zero.
pub fn level_payment(principal: Money, monthly_rate: Rate, months: u32) -> CreditResult<Money> {
    if months == 0 {
        return Err(CreditError::DivisionByZero {
            context: "annuity payment with zero-month term".into(),
        });
    }
    let n = Decimal::from(months);
    if monthly_rate.is_zero() {
        return Ok(principal / n);
    }

    let growth = (Decimal::ONE + monthly_rate)
        .checked_powi(i64::from(months))
        .ok_or_else(|| CreditError::InvalidInput {
            field: "annual_rate_percent".into(),
            reason: "Compounding overflows over the requested term.".into(),
        })?;
    within_range(
        principal
            .checked_mul(monthly_rate)
            .and_then(|v| v.checked_mul(growth))
            .and_then(|v| v.checked_div(growth - Decimal::ONE)),
        "annual_rate_percent",
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: Decimal, b: Decimal, eps: Decimal) -> bool {
        (a - b).abs() < eps
    }

    fn base_input() -> AnnuityInput {
        AnnuityInput {
            principal: dec!(100_000_000),
            annual_rate_percent: dec!(12),
            term_months: 12,
            grace: GraceKind::None,
            grace_months: None,
            provision_fee_percent: Decimal::ZERO,
            admin_fee: Decimal::ZERO,
        }
    }

    #[test]
    fn test_level_payment_reference_loan() {
        let pmt = level_payment(dec!(100_000_000), dec!(0.01), 12).unwrap();
        assert!(approx_eq(pmt, dec!(8_884_878.87), dec!(0.01)), "got {pmt}");
    }

    #[test]
    fn test_zero_rate_is_straight_line() {
        let mut input = base_input();
        input.annual_rate_percent = Decimal::ZERO;
        let out = build_annuity_schedule(&input).unwrap().result;
        assert_eq!(out.payment, dec!(100_000_000) / dec!(12));
        assert_eq!(out.schedule.total_interest, Decimal::ZERO);
        assert!(out.schedule.rows.iter().all(|r| r.interest_portion.is_zero()));
    }

    #[test]
    fn test_schedule_length_matches_term() {
        let mut input = base_input();
        input.term_months = 36;
        let out = build_annuity_schedule(&input).unwrap().result;
        assert_eq!(out.schedule.rows.len(), 36);
        assert_eq!(out.schedule.rows.first().unwrap().month, 1);
        assert_eq!(out.schedule.rows.last().unwrap().month, 36);
    }

    #[test]
    fn test_fully_amortizes_without_grace() {
        let out = build_annuity_schedule(&base_input()).unwrap();
        assert!(approx_eq(
            out.result.schedule.total_principal(),
            dec!(100_000_000),
            Decimal::ONE
        ));
        assert!(out.result.residual_balance < dec!(0.01));
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_grace_months_are_interest_only() {
        let mut input = base_input();
        input.grace = GraceKind::InterestOnly;
        let out = build_annuity_schedule(&input).unwrap().result;
        for row in &out.schedule.rows[..3] {
            assert_eq!(row.principal_portion, Decimal::ZERO);
            assert_eq!(row.installment, dec!(1_000_000));
            assert_eq!(row.remaining_balance, dec!(100_000_000));
        }
        assert_eq!(out.schedule.rows[3].installment, out.payment);
    }

    #[test]
    fn test_grace_leaves_residual_and_warns() {
        let mut input = base_input();
        input.grace = GraceKind::InterestOnly;
        let out = build_annuity_schedule(&input).unwrap();
        assert!(out.result.residual_balance > dec!(26_000_000));
        assert_eq!(out.result.schedule.final_balance(), out.result.residual_balance);
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn test_custom_grace_months() {
        let mut input = base_input();
        input.grace = GraceKind::InterestOnly;
        input.grace_months = Some(1);
        let out = build_annuity_schedule(&input).unwrap().result;
        assert_eq!(out.schedule.rows[0].principal_portion, Decimal::ZERO);
        assert!(out.schedule.rows[1].principal_portion > Decimal::ZERO);
    }

    #[test]
    fn test_grace_months_ignored_without_grace_kind() {
        let mut input = base_input();
        input.grace_months = Some(6);
        let out = build_annuity_schedule(&input).unwrap().result;
        assert!(out.schedule.rows[0].principal_portion > Decimal::ZERO);
    }

    #[test]
    fn test_fees_flow_into_totals() {
        let mut input = base_input();
        input.provision_fee_percent = dec!(1);
        input.admin_fee = dec!(250_000);
        let out = build_annuity_schedule(&input).unwrap().result;
        assert_eq!(out.provision_fee_amount, dec!(1_000_000));
        assert_eq!(out.schedule.net_disbursement, dec!(98_750_000));
        let installments: Decimal = out.schedule.rows.iter().map(|r| r.installment).sum();
        assert_eq!(
            out.schedule.total_payment,
            installments + dec!(1_000_000) + dec!(250_000)
        );
    }

    #[test]
    fn test_zero_term_rejected() {
        let mut input = base_input();
        input.term_months = 0;
        match build_annuity_schedule(&input).unwrap_err() {
            CreditError::InvalidInput { field, .. } => assert_eq!(field, "term_months"),
            other => panic!("Expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn test_negative_fee_clamped_with_warning() {
        let mut input = base_input();
        input.admin_fee = dec!(-10);
        let out = build_annuity_schedule(&input).unwrap();
        assert_eq!(out.result.schedule.net_disbursement, dec!(100_000_000));
        assert!(out.warnings.iter().any(|w| w.contains("admin_fee")));
    }

    #[test]
    fn test_balance_never_negative() {
        let mut input = base_input();
        input.annual_rate_percent = dec!(48);
        input.term_months = 60;
        let out = build_annuity_schedule(&input).unwrap().result;
        assert!(out
            .schedule
            .rows
            .iter()
            .all(|r| r.remaining_balance >= Decimal::ZERO));
    }

    #[test]
    fn test_lenient_json_input() {
        let input: AnnuityInput = serde_json::from_str(
            r#"{"principal": "Rp 50.000.000", "annual_rate_percent": "12", "term_months": 6,
                "provision_fee_percent": null, "admin_fee": "abc"}"#,
        )
        .unwrap();
        assert_eq!(input.principal, dec!(50_000_000));
        assert_eq!(input.admin_fee, Decimal::ZERO);
        assert_eq!(input.grace, GraceKind::None);
    }

    #[test]
    fn test_overflowing_payment_is_an_error_not_a_panic() {
        let input = AnnuityInput {
            principal: dec!(1_000_000_000),
            annual_rate_percent: dec!(1200),
            term_months: 80,
            ..base_input()
        };
        match build_annuity_schedule(&input).unwrap_err() {
            CreditError::InvalidInput { field, .. } => assert_eq!(field, "annual_rate_percent"),
            other => panic!("Expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn test_overflowing_fee_is_an_error() {
        let mut input = base_input();
        input.principal = Decimal::MAX;
        input.annual_rate_percent = Decimal::ZERO;
        input.provision_fee_percent = dec!(500);
        assert!(build_annuity_schedule(&input).is_err());
    }

    #[test]
    fn test_rate_string_keeps_its_decimals() {
        let input: AnnuityInput = serde_json::from_str(
            r#"{"principal": "100.000.000", "annual_rate_percent": "10.125", "term_months": 12,
                "provision_fee_percent": "1,250"}"#,
        )
        .unwrap();
        assert_eq!(input.principal, dec!(100_000_000));
        assert_eq!(input.annual_rate_percent, dec!(10.125));
        assert_eq!(input.provision_fee_percent, dec!(1.25));
        let out = build_annuity_schedule(&input).unwrap().result;
        assert_eq!(out.monthly_rate, dec!(10.125) / dec!(100) / dec!(12));
    }

    #[test]
    fn test_metadata_populated() {
        let out = build_annuity_schedule(&base_input()).unwrap();
        assert!(!out.methodology.is_empty());
        assert_eq!(out.metadata.precision, "rust_decimal_128bit");
    }
}

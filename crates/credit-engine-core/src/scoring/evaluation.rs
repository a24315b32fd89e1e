//! One-call evaluation of a loan application.
//!
//! Runs the loan product, checks repayment capacity, values collateral, grades the
//! bureau report and feeds all of it into the composite score. Every intermediate
//! result is returned so the caller can render or audit each stage.

use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::amortization::annuity::{build_annuity_schedule, AnnuityInput, AnnuityOutput};
use crate::amortization::capacity::{assess_repayment_capacity, RepaymentCapacity};
use crate::amortization::flat::{build_flat_schedule, FlatInput, FlatOutput};
use crate::bureau::grading::{assess_bureau, BureauAssessment, BureauLabel};
use crate::collateral::scoring::{evaluate_collateral, CollateralInput, CollateralOutput};
use crate::fields::lenient_opt_decimal;
use crate::types::{with_metadata, ComputationOutput, Decision, Money, Percent, Points};
use crate::CreditResult;

use super::composite::{score_composite, CompositeScore, CompositeScoreInput, FiveCSurvey};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum LoanProduct {
    Flat(FlatInput),
    Annuity(AnnuityInput),
}

/// Bureau evidence: the raw export, a grade already computed elsewhere, or nothing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BureauSource {
    Raw {
        text: String,
    },
    Graded {
        score_points: Points,
        #[serde(default)]
        label: Option<BureauLabel>,
    },
    #[default]
    Missing,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationInput {
    pub loan: LoanProduct,
    /// Income for the DSR check; for flat loans it replaces the loan's own income.
    #[serde(default, deserialize_with = "lenient_opt_decimal")]
    pub monthly_income: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_dsr_percent: Option<Percent>,
    #[serde(default)]
    pub collateral: CollateralInput,
    #[serde(default)]
    pub bureau: BureauSource,
    #[serde(default)]
    pub survey: FiveCSurvey,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approval_threshold: Option<Points>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum LoanOutcome {
    Flat(FlatOutput),
    Annuity(AnnuityOutput),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationReport {
    pub loan: LoanOutcome,
    pub repayment: RepaymentCapacity,
    pub collateral: CollateralOutput,
    pub bureau: Option<BureauAssessment>,
    pub bureau_label: Option<BureauLabel>,
    pub composite: CompositeScore,
    pub decision: Decision,
}

/// Evaluate a full application. Fails only when the loan term is zero.
pub fn evaluate_application(
    input: &ApplicationInput,
) -> CreditResult<ComputationOutput<ApplicationReport>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let (loan, repayment) = match &input.loan {
        LoanProduct::Flat(terms) => {
            let mut terms = terms.clone();
            if let Some(income) = input.monthly_income {
                terms.monthly_income = income;
            }
            if input.max_dsr_percent.is_some() {
                terms.max_dsr_percent = input.max_dsr_percent;
            }
            let out = build_flat_schedule(&terms)?;
            prefixed(&mut warnings, "loan", out.warnings);
            let repayment = out.result.repayment.clone();
            (LoanOutcome::Flat(out.result), repayment)
        }
        LoanProduct::Annuity(terms) => {
            let out = build_annuity_schedule(terms)?;
            prefixed(&mut warnings, "loan", out.warnings);
            // grace months pay less, so the level payment is the binding installment
            let income = input.monthly_income.unwrap_or_default();
            if income.is_zero() {
                warnings.push("loan: Monthly income not provided; DSR reported as 0".into());
            }
            let repayment = assess_repayment_capacity(
                out.result.schedule.peak_installment(),
                income,
                input.max_dsr_percent,
            );
            (LoanOutcome::Annuity(out.result), repayment)
        }
    };

    let collateral = evaluate_collateral(&input.collateral);
    prefixed(&mut warnings, "collateral", collateral.warnings);

    let (bureau, bureau_label, bureau_score) = match &input.bureau {
        BureauSource::Raw { text } => {
            let assessed = assess_bureau(text);
            prefixed(&mut warnings, "bureau", assessed.warnings);
            let label = assessed.result.grade.label;
            let score = assessed.result.grade.score_points;
            (Some(assessed.result), Some(label), score)
        }
        BureauSource::Graded {
            score_points,
            label,
        } => (None, *label, *score_points),
        BureauSource::Missing => {
            warnings.push("bureau: No bureau report supplied; bureau score is 0".into());
            (None, None, Points::ZERO)
        }
    };

    let composite = score_composite(&CompositeScoreInput {
        survey: input.survey.clone(),
        collateral_score: collateral.result.collateral_score,
        bureau_score,
        repayment_approved: repayment.decision == Decision::Approve,
        approval_threshold: input.approval_threshold,
    });
    prefixed(&mut warnings, "score", composite.warnings);

    let decision = composite.result.decision;
    tracing::info!(%decision, total = %composite.result.total_score, "application evaluated");

    let report = ApplicationReport {
        loan,
        repayment,
        collateral: collateral.result,
        bureau,
        bureau_label,
        composite: composite.result,
        decision,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "repayment_installment": "peak scheduled installment",
        "collateral": collateral.assumptions,
        "composite": composite.assumptions,
    });

    Ok(with_metadata(
        "Credit Application Evaluation (amortization, collateral, bureau, 5C)",
        &assumptions,
        warnings,
        elapsed,
        report,
    ))
}

fn prefixed(into: &mut Vec<String>, stage: &str, warnings: Vec<String>) {
    into.extend(warnings.into_iter().map(|w| format!("{stage}: {w}")));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amortization::annuity::GraceKind;
    use crate::collateral::valuation::{
        CertificateBinding, CertificateCollateral, CollateralItem,
    };
    use rust_decimal_macros::dec;

    fn survey() -> FiveCSurvey {
        FiveCSurvey {
            character: [4, 4, 3, 4],
            capital: [3, 4, 4],
            capacity: [4, 4, 4],
        }
    }

    fn certificate() -> CollateralInput {
        CollateralInput {
            items: vec![CollateralItem::Certificate(CertificateCollateral {
                land_value: Some(dec!(200_000_000)),
                appraisal_land_value: Some(dec!(150_000_000)),
                appraisal_building_value: Some(dec!(70_000_000)),
                binding: Some(CertificateBinding::APHT),
                ..Default::default()
            })],
            plafond: Some(dec!(100_000_000)),
            coverage_multiple: None,
        }
    }

    fn annuity_application(income: Money) -> ApplicationInput {
        ApplicationInput {
            loan: LoanProduct::Annuity(AnnuityInput {
                principal: dec!(100_000_000),
                annual_rate_percent: dec!(12),
                term_months: 12,
                grace: GraceKind::None,
                grace_months: None,
                provision_fee_percent: dec!(1),
                admin_fee: dec!(500_000),
            }),
            monthly_income: Some(income),
            max_dsr_percent: None,
            collateral: certificate(),
            bureau: BureauSource::Raw {
                text: "pelapor;kualitas\nBRI;1\nBNI;1\nBPR;1".into(),
            },
            survey: survey(),
            approval_threshold: None,
        }
    }

    #[test]
    fn test_strong_annuity_application_approves() {
        let out = evaluate_application(&annuity_application(dec!(30_000_000))).unwrap();
        let report = out.result;
        assert_eq!(report.repayment.decision, Decision::Approve);
        assert_eq!(report.collateral.collateral_score, dec!(12));
        assert_eq!(report.bureau_label, Some(BureauLabel::SangatBaik));
        assert_eq!(report.composite.repayment_score, dec!(40));
        assert_eq!(report.decision, Decision::Approve);
    }

    #[test]
    fn test_low_income_fails_repayment_and_decision() {
        // 8.88M installment against 20M income is a 44% DSR
        let out = evaluate_application(&annuity_application(dec!(20_000_000))).unwrap();
        assert_eq!(out.result.repayment.decision, Decision::Reject);
        assert_eq!(out.result.decision, Decision::Reject);
    }

    #[test]
    fn test_flat_loan_with_pre_graded_bureau() {
        let input = ApplicationInput {
            loan: LoanProduct::Flat(FlatInput {
                principal: dec!(12_000_000),
                term_months: 12,
                monthly_flat_rate_percent: dec!(1),
                monthly_income: dec!(5_000_000),
                max_dsr_percent: None,
            }),
            monthly_income: None,
            max_dsr_percent: None,
            collateral: CollateralInput::default(),
            bureau: BureauSource::Graded {
                score_points: dec!(22.5),
                label: Some(BureauLabel::Baik),
            },
            survey: survey(),
            approval_threshold: None,
        };
        let out = evaluate_application(&input).unwrap();
        assert!(out.result.collateral.waived);
        assert!(out.result.bureau.is_none());
        assert_eq!(out.result.repayment.debt_service_ratio, dec!(22.4));
        assert_eq!(out.result.decision, Decision::Approve);
    }

    #[test]
    fn test_missing_bureau_warns() {
        let mut input = annuity_application(dec!(30_000_000));
        input.bureau = BureauSource::Missing;
        let out = evaluate_application(&input).unwrap();
        assert!(out.warnings.iter().any(|w| w.starts_with("bureau:")));
        assert_eq!(out.result.composite.bureau_score, Points::ZERO);
    }

    #[test]
    fn test_zero_term_is_an_error() {
        let mut input = annuity_application(dec!(30_000_000));
        if let LoanProduct::Annuity(terms) = &mut input.loan {
            terms.term_months = 0;
        }
        assert!(evaluate_application(&input).is_err());
    }

    #[test]
    fn test_deserialize_application_json() {
        let raw = r#"{
            "loan": {"method": "flat", "principal": "12.000.000", "term_months": 12,
                     "monthly_flat_rate_percent": 1, "monthly_income": 5000000},
            "bureau": {"kind": "graded", "score_points": "30"},
            "survey": {"character": [4, 4, 4, 4], "capital": [4, 4, 4], "capacity": [4, 4, 4]}
        }"#;
        let input: ApplicationInput = serde_json::from_str(raw).unwrap();
        let out = evaluate_application(&input).unwrap().result;
        assert_eq!(out.composite.total_score, dec!(100));
    }
}

//! Weighted 5C composite score.
//!
//! The soft survey (character, capital, capacity) is weighted 40/30/30 and then
//! scaled to at most 15 points. Collateral (max 15), repayment capacity (40) and
//! the bureau grade (max 30) are added as-is, for a ceiling of 100.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::types::{saturating_sum, with_metadata, ComputationOutput, Decision, Points};

pub const CHARACTER_QUESTIONS: usize = 4;
pub const CAPITAL_QUESTIONS: usize = 3;
pub const CAPACITY_QUESTIONS: usize = 3;

/// Highest answer on the survey scale.
pub const MAX_ANSWER: i64 = 4;

pub const CHARACTER_WEIGHT: Decimal = dec!(40);
pub const CAPITAL_WEIGHT: Decimal = dec!(30);
pub const CAPACITY_WEIGHT: Decimal = dec!(30);
pub const BEHAVIORAL_FACTOR: Decimal = dec!(0.15);
pub const REPAYMENT_POINTS: Points = dec!(40);
pub const DEFAULT_APPROVAL_THRESHOLD: Points = dec!(80);

/// Ten fixed survey answers, each on a 1–4 scale.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiveCSurvey {
    pub character: [i64; CHARACTER_QUESTIONS],
    pub capital: [i64; CAPITAL_QUESTIONS],
    pub capacity: [i64; CAPACITY_QUESTIONS],
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompositeScoreInput {
    #[serde(default)]
    pub survey: FiveCSurvey,
    pub collateral_score: Points,
    pub bureau_score: Points,
    pub repayment_approved: bool,
    /// Overrides the 80-point approval threshold.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approval_threshold: Option<Points>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeScore {
    /// Mean clamped answer, 0–4.
    pub character_subscore: Decimal,
    pub capital_subscore: Decimal,
    pub capacity_subscore: Decimal,
    pub character_weighted: Points,
    pub capital_weighted: Points,
    pub capacity_weighted: Points,
    pub behavioral_weighted: Points,
    pub collateral_score: Points,
    pub bureau_score: Points,
    pub repayment_score: Points,
    pub total_score: Points,
    pub approval_threshold: Points,
    pub decision: Decision,
}

/// Mean of the answers after clamping each to `[0, MAX_ANSWER]`.
pub fn subscore_average(answers: &[i64]) -> Decimal {
    if answers.is_empty() {
        return Decimal::ZERO;
    }
    let sum: i64 = answers.iter().map(|a| (*a).clamp(0, MAX_ANSWER)).sum();
    Decimal::from(sum) / Decimal::from(answers.len() as u64)
}

fn weighted(avg: Decimal, weight: Decimal) -> Points {
    avg / Decimal::from(MAX_ANSWER) * weight
}

/// Combine the survey with the component scores into one decision.
pub fn score_composite(input: &CompositeScoreInput) -> ComputationOutput<CompositeScore> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let survey = &input.survey;
    let out_of_range = survey
        .character
        .iter()
        .chain(survey.capital.iter())
        .chain(survey.capacity.iter())
        .filter(|a| !(1..=MAX_ANSWER).contains(*a))
        .count();
    if out_of_range > 0 {
        tracing::warn!(out_of_range, "survey answers outside 1-4");
        warnings.push(format!(
            "{out_of_range} survey answer(s) outside 1-4; clamped to [0, 4]"
        ));
    }

    let character_subscore = subscore_average(&survey.character);
    let capital_subscore = subscore_average(&survey.capital);
    let capacity_subscore = subscore_average(&survey.capacity);

    let character_weighted = weighted(character_subscore, CHARACTER_WEIGHT);
    let capital_weighted = weighted(capital_subscore, CAPITAL_WEIGHT);
    let capacity_weighted = weighted(capacity_subscore, CAPACITY_WEIGHT);
    let behavioral_weighted =
        (character_weighted + capital_weighted + capacity_weighted) * BEHAVIORAL_FACTOR;

    let repayment_score = if input.repayment_approved {
        REPAYMENT_POINTS
    } else {
        Decimal::ZERO
    };

    let total_score = saturating_sum([
        input.collateral_score,
        behavioral_weighted,
        repayment_score,
        input.bureau_score,
    ]);
    let threshold = input
        .approval_threshold
        .unwrap_or(DEFAULT_APPROVAL_THRESHOLD);
    let decision = Decision::from_check(total_score >= threshold);
    tracing::debug!(%total_score, %threshold, %decision, "composite score computed");

    let output = CompositeScore {
        character_subscore,
        capital_subscore,
        capacity_subscore,
        character_weighted,
        capital_weighted,
        capacity_weighted,
        behavioral_weighted,
        collateral_score: input.collateral_score,
        bureau_score: input.bureau_score,
        repayment_score,
        total_score,
        approval_threshold: threshold,
        decision,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "weights": {
            "character": CHARACTER_WEIGHT.to_string(),
            "capital": CAPITAL_WEIGHT.to_string(),
            "capacity": CAPACITY_WEIGHT.to_string(),
        },
        "behavioral_factor": BEHAVIORAL_FACTOR.to_string(),
        "repayment_points": REPAYMENT_POINTS.to_string(),
        "approval_threshold": threshold.to_string(),
    });

    with_metadata(
        "Weighted 5C Composite Score",
        &assumptions,
        warnings,
        elapsed,
        output,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_marks() -> FiveCSurvey {
        FiveCSurvey {
            character: [4; 4],
            capital: [4; 3],
            capacity: [4; 3],
        }
    }

    fn input(collateral: Points, bureau: Points, repayment: bool) -> CompositeScoreInput {
        CompositeScoreInput {
            survey: full_marks(),
            collateral_score: collateral,
            bureau_score: bureau,
            repayment_approved: repayment,
            approval_threshold: None,
        }
    }

    #[test]
    fn test_maximum_score_is_one_hundred() {
        let out = score_composite(&input(dec!(15), dec!(30), true)).result;
        assert_eq!(out.behavioral_weighted, dec!(15));
        assert_eq!(out.total_score, dec!(100));
        assert_eq!(out.decision, Decision::Approve);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        // 15 + 15 + 40 + 10 = 80
        let out = score_composite(&input(dec!(15), dec!(10), true)).result;
        assert_eq!(out.total_score, dec!(80));
        assert_eq!(out.decision, Decision::Approve);
    }

    #[test]
    fn test_just_below_threshold_rejects() {
        let out = score_composite(&input(dec!(15), dec!(9.999), true)).result;
        assert_eq!(out.total_score, dec!(79.999));
        assert_eq!(out.decision, Decision::Reject);
    }

    #[test]
    fn test_failed_repayment_drops_forty_points() {
        let out = score_composite(&input(dec!(15), dec!(30), false)).result;
        assert_eq!(out.repayment_score, Decimal::ZERO);
        assert_eq!(out.total_score, dec!(60));
        assert_eq!(out.decision, Decision::Reject);
    }

    #[test]
    fn test_subscore_weights() {
        let mut i = input(Decimal::ZERO, Decimal::ZERO, false);
        i.survey = FiveCSurvey {
            character: [2, 2, 2, 2],
            capital: [4, 4, 4],
            capacity: [1, 1, 1],
        };
        let out = score_composite(&i).result;
        assert_eq!(out.character_weighted, dec!(20));
        assert_eq!(out.capital_weighted, dec!(30));
        assert_eq!(out.capacity_weighted, dec!(7.5));
        assert_eq!(out.behavioral_weighted, dec!(8.625));
    }

    #[test]
    fn test_out_of_range_answers_are_clamped() {
        assert_eq!(subscore_average(&[9, 4, -3, 3]), dec!(2.75));
        let mut i = input(Decimal::ZERO, Decimal::ZERO, false);
        i.survey.character = [9, 4, -3, 3];
        let out = score_composite(&i);
        assert_eq!(out.warnings.len(), 1);
    }

    #[test]
    fn test_oversized_component_scores_saturate() {
        let out = score_composite(&input(Decimal::MAX, Decimal::MAX, true)).result;
        assert_eq!(out.total_score, Decimal::MAX);
        assert_eq!(out.decision, Decision::Approve);
    }

    #[test]
    fn test_custom_threshold() {
        let mut i = input(dec!(15), dec!(0), true);
        i.approval_threshold = Some(dec!(70));
        assert_eq!(score_composite(&i).result.decision, Decision::Approve);
    }
}

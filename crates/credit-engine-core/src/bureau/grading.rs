use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::types::{
    saturating_sum, with_metadata, ApprovalStatus, ComputationOutput, Money, Points,
};

use super::parser::{parse_bureau, BureauReport};

pub const SANGAT_BAIK_MIN_RATIO: Decimal = dec!(0.85);
pub const BAIK_MIN_RATIO: Decimal = dec!(0.70);
pub const CUKUP_MIN_RATIO: Decimal = dec!(0.50);
pub const BURUK_MIN_RATIO: Decimal = dec!(0.25);

/// Qualitative bureau grade, named as officers read them on the SLIK summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BureauLabel {
    SangatBaik,
    Baik,
    Cukup,
    Buruk,
    SangatBuruk,
    #[default]
    Undetermined,
}

impl BureauLabel {
    /// Label for a quality-1 ratio. `has_code_three_or_worse` blocks `Baik` only.
    pub fn classify(ratio: Decimal, has_code_three_or_worse: bool) -> Self {
        if ratio >= SANGAT_BAIK_MIN_RATIO {
            BureauLabel::SangatBaik
        } else if ratio >= BAIK_MIN_RATIO && !has_code_three_or_worse {
            BureauLabel::Baik
        } else if ratio >= CUKUP_MIN_RATIO {
            BureauLabel::Cukup
        } else if ratio >= BURUK_MIN_RATIO {
            BureauLabel::Buruk
        } else {
            BureauLabel::SangatBuruk
        }
    }

    pub fn points(self) -> Points {
        match self {
            BureauLabel::SangatBaik => dec!(30),
            BureauLabel::Baik => dec!(22.5),
            BureauLabel::Cukup => dec!(15),
            BureauLabel::Buruk => dec!(7.5),
            BureauLabel::SangatBuruk | BureauLabel::Undetermined => Decimal::ZERO,
        }
    }

    pub fn approval_status(self) -> ApprovalStatus {
        match self {
            BureauLabel::SangatBaik | BureauLabel::Baik => ApprovalStatus::Approve,
            BureauLabel::Undetermined => ApprovalStatus::Undetermined,
            _ => ApprovalStatus::Reject,
        }
    }
}

impl std::fmt::Display for BureauLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            BureauLabel::SangatBaik => "Sangat Baik",
            BureauLabel::Baik => "Baik",
            BureauLabel::Cukup => "Cukup",
            BureauLabel::Buruk => "Buruk",
            BureauLabel::SangatBuruk => "Sangat Buruk",
            BureauLabel::Undetermined => "Undetermined",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BureauGrade {
    /// Share of coded facilities at quality 1; 0 when no facility carries a code.
    pub quality_one_ratio: Decimal,
    pub coded_facilities: usize,
    pub quality_one_facilities: usize,
    pub label: BureauLabel,
    pub approval_status: ApprovalStatus,
    pub score_points: Points,
    pub facility_count: usize,
    pub total_plafond: Money,
    pub total_outstanding: Money,
    pub worst_quality: Option<u8>,
    pub max_overdue_days: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BureauAssessment {
    pub report: BureauReport,
    pub grade: BureauGrade,
}

/// Grade a parsed report by the proportion of facilities at quality code 1.
pub fn grade_bureau(report: &BureauReport) -> ComputationOutput<BureauGrade> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let codes: Vec<u8> = report.records.iter().filter_map(|r| r.quality_code).collect();
    let coded = codes.len();
    let quality_one = codes.iter().filter(|c| **c == 1).count();

    let (ratio, label) = if coded == 0 {
        warnings.push("No facility carries a quality code; bureau grade undetermined".into());
        (Decimal::ZERO, BureauLabel::Undetermined)
    } else {
        let ratio = Decimal::from(quality_one as u64) / Decimal::from(coded as u64);
        let severe = codes.iter().any(|c| *c >= 3);
        (ratio, BureauLabel::classify(ratio, severe))
    };

    let uncoded = report.records.len() - coded;
    if coded > 0 && uncoded > 0 {
        warnings.push(format!("{uncoded} facilities without a quality code were ignored"));
    }
    tracing::debug!(coded, quality_one, %ratio, ?label, "bureau graded");

    let grade = BureauGrade {
        quality_one_ratio: ratio,
        coded_facilities: coded,
        quality_one_facilities: quality_one,
        label,
        approval_status: label.approval_status(),
        score_points: label.points(),
        facility_count: report.records.len(),
        total_plafond: saturating_sum(report.records.iter().map(|r| r.plafond)),
        total_outstanding: saturating_sum(
            report.records.iter().map(|r| r.outstanding_balance),
        ),
        worst_quality: codes.iter().copied().max(),
        max_overdue_days: report
            .records
            .iter()
            .map(|r| r.overdue_days)
            .max()
            .unwrap_or(0),
    };

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "sangat_baik_min_ratio": SANGAT_BAIK_MIN_RATIO.to_string(),
        "baik_min_ratio": BAIK_MIN_RATIO.to_string(),
        "cukup_min_ratio": CUKUP_MIN_RATIO.to_string(),
        "buruk_min_ratio": BURUK_MIN_RATIO.to_string(),
    });

    with_metadata(
        "SLIK Quality-1 Ratio Grading",
        &assumptions,
        warnings,
        elapsed,
        grade,
    )
}

/// Parse then grade, carrying the warnings of both stages.
pub fn assess_bureau(raw: &str) -> ComputationOutput<BureauAssessment> {
    let start = Instant::now();
    let parsed = parse_bureau(raw);
    let graded = grade_bureau(&parsed.result.report);

    let mut warnings = parsed.warnings;
    warnings.extend(graded.warnings);

    let elapsed = start.elapsed().as_micros() as u64;
    with_metadata(
        "SLIK Bureau Parsing and Grading",
        &graded.assumptions,
        warnings,
        elapsed,
        BureauAssessment {
            report: parsed.result.report,
            grade: graded.result,
        },
    )
}

//! Raw bureau export to typed facility records.

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::fields::{first_decimal, first_percent, first_present, parse_date, FieldRecord};
use crate::types::{with_metadata, ComputationOutput, Money, Percent};

use super::json::{find_borrower_name, table_from_json};
use super::schema::{candidate_keys, BureauField, BORROWER_NAME_KEYS};
use super::table::{parse_delimited, BureauTable, TableSource};

/// One credit facility the borrower holds at another lender.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BureauFacilityRecord {
    pub lender_name: String,
    pub credit_type_label: String,
    pub plafond: Money,
    pub outstanding_balance: Money,
    pub interest_rate: Percent,
    pub start_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub overdue_days: u32,
    /// SLIK collectibility 1 (current) to 5 (loss); `None` when no code was found.
    pub quality_code: Option<u8>,
    pub condition: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BureauReport {
    pub borrower_name: Option<String>,
    pub records: Vec<BureauFacilityRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedBureau {
    pub table: BureauTable,
    pub report: BureauReport,
}

/// First digit 1–5 in the text, e.g. `"Kol-2 (DPK)"` gives 2.
pub fn extract_quality_code(text: &str) -> Option<u8> {
    text.chars()
        .find(|c| ('1'..='5').contains(c))
        .and_then(|c| c.to_digit(10))
        .and_then(|d| u8::try_from(d).ok())
}

impl BureauFacilityRecord {
    /// Missing or unparseable numbers become 0; missing text becomes empty.
    pub fn from_fields(record: &FieldRecord) -> Self {
        let text = |field| {
            first_present(record, candidate_keys(field))
                .unwrap_or_default()
                .to_string()
        };
        let number = |field| first_decimal(record, candidate_keys(field)).unwrap_or(Decimal::ZERO);
        let date = |field| first_present(record, candidate_keys(field)).and_then(parse_date);

        BureauFacilityRecord {
            lender_name: text(BureauField::LenderName),
            credit_type_label: text(BureauField::CreditTypeLabel),
            plafond: number(BureauField::Plafond).max(Decimal::ZERO),
            outstanding_balance: number(BureauField::OutstandingBalance).max(Decimal::ZERO),
            interest_rate: first_percent(record, candidate_keys(BureauField::InterestRate))
                .unwrap_or(Decimal::ZERO)
                .max(Decimal::ZERO),
            start_date: date(BureauField::StartDate),
            due_date: date(BureauField::DueDate),
            overdue_days: number(BureauField::OverdueDays)
                .trunc()
                .to_u32()
                .unwrap_or(0),
            quality_code: first_present(record, candidate_keys(BureauField::QualityCode))
                .and_then(extract_quality_code),
            condition: text(BureauField::Condition),
        }
    }
}

/// Parse a raw export. Never fails; unusable input yields an empty or
/// single-column table, which grades as Undetermined.
pub fn parse_bureau(raw: &str) -> ComputationOutput<ParsedBureau> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let (table, json_name) = match serde_json::from_str::<serde_json::Value>(raw.trim()) {
        Ok(doc) if doc.is_object() || doc.is_array() => {
            let name = find_borrower_name(&doc);
            match table_from_json(&doc) {
                Some(table) => (table, name),
                None => {
                    warnings.push("JSON contains no record-like array or object".into());
                    (BureauTable::empty(), name)
                }
            }
        }
        _ => (parse_delimited(raw), None),
    };

    match &table.source {
        TableSource::RawLines => {
            warnings.push("No delimiter found; lines kept as a single column".into())
        }
        TableSource::Empty if warnings.is_empty() => warnings.push("Bureau text is empty".into()),
        _ => {}
    }

    let records: Vec<FieldRecord> = table.records();
    let borrower_name = json_name.or_else(|| {
        records
            .iter()
            .find_map(|r| first_present(r, BORROWER_NAME_KEYS))
            .map(str::to_string)
    });

    let report = BureauReport {
        borrower_name,
        records: records.iter().map(BureauFacilityRecord::from_fields).collect(),
    };
    tracing::debug!(records = report.records.len(), source = ?table.source, "bureau text parsed");

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "json_selection": "highest schema-field overlap, then longest array",
        "delimiters": [",", ";", "\\t", "|"],
    });

    with_metadata(
        "SLIK Bureau Export Parsing",
        &assumptions,
        warnings,
        elapsed,
        ParsedBureau { table, report },
    )
}

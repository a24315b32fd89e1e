//! Facility-record schema shared by the JSON matcher and record extraction.
//!
//! Each field lists its candidate column names in priority order. English names
//! come first, followed by the labels used in SLIK (iDeb) exports. Candidates are
//! compared after `normalize_key`, so spelling of case and separators is free.

use std::collections::BTreeSet;

use crate::fields::normalize_key;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BureauField {
    LenderName,
    CreditTypeLabel,
    Plafond,
    OutstandingBalance,
    InterestRate,
    StartDate,
    DueDate,
    OverdueDays,
    QualityCode,
    Condition,
}

pub const BUREAU_SCHEMA: &[(BureauField, &[&str])] = &[
    (
        BureauField::LenderName,
        &["lender_name", "lender", "nama_pelapor", "pelapor", "ljk", "nama_ljk", "bank", "kreditur"],
    ),
    (
        BureauField::CreditTypeLabel,
        &["credit_type_label", "credit_type", "facility_type", "jenis_kredit", "jenis_fasilitas", "jenis_penggunaan", "jenis"],
    ),
    (
        BureauField::Plafond,
        &["plafond", "plafon", "plafon_awal", "credit_limit", "limit"],
    ),
    (
        BureauField::OutstandingBalance,
        &["outstanding_balance", "outstanding", "baki_debet", "bakidebet", "saldo", "sisa_pokok"],
    ),
    (
        BureauField::InterestRate,
        &["interest_rate", "rate", "suku_bunga", "suku_bunga_imbalan", "bunga"],
    ),
    (
        BureauField::StartDate,
        &["start_date", "tanggal_mulai", "tgl_mulai", "tanggal_akad_awal", "tanggal_akad", "mulai"],
    ),
    (
        BureauField::DueDate,
        &["due_date", "maturity_date", "tanggal_jatuh_tempo", "tgl_jatuh_tempo", "jatuh_tempo"],
    ),
    (
        BureauField::OverdueDays,
        &["overdue_days", "days_past_due", "dpd", "jumlah_hari_tunggakan", "hari_tunggakan", "tunggakan_hari"],
    ),
    (
        BureauField::QualityCode,
        &["quality_code", "quality", "kualitas", "kolektibilitas", "kol", "collectibility"],
    ),
    (
        BureauField::Condition,
        &["condition", "kondisi", "keterangan_kondisi", "status", "keterangan"],
    ),
];

/// Keys that name the borrower in a report header.
pub const BORROWER_NAME_KEYS: &[&str] = &[
    "borrower_name",
    "debtor_name",
    "nama_debitur",
    "nama_nasabah",
    "nama_lengkap",
    "customer_name",
    "nama",
    "name",
];

pub fn candidate_keys(field: BureauField) -> &'static [&'static str] {
    BUREAU_SCHEMA
        .iter()
        .find(|(f, _)| *f == field)
        .map(|(_, keys)| *keys)
        .unwrap_or(&[])
}

/// Number of schema fields that at least one of `keys` (already normalized) satisfies.
pub fn schema_match_count(keys: &BTreeSet<String>) -> usize {
    BUREAU_SCHEMA
        .iter()
        .filter(|(_, candidates)| candidates.iter().any(|c| keys.contains(&normalize_key(c))))
        .count()
}

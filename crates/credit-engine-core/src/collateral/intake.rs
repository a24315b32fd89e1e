//! Build typed collateral items from loosely keyed form records.

use crate::fields::{first_decimal, first_percent, first_present, normalize_key, FieldRecord};

use super::valuation::{
    BalanceCollateral, CertificateBinding, CertificateCollateral, CollateralItem,
    OtherCollateral, VehicleBinding, VehicleCollateral,
};

const TYPE_KEYS: &[&str] = &["type", "collateral_type", "jenis_agunan", "jenis_jaminan", "agunan"];
const BINDING_KEYS: &[&str] = &["binding", "binding_kind", "pengikatan", "jenis_pengikatan"];
const LIMIT_KEYS: &[&str] = &["requested_limit", "plafond", "plafon", "limit"];

const LAND_VALUE_KEYS: &[&str] = &["land_value", "njop_total", "total_njop", "nilai_njop_total"];
const NJOP_KEYS: &[&str] = &["njop_value", "njop", "nilai_njop"];
const APPRAISAL_LAND_KEYS: &[&str] = &["appraisal_land_value", "appraisal_value", "taksasi_tanah", "nilai_taksasi_tanah"];
const APPRAISAL_BUILDING_KEYS: &[&str] = &["appraisal_building_value", "building_value", "taksasi_bangunan", "nilai_taksasi_bangunan"];
const MARKET_VALUE_KEYS: &[&str] = &["market_value", "nilai_pasar", "harga_pasar", "taksasi"];
const BALANCE_KEYS: &[&str] = &["held_balance", "saldo", "saldo_diblokir", "nominal", "nilai_deposito"];
const MARGIN_KEYS: &[&str] = &["safety_margin_percent", "margin", "safety_margin"];

/// Type label fragments, matched against the normalized label in this order.
const TYPE_MARKERS: &[(&str, Kind)] = &[
    ("sertifikat", Kind::Certificate),
    ("certificate", Kind::Certificate),
    ("shm", Kind::Certificate),
    ("shgb", Kind::Certificate),
    ("bpkb", Kind::Vehicle),
    ("vehicle", Kind::Vehicle),
    ("kendaraan", Kind::Vehicle),
    ("tabungan", Kind::Savings),
    ("savings", Kind::Savings),
    ("deposito", Kind::Deposit),
    ("deposit", Kind::Deposit),
];

#[derive(Debug, Clone, Copy)]
enum Kind {
    Certificate,
    Vehicle,
    Savings,
    Deposit,
}

impl CollateralItem {
    /// Interpret a form record. Unrecognized type labels become `Other`.
    pub fn from_fields(record: &FieldRecord) -> CollateralItem {
        let label = first_present(record, TYPE_KEYS)
            .map(normalize_key)
            .unwrap_or_default();
        let kind = TYPE_MARKERS
            .iter()
            .find(|(marker, _)| label.contains(marker))
            .map(|(_, kind)| *kind);
        let binding = first_present(record, BINDING_KEYS)
            .map(normalize_key)
            .unwrap_or_default();
        let requested_limit = first_decimal(record, LIMIT_KEYS);

        match kind {
            Some(Kind::Certificate) => CollateralItem::Certificate(CertificateCollateral {
                land_value: first_decimal(record, LAND_VALUE_KEYS),
                njop_value: first_decimal(record, NJOP_KEYS),
                appraisal_land_value: first_decimal(record, APPRAISAL_LAND_KEYS),
                appraisal_building_value: first_decimal(record, APPRAISAL_BUILDING_KEYS),
                binding: parse_certificate_binding(&binding),
                requested_limit,
            }),
            Some(Kind::Vehicle) => CollateralItem::VehicleTitle(VehicleCollateral {
                market_value: first_decimal(record, MARKET_VALUE_KEYS),
                binding: parse_vehicle_binding(&binding),
                requested_limit,
            }),
            Some(Kind::Savings) => CollateralItem::Savings(BalanceCollateral {
                held_balance: first_decimal(record, BALANCE_KEYS),
                requested_limit,
            }),
            Some(Kind::Deposit) => CollateralItem::Deposit(BalanceCollateral {
                held_balance: first_decimal(record, BALANCE_KEYS),
                requested_limit,
            }),
            None => CollateralItem::Other(OtherCollateral {
                market_value: first_decimal(record, MARKET_VALUE_KEYS),
                safety_margin_percent: first_percent(record, MARGIN_KEYS),
                requested_limit,
            }),
        }
    }
}

fn parse_certificate_binding(normalized: &str) -> Option<CertificateBinding> {
    if normalized.contains("skmht") {
        Some(CertificateBinding::SKMHT)
    } else if normalized.contains("apht") {
        Some(CertificateBinding::APHT)
    } else {
        None
    }
}

fn parse_vehicle_binding(normalized: &str) -> Option<VehicleBinding> {
    // "nonfidusia" contains "fidusia", so check the negative form first.
    if normalized.contains("nonfidusia") || normalized.contains("nonfiducia") {
        Some(VehicleBinding::NonFiducia)
    } else if normalized.contains("fidusia") || normalized.contains("fiducia") {
        Some(VehicleBinding::Fiducia)
    } else {
        None
    }
}

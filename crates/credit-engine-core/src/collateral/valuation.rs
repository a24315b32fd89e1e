//! Per-type collateral valuation.
//!
//! Each collateral variant has its own pure valuation function; `value_item` is
//! the single dispatch point. Margins are derived from the binding strength by
//! separate functions so a form can recompute them whenever the binding changes.
//!
//! | Type         | Market basis                       | Margin                         | Approve when                    |
//! |--------------|------------------------------------|--------------------------------|---------------------------------|
//! | Certificate  | avg(NJOP total, appraisal total)   | SKMHT 60, APHT 80, unset 80    | market ≥ limit × coverage       |
//! | VehicleTitle | market value                       | Fiducia 50, NonFiducia 0, unset 50 | liquidation ≥ limit × coverage |
//! | Savings      | held balance                       | n/a                            | balance ≥ limit                 |
//! | Deposit      | held balance                       | n/a                            | balance ≥ limit                 |
//! | Other        | market value                       | 50 unless overridden           | liquidation ≥ limit × coverage  |

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::fields::{lenient_opt_decimal, lenient_opt_percent};
use crate::types::{saturating_sum, ApprovalStatus, Money, Percent, Points};

/// Minimum market value as a multiple of the requested limit.
pub const DEFAULT_COVERAGE_MULTIPLE: Decimal = dec!(1.25);

pub const CERTIFICATE_APHT_MARGIN: Percent = dec!(80);
pub const CERTIFICATE_SKMHT_MARGIN: Percent = dec!(60);
pub const VEHICLE_FIDUCIA_MARGIN: Percent = dec!(50);
pub const VEHICLE_NON_FIDUCIA_MARGIN: Percent = dec!(0);
pub const OTHER_DEFAULT_MARGIN: Percent = dec!(50);

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Legal binding on land/building certificates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CertificateBinding {
    /// Full mortgage deed.
    APHT,
    /// Power of attorney to encumber; weaker, pending APHT.
    SKMHT,
}

/// Binding on vehicle ownership books (BPKB).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VehicleBinding {
    Fiducia,
    NonFiducia,
}

/// Variant tag without payload, used in verdicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollateralType {
    Certificate,
    VehicleTitle,
    Savings,
    Deposit,
    Other,
}

impl std::fmt::Display for CollateralType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CollateralType::Certificate => write!(f, "Certificate"),
            CollateralType::VehicleTitle => write!(f, "VehicleTitle"),
            CollateralType::Savings => write!(f, "Savings"),
            CollateralType::Deposit => write!(f, "Deposit"),
            CollateralType::Other => write!(f, "Other"),
        }
    }
}

// ---------------------------------------------------------------------------
// Items
// ---------------------------------------------------------------------------

/// Land or land-and-building certificate (SHM/SHGB).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CertificateCollateral {
    /// NJOP total as entered on the form.
    #[serde(default, deserialize_with = "lenient_opt_decimal")]
    pub land_value: Option<Money>,
    /// Single NJOP figure used when `land_value` is absent.
    #[serde(default, deserialize_with = "lenient_opt_decimal")]
    pub njop_value: Option<Money>,
    /// Bank appraisal of the land.
    #[serde(default, deserialize_with = "lenient_opt_decimal")]
    pub appraisal_land_value: Option<Money>,
    /// Bank appraisal of the building.
    #[serde(default, deserialize_with = "lenient_opt_decimal")]
    pub appraisal_building_value: Option<Money>,
    #[serde(default)]
    pub binding: Option<CertificateBinding>,
    #[serde(default, deserialize_with = "lenient_opt_decimal")]
    pub requested_limit: Option<Money>,
}

/// Vehicle ownership book (BPKB).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VehicleCollateral {
    #[serde(default, deserialize_with = "lenient_opt_decimal")]
    pub market_value: Option<Money>,
    #[serde(default)]
    pub binding: Option<VehicleBinding>,
    #[serde(default, deserialize_with = "lenient_opt_decimal")]
    pub requested_limit: Option<Money>,
}

/// Savings or time deposit held (blocked) at the lender.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BalanceCollateral {
    #[serde(default, deserialize_with = "lenient_opt_decimal")]
    pub held_balance: Option<Money>,
    #[serde(default, deserialize_with = "lenient_opt_decimal")]
    pub requested_limit: Option<Money>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OtherCollateral {
    #[serde(default, deserialize_with = "lenient_opt_decimal")]
    pub market_value: Option<Money>,
    #[serde(default, deserialize_with = "lenient_opt_percent")]
    pub safety_margin_percent: Option<Percent>,
    #[serde(default, deserialize_with = "lenient_opt_decimal")]
    pub requested_limit: Option<Money>,
}

/// One pledged collateral item.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CollateralItem {
    Certificate(CertificateCollateral),
    VehicleTitle(VehicleCollateral),
    Savings(BalanceCollateral),
    Deposit(BalanceCollateral),
    Other(OtherCollateral),
}

impl CollateralItem {
    pub fn collateral_type(&self) -> CollateralType {
        match self {
            CollateralItem::Certificate(_) => CollateralType::Certificate,
            CollateralItem::VehicleTitle(_) => CollateralType::VehicleTitle,
            CollateralItem::Savings(_) => CollateralType::Savings,
            CollateralItem::Deposit(_) => CollateralType::Deposit,
            CollateralItem::Other(_) => CollateralType::Other,
        }
    }

    pub fn requested_limit(&self) -> Option<Money> {
        match self {
            CollateralItem::Certificate(c) => c.requested_limit,
            CollateralItem::VehicleTitle(v) => v.requested_limit,
            CollateralItem::Savings(b) | CollateralItem::Deposit(b) => b.requested_limit,
            CollateralItem::Other(o) => o.requested_limit,
        }
    }
}

// ---------------------------------------------------------------------------
// Verdict
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollateralVerdict {
    pub collateral_type: CollateralType,
    /// Market basis the approval rule is tested against (before margin).
    pub market_value: Option<Money>,
    /// Market basis after the safety margin; 0 when the basis was never entered.
    pub liquidation_value: Money,
    /// `None` for cash-like collateral, which carries no margin.
    pub safety_margin_percent: Option<Percent>,
    pub requested_limit: Option<Money>,
    /// Threshold the tested value had to reach.
    pub minimum_required: Option<Money>,
    pub approval_status: ApprovalStatus,
    pub score_points: Points,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

// ---------------------------------------------------------------------------
// Margin derivation
// ---------------------------------------------------------------------------

pub fn certificate_margin(binding: Option<CertificateBinding>) -> Percent {
    match binding {
        Some(CertificateBinding::SKMHT) => CERTIFICATE_SKMHT_MARGIN,
        Some(CertificateBinding::APHT) | None => CERTIFICATE_APHT_MARGIN,
    }
}

pub fn vehicle_margin(binding: Option<VehicleBinding>) -> Percent {
    match binding {
        Some(VehicleBinding::NonFiducia) => VEHICLE_NON_FIDUCIA_MARGIN,
        Some(VehicleBinding::Fiducia) | None => VEHICLE_FIDUCIA_MARGIN,
    }
}

/// Points an item earns when approved.
pub fn approval_points(item: &CollateralItem) -> Points {
    match item {
        CollateralItem::Certificate(c) if c.binding == Some(CertificateBinding::SKMHT) => dec!(9),
        CollateralItem::Certificate(_) => dec!(12),
        _ => dec!(15),
    }
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// Value one item. `fallback_limit` is the application plafond, used when the
/// item carries no limit of its own.
pub fn value_item(
    item: &CollateralItem,
    fallback_limit: Option<Money>,
    coverage_multiple: Decimal,
) -> CollateralVerdict {
    let limit = item.requested_limit().or(fallback_limit).map(clamp);
    let mut verdict = match item {
        CollateralItem::Certificate(c) => value_certificate(c, limit, coverage_multiple),
        CollateralItem::VehicleTitle(v) => value_vehicle(v, limit, coverage_multiple),
        CollateralItem::Savings(b) => value_balance(CollateralType::Savings, b, limit),
        CollateralItem::Deposit(b) => value_balance(CollateralType::Deposit, b, limit),
        CollateralItem::Other(o) => value_other(o, limit, coverage_multiple),
    };
    if verdict.approval_status.is_approved() {
        verdict.score_points = approval_points(item);
    }
    verdict
}

pub fn value_certificate(
    cert: &CertificateCollateral,
    limit: Option<Money>,
    coverage_multiple: Decimal,
) -> CollateralVerdict {
    let njop_total = cert.land_value.or(cert.njop_value).map(clamp);
    let appraisal_total = match (cert.appraisal_land_value, cert.appraisal_building_value) {
        (None, None) => None,
        (land, building) => Some(clamp(
            land.unwrap_or(Decimal::ZERO)
                .saturating_add(building.unwrap_or(Decimal::ZERO)),
        )),
    };
    let market = average_present(&[njop_total, appraisal_total]);
    let margin = certificate_margin(cert.binding);
    let liquidation = market.map(|m| apply_margin(m, margin));

    let minimum = limit.map(|l| l.saturating_mul(coverage_multiple));
    let (status, note) = judge(market, minimum, "NJOP or appraisal value not entered");

    CollateralVerdict {
        collateral_type: CollateralType::Certificate,
        market_value: market,
        liquidation_value: liquidation.unwrap_or(Decimal::ZERO),
        safety_margin_percent: Some(margin),
        requested_limit: limit,
        minimum_required: minimum,
        approval_status: status,
        score_points: Decimal::ZERO,
        note,
    }
}

pub fn value_vehicle(
    vehicle: &VehicleCollateral,
    limit: Option<Money>,
    coverage_multiple: Decimal,
) -> CollateralVerdict {
    let market = vehicle.market_value.map(clamp);
    let margin = vehicle_margin(vehicle.binding);
    let liquidation = market.map(|m| apply_margin(m, margin));

    let minimum = limit.map(|l| l.saturating_mul(coverage_multiple));
    let (status, note) = judge(liquidation, minimum, "vehicle market value not entered");

    CollateralVerdict {
        collateral_type: CollateralType::VehicleTitle,
        market_value: market,
        liquidation_value: liquidation.unwrap_or(Decimal::ZERO),
        safety_margin_percent: Some(margin),
        requested_limit: limit,
        minimum_required: minimum,
        approval_status: status,
        score_points: Decimal::ZERO,
        note,
    }
}

pub fn value_balance(
    kind: CollateralType,
    balance: &BalanceCollateral,
    limit: Option<Money>,
) -> CollateralVerdict {
    let held = balance.held_balance.map(clamp);
    let (status, note) = judge(held, limit, "held balance not entered");

    CollateralVerdict {
        collateral_type: kind,
        market_value: held,
        liquidation_value: held.unwrap_or(Decimal::ZERO),
        safety_margin_percent: None,
        requested_limit: limit,
        minimum_required: limit,
        approval_status: status,
        score_points: Decimal::ZERO,
        note,
    }
}

pub fn value_other(
    other: &OtherCollateral,
    limit: Option<Money>,
    coverage_multiple: Decimal,
) -> CollateralVerdict {
    let market = other.market_value.map(clamp);
    let margin = other
        .safety_margin_percent
        .map(clamp)
        .unwrap_or(OTHER_DEFAULT_MARGIN);
    let liquidation = market.map(|m| apply_margin(m, margin));

    let minimum = limit.map(|l| l.saturating_mul(coverage_multiple));
    let (status, note) = judge(liquidation, minimum, "market value not entered");

    CollateralVerdict {
        collateral_type: CollateralType::Other,
        market_value: market,
        liquidation_value: liquidation.unwrap_or(Decimal::ZERO),
        safety_margin_percent: Some(margin),
        requested_limit: limit,
        minimum_required: minimum,
        approval_status: status,
        score_points: Decimal::ZERO,
        note,
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn clamp(value: Money) -> Money {
    value.max(Decimal::ZERO)
}

/// Liquidation value; saturates rather than overflowing on absurd entries.
fn apply_margin(market: Money, margin: Percent) -> Money {
    market.saturating_mul(margin) / dec!(100)
}

fn average_present(values: &[Option<Money>]) -> Option<Money> {
    let present: Vec<Money> = values.iter().flatten().copied().collect();
    if present.is_empty() {
        None
    } else {
        Some(saturating_sum(present.iter().copied()) / Decimal::from(present.len()))
    }
}

/// Boundary is inclusive: a tested value exactly at the minimum approves.
fn judge(
    tested: Option<Money>,
    minimum: Option<Money>,
    missing_value_note: &str,
) -> (ApprovalStatus, Option<String>) {
    match (tested, minimum) {
        (Some(v), Some(min)) => (ApprovalStatus::from_check(v >= min), None),
        (None, _) => (
            ApprovalStatus::Undetermined,
            Some(missing_value_note.to_string()),
        ),
        (Some(_), None) => (
            ApprovalStatus::Undetermined,
            Some("requested limit not set".to_string()),
        ),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn certificate(njop: Money, appraisal: Money, binding: Option<CertificateBinding>) -> CertificateCollateral {
        CertificateCollateral {
            land_value: Some(njop),
            njop_value: None,
            appraisal_land_value: Some(appraisal),
            appraisal_building_value: None,
            binding,
            requested_limit: None,
        }
    }

    #[test]
    fn test_certificate_reference_case() {
        let cert = certificate(
            dec!(200_000_000),
            dec!(220_000_000),
            Some(CertificateBinding::APHT),
        );
        let v = value_certificate(&cert, Some(dec!(150_000_000)), DEFAULT_COVERAGE_MULTIPLE);
        assert_eq!(v.market_value, Some(dec!(210_000_000)));
        assert_eq!(v.minimum_required, Some(dec!(187_500_000)));
        assert_eq!(v.liquidation_value, dec!(168_000_000));
        assert_eq!(v.approval_status, ApprovalStatus::Approve);
    }

    #[test]
    fn test_certificate_boundary_inclusive() {
        let cert = certificate(dec!(125), dec!(125), None);
        let v = value_certificate(&cert, Some(dec!(100)), DEFAULT_COVERAGE_MULTIPLE);
        assert_eq!(v.approval_status, ApprovalStatus::Approve);

        let cert = certificate(dec!(124.99), dec!(125), None);
        let v = value_certificate(&cert, Some(dec!(100)), DEFAULT_COVERAGE_MULTIPLE);
        assert_eq!(v.approval_status, ApprovalStatus::Reject);
    }

    #[test]
    fn test_certificate_njop_fallback_and_appraisal_sum() {
        let cert = CertificateCollateral {
            land_value: None,
            njop_value: Some(dec!(100)),
            appraisal_land_value: Some(dec!(120)),
            appraisal_building_value: Some(dec!(80)),
            binding: None,
            requested_limit: None,
        };
        let v = value_certificate(&cert, Some(dec!(100)), DEFAULT_COVERAGE_MULTIPLE);
        // avg(100, 200) = 150
        assert_eq!(v.market_value, Some(dec!(150)));
    }

    #[test]
    fn test_certificate_nothing_entered_is_undetermined() {
        let v = value_certificate(
            &CertificateCollateral::default(),
            Some(dec!(100)),
            DEFAULT_COVERAGE_MULTIPLE,
        );
        assert_eq!(v.approval_status, ApprovalStatus::Undetermined);
        assert_eq!(v.liquidation_value, Decimal::ZERO);
        assert!(v.note.is_some());
    }

    #[test]
    fn test_certificate_zero_values_reject_not_undetermined() {
        let cert = certificate(Decimal::ZERO, Decimal::ZERO, None);
        let v = value_certificate(&cert, Some(dec!(100)), DEFAULT_COVERAGE_MULTIPLE);
        assert_eq!(v.approval_status, ApprovalStatus::Reject);
    }

    #[test]
    fn test_margin_derivation() {
        assert_eq!(certificate_margin(Some(CertificateBinding::SKMHT)), dec!(60));
        assert_eq!(certificate_margin(Some(CertificateBinding::APHT)), dec!(80));
        assert_eq!(certificate_margin(None), dec!(80));
        assert_eq!(vehicle_margin(Some(VehicleBinding::Fiducia)), dec!(50));
        assert_eq!(vehicle_margin(Some(VehicleBinding::NonFiducia)), dec!(0));
        assert_eq!(vehicle_margin(None), dec!(50));
    }

    #[test]
    fn test_vehicle_tests_liquidation_value() {
        let vehicle = VehicleCollateral {
            market_value: Some(dec!(250)),
            binding: Some(VehicleBinding::Fiducia),
            requested_limit: None,
        };
        // liquidation 125 vs required 125
        let v = value_vehicle(&vehicle, Some(dec!(100)), DEFAULT_COVERAGE_MULTIPLE);
        assert_eq!(v.liquidation_value, dec!(125));
        assert_eq!(v.approval_status, ApprovalStatus::Approve);
    }

    #[test]
    fn test_vehicle_non_fiducia_rejects() {
        let vehicle = VehicleCollateral {
            market_value: Some(dec!(1_000_000)),
            binding: Some(VehicleBinding::NonFiducia),
            requested_limit: None,
        };
        let v = value_vehicle(&vehicle, Some(dec!(100)), DEFAULT_COVERAGE_MULTIPLE);
        assert_eq!(v.liquidation_value, Decimal::ZERO);
        assert_eq!(v.approval_status, ApprovalStatus::Reject);
    }

    #[test]
    fn test_balance_has_no_margin_or_multiple() {
        let savings = BalanceCollateral {
            held_balance: Some(dec!(100)),
            requested_limit: None,
        };
        let v = value_balance(CollateralType::Savings, &savings, Some(dec!(100)));
        assert_eq!(v.safety_margin_percent, None);
        assert_eq!(v.approval_status, ApprovalStatus::Approve);

        let v = value_balance(CollateralType::Deposit, &savings, Some(dec!(101)));
        assert_eq!(v.approval_status, ApprovalStatus::Reject);
    }

    #[test]
    fn test_other_uses_default_or_override_margin() {
        let other = OtherCollateral {
            market_value: Some(dec!(300)),
            safety_margin_percent: None,
            requested_limit: None,
        };
        let v = value_other(&other, Some(dec!(100)), DEFAULT_COVERAGE_MULTIPLE);
        assert_eq!(v.liquidation_value, dec!(150));
        assert_eq!(v.approval_status, ApprovalStatus::Approve);

        let other = OtherCollateral {
            safety_margin_percent: Some(dec!(40)),
            ..other
        };
        let v = value_other(&other, Some(dec!(100)), DEFAULT_COVERAGE_MULTIPLE);
        assert_eq!(v.liquidation_value, dec!(120));
        assert_eq!(v.approval_status, ApprovalStatus::Reject);
    }

    #[test]
    fn test_item_limit_overrides_plafond() {
        let item = CollateralItem::Savings(BalanceCollateral {
            held_balance: Some(dec!(50)),
            requested_limit: Some(dec!(40)),
        });
        let v = value_item(&item, Some(dec!(1_000)), DEFAULT_COVERAGE_MULTIPLE);
        assert_eq!(v.requested_limit, Some(dec!(40)));
        assert_eq!(v.approval_status, ApprovalStatus::Approve);
        assert_eq!(v.score_points, dec!(15));
    }

    #[test]
    fn test_missing_limit_is_undetermined() {
        let item = CollateralItem::Savings(BalanceCollateral {
            held_balance: Some(dec!(50)),
            requested_limit: None,
        });
        let v = value_item(&item, None, DEFAULT_COVERAGE_MULTIPLE);
        assert_eq!(v.approval_status, ApprovalStatus::Undetermined);
        assert_eq!(v.score_points, Decimal::ZERO);
    }

    #[test]
    fn test_approval_points_table() {
        let skmht = CollateralItem::Certificate(certificate(dec!(1), dec!(1), Some(CertificateBinding::SKMHT)));
        let apht = CollateralItem::Certificate(certificate(dec!(1), dec!(1), Some(CertificateBinding::APHT)));
        let unset = CollateralItem::Certificate(certificate(dec!(1), dec!(1), None));
        let vehicle = CollateralItem::VehicleTitle(VehicleCollateral::default());
        assert_eq!(approval_points(&skmht), dec!(9));
        assert_eq!(approval_points(&apht), dec!(12));
        assert_eq!(approval_points(&unset), dec!(12));
        assert_eq!(approval_points(&vehicle), dec!(15));
    }

    #[test]
    fn test_huge_entries_saturate_instead_of_panicking() {
        let other = OtherCollateral {
            market_value: Some(Decimal::MAX),
            safety_margin_percent: Some(dec!(1_000)),
            requested_limit: None,
        };
        let v = value_other(&other, Some(Decimal::MAX), dec!(3));
        assert_eq!(v.minimum_required, Some(Decimal::MAX));
        assert_eq!(v.liquidation_value, Decimal::MAX / dec!(100));
        assert_eq!(v.approval_status, ApprovalStatus::Reject);

        let cert = CertificateCollateral {
            appraisal_land_value: Some(Decimal::MAX),
            appraisal_building_value: Some(Decimal::MAX),
            ..Default::default()
        };
        let v = value_certificate(&cert, Some(dec!(1)), DEFAULT_COVERAGE_MULTIPLE);
        assert_eq!(v.market_value, Some(Decimal::MAX));
        assert_eq!(v.approval_status, ApprovalStatus::Approve);
    }

    #[test]
    fn test_tagged_json_item() {
        let item: CollateralItem = serde_json::from_str(
            r#"{"type": "Certificate", "land_value": "200.000.000", "appraisal_land_value": 220000000, "binding": "SKMHT"}"#,
        )
        .unwrap();
        match item {
            CollateralItem::Certificate(c) => {
                assert_eq!(c.land_value, Some(dec!(200_000_000)));
                assert_eq!(c.binding, Some(CertificateBinding::SKMHT));
                assert_eq!(c.njop_value, None);
            }
            other => panic!("Expected Certificate, got {other:?}"),
        }
    }
}

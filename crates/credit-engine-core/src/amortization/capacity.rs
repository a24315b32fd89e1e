use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::{Decision, Money, Percent};

/// Installments above this share of monthly income are rejected.
pub const DEFAULT_MAX_DSR_PERCENT: Percent = dec!(35);

/// Debt-service-ratio verdict for one installment against one income.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepaymentCapacity {
    pub installment: Money,
    pub monthly_income: Money,
    /// Installment / income in percent; 0 when no income was entered.
    pub debt_service_ratio: Percent,
    pub max_dsr_percent: Percent,
    pub decision: Decision,
}

/// DSR check. A missing (zero) income yields a ratio of 0 rather than a division
/// error, so callers must confirm income was captured before trusting an approval.
pub fn assess_repayment_capacity(
    installment: Money,
    monthly_income: Money,
    max_dsr_percent: Option<Percent>,
) -> RepaymentCapacity {
    let max_dsr = max_dsr_percent.unwrap_or(DEFAULT_MAX_DSR_PERCENT);
    let dsr = if monthly_income > Decimal::ZERO {
        // a sliver of income against a large installment pins the ratio at MAX
        installment
            .checked_div(monthly_income)
            .and_then(|r| r.checked_mul(dec!(100)))
            .unwrap_or(Decimal::MAX)
    } else {
        Decimal::ZERO
    };

    RepaymentCapacity {
        installment,
        monthly_income,
        debt_service_ratio: dsr,
        max_dsr_percent: max_dsr,
        decision: Decision::from_check(dsr <= max_dsr),
    }
}

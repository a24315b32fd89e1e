use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::Money;

/// One month of a repayment schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationRow {
    /// 1-based month index.
    pub month: u32,
    pub installment: Money,
    pub interest_portion: Money,
    pub principal_portion: Money,
    /// Outstanding principal after this month's payment, never negative.
    pub remaining_balance: Money,
}

/// Ordered rows plus the aggregates shown to the officer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationSchedule {
    pub rows: Vec<AmortizationRow>,
    pub total_interest: Money,
    /// Fees plus every installment.
    pub total_payment: Money,
    /// Principal actually handed to the borrower after fees.
    pub net_disbursement: Money,
}

impl AmortizationSchedule {
    /// Highest single installment, the figure a repayment-capacity check must survive.
    pub fn peak_installment(&self) -> Money {
        self.rows
            .iter()
            .map(|r| r.installment)
            .max()
            .unwrap_or(Decimal::ZERO)
    }

    pub fn total_principal(&self) -> Money {
        self.rows.iter().map(|r| r.principal_portion).sum()
    }

    pub fn final_balance(&self) -> Money {
        self.rows
            .last()
            .map(|r| r.remaining_balance)
            .unwrap_or(Decimal::ZERO)
    }
}

//! Payroll view rows (read only)

use crate::ids::{PayrollId, UserId};
use crate::record::Record;
use serde::{Deserialize, Serialize};

/// Processing state of a payslip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayrollStatus {
    /// Being prepared
    Draft,
    /// Computed, not yet paid
    Processed,
    /// Paid out
    Paid,
}

/// Monthly payroll record of one user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayrollRecord {
    /// Row id
    pub id: PayrollId,
    /// Employee
    pub user_id: UserId,
    /// Pay year
    pub year: i32,
    /// Pay month (1-12)
    pub month: u32,
    /// Gross pay
    pub gross_pay: f64,
    /// Statutory and other deductions
    pub deductions: f64,
    /// Net pay
    pub net_pay: f64,
    /// Processing state
    pub status: PayrollStatus,
}

impl PayrollRecord {
    /// Period label, e.g. `2025-01`
    #[must_use]
    pub fn period(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }
}

impl Record for PayrollRecord {
    type Id = PayrollId;

    const TABLE: &'static str = "nd_payroll";
    const ENTITY: &'static str = "payroll record";

    fn id(&self) -> PayrollId {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn period_is_zero_padded() {
        let record = PayrollRecord {
            id: PayrollId::new(),
            user_id: UserId::new(),
            year: 2025,
            month: 3,
            gross_pay: 3200.0,
            deductions: 410.5,
            net_pay: 2789.5,
            status: PayrollStatus::Paid,
        };
        assert_eq!(record.period(), "2025-03");
    }
}

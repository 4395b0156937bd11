use super::status::Status;
use crate::error::{LoanError, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type RequestId = Uuid;
pub type LoanTypeId = i64;

/// Reference data describing a loan product. Read-only to the lifecycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanType {
    pub id: LoanTypeId,
    pub name: String,
    /// `None` leaves the lower bound unconstrained.
    pub minimum_amount: Option<Decimal>,
    /// `None` leaves the upper bound unconstrained.
    pub maximum_amount: Option<Decimal>,
    /// Effective annual interest rate, e.g. `0.12` for 12%.
    pub interest_rate: Decimal,
    pub automatic_validation: bool,
}

/// A loan request as persisted by the request store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanRequest {
    /// Assigned by the store on first save.
    pub id: Option<RequestId>,
    pub amount: Decimal,
    pub term_months: i32,
    pub email: String,
    pub status: Status,
    pub loan_type_id: LoanTypeId,
    /// Populated exactly when `status` is `Approved`.
    pub monthly_debt: Option<Decimal>,
}

impl LoanRequest {
    pub fn pending(application: &LoanApplication) -> Self {
        Self {
            id: None,
            amount: application.amount,
            term_months: application.term_months,
            email: application.email.clone(),
            status: Status::Pending,
            loan_type_id: application.loan_type_id,
            monthly_debt: None,
        }
    }
}

/// Intake data for a new loan request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanApplication {
    pub document_number: String,
    pub email: String,
    pub amount: Decimal,
    pub term_months: i32,
    pub loan_type_id: LoanTypeId,
}

impl LoanType {
    /// Bounds are inclusive; each one is only enforced when configured.
    pub fn check_amount(&self, amount: Decimal) -> Result<()> {
        if let Some(maximum) = self.maximum_amount
            && amount > maximum
        {
            return Err(LoanError::AmountAboveMaximum { amount, maximum });
        }
        if let Some(minimum) = self.minimum_amount
            && amount < minimum
        {
            return Err(LoanError::AmountBelowMinimum { amount, minimum });
        }
        Ok(())
    }
}

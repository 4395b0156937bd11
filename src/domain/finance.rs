//! Pure amortization and affordability arithmetic.
//!
//! All intermediate values are carried as `Decimal` (28 significant digits);
//! only the final result is rounded to its output scale.

use crate::error::{LoanError, Result};
use rust_decimal::{Decimal, MathematicalOps, RoundingStrategy};

const MONTHS_PER_YEAR: u32 = 12;

/// Fixed monthly installment for a fully amortized loan:
/// `P·i·(1+i)^n / ((1+i)^n − 1)`, or `P / n` when `i` is zero.
///
/// The result is rounded to cents with banker's rounding.
pub fn monthly_payment(
    principal: Decimal,
    periodic_rate: Option<Decimal>,
    term_months: i32,
) -> Result<Decimal> {
    if principal <= Decimal::ZERO {
        return Err(LoanError::InvalidFinancialInput(format!(
            "principal must be > 0, got {principal}"
        )));
    }
    if term_months <= 0 {
        return Err(LoanError::InvalidFinancialInput(format!(
            "term months must be > 0, got {term_months}"
        )));
    }
    let rate = periodic_rate.ok_or_else(|| {
        LoanError::InvalidFinancialInput("periodic rate is required".to_string())
    })?;

    if rate.is_zero() {
        return Ok(round_cents(principal / Decimal::from(term_months)));
    }

    let overflow = || LoanError::InvalidFinancialInput("amortization overflow".to_string());

    // term_months > 0 was checked above
    let growth = (Decimal::ONE + rate)
        .checked_powu(term_months.unsigned_abs().into())
        .ok_or_else(overflow)?;
    let denominator = growth - Decimal::ONE;
    if denominator.is_zero() {
        return Err(LoanError::InvalidFinancialInput(format!(
            "periodic rate {rate} is too small to amortize"
        )));
    }
    let numerator = principal
        .checked_mul(rate)
        .and_then(|v| v.checked_mul(growth))
        .ok_or_else(overflow)?;
    let payment = numerator.checked_div(denominator).ok_or_else(overflow)?;

    Ok(round_cents(payment))
}

/// Converts an annual rate into a monthly one.
///
/// With `effective_annual` the rate compounds: `(1 + r)^(1/12) − 1`;
/// otherwise it is the nominal split `r / 12`.
pub fn annual_to_periodic(annual_rate: Decimal, effective_annual: bool) -> Result<Decimal> {
    let months = Decimal::from(MONTHS_PER_YEAR);
    if !effective_annual {
        return Ok(annual_rate / months);
    }
    let base = Decimal::ONE + annual_rate;
    if base <= Decimal::ZERO {
        return Err(LoanError::InvalidFinancialInput(format!(
            "annual rate {annual_rate} cannot compound"
        )));
    }
    base.checked_powd(Decimal::ONE / months)
        .map(|root| root - Decimal::ONE)
        .ok_or_else(|| {
            LoanError::InvalidFinancialInput(format!(
                "unable to derive a monthly rate from {annual_rate}"
            ))
        })
}

/// Monthly obligation over monthly salary, four decimals, half-up.
pub fn debt_to_income_ratio(monthly_payment: Decimal, salary: Decimal) -> Result<Decimal> {
    if salary.is_zero() {
        return Err(LoanError::DivisionByZero("salary must not be zero"));
    }
    Ok((monthly_payment / salary).round_dp_with_strategy(4, RoundingStrategy::MidpointAwayFromZero))
}

/// Portion of the applicant's debt ceiling (`salary × ratio`) not yet committed.
pub fn available_capacity(
    base_salary: Decimal,
    ceiling_ratio: Decimal,
    current_monthly_debt: Decimal,
) -> Decimal {
    base_salary * ceiling_ratio - current_monthly_debt
}

fn round_cents(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven)
}

//! Paying in installments versus paying cash.
//!
//! Each installment is deflated by the inflation accumulated up to its month
//! to get its value in today's money. Paying in installments is worth it when
//! the sum of those real values is below the cash price.
//!
//! | Line                | Formula                                   |
//! |---------------------|-------------------------------------------|
//! | Installment         | financed price / n                        |
//! | Implied interest %  | (financed / cash − 1) × 100               |
//! | Annual inflation %  | ((1 + m)^12 − 1) × 100                    |
//! | Real value, month i | installment / (1 + m)^i                   |
//! | Savings, month i    | installment − real value                  |
//!
//! Running totals are kept at full precision and only rounded for display, so
//! that an interest-free plan with no inflation comes out exactly at the cash
//! price. Inflation or deflation steep enough to push the accumulated factor
//! out of the decimal range within the plan is rejected.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::calculations::common::{HUNDRED, percentage_of, round_half_up};

/// Months in a year, for the annualised inflation figure.
const MONTHS_PER_YEAR: u32 = 12;

/// Precision kept on the accumulated inflation factor.
const FACTOR_DP: u32 = 12;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InstallmentError {
    #[error("cash price must be positive, got {0}")]
    NonPositiveCashPrice(Decimal),

    #[error("financed price must be positive, got {0}")]
    NonPositiveFinancedPrice(Decimal),

    #[error("at least one installment is required")]
    NoInstallments,

    #[error("monthly inflation must be above -100%, got rate {0}")]
    InflationTooLow(Decimal),

    /// The accumulated inflation factor left the decimal range, or rounded
    /// to zero, at `month`.
    #[error("inflation factor out of range at month {month}")]
    FactorOutOfRange { month: u32 },

    #[error("{0} is out of range")]
    Overflow(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallmentInput {
    pub cash_price: Decimal,
    /// Total paid across all installments.
    pub financed_price: Decimal,
    /// Expected monthly inflation as a fraction (0.022 = 2.2%).
    pub monthly_inflation: Decimal,
    pub installments: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallmentRow {
    /// 1-based.
    pub month: u32,
    pub installment_amount: Decimal,
    pub real_value: Decimal,
    pub savings: Decimal,
    pub accumulated_savings: Decimal,
    pub accumulated_real_value: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recommendation {
    /// Installments cost less in real terms. `same_price` is set when the
    /// financed price equals the cash price.
    Installments { same_price: bool },
    Cash,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallmentComparison {
    pub installment_amount: Decimal,
    pub implied_interest_percentage: Decimal,
    pub annual_inflation_percentage: Decimal,
    pub rows: Vec<InstallmentRow>,
    pub total_real_value: Decimal,
    pub total_savings: Decimal,
    /// Financed price − cash price.
    pub difference: Decimal,
    pub recommendation: Recommendation,
}

impl InstallmentInput {
    /// Compares the plan against the cash price.
    ///
    /// ```
    /// use rust_decimal_macros::dec;
    /// use pricing_core::calculations::{InstallmentInput, Recommendation};
    ///
    /// let input = InstallmentInput {
    ///     cash_price: dec!(100000),
    ///     financed_price: dec!(100000),
    ///     monthly_inflation: dec!(0.022),
    ///     installments: 12,
    /// };
    ///
    /// let comparison = input.compare().unwrap();
    ///
    /// assert_eq!(comparison.total_real_value, dec!(87055.04));
    /// assert_eq!(
    ///     comparison.recommendation,
    ///     Recommendation::Installments { same_price: true }
    /// );
    /// ```
    pub fn compare(&self) -> Result<InstallmentComparison, InstallmentError> {
        self.validate()?;

        let growth = Decimal::ONE
            .checked_add(self.monthly_inflation)
            .ok_or(InstallmentError::Overflow("monthly inflation"))?;
        let installment = self.financed_price / Decimal::from(self.installments);

        let mut rows = Vec::with_capacity(self.installments as usize);
        let mut factor = Decimal::ONE;
        let mut accumulated_real = Decimal::ZERO;
        let mut accumulated_savings = Decimal::ZERO;

        for month in 1..=self.installments {
            factor = factor
                .checked_mul(growth)
                .map(|f| f.round_dp(FACTOR_DP))
                .filter(|f| !f.is_zero())
                .ok_or(InstallmentError::FactorOutOfRange { month })?;
            let real_value = installment
                .checked_div(factor)
                .ok_or(InstallmentError::FactorOutOfRange { month })?;
            let savings = installment - real_value;
            accumulated_real = accumulated_real
                .checked_add(real_value)
                .ok_or(InstallmentError::Overflow("accumulated real value"))?;
            accumulated_savings = accumulated_savings
                .checked_add(savings)
                .ok_or(InstallmentError::Overflow("accumulated savings"))?;

            rows.push(InstallmentRow {
                month,
                installment_amount: round_half_up(installment),
                real_value: round_half_up(real_value),
                savings: round_half_up(savings),
                accumulated_savings: round_half_up(accumulated_savings),
                accumulated_real_value: round_half_up(accumulated_real),
            });
        }

        let total_real_value = round_half_up(accumulated_real);
        let recommendation = if total_real_value < self.cash_price {
            Recommendation::Installments {
                same_price: self.financed_price == self.cash_price,
            }
        } else {
            Recommendation::Cash
        };

        debug!(
            installments = self.installments,
            total_real_value = %total_real_value,
            cash_price = %self.cash_price,
            ?recommendation,
            "installment plan compared"
        );

        let implied_interest_percentage =
            percentage_of(self.financed_price - self.cash_price, self.cash_price)
                .ok_or(InstallmentError::Overflow("implied interest"))?;
        let annual_inflation_percentage = annual_factor(growth)
            .and_then(|annual| (annual - Decimal::ONE).checked_mul(HUNDRED))
            .map(round_half_up)
            .ok_or(InstallmentError::Overflow("annual inflation"))?;

        Ok(InstallmentComparison {
            installment_amount: round_half_up(installment),
            implied_interest_percentage,
            annual_inflation_percentage,
            rows,
            total_real_value,
            total_savings: round_half_up(accumulated_savings),
            difference: self.financed_price - self.cash_price,
            recommendation,
        })
    }

    fn validate(&self) -> Result<(), InstallmentError> {
        if self.cash_price <= Decimal::ZERO {
            return Err(InstallmentError::NonPositiveCashPrice(self.cash_price));
        }
        if self.financed_price <= Decimal::ZERO {
            return Err(InstallmentError::NonPositiveFinancedPrice(self.financed_price));
        }
        if self.installments == 0 {
            return Err(InstallmentError::NoInstallments);
        }
        if self.monthly_inflation <= -Decimal::ONE {
            return Err(InstallmentError::InflationTooLow(self.monthly_inflation));
        }
        Ok(())
    }
}

/// `growth` compounded over a year; `None` past the decimal range.
fn annual_factor(growth: Decimal) -> Option<Decimal> {
    (0..MONTHS_PER_YEAR).try_fold(Decimal::ONE, |acc, _| acc.checked_mul(growth))
}

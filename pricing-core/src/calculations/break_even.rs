//! Break-even point for a mix of products sharing fixed costs.
//!
//! Products are weighted equally: the break-even volume is the total fixed
//! cost divided by the average contribution margin per unit, rounded up to a
//! whole unit, and revenue is that volume at the average selling price.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use pricing_core::calculations::{BreakEvenCalculator, FixedCost, Product};
//!
//! let fixed = [FixedCost::new("Alquiler", dec!(1000))];
//! let products = [Product::new("Café", dec!(3), dec!(10))];
//!
//! let result = BreakEvenCalculator::calculate(&fixed, &products).unwrap();
//!
//! assert_eq!(result.break_even_units, dec!(143));
//! assert_eq!(result.break_even_revenue, dec!(1430.00));
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::calculations::common::{HUNDRED, percentage_of, ratio_or_zero, round_half_up};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BreakEvenError {
    #[error("at least one product is required")]
    NoProducts,

    #[error("fixed cost '{description}' is negative: {amount}")]
    NegativeFixedCost { description: String, amount: Decimal },

    #[error("product '{0}' has a negative cost or price")]
    NegativeProductValue(String),

    /// Products do not contribute anything towards fixed costs on average.
    #[error("average contribution margin must be positive, got {0}")]
    NoPositiveContribution(Decimal),

    #[error("{0} is out of range")]
    Overflow(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedCost {
    pub description: String,
    pub amount: Decimal,
}

impl FixedCost {
    pub fn new(
        description: impl Into<String>,
        amount: Decimal,
    ) -> Self {
        Self {
            description: description.into(),
            amount,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub name: String,
    pub variable_cost: Decimal,
    pub selling_price: Decimal,
}

impl Product {
    pub fn new(
        name: impl Into<String>,
        variable_cost: Decimal,
        selling_price: Decimal,
    ) -> Self {
        Self {
            name: name.into(),
            variable_cost,
            selling_price,
        }
    }
}

/// Per-product contribution figures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductMargin {
    pub name: String,
    /// Selling price − variable cost.
    pub contribution_margin: Decimal,
    /// Contribution margin / selling price (0 when the price is 0).
    pub contribution_ratio: Decimal,
    pub gross_margin_percentage: Decimal,
}

impl ProductMargin {
    pub fn from_product(product: &Product) -> Result<Self, BreakEvenError> {
        let contribution_margin = product
            .selling_price
            .checked_sub(product.variable_cost)
            .ok_or(BreakEvenError::Overflow("contribution margin"))?;
        Ok(Self {
            name: product.name.clone(),
            contribution_margin,
            contribution_ratio: ratio_or_zero(contribution_margin, product.selling_price)
                .ok_or(BreakEvenError::Overflow("contribution ratio"))?,
            gross_margin_percentage: percentage_of(contribution_margin, product.selling_price)
                .ok_or(BreakEvenError::Overflow("gross margin"))?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakEvenResult {
    pub total_fixed_costs: Decimal,
    pub products: Vec<ProductMargin>,
    pub total_contribution_margin: Decimal,
    /// Mean of the per-product contribution ratios, as a percentage.
    pub average_contribution_percentage: Decimal,
    /// Whole units across all products.
    pub break_even_units: Decimal,
    pub break_even_revenue: Decimal,
    /// Contribution earned at the break-even revenue; covers the fixed costs.
    pub contribution_at_break_even: Decimal,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BreakEvenCalculator;

impl BreakEvenCalculator {
    pub fn calculate(
        fixed_costs: &[FixedCost],
        products: &[Product],
    ) -> Result<BreakEvenResult, BreakEvenError> {
        if products.is_empty() {
            return Err(BreakEvenError::NoProducts);
        }
        if let Some(cost) = fixed_costs.iter().find(|cost| cost.amount < Decimal::ZERO) {
            return Err(BreakEvenError::NegativeFixedCost {
                description: cost.description.clone(),
                amount: cost.amount,
            });
        }
        if let Some(product) = products
            .iter()
            .find(|p| p.variable_cost < Decimal::ZERO || p.selling_price < Decimal::ZERO)
        {
            return Err(BreakEvenError::NegativeProductValue(product.name.clone()));
        }

        let count = Decimal::from(products.len());
        let total_fixed_costs =
            checked_sum(fixed_costs.iter().map(|cost| cost.amount), "total fixed costs")?;
        let margins = products
            .iter()
            .map(ProductMargin::from_product)
            .collect::<Result<Vec<_>, _>>()?;

        let total_contribution_margin = checked_sum(
            margins.iter().map(|m| m.contribution_margin),
            "total contribution margin",
        )?;
        let average_contribution = total_contribution_margin / count;
        if average_contribution <= Decimal::ZERO {
            return Err(BreakEvenError::NoPositiveContribution(round_half_up(
                average_contribution,
            )));
        }

        let average_ratio =
            checked_sum(margins.iter().map(|m| m.contribution_ratio), "contribution ratio")? / count;
        let average_price =
            checked_sum(products.iter().map(|p| p.selling_price), "selling price")? / count;

        let break_even_units = total_fixed_costs
            .checked_div(average_contribution)
            .map(|units| units.ceil())
            .ok_or(BreakEvenError::Overflow("break-even units"))?;
        let break_even_revenue = break_even_units
            .checked_mul(average_price)
            .map(round_half_up)
            .ok_or(BreakEvenError::Overflow("break-even revenue"))?;
        let contribution_at_break_even = break_even_revenue
            .checked_mul(average_ratio)
            .map(round_half_up)
            .ok_or(BreakEvenError::Overflow("contribution at break-even"))?;

        let average_contribution_percentage = average_ratio
            .checked_mul(HUNDRED)
            .map(round_half_up)
            .ok_or(BreakEvenError::Overflow("average contribution percentage"))?;

        debug!(
            total_fixed_costs = %total_fixed_costs,
            units = %break_even_units,
            revenue = %break_even_revenue,
            "break-even point computed"
        );

        Ok(BreakEvenResult {
            total_fixed_costs,
            products: margins,
            total_contribution_margin,
            average_contribution_percentage,
            break_even_units,
            break_even_revenue,
            contribution_at_break_even,
        })
    }
}

fn checked_sum(
    mut values: impl Iterator<Item = Decimal>,
    what: &'static str,
) -> Result<Decimal, BreakEvenError> {
    values
        .try_fold(Decimal::ZERO, |total, value| total.checked_add(value))
        .ok_or(BreakEvenError::Overflow(what))
}

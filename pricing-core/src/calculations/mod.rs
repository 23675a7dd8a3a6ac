//! Calculators behind the pricing tools.
//!
//! The margin calculator is driven by [`PricingEngine`]; the cost breakdown,
//! break-even and installment calculators are independent of it and of each
//! other.

pub mod common;

mod break_even;
mod cost_breakdown;
mod installments;
mod pricing;

pub use break_even::{
    BreakEvenCalculator, BreakEvenError, BreakEvenResult, FixedCost, Product, ProductMargin,
};
pub use cost_breakdown::{CostBreakdown, CostBreakdownError, CostLine};
pub use installments::{
    InstallmentComparison, InstallmentError, InstallmentInput, InstallmentRow, Recommendation,
};
pub use pricing::{
    ChargeLine, IncomeStatement, IncomeStatementLine, PricingEngine, PricingError, PricingInput,
    PricingResult, StatementItem, VatPosition,
};

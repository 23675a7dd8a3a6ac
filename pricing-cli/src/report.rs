//! Plain-text reports. Every figure comes from the core calculators; these
//! types only lay them out.

use std::fmt;

use pricing_core::calculations::{
    BreakEvenResult, CostBreakdown, InstallmentComparison, PricingError, PricingResult,
    Recommendation, VatPosition,
};
use pricing_data::PerceptionTable;
use rust_decimal::Decimal;

use crate::config::DisplaySettings;
use crate::utils::{format_amount, format_currency, format_percent};

const LABEL_WIDTH: usize = 28;
const VALUE_WIDTH: usize = 18;

struct Fmt<'a>(&'a DisplaySettings);

impl Fmt<'_> {
    fn money(
        &self,
        value: Decimal,
    ) -> String {
        format_currency(value, &self.0.currency_symbol, &self.0.number_format())
    }

    fn percent(
        &self,
        value: Decimal,
    ) -> String {
        format_percent(value, &self.0.number_format())
    }
}

fn line(
    f: &mut fmt::Formatter<'_>,
    label: &str,
    value: &str,
) -> fmt::Result {
    writeln!(f, "{label:<LABEL_WIDTH$}{value:>VALUE_WIDTH$}")
}

// =============================================================================
// Margin
// =============================================================================

pub struct MarginReport<'a> {
    pub display: &'a DisplaySettings,
    pub breakdown: Option<&'a CostBreakdown>,
    /// `None` when there was nothing to price.
    pub result: Option<&'a PricingResult>,
    pub statement: bool,
}

impl fmt::Display for MarginReport<'_> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let fm = Fmt(self.display);

        if let Some(breakdown) = self.breakdown {
            writeln!(f, "Cost breakdown")?;
            for cost in &breakdown.lines {
                writeln!(
                    f,
                    "  {:<26}{:>18}  (VAT {})",
                    cost.name,
                    fm.money(cost.net_amount),
                    fm.money(cost.vat_amount)
                )?;
            }
            line(f, "  Total net", &fm.money(breakdown.total_net))?;
            line(f, "  Total VAT", &fm.money(breakdown.total_vat))?;
            line(f, "  Total", &fm.money(breakdown.total_gross))?;
            writeln!(f)?;
        }

        let Some(result) = self.result else {
            return writeln!(f, "Nothing to price: enter a cost above zero and a markup or margin.");
        };

        line(f, "Cost", &fm.money(result.cost))?;
        if !result.purchase_vat.is_zero() {
            line(f, "Cost without VAT", &fm.money(result.cost_without_vat))?;
            line(f, "Purchase VAT", &fm.money(result.purchase_vat))?;
        }
        line(f, "Net amount", &fm.money(result.net_amount))?;
        if !result.sale_vat.is_zero() {
            line(f, "Sale VAT", &fm.money(result.sale_vat))?;
        }
        line(f, "Sale price", &fm.money(result.sale_price))?;

        for charge in &result.charges {
            line(
                f,
                &format!("{} ({})", charge.name, fm.percent(charge.rate * Decimal::ONE_HUNDRED)),
                &fm.money(charge.amount),
            )?;
        }
        if !result.discount_amount.is_zero() {
            line(f, "Discount", &fm.money(result.discount_amount))?;
            line(f, "Sale price after discount", &fm.money(result.sale_price_after_discount))?;
        }

        let position = match result.vat_position() {
            VatPosition::Pay => "VAT to pay",
            VatPosition::Receive => "VAT in favour",
        };
        line(f, position, &fm.money(result.vat_balance.abs()))?;
        line(f, "Gross profit", &fm.money(result.gross_profit))?;
        line(f, "Net profit", &fm.money(result.net_profit))?;
        line(f, "Net margin", &fm.percent(result.net_margin_percentage))?;
        line(f, "Markup on cost", &fm.percent(result.net_markup_percentage))?;
        line(
            f,
            "Maximum discount",
            &format!(
                "{} ({})",
                fm.money(result.max_discount),
                fm.percent(result.max_discount_percentage)
            ),
        )?;

        if self.statement {
            writeln!(f)?;
            writeln!(f, "Income statement")?;
            match result.income_statement() {
                Ok(statement) => {
                    for item in statement.lines {
                        writeln!(
                            f,
                            "  {:<26}{:>18}{:>10}",
                            item.item.label(),
                            fm.money(item.amount),
                            fm.percent(item.share_of_sale)
                        )?;
                    }
                }
                Err(err) => writeln!(f, "  unavailable: {err}")?,
            }
        }
        Ok(())
    }
}

// =============================================================================
// Batch
// =============================================================================

/// Outcome of one batch row.
pub type ScenarioOutcome = Result<Option<PricingResult>, PricingError>;

pub struct BatchReport<'a> {
    pub display: &'a DisplaySettings,
    pub rows: &'a [(String, ScenarioOutcome)],
}

impl fmt::Display for BatchReport<'_> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let fm = Fmt(self.display);
        writeln!(
            f,
            "{:<24}{:>18}{:>18}{:>10}{:>18}",
            "Scenario", "Sale price", "Net profit", "Margin", "Max discount"
        )?;
        for (name, outcome) in self.rows {
            match outcome {
                Ok(Some(result)) => writeln!(
                    f,
                    "{:<24}{:>18}{:>18}{:>10}{:>18}",
                    name,
                    fm.money(result.sale_price_after_discount),
                    fm.money(result.net_profit),
                    fm.percent(result.net_margin_percentage),
                    fm.money(result.max_discount)
                )?,
                Ok(None) => writeln!(f, "{name:<24}nothing to price")?,
                Err(err) => writeln!(f, "{name:<24}error: {err}")?,
            }
        }
        Ok(())
    }
}

// =============================================================================
// Break-even
// =============================================================================

pub struct BreakEvenReport<'a> {
    pub display: &'a DisplaySettings,
    pub result: &'a BreakEvenResult,
}

impl fmt::Display for BreakEvenReport<'_> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let fm = Fmt(self.display);
        let result = self.result;

        writeln!(f, "{:<24}{:>18}{:>10}", "Product", "Contribution", "Margin")?;
        for product in &result.products {
            writeln!(
                f,
                "{:<24}{:>18}{:>10}",
                product.name,
                fm.money(product.contribution_margin),
                fm.percent(product.gross_margin_percentage)
            )?;
        }
        writeln!(f)?;
        line(f, "Total fixed costs", &fm.money(result.total_fixed_costs))?;
        line(f, "Average contribution", &fm.percent(result.average_contribution_percentage))?;
        line(
            f,
            "Break-even units",
            &format_amount(result.break_even_units, &self.display.number_format()),
        )?;
        line(f, "Break-even revenue", &fm.money(result.break_even_revenue))?;
        line(f, "Contribution at break-even", &fm.money(result.contribution_at_break_even))
    }
}

// =============================================================================
// Installments
// =============================================================================

pub struct InstallmentReport<'a> {
    pub display: &'a DisplaySettings,
    pub comparison: &'a InstallmentComparison,
    pub schedule: bool,
}

impl fmt::Display for InstallmentReport<'_> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let fm = Fmt(self.display);
        let c = self.comparison;

        line(f, "Installment", &fm.money(c.installment_amount))?;
        line(f, "Implied interest", &fm.percent(c.implied_interest_percentage))?;
        line(f, "Annual inflation", &fm.percent(c.annual_inflation_percentage))?;
        line(f, "Difference vs cash", &fm.money(c.difference))?;
        line(f, "Total in today's money", &fm.money(c.total_real_value))?;
        line(f, "Inflation savings", &fm.money(c.total_savings))?;

        let verdict = match c.recommendation {
            Recommendation::Installments { same_price: true } => {
                "Pay in installments: same price, and inflation works in your favour."
            }
            Recommendation::Installments { same_price: false } => {
                "Pay in installments: inflation outweighs the surcharge."
            }
            Recommendation::Cash => "Pay cash: the installments cost more in real terms.",
        };
        writeln!(f)?;
        writeln!(f, "{verdict}")?;

        if self.schedule {
            writeln!(f)?;
            writeln!(
                f,
                "{:>5}{:>18}{:>18}{:>18}{:>18}",
                "Month", "Installment", "Real value", "Savings", "Accum. savings"
            )?;
            for row in &c.rows {
                writeln!(
                    f,
                    "{:>5}{:>18}{:>18}{:>18}{:>18}",
                    row.month,
                    fm.money(row.installment_amount),
                    fm.money(row.real_value),
                    fm.money(row.savings),
                    fm.money(row.accumulated_savings)
                )?;
            }
        }
        Ok(())
    }
}

// =============================================================================
// Rates
// =============================================================================

pub struct RatesReport<'a> {
    pub display: &'a DisplaySettings,
    pub table: &'a PerceptionTable,
}

impl fmt::Display for RatesReport<'_> {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let fm = Fmt(self.display);
        for entry in self.table.entries() {
            writeln!(
                f,
                "{:<32}{:>10}",
                entry.jurisdiction,
                fm.percent(entry.rate * Decimal::ONE_HUNDRED)
            )?;
        }
        Ok(())
    }
}

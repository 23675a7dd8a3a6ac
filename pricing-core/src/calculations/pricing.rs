//! Price, tax and profit calculation for the margin calculator.
//!
//! The engine turns a cost and a margin into a sale price and walks it through
//! VAT, perceptions, internal taxes, the payment-processor commission and an
//! optional discount, ending with the net profit and the largest discount the
//! price can take before the sale stops paying for itself.
//!
//! # Calculation Steps
//!
//! | Step | Description |
//! |------|-------------|
//! | 1    | Cost without VAT (grossed down when the cost includes purchase VAT) |
//! | 2    | Net taxable amount: markup on cost, or margin on sale |
//! | 3    | Sale price and sale VAT, depending on who bears the VAT |
//! | 4    | Perceptions and internal taxes on the net amount, processor fee on the sale price |
//! | 5    | Discount and sale price after discount |
//! | 6    | VAT balance: purchase VAT − sale VAT |
//! | 7    | Gross profit: sale price after discount − cost as entered |
//! | 8    | Net profit: gross profit + VAT balance − taxes |
//! | 9    | Net margin: net profit / sale price after discount |
//! | 10   | Maximum discount before the net profit reaches zero |
//!
//! Every monetary line is rounded half-up to cents before it feeds the next
//! line.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use pricing_core::MarginSpec;
//! use pricing_core::calculations::{PricingEngine, PricingInput};
//!
//! let input = PricingInput::new(dec!(1000), MarginSpec::Markup(dec!(0.30)));
//! let result = PricingEngine::calculate(&input).unwrap().unwrap();
//!
//! assert_eq!(result.sale_price, dec!(1300.00));
//! assert_eq!(result.net_profit, dec!(300.00));
//! assert_eq!(result.net_margin_percentage, dec!(23.08));
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::calculations::common::{max, percentage_of, round_half_up};
use crate::{AdditionalCharge, ChargeKind, DiscountSpec, MarginSpec, VatBearer, VatSpec};

/// Errors that reject a pricing input.
///
/// Missing input (no cost, no margin) is not an error; see
/// [`PricingEngine::calculate`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PricingError {
    /// A margin on sale of 100% or more has no finite sale price.
    #[error("margin on sale must be below 100%, got rate {0}")]
    MarginOnSaleTooHigh(Decimal),

    /// Markups and margins cannot be negative.
    #[error("{field} must not be negative, got {rate}")]
    NegativeMargin { field: &'static str, rate: Decimal },

    /// A VAT, perception, internal-tax or processor rate outside `[0, 1)`.
    #[error("{field} rate must be between 0 and 1, got {rate}")]
    InvalidRate { field: String, rate: Decimal },

    /// A percentage discount outside `[0, 1)`.
    #[error("discount rate must be between 0 and 1, got {0}")]
    InvalidDiscountRate(Decimal),

    /// A fixed discount below zero.
    #[error("discount amount must be non-negative, got {0}")]
    NegativeDiscount(Decimal),

    /// A fixed discount larger than the price it is taken from.
    #[error("discount {discount} exceeds the sale price {sale_price}")]
    DiscountExceedsSalePrice { discount: Decimal, sale_price: Decimal },

    /// An amount or percentage beyond the decimal range.
    #[error("{0} is out of range")]
    Overflow(&'static str),
}

/// Everything one pricing computation needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingInput {
    /// Cost as entered, with or without purchase VAT (see [`VatSpec::cost_includes_vat`]).
    pub cost: Decimal,
    pub margin: MarginSpec,
    pub vat: VatSpec,
    /// Jurisdiction perceptions, in entry order.
    pub perceptions: Vec<AdditionalCharge>,
    /// Municipal, provincial and other internal taxes, in entry order.
    pub internal_taxes: Vec<AdditionalCharge>,
    /// Payment-processor commission as a fraction of the sale price.
    pub processor_rate: Option<Decimal>,
    pub discount: Option<DiscountSpec>,
}

impl PricingInput {
    /// An input with no VAT, charges or discount.
    pub fn new(
        cost: Decimal,
        margin: MarginSpec,
    ) -> Self {
        Self {
            cost,
            margin,
            vat: VatSpec::default(),
            perceptions: Vec::new(),
            internal_taxes: Vec::new(),
            processor_rate: None,
            discount: None,
        }
    }

    /// Sum of every rate that scales with the sale: charges plus processor fee.
    pub fn variable_rate(&self) -> Decimal {
        self.perceptions
            .iter()
            .chain(self.internal_taxes.iter())
            .map(|charge| charge.rate)
            .sum::<Decimal>()
            + self.processor_rate.unwrap_or_default()
    }
}

/// One computed charge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChargeLine {
    pub name: String,
    pub kind: ChargeKind,
    pub rate: Decimal,
    pub amount: Decimal,
}

/// Whether the VAT balance is owed to or recoverable from the tax authority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VatPosition {
    Pay,
    Receive,
}

/// Priced breakdown of a [`PricingInput`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingResult {
    /// Cost as entered.
    pub cost: Decimal,
    pub cost_without_vat: Decimal,
    pub purchase_vat: Decimal,

    /// Net taxable amount: the price before sale VAT.
    pub net_amount: Decimal,
    /// Gross sale price, before discount.
    pub sale_price: Decimal,
    pub sale_vat: Decimal,
    /// Purchase VAT − sale VAT. Negative means VAT is owed.
    pub vat_balance: Decimal,

    /// Perceptions, internal taxes and processor fee, in that order.
    pub charges: Vec<ChargeLine>,
    pub perceptions_total: Decimal,
    pub internal_taxes_total: Decimal,
    pub processor_fee: Decimal,
    /// Perceptions + internal taxes + processor fee.
    pub total_taxes: Decimal,

    pub discount_amount: Decimal,
    pub sale_price_after_discount: Decimal,

    /// Sale price after discount − cost as entered.
    pub gross_profit: Decimal,
    pub net_profit: Decimal,
    /// Net profit as a percentage of the sale price after discount.
    pub net_margin_percentage: Decimal,
    /// Net profit as a percentage of the cost as entered.
    pub net_markup_percentage: Decimal,

    /// Largest discount that keeps the net profit at or above zero.
    pub max_discount: Decimal,
    /// [`Self::max_discount`] as a percentage of the sale price.
    pub max_discount_percentage: Decimal,
}

impl PricingResult {
    pub fn vat_position(&self) -> VatPosition {
        if self.vat_balance < Decimal::ZERO {
            VatPosition::Pay
        } else {
            VatPosition::Receive
        }
    }

    /// Income-statement view of the result, shares relative to the sale
    /// price after discount.
    ///
    /// Sale price and discount lines appear only when a discount was taken;
    /// VAT, processor, internal-tax and perception lines only when non-zero.
    /// Fails when a share does not fit in a decimal, which only happens when
    /// a fixed discount leaves a few cents of a very large price.
    pub fn income_statement(&self) -> Result<IncomeStatement, PricingError> {
        let base = self.sale_price_after_discount;
        let mut lines = Vec::new();
        let mut push = |item: StatementItem, amount: Decimal| -> Result<(), PricingError> {
            lines.push(IncomeStatementLine {
                item,
                amount,
                share_of_sale: percentage_of(amount, base)
                    .ok_or(PricingError::Overflow("income statement share"))?,
            });
            Ok(())
        };

        if !self.discount_amount.is_zero() {
            push(StatementItem::SalePrice, self.sale_price)?;
            push(StatementItem::Discount, self.discount_amount)?;
        }
        push(StatementItem::NetSales, base)?;
        push(StatementItem::Cost, self.cost)?;
        push(StatementItem::GrossMargin, self.gross_profit)?;
        if !self.vat_balance.is_zero() {
            push(StatementItem::VatBalance, self.vat_balance.abs())?;
        }
        if !self.processor_fee.is_zero() {
            push(StatementItem::ProcessorFee, self.processor_fee)?;
        }
        if !self.internal_taxes_total.is_zero() {
            push(StatementItem::InternalTaxes, self.internal_taxes_total)?;
        }
        if !self.perceptions_total.is_zero() {
            push(StatementItem::Perceptions, self.perceptions_total)?;
        }
        push(StatementItem::NetProfit, self.net_profit)?;

        Ok(IncomeStatement { lines })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatementItem {
    SalePrice,
    Discount,
    NetSales,
    Cost,
    GrossMargin,
    VatBalance,
    ProcessorFee,
    InternalTaxes,
    Perceptions,
    NetProfit,
}

impl StatementItem {
    pub fn label(&self) -> &'static str {
        match self {
            Self::SalePrice => "Sale price",
            Self::Discount => "Discount",
            Self::NetSales => "Net sales",
            Self::Cost => "Cost",
            Self::GrossMargin => "Gross margin",
            Self::VatBalance => "VAT balance",
            Self::ProcessorFee => "Processor fee",
            Self::InternalTaxes => "Internal taxes",
            Self::Perceptions => "Perceptions",
            Self::NetProfit => "Net profit",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomeStatementLine {
    pub item: StatementItem,
    pub amount: Decimal,
    /// Percentage of the sale price after discount.
    pub share_of_sale: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomeStatement {
    pub lines: Vec<IncomeStatementLine>,
}

impl IncomeStatement {
    pub fn line(
        &self,
        item: StatementItem,
    ) -> Option<&IncomeStatementLine> {
        self.lines.iter().find(|line| line.item == item)
    }
}

/// Stateless pricing calculator.
#[derive(Debug, Clone, Copy, Default)]
pub struct PricingEngine;

impl PricingEngine {
    /// Prices `input`.
    ///
    /// Returns `Ok(None)` when there is nothing to price yet: a cost of zero
    /// or less, or a zero markup/margin. Inputs that can never be priced
    /// (margin on sale of 100% or more, rates outside `[0, 1)`, oversized
    /// discounts) are rejected with a [`PricingError`], as are amounts too
    /// large for the decimal range.
    ///
    /// # Example: margin on sale
    ///
    /// ```
    /// use rust_decimal_macros::dec;
    /// use pricing_core::MarginSpec;
    /// use pricing_core::calculations::{PricingEngine, PricingError, PricingInput};
    ///
    /// let input = PricingInput::new(dec!(750), MarginSpec::MarginOnSale(dec!(0.25)));
    /// let result = PricingEngine::calculate(&input).unwrap().unwrap();
    /// assert_eq!(result.sale_price, dec!(1000.00));
    ///
    /// let too_high = PricingInput::new(dec!(750), MarginSpec::MarginOnSale(dec!(1)));
    /// assert_eq!(
    ///     PricingEngine::calculate(&too_high),
    ///     Err(PricingError::MarginOnSaleTooHigh(dec!(1)))
    /// );
    /// ```
    pub fn calculate(input: &PricingInput) -> Result<Option<PricingResult>, PricingError> {
        if input.cost <= Decimal::ZERO || input.margin.is_zero() {
            debug!(
                cost = %input.cost,
                margin = %input.margin.rate(),
                "cost or margin missing; nothing to price"
            );
            return Ok(None);
        }
        Self::validate(input)?;

        let vat = &input.vat;

        // Step 1
        let (cost_without_vat, purchase_vat) = Self::cost_without_vat(input.cost, vat);

        // Step 2
        let priced = Self::net_from_margin(cost_without_vat, input.margin)?;

        // Step 3
        let (net_amount, sale_price, sale_vat) = Self::apply_sale_vat(priced, vat)?;

        // Step 4
        let mut charges = Vec::with_capacity(input.perceptions.len() + input.internal_taxes.len() + 1);
        let perceptions_total =
            Self::push_charges(&mut charges, &input.perceptions, ChargeKind::Perception, net_amount)?;
        let internal_taxes_total = Self::push_charges(
            &mut charges,
            &input.internal_taxes,
            ChargeKind::InternalTax,
            net_amount,
        )?;
        let processor_fee = match input.processor_rate {
            Some(rate) if !rate.is_zero() => {
                let fee = round_half_up(sale_price * rate);
                charges.push(ChargeLine {
                    name: "Payment processor".to_string(),
                    kind: ChargeKind::ProcessorFee,
                    rate,
                    amount: fee,
                });
                fee
            }
            _ => Decimal::ZERO,
        };
        let total_taxes = perceptions_total
            .checked_add(internal_taxes_total)
            .and_then(|sum| sum.checked_add(processor_fee))
            .ok_or(PricingError::Overflow("total taxes"))?;

        // Step 5
        let discount_amount = Self::discount_amount(input.discount, sale_price)?;
        let sale_price_after_discount = sale_price - discount_amount;

        // Steps 6-9
        let vat_balance = purchase_vat - sale_vat;
        let gross_profit = sale_price_after_discount - input.cost;
        let net_profit = gross_profit
            .checked_add(vat_balance)
            .and_then(|sum| sum.checked_sub(total_taxes))
            .ok_or(PricingError::Overflow("net profit"))?;
        if net_profit < Decimal::ZERO {
            warn!(
                net_profit = %net_profit,
                sale_price = %sale_price_after_discount,
                "sale price does not cover cost, VAT and taxes"
            );
        }
        let net_margin_percentage = percentage_of(net_profit, sale_price_after_discount)
            .ok_or(PricingError::Overflow("net margin"))?;
        let net_markup_percentage =
            percentage_of(net_profit, input.cost).ok_or(PricingError::Overflow("markup on cost"))?;

        // Step 10
        let max_discount =
            Self::max_discount(input.cost, vat_balance, input.variable_rate(), sale_price)?;
        let max_discount_percentage = percentage_of(max_discount, sale_price)
            .ok_or(PricingError::Overflow("maximum discount"))?;

        Ok(Some(PricingResult {
            cost: input.cost,
            cost_without_vat,
            purchase_vat,
            net_amount,
            sale_price,
            sale_vat,
            vat_balance,
            charges,
            perceptions_total,
            internal_taxes_total,
            processor_fee,
            total_taxes,
            discount_amount,
            sale_price_after_discount,
            gross_profit,
            net_profit,
            net_margin_percentage,
            net_markup_percentage,
            max_discount,
            max_discount_percentage,
        }))
    }

    fn validate(input: &PricingInput) -> Result<(), PricingError> {
        match input.margin {
            MarginSpec::Markup(rate) if rate < Decimal::ZERO => {
                return Err(PricingError::NegativeMargin {
                    field: "markup",
                    rate,
                });
            }
            MarginSpec::MarginOnSale(rate) if rate < Decimal::ZERO => {
                return Err(PricingError::NegativeMargin {
                    field: "margin on sale",
                    rate,
                });
            }
            MarginSpec::MarginOnSale(rate) if rate >= Decimal::ONE => {
                return Err(PricingError::MarginOnSaleTooHigh(rate));
            }
            _ => {}
        }

        if input.vat.cost_includes_vat {
            check_rate("purchase VAT", input.vat.purchase_rate)?;
        }
        if input.vat.sell_with_vat {
            check_rate("sale VAT", input.vat.sale_rate)?;
        }
        for charge in input.perceptions.iter().chain(input.internal_taxes.iter()) {
            check_rate(&charge.name, charge.rate)?;
        }
        if let Some(rate) = input.processor_rate {
            check_rate("processor", rate)?;
        }
        match input.discount {
            Some(DiscountSpec::Percentage(rate)) if rate < Decimal::ZERO || rate >= Decimal::ONE => {
                Err(PricingError::InvalidDiscountRate(rate))
            }
            Some(DiscountSpec::Fixed(amount)) if amount < Decimal::ZERO => {
                Err(PricingError::NegativeDiscount(amount))
            }
            _ => Ok(()),
        }
    }

    /// Step 1: strips purchase VAT out of the cost when the cost includes it.
    fn cost_without_vat(
        cost: Decimal,
        vat: &VatSpec,
    ) -> (Decimal, Decimal) {
        if !vat.cost_includes_vat {
            return (cost, Decimal::ZERO);
        }
        let without = round_half_up(cost / (Decimal::ONE + vat.purchase_rate));
        (without, cost - without)
    }

    /// Step 2: net taxable amount from the markup or margin on sale.
    fn net_from_margin(
        cost_without_vat: Decimal,
        margin: MarginSpec,
    ) -> Result<Decimal, PricingError> {
        let priced = match margin {
            MarginSpec::Markup(rate) => Decimal::ONE
                .checked_add(rate)
                .and_then(|factor| cost_without_vat.checked_mul(factor)),
            MarginSpec::MarginOnSale(rate) => cost_without_vat.checked_div(Decimal::ONE - rate),
        };
        priced
            .map(round_half_up)
            .ok_or(PricingError::Overflow("net amount"))
    }

    /// Step 3: returns `(net_amount, sale_price, sale_vat)`.
    ///
    /// When the business absorbs VAT the priced amount becomes the sale price
    /// and the net amount is recovered from it, so `sale_price = net + VAT`
    /// holds to the cent in both policies.
    fn apply_sale_vat(
        priced: Decimal,
        vat: &VatSpec,
    ) -> Result<(Decimal, Decimal, Decimal), PricingError> {
        if !vat.sell_with_vat {
            return Ok((priced, priced, Decimal::ZERO));
        }
        match vat.bearer {
            VatBearer::CustomerPays => {
                let sale_vat = round_half_up(priced * vat.sale_rate);
                let sale_price = priced
                    .checked_add(sale_vat)
                    .ok_or(PricingError::Overflow("sale price"))?;
                Ok((priced, sale_price, sale_vat))
            }
            VatBearer::BusinessAbsorbs => {
                let net = round_half_up(priced / (Decimal::ONE + vat.sale_rate));
                Ok((net, priced, priced - net))
            }
        }
    }

    /// Step 4: one line per charge on the net amount; returns their total.
    fn push_charges(
        lines: &mut Vec<ChargeLine>,
        charges: &[AdditionalCharge],
        kind: ChargeKind,
        net_amount: Decimal,
    ) -> Result<Decimal, PricingError> {
        charges.iter().try_fold(Decimal::ZERO, |total, charge| {
            let amount = round_half_up(net_amount * charge.rate);
            lines.push(ChargeLine {
                name: charge.name.clone(),
                kind,
                rate: charge.rate,
                amount,
            });
            total
                .checked_add(amount)
                .ok_or(PricingError::Overflow("additional charges"))
        })
    }

    /// Step 5.
    fn discount_amount(
        discount: Option<DiscountSpec>,
        sale_price: Decimal,
    ) -> Result<Decimal, PricingError> {
        match discount {
            None => Ok(Decimal::ZERO),
            Some(DiscountSpec::Percentage(rate)) => Ok(round_half_up(sale_price * rate)),
            Some(DiscountSpec::Fixed(amount)) if amount > sale_price => {
                Err(PricingError::DiscountExceedsSalePrice {
                    discount: amount,
                    sale_price,
                })
            }
            Some(DiscountSpec::Fixed(amount)) => Ok(amount),
        }
    }

    /// Step 10: sale price minus `(cost + VAT balance) / (1 − Σ variable
    /// rates)`, floored at zero.
    fn max_discount(
        cost: Decimal,
        vat_balance: Decimal,
        variable_rate: Decimal,
        sale_price: Decimal,
    ) -> Result<Decimal, PricingError> {
        if variable_rate >= Decimal::ONE {
            warn!(
                variable_rate = %variable_rate,
                "variable rates consume the whole sale; no discount is possible"
            );
            return Ok(Decimal::ZERO);
        }
        let break_even = cost
            .checked_add(vat_balance)
            .and_then(|covered| covered.checked_div(Decimal::ONE - variable_rate))
            .map(round_half_up)
            .ok_or(PricingError::Overflow("maximum discount"))?;
        let headroom = sale_price
            .checked_sub(break_even)
            .ok_or(PricingError::Overflow("maximum discount"))?;
        if headroom < Decimal::ZERO {
            warn!(
                sale_price = %sale_price,
                break_even = %break_even,
                "sale price is below break-even; maximum discount floored at zero"
            );
        }
        Ok(max(headroom, Decimal::ZERO))
    }
}

fn check_rate(
    field: &str,
    rate: Decimal,
) -> Result<(), PricingError> {
    if rate < Decimal::ZERO || rate >= Decimal::ONE {
        return Err(PricingError::InvalidRate {
            field: field.to_string(),
            rate,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;
    use tracing_subscriber::fmt::format::FmtSpan;

    use super::*;

    fn markup(
        cost: Decimal,
        rate: Decimal,
    ) -> PricingInput {
        PricingInput::new(cost, MarginSpec::Markup(rate))
    }

    fn price(input: &PricingInput) -> PricingResult {
        PricingEngine::calculate(input)
            .expect("input should be valid")
            .expect("input should produce a result")
    }

    /// Cost 1000, 50% markup, 3% perception, 1% internal tax, 5% processor, 10% off.
    fn loaded_input() -> PricingInput {
        PricingInput {
            perceptions: vec![AdditionalCharge::new("IIBB - CÓRDOBA", dec!(0.03))],
            internal_taxes: vec![AdditionalCharge::new("TASAS MUNICIPALES", dec!(0.01))],
            processor_rate: Some(dec!(0.05)),
            discount: Some(DiscountSpec::Percentage(dec!(0.10))),
            ..markup(dec!(1000), dec!(0.50))
        }
    }

    fn init_test_tracing() -> tracing::subscriber::DefaultGuard {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_span_events(FmtSpan::NONE)
            .with_test_writer()
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    // =========================================================================
    // Empty input
    // =========================================================================

    #[test]
    fn zero_cost_yields_no_result() {
        let result = PricingEngine::calculate(&markup(dec!(0), dec!(0.30)));

        assert_eq!(result, Ok(None));
    }

    #[test]
    fn negative_cost_yields_no_result() {
        let result = PricingEngine::calculate(&markup(dec!(-10), dec!(0.30)));

        assert_eq!(result, Ok(None));
    }

    #[test]
    fn zero_margin_yields_no_result() {
        let result = PricingEngine::calculate(&markup(dec!(1000), dec!(0)));

        assert_eq!(result, Ok(None));
    }

    // =========================================================================
    // Validation
    // =========================================================================

    #[test]
    fn margin_on_sale_of_one_hundred_percent_is_rejected() {
        let input = PricingInput::new(dec!(1000), MarginSpec::MarginOnSale(dec!(1)));

        let result = PricingEngine::calculate(&input);

        assert_eq!(result, Err(PricingError::MarginOnSaleTooHigh(dec!(1))));
    }

    #[test]
    fn margin_on_sale_above_one_hundred_percent_is_rejected() {
        let input = PricingInput::new(dec!(1000), MarginSpec::MarginOnSale(dec!(1.5)));

        let result = PricingEngine::calculate(&input);

        assert_eq!(result, Err(PricingError::MarginOnSaleTooHigh(dec!(1.5))));
    }

    #[test]
    fn margin_on_sale_error_message_names_the_rate() {
        let err = PricingError::MarginOnSaleTooHigh(dec!(1.5));

        assert_eq!(err.to_string(), "margin on sale must be below 100%, got rate 1.5");
    }

    #[test]
    fn negative_markup_is_rejected() {
        let result = PricingEngine::calculate(&markup(dec!(1000), dec!(-0.1)));

        assert_eq!(
            result,
            Err(PricingError::NegativeMargin {
                field: "markup",
                rate: dec!(-0.1)
            })
        );
    }

    #[test]
    fn charge_rate_of_one_is_rejected() {
        let input = PricingInput {
            perceptions: vec![AdditionalCharge::new("IIBB - SALTA", dec!(1))],
            ..markup(dec!(1000), dec!(0.30))
        };

        let result = PricingEngine::calculate(&input);

        assert_eq!(
            result,
            Err(PricingError::InvalidRate {
                field: "IIBB - SALTA".to_string(),
                rate: dec!(1)
            })
        );
    }

    #[test]
    fn unused_vat_rates_are_not_validated() {
        let input = PricingInput {
            vat: VatSpec {
                purchase_rate: dec!(5),
                sale_rate: dec!(5),
                ..VatSpec::default()
            },
            ..markup(dec!(1000), dec!(0.30))
        };

        assert!(PricingEngine::calculate(&input).is_ok());
    }

    #[test]
    fn percentage_discount_of_one_hundred_percent_is_rejected() {
        let input = PricingInput {
            discount: Some(DiscountSpec::Percentage(dec!(1))),
            ..markup(dec!(1000), dec!(0.30))
        };

        let result = PricingEngine::calculate(&input);

        assert_eq!(result, Err(PricingError::InvalidDiscountRate(dec!(1))));
    }

    #[test]
    fn negative_fixed_discount_is_rejected() {
        let input = PricingInput {
            discount: Some(DiscountSpec::Fixed(dec!(-5))),
            ..markup(dec!(1000), dec!(0.30))
        };

        let result = PricingEngine::calculate(&input);

        assert_eq!(result, Err(PricingError::NegativeDiscount(dec!(-5))));
    }

    #[test]
    fn fixed_discount_above_sale_price_is_rejected() {
        let input = PricingInput {
            discount: Some(DiscountSpec::Fixed(dec!(2000))),
            ..markup(dec!(1000), dec!(0.30))
        };

        let result = PricingEngine::calculate(&input);

        assert_eq!(
            result,
            Err(PricingError::DiscountExceedsSalePrice {
                discount: dec!(2000),
                sale_price: dec!(1300.00)
            })
        );
    }

    // =========================================================================
    // Margin
    // =========================================================================

    #[test]
    fn markup_without_vat_or_charges() {
        let result = price(&markup(dec!(1000), dec!(0.30)));

        assert_eq!(result.net_amount, dec!(1300.00));
        assert_eq!(result.sale_price, dec!(1300.00));
        assert_eq!(result.gross_profit, dec!(300.00));
        assert_eq!(result.net_profit, dec!(300.00));
        assert_eq!(result.net_margin_percentage, dec!(23.08));
        assert_eq!(result.net_markup_percentage, dec!(30.00));
        assert_eq!(result.vat_balance, dec!(0));
        assert_eq!(result.total_taxes, dec!(0));
        assert!(result.charges.is_empty());
    }

    #[test]
    fn markup_sale_price_matches_formula_across_inputs() {
        for cost in [dec!(1), dec!(99.99), dec!(1000), dec!(123456.78)] {
            for rate in [dec!(0.01), dec!(0.30), dec!(1.5)] {
                let result = price(&markup(cost, rate));

                assert_eq!(
                    result.sale_price,
                    round_half_up(cost * (Decimal::ONE + rate)),
                    "cost {cost}, markup {rate}"
                );
                assert_eq!(result.net_profit, result.sale_price - cost);
            }
        }
    }

    #[test]
    fn margin_on_sale_recovers_the_requested_margin() {
        let input = PricingInput::new(dec!(1000), MarginSpec::MarginOnSale(dec!(0.30)));

        let result = price(&input);

        assert_eq!(result.sale_price, dec!(1428.57));
        assert_eq!(result.net_profit, dec!(428.57));
        assert_eq!(result.net_margin_percentage, dec!(30.00));
    }

    #[test]
    fn negative_margin_on_sale_is_rejected() {
        let input = PricingInput::new(dec!(1000), MarginSpec::MarginOnSale(dec!(-0.2)));

        let result = PricingEngine::calculate(&input);

        assert_eq!(
            result,
            Err(PricingError::NegativeMargin {
                field: "margin on sale",
                rate: dec!(-0.2)
            })
        );
    }

    // =========================================================================
    // VAT
    // =========================================================================

    #[test]
    fn cost_including_vat_is_grossed_down() {
        let input = PricingInput {
            vat: VatSpec {
                cost_includes_vat: true,
                ..VatSpec::default()
            },
            ..markup(dec!(1210), dec!(0.30))
        };

        let result = price(&input);

        assert_eq!(result.cost_without_vat, dec!(1000.00));
        assert_eq!(result.purchase_vat, dec!(210.00));
        assert_eq!(result.sale_price, dec!(1300.00));
        assert_eq!(result.gross_profit, dec!(90.00));
        assert_eq!(result.vat_balance, dec!(210.00));
        assert_eq!(result.net_profit, dec!(300.00));
        assert_eq!(result.vat_position(), VatPosition::Receive);
    }

    #[test]
    fn purchase_vat_round_trip_stays_within_a_cent() {
        for (cost, rate) in [
            (dec!(999.99), dec!(0.21)),
            (dec!(100), dec!(0.105)),
            (dec!(0.07), dec!(0.27)),
        ] {
            let input = PricingInput {
                vat: VatSpec {
                    cost_includes_vat: true,
                    purchase_rate: rate,
                    ..VatSpec::default()
                },
                ..markup(cost, dec!(0.30))
            };

            let result = price(&input);
            let rebuilt = result.cost_without_vat * (Decimal::ONE + rate);

            assert!(
                (rebuilt - cost).abs() <= dec!(0.01),
                "cost {cost} at {rate} rebuilt as {rebuilt}"
            );
            assert_eq!(result.cost_without_vat + result.purchase_vat, cost);
        }
    }

    #[test]
    fn customer_pays_sale_vat_on_top() {
        let input = PricingInput {
            vat: VatSpec {
                cost_includes_vat: true,
                sell_with_vat: true,
                bearer: VatBearer::CustomerPays,
                ..VatSpec::default()
            },
            ..markup(dec!(1210), dec!(0.30))
        };

        let result = price(&input);

        assert_eq!(result.net_amount, dec!(1300.00));
        assert_eq!(result.sale_vat, dec!(273.00));
        assert_eq!(result.sale_price, dec!(1573.00));
        assert_eq!(result.vat_balance, dec!(-63.00));
        assert_eq!(result.gross_profit, dec!(363.00));
        assert_eq!(result.net_profit, dec!(300.00));
        assert_eq!(result.net_margin_percentage, dec!(19.07));
        assert_eq!(result.vat_position(), VatPosition::Pay);
    }

    #[test]
    fn business_absorbs_sale_vat_from_the_price() {
        let input = PricingInput {
            vat: VatSpec {
                sell_with_vat: true,
                bearer: VatBearer::BusinessAbsorbs,
                ..VatSpec::default()
            },
            ..markup(dec!(1000), dec!(0.21))
        };

        let result = price(&input);

        assert_eq!(result.sale_price, dec!(1210.00));
        assert_eq!(result.net_amount, dec!(1000.00));
        assert_eq!(result.sale_vat, dec!(210.00));
        assert_eq!(result.vat_balance, dec!(-210.00));
        assert_eq!(result.net_profit, dec!(0.00));
        assert_eq!(result.max_discount, dec!(0.00));
    }

    #[test]
    fn zero_vat_balance_is_a_receive_position() {
        let result = price(&markup(dec!(1000), dec!(0.30)));

        assert_eq!(result.vat_position(), VatPosition::Receive);
    }

    // =========================================================================
    // Charges and discounts
    // =========================================================================

    #[test]
    fn charges_and_percentage_discount() {
        let result = price(&loaded_input());

        assert_eq!(result.perceptions_total, dec!(45.00));
        assert_eq!(result.internal_taxes_total, dec!(15.00));
        assert_eq!(result.processor_fee, dec!(75.00));
        assert_eq!(result.total_taxes, dec!(135.00));
        assert_eq!(result.discount_amount, dec!(150.00));
        assert_eq!(result.sale_price_after_discount, dec!(1350.00));
        assert_eq!(result.gross_profit, dec!(350.00));
        assert_eq!(result.net_profit, dec!(215.00));
        assert_eq!(result.net_margin_percentage, dec!(15.93));
        assert_eq!(result.net_markup_percentage, dec!(21.50));
    }

    #[test]
    fn charge_lines_keep_entry_order() {
        let result = price(&loaded_input());

        let kinds: Vec<_> = result.charges.iter().map(|line| line.kind).collect();
        assert_eq!(
            kinds,
            vec![ChargeKind::Perception, ChargeKind::InternalTax, ChargeKind::ProcessorFee]
        );
        assert_eq!(result.charges[0].name, "IIBB - CÓRDOBA");
        assert_eq!(result.charges[0].amount, dec!(45.00));
    }

    #[test]
    fn fixed_discount_is_taken_literally() {
        let input = PricingInput {
            discount: Some(DiscountSpec::Fixed(dec!(100))),
            ..markup(dec!(1000), dec!(0.30))
        };

        let result = price(&input);

        assert_eq!(result.discount_amount, dec!(100));
        assert_eq!(result.sale_price_after_discount, dec!(1200.00));
        assert_eq!(result.net_profit, dec!(200.00));
        assert_eq!(result.net_margin_percentage, dec!(16.67));
    }

    // =========================================================================
    // Maximum discount
    // =========================================================================

    #[test]
    fn max_discount_equals_profit_without_charges() {
        let result = price(&markup(dec!(1000), dec!(0.30)));

        assert_eq!(result.max_discount, dec!(300.00));
        assert_eq!(result.max_discount_percentage, dec!(23.08));
    }

    #[test]
    fn max_discount_accounts_for_variable_rates() {
        let result = price(&loaded_input());

        // 1000 / (1 − 0.09) = 1098.90
        assert_eq!(result.max_discount, dec!(401.10));
        assert_eq!(result.max_discount_percentage, dec!(26.74));
    }

    #[test]
    fn max_discount_accounts_for_vat_owed() {
        let input = PricingInput {
            vat: VatSpec {
                cost_includes_vat: true,
                sell_with_vat: true,
                ..VatSpec::default()
            },
            ..markup(dec!(1210), dec!(0.30))
        };

        let result = price(&input);

        // 1573.00 − (1210 + (−63.00)) / 1
        assert_eq!(result.sale_price, dec!(1573.00));
        assert_eq!(result.vat_balance, dec!(-63.00));
        assert_eq!(result.max_discount, dec!(426.00));
        assert_eq!(result.max_discount_percentage, dec!(27.08));
    }

    #[test]
    fn max_discount_adds_recoverable_vat_to_the_cost() {
        let input = PricingInput {
            vat: VatSpec {
                cost_includes_vat: true,
                ..VatSpec::default()
            },
            ..markup(dec!(1210), dec!(0.30))
        };

        let result = price(&input);

        // 1300.00 − (1210 + 210.00)
        assert_eq!(result.vat_balance, dec!(210.00));
        assert_eq!(result.max_discount, Decimal::ZERO);
    }

    #[test]
    fn max_discount_is_floored_at_zero() {
        let _guard = init_test_tracing();
        let input = PricingInput {
            perceptions: vec![AdditionalCharge::new("IIBB - BUENOS AIRES", dec!(0.20))],
            ..markup(dec!(1000), dec!(0.10))
        };

        let result = price(&input);

        assert_eq!(result.net_profit, dec!(-120.00));
        assert_eq!(result.net_margin_percentage, dec!(-10.91));
        assert_eq!(result.max_discount, Decimal::ZERO);
        assert_eq!(result.max_discount_percentage, dec!(0));
    }

    #[test]
    fn max_discount_is_zero_when_rates_reach_one() {
        let _guard = init_test_tracing();
        let input = PricingInput {
            perceptions: vec![AdditionalCharge::new("IIBB - JUJUY", dec!(0.60))],
            internal_taxes: vec![AdditionalCharge::new("TASAS PROVINCIALES", dec!(0.50))],
            ..markup(dec!(1000), dec!(3))
        };

        let result = price(&input);

        assert_eq!(result.max_discount, Decimal::ZERO);
    }

    // =========================================================================
    // Income statement
    // =========================================================================

    #[test]
    fn income_statement_lines_and_shares() {
        let statement = price(&loaded_input())
            .income_statement()
            .expect("shares should fit");

        let items: Vec<_> = statement.lines.iter().map(|line| line.item).collect();
        assert_eq!(
            items,
            vec![
                StatementItem::SalePrice,
                StatementItem::Discount,
                StatementItem::NetSales,
                StatementItem::Cost,
                StatementItem::GrossMargin,
                StatementItem::ProcessorFee,
                StatementItem::InternalTaxes,
                StatementItem::Perceptions,
                StatementItem::NetProfit,
            ]
        );

        let share = |item| statement.line(item).map(|line| line.share_of_sale);
        assert_eq!(share(StatementItem::NetSales), Some(dec!(100.00)));
        assert_eq!(share(StatementItem::Cost), Some(dec!(74.07)));
        assert_eq!(share(StatementItem::GrossMargin), Some(dec!(25.93)));
        assert_eq!(share(StatementItem::ProcessorFee), Some(dec!(5.56)));
        assert_eq!(share(StatementItem::Perceptions), Some(dec!(3.33)));
        assert_eq!(share(StatementItem::NetProfit), Some(dec!(15.93)));
    }

    #[test]
    fn income_statement_shows_vat_balance_as_magnitude() {
        let input = PricingInput {
            vat: VatSpec {
                sell_with_vat: true,
                ..VatSpec::default()
            },
            ..markup(dec!(1000), dec!(0.30))
        };

        let statement = price(&input).income_statement().expect("shares should fit");

        let vat = statement
            .line(StatementItem::VatBalance)
            .expect("VAT line present");
        assert_eq!(vat.amount, dec!(273.00));
        assert!(statement.line(StatementItem::Discount).is_none());
    }

    // =========================================================================
    // Out-of-range amounts
    // =========================================================================

    #[test]
    fn markup_beyond_decimal_range_is_an_error() {
        let input = markup(Decimal::from_i128_with_scale(10_i128.pow(28), 0), dec!(9));

        assert_eq!(
            PricingEngine::calculate(&input),
            Err(PricingError::Overflow("net amount"))
        );
    }

    #[test]
    fn margin_on_sale_beyond_decimal_range_is_an_error() {
        let input = PricingInput::new(Decimal::MAX / dec!(2), MarginSpec::MarginOnSale(dec!(0.90)));

        assert_eq!(
            PricingEngine::calculate(&input),
            Err(PricingError::Overflow("net amount"))
        );
    }

    #[test]
    fn sale_vat_pushing_price_beyond_decimal_range_is_an_error() {
        let input = PricingInput {
            vat: VatSpec {
                sell_with_vat: true,
                ..VatSpec::default()
            },
            ..markup(Decimal::MAX / dec!(1.2), dec!(0.01))
        };

        assert_eq!(
            PricingEngine::calculate(&input),
            Err(PricingError::Overflow("sale price"))
        );
    }

    #[test]
    fn overflow_error_names_the_amount() {
        assert_eq!(
            PricingError::Overflow("net amount").to_string(),
            "net amount is out of range"
        );
    }

    #[test]
    fn recomputing_identical_input_is_deterministic() {
        let input = loaded_input();

        assert_eq!(price(&input), price(&input));
    }
}

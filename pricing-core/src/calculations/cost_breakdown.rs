//! Itemised product cost.
//!
//! Splits each [`CostComponent`] into its net amount and the VAT it carries,
//! and totals them. The totals can seed a [`PricingInput`] so that the
//! pricing engine starts from the gross cost and strips the blended VAT.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::CostComponent;
use crate::calculations::PricingInput;
use crate::calculations::common::round_half_up;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CostBreakdownError {
    #[error("cost component '{name}' has a negative amount {amount}")]
    NegativeAmount { name: String, amount: Decimal },

    #[error("cost component '{name}' has a VAT rate outside [0, 1): {rate}")]
    InvalidVatRate { name: String, rate: Decimal },

    #[error("cost components add up to more than the decimal range")]
    Overflow,
}

/// One component after the VAT split.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostLine {
    pub name: String,
    /// Amount as entered.
    pub amount: Decimal,
    pub net_amount: Decimal,
    pub vat_amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub lines: Vec<CostLine>,
    pub total_net: Decimal,
    pub total_vat: Decimal,
    /// `total_net + total_vat`.
    pub total_gross: Decimal,
}

impl CostBreakdown {
    /// Builds the breakdown. Components without a name are labelled
    /// `Componente N` after their 1-based position.
    ///
    /// ```
    /// use rust_decimal_macros::dec;
    /// use pricing_core::CostComponent;
    /// use pricing_core::calculations::CostBreakdown;
    ///
    /// let breakdown = CostBreakdown::from_components(&[
    ///     CostComponent::with_vat("Materia prima", dec!(1210), dec!(0.21)),
    ///     CostComponent::net("Mano de obra", dec!(500)),
    /// ])
    /// .unwrap();
    ///
    /// assert_eq!(breakdown.total_net, dec!(1500.00));
    /// assert_eq!(breakdown.total_vat, dec!(210.00));
    /// assert_eq!(breakdown.total_gross, dec!(1710.00));
    /// ```
    pub fn from_components(components: &[CostComponent]) -> Result<Self, CostBreakdownError> {
        let mut lines = Vec::with_capacity(components.len());

        for (idx, component) in components.iter().enumerate() {
            let name = if component.name.trim().is_empty() {
                format!("Componente {}", idx + 1)
            } else {
                component.name.trim().to_string()
            };

            if component.amount < Decimal::ZERO {
                return Err(CostBreakdownError::NegativeAmount {
                    name,
                    amount: component.amount,
                });
            }

            let (net_amount, vat_amount) = if component.includes_vat {
                if component.vat_rate < Decimal::ZERO || component.vat_rate >= Decimal::ONE {
                    return Err(CostBreakdownError::InvalidVatRate {
                        name,
                        rate: component.vat_rate,
                    });
                }
                let net = round_half_up(component.amount / (Decimal::ONE + component.vat_rate));
                (net, component.amount - net)
            } else {
                (component.amount, Decimal::ZERO)
            };

            lines.push(CostLine {
                name,
                amount: component.amount,
                net_amount,
                vat_amount,
            });
        }

        let total_net = checked_sum(lines.iter().map(|line| line.net_amount))?;
        let total_vat = checked_sum(lines.iter().map(|line| line.vat_amount))?;
        let total_gross = total_net
            .checked_add(total_vat)
            .ok_or(CostBreakdownError::Overflow)?;
        debug!(
            components = lines.len(),
            total_net = %total_net,
            total_vat = %total_vat,
            "cost breakdown built"
        );

        Ok(Self {
            lines,
            total_net,
            total_vat,
            total_gross,
        })
    }

    pub fn includes_vat(&self) -> bool {
        !self.total_vat.is_zero()
    }

    /// VAT carried by the whole cost as a fraction of its net total.
    pub fn blended_vat_rate(&self) -> Decimal {
        // Each component carries no more VAT than its net amount.
        if self.total_net.is_zero() {
            Decimal::ZERO
        } else {
            self.total_vat / self.total_net
        }
    }

    /// Uses the gross total as the cost of `input`, marking it as
    /// VAT-inclusive at the blended rate when any component carries VAT.
    pub fn apply_to(
        &self,
        input: &mut PricingInput,
    ) {
        input.cost = self.total_gross;
        input.vat.cost_includes_vat = self.includes_vat();
        if self.includes_vat() {
            input.vat.purchase_rate = self.blended_vat_rate();
        }
    }
}

fn checked_sum(mut amounts: impl Iterator<Item = Decimal>) -> Result<Decimal, CostBreakdownError> {
    amounts
        .try_fold(Decimal::ZERO, |total, amount| total.checked_add(amount))
        .ok_or(CostBreakdownError::Overflow)
}

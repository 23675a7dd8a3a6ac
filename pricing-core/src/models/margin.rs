use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// How the sale price is derived from cost. Rates are fractions (0.30 = 30%).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "rate", rename_all = "snake_case")]
pub enum MarginSpec {
    /// sale price = cost × (1 + rate)
    Markup(Decimal),
    /// sale price = cost / (1 − rate); the rate must stay below 1.
    MarginOnSale(Decimal),
}

impl MarginSpec {
    pub fn rate(&self) -> Decimal {
        match self {
            Self::Markup(rate) | Self::MarginOnSale(rate) => *rate,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.rate().is_zero()
    }
}

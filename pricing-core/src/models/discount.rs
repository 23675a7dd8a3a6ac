use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum DiscountSpec {
    /// Fraction of the pre-discount sale price, in `[0, 1)`.
    Percentage(Decimal),
    /// Literal amount taken off the sale price.
    Fixed(Decimal),
}

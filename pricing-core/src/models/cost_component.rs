use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::DEFAULT_VAT_RATE;

/// One line of a product's cost (raw material, labour, packaging, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostComponent {
    /// Empty names are replaced with `Componente N` when the breakdown is built.
    pub name: String,
    pub amount: Decimal,
    pub includes_vat: bool,
    pub vat_rate: Decimal,
}

impl CostComponent {
    /// A component whose amount carries no VAT.
    pub fn net(
        name: impl Into<String>,
        amount: Decimal,
    ) -> Self {
        Self {
            name: name.into(),
            amount,
            includes_vat: false,
            vat_rate: DEFAULT_VAT_RATE,
        }
    }

    /// A component whose amount already contains VAT at `vat_rate`.
    pub fn with_vat(
        name: impl Into<String>,
        amount: Decimal,
        vat_rate: Decimal,
    ) -> Self {
        Self {
            name: name.into(),
            amount,
            includes_vat: true,
            vat_rate,
        }
    }
}

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// General Argentine VAT rate (21%).
pub const DEFAULT_VAT_RATE: Decimal = Decimal::from_parts(21, 0, 0, false, 2);

/// Who carries the VAT charged on a sale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VatBearer {
    /// The price is grossed up and the customer pays the VAT on top.
    #[default]
    CustomerPays,
    /// The stated price already contains the VAT; the business nets less.
    BusinessAbsorbs,
}

impl VatBearer {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CustomerPays => "customer",
            Self::BusinessAbsorbs => "business",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "customer" | "customer_pays" | "cliente" => Some(Self::CustomerPays),
            "business" | "business_absorbs" | "negocio" => Some(Self::BusinessAbsorbs),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VatSpec {
    pub purchase_rate: Decimal,
    /// The entered cost already contains purchase VAT and must be grossed down.
    pub cost_includes_vat: bool,
    pub sale_rate: Decimal,
    pub sell_with_vat: bool,
    pub bearer: VatBearer,
}

impl Default for VatSpec {
    fn default() -> Self {
        Self {
            purchase_rate: DEFAULT_VAT_RATE,
            cost_includes_vat: false,
            sale_rate: DEFAULT_VAT_RATE,
            sell_with_vat: false,
            bearer: VatBearer::CustomerPays,
        }
    }
}

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A perception or internal tax levied as a fraction of the net taxable amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdditionalCharge {
    pub name: String,
    pub rate: Decimal,
}

impl AdditionalCharge {
    pub fn new(
        name: impl Into<String>,
        rate: Decimal,
    ) -> Self {
        Self {
            name: name.into(),
            rate,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChargeKind {
    Perception,
    InternalTax,
    ProcessorFee,
}

impl ChargeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Perception => "perception",
            Self::InternalTax => "internal_tax",
            Self::ProcessorFee => "processor_fee",
        }
    }
}

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::AdditionalCharge;

/// Default perception rate for a jurisdiction (e.g. `IIBB - CÓRDOBA`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerceptionRate {
    pub jurisdiction: String,
    pub rate: Decimal,
}

impl PerceptionRate {
    pub fn to_charge(&self) -> AdditionalCharge {
        AdditionalCharge::new(self.jurisdiction.clone(), self.rate)
    }
}

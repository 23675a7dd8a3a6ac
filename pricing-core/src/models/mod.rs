mod charge;
mod cost_component;
mod discount;
mod margin;
mod perception_rate;
mod vat;

pub use charge::{AdditionalCharge, ChargeKind};
pub use cost_component::CostComponent;
pub use discount::DiscountSpec;
pub use margin::MarginSpec;
pub use perception_rate::PerceptionRate;
pub use vat::{DEFAULT_VAT_RATE, VatBearer, VatSpec};

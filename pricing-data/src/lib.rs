//! Reference and worksheet data for the pricing calculators, read from CSV.

mod perception_table;
mod worksheet;

pub use perception_table::{DEFAULT_PERCEPTION_TABLE, PerceptionTable, PerceptionTableError};
pub use worksheet::{WorksheetLoadError, WorksheetLoader};

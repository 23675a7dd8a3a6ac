use std::io::Read;

use pricing_core::PerceptionRate;
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::debug;

/// Default jurisdiction table shipped with the crate.
///
/// The rates are informational starting points, not the current legal rates
/// of each regime; load a table of your own with [`PerceptionTable::parse`]
/// to use real figures.
pub const DEFAULT_PERCEPTION_TABLE: &str = include_str!("../data/perception_rates.csv");

/// Errors that can occur when loading a perception table.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PerceptionTableError {
    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error("row {row}: jurisdiction name is empty")]
    EmptyJurisdiction { row: usize },

    #[error("row {row}: rate for '{jurisdiction}' must be between 0 and 1, got {rate}")]
    InvalidRate {
        row: usize,
        jurisdiction: String,
        rate: Decimal,
    },

    #[error("row {row}: jurisdiction '{jurisdiction}' is listed more than once")]
    DuplicateJurisdiction { row: usize, jurisdiction: String },
}

impl From<csv::Error> for PerceptionTableError {
    fn from(err: csv::Error) -> Self {
        PerceptionTableError::CsvParse(err.to_string())
    }
}

/// Jurisdiction name → default perception rate.
///
/// The CSV has a `jurisdiction,rate` header; rates are fractions (`0.03` for
/// 3%). Rows keep their file order.
///
/// ```
/// use rust_decimal_macros::dec;
/// use pricing_data::PerceptionTable;
///
/// let table = PerceptionTable::parse("jurisdiction,rate\nIIBB - SALTA,0.036\n".as_bytes())
///     .unwrap();
///
/// let salta = table.lookup("  iibb - salta ").unwrap();
/// assert_eq!(salta.rate, dec!(0.036));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PerceptionTable {
    entries: Vec<PerceptionRate>,
}

impl PerceptionTable {
    /// Parse a perception table from a CSV reader.
    pub fn parse<R: Read>(reader: R) -> Result<Self, PerceptionTableError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut entries: Vec<PerceptionRate> = Vec::new();

        for (idx, result) in csv_reader.deserialize::<PerceptionRate>().enumerate() {
            let entry = result?;
            let row = idx + 1;

            if entry.jurisdiction.is_empty() {
                return Err(PerceptionTableError::EmptyJurisdiction { row });
            }
            if entry.rate < Decimal::ZERO || entry.rate >= Decimal::ONE {
                return Err(PerceptionTableError::InvalidRate {
                    row,
                    jurisdiction: entry.jurisdiction,
                    rate: entry.rate,
                });
            }
            let key = normalize(&entry.jurisdiction);
            if entries.iter().any(|e| normalize(&e.jurisdiction) == key) {
                return Err(PerceptionTableError::DuplicateJurisdiction {
                    row,
                    jurisdiction: entry.jurisdiction,
                });
            }
            entries.push(entry);
        }

        debug!(entries = entries.len(), "perception table loaded");
        Ok(Self { entries })
    }

    /// The table embedded in the crate, see [`DEFAULT_PERCEPTION_TABLE`].
    pub fn embedded() -> Result<Self, PerceptionTableError> {
        Self::parse(DEFAULT_PERCEPTION_TABLE.as_bytes())
    }

    /// Finds a jurisdiction ignoring case and surrounding whitespace.
    pub fn lookup(
        &self,
        jurisdiction: &str,
    ) -> Option<&PerceptionRate> {
        let key = normalize(jurisdiction);
        self.entries
            .iter()
            .find(|entry| normalize(&entry.jurisdiction) == key)
    }

    pub fn entries(&self) -> &[PerceptionRate] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

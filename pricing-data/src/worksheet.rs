//! Break-even worksheets: fixed costs and products.
//!
//! | Sheet       | Columns                               |
//! |-------------|---------------------------------------|
//! | Fixed costs | `description,amount`                  |
//! | Products    | `name,variable_cost,selling_price`    |
//!
//! Headers are matched by name and cells are trimmed. Amounts must not be
//! negative; the offending 1-based row is reported otherwise.

use std::io::Read;

use pricing_core::calculations::{FixedCost, Product};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WorksheetLoadError {
    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error("row {row}: '{name}' has a negative {field}: {amount}")]
    NegativeAmount {
        row: usize,
        name: String,
        field: &'static str,
        amount: Decimal,
    },
}

impl From<csv::Error> for WorksheetLoadError {
    fn from(err: csv::Error) -> Self {
        WorksheetLoadError::CsvParse(err.to_string())
    }
}

pub struct WorksheetLoader;

impl WorksheetLoader {
    /// Parse a fixed-cost sheet.
    pub fn fixed_costs<R: Read>(reader: R) -> Result<Vec<FixedCost>, WorksheetLoadError> {
        let costs: Vec<FixedCost> = Self::read_rows(reader)?;
        for (idx, cost) in costs.iter().enumerate() {
            check_amount(idx + 1, &cost.description, "amount", cost.amount)?;
        }
        debug!(rows = costs.len(), "fixed costs loaded");
        Ok(costs)
    }

    /// Parse a product sheet.
    ///
    /// ```
    /// use rust_decimal_macros::dec;
    /// use pricing_data::WorksheetLoader;
    ///
    /// let csv = "name,variable_cost,selling_price\nMesa,600,1000\n";
    /// let products = WorksheetLoader::products(csv.as_bytes()).unwrap();
    ///
    /// assert_eq!(products[0].selling_price, dec!(1000));
    /// ```
    pub fn products<R: Read>(reader: R) -> Result<Vec<Product>, WorksheetLoadError> {
        let products: Vec<Product> = Self::read_rows(reader)?;
        for (idx, product) in products.iter().enumerate() {
            check_amount(idx + 1, &product.name, "variable cost", product.variable_cost)?;
            check_amount(idx + 1, &product.name, "selling price", product.selling_price)?;
        }
        debug!(rows = products.len(), "products loaded");
        Ok(products)
    }

    fn read_rows<R: Read, T: DeserializeOwned>(reader: R) -> Result<Vec<T>, WorksheetLoadError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .flexible(false)
            .from_reader(reader);

        let mut rows = Vec::new();
        for result in csv_reader.deserialize() {
            rows.push(result?);
        }
        Ok(rows)
    }
}

fn check_amount(
    row: usize,
    name: &str,
    field: &'static str,
    amount: Decimal,
) -> Result<(), WorksheetLoadError> {
    if amount < Decimal::ZERO {
        return Err(WorksheetLoadError::NegativeAmount {
            row,
            name: name.to_string(),
            field,
            amount,
        });
    }
    Ok(())
}

//! CSV loader for batches of margin scenarios.
//!
//! ## CSV Format
//!
//! Column order does **not** matter (headers are matched by name). Rates are
//! percentages (`30` = 30%), as on the command line.
//!
//! | Column              | Required | Type    | Notes                                           |
//! |---------------------|----------|---------|-------------------------------------------------|
//! | `name`              | yes      | string  | Shown in the report                              |
//! | `cost`              | yes      | decimal |                                                 |
//! | `markup`            | no       | decimal | At most one of `markup` / `margin_on_sale`;      |
//! |                     |          |         | neither leaves the row with nothing to price     |
//! | `margin_on_sale`    | no       | decimal |                                                 |
//! | `cost_includes_vat` | no       | flag    | `true`/`false`, `yes`/`no`, `si`/`no`, `1`/`0`   |
//! | `sell_with_vat`     | no       | flag    |                                                 |
//! | `vat_bearer`        | no       | string  | `customer` or `business`; default from settings |
//! | `processor_rate`    | no       | decimal | Default from settings                            |
//! | `discount_rate`     | no       | decimal | At most one of the two discount columns          |
//! | `discount_amount`   | no       | decimal |                                                 |
//! | `perceptions`       | no       | string  | `;`-separated jurisdiction names from the table  |
//! | `internal_taxes`    | no       | string  | `;`-separated `NAME=PERCENT` or table names      |
//!
//! ### Example
//!
//! ```csv
//! name,cost,markup,margin_on_sale,cost_includes_vat,sell_with_vat,vat_bearer,processor_rate,discount_rate,discount_amount,perceptions,internal_taxes
//! Mesa,1000,30,,no,no,,,,,,
//! Silla,1210,,25,si,si,customer,5,10,,IIBB - CABA;IIBB - CÓRDOBA,TASAS MUNICIPALES;Tasa vial=1.5
//! ```

use std::path::{Path, PathBuf};

use pricing_core::calculations::PricingInput;
use pricing_core::calculations::common::percent_to_rate;
use pricing_core::{AdditionalCharge, DiscountSpec, MarginSpec, VatBearer, VatSpec};
use pricing_data::PerceptionTable;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::app::{InputError, parse_charge};
use crate::config::Settings;
use crate::utils::NumberFormat;

// ---------------------------------------------------------------------------
// Serde-compatible row that mirrors the CSV layout exactly
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct CsvRow {
    name: String,
    cost: Decimal,
    markup: Option<Decimal>,
    margin_on_sale: Option<Decimal>,
    cost_includes_vat: Option<String>,
    sell_with_vat: Option<String>,
    vat_bearer: Option<String>,
    processor_rate: Option<Decimal>,
    discount_rate: Option<Decimal>,
    discount_amount: Option<Decimal>,
    perceptions: Option<String>,
    internal_taxes: Option<String>,
}

/// One named margin computation from a batch file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scenario {
    pub name: String,
    pub input: PricingInput,
}

// ---------------------------------------------------------------------------
// Public error type
// ---------------------------------------------------------------------------

/// Errors that can occur while loading or converting CSV data. Rows are
/// 1-based (header = row 0).
#[derive(Debug, thiserror::Error)]
pub enum CsvLoadError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Bad structure, missing required column, type mismatch, etc.
    #[error("CSV parse error: {0}")]
    Parse(#[from] csv::Error),

    #[error("row {row}: give at most one of markup or margin_on_sale")]
    AmbiguousMargin { row: usize },

    #[error("row {row}: give at most one of discount_rate or discount_amount")]
    AmbiguousDiscount { row: usize },

    #[error("row {row}: '{value}' is not a yes/no value for {column}")]
    InvalidFlag {
        row: usize,
        column: &'static str,
        value: String,
    },

    #[error("unrecognised VAT bearer '{value}' on row {row}")]
    InvalidVatBearer { value: String, row: usize },

    #[error("unknown jurisdiction '{name}' on row {row}")]
    UnknownJurisdiction { name: String, row: usize },

    #[error("row {row}: internal tax: {source}")]
    InvalidInternalTax {
        row: usize,
        #[source]
        source: InputError,
    },
}

// ---------------------------------------------------------------------------
// Core loader
// ---------------------------------------------------------------------------

fn parse_flag(
    value: Option<String>,
    column: &'static str,
    row: usize,
) -> Result<bool, CsvLoadError> {
    let Some(value) = value else {
        return Ok(false);
    };
    match value.trim().to_lowercase().as_str() {
        "" | "false" | "no" | "n" | "0" => Ok(false),
        "true" | "yes" | "y" | "si" | "sí" | "s" | "1" => Ok(true),
        _ => Err(CsvLoadError::InvalidFlag { row, column, value }),
    }
}

fn split_list(value: Option<&str>) -> impl Iterator<Item = &str> {
    value
        .unwrap_or_default()
        .split(';')
        .map(str::trim)
        .filter(|item| !item.is_empty())
}

/// Convert a single CSV row into a scenario.
fn convert_row(
    row: CsvRow,
    row_number: usize,
    table: &PerceptionTable,
    settings: &Settings,
) -> Result<Scenario, CsvLoadError> {
    let margin = match (row.markup, row.margin_on_sale) {
        (Some(markup), None) => MarginSpec::Markup(percent_to_rate(markup)),
        (None, Some(margin)) => MarginSpec::MarginOnSale(percent_to_rate(margin)),
        (None, None) => MarginSpec::Markup(Decimal::ZERO),
        (Some(_), Some(_)) => return Err(CsvLoadError::AmbiguousMargin { row: row_number }),
    };

    let discount = match (row.discount_rate, row.discount_amount) {
        (Some(rate), None) => Some(DiscountSpec::Percentage(percent_to_rate(rate))),
        (None, Some(amount)) => Some(DiscountSpec::Fixed(amount)),
        (None, None) => None,
        (Some(_), Some(_)) => return Err(CsvLoadError::AmbiguousDiscount { row: row_number }),
    };

    let bearer = match row.vat_bearer.as_deref().map(str::trim) {
        None | Some("") => settings.vat.bearer,
        Some(value) => VatBearer::parse(value).ok_or_else(|| CsvLoadError::InvalidVatBearer {
            value: value.to_string(),
            row: row_number,
        })?,
    };

    let perceptions = split_list(row.perceptions.as_deref())
        .map(|name| {
            table
                .lookup(name)
                .map(|entry| entry.to_charge())
                .ok_or_else(|| CsvLoadError::UnknownJurisdiction {
                    name: name.to_string(),
                    row: row_number,
                })
        })
        .collect::<Result<Vec<AdditionalCharge>, _>>()?;

    let internal_taxes = split_list(row.internal_taxes.as_deref())
        .map(|item| {
            parse_charge(item, table, &NumberFormat::PLAIN).map_err(|source| {
                CsvLoadError::InvalidInternalTax {
                    row: row_number,
                    source,
                }
            })
        })
        .collect::<Result<Vec<AdditionalCharge>, _>>()?;

    let processor_percent = row
        .processor_rate
        .unwrap_or(settings.payments.processor_percent);

    Ok(Scenario {
        name: row.name,
        input: PricingInput {
            cost: row.cost,
            margin,
            vat: VatSpec {
                purchase_rate: percent_to_rate(settings.vat.purchase_percent),
                cost_includes_vat: parse_flag(row.cost_includes_vat, "cost_includes_vat", row_number)?,
                sale_rate: percent_to_rate(settings.vat.sale_percent),
                sell_with_vat: parse_flag(row.sell_with_vat, "sell_with_vat", row_number)?,
                bearer,
            },
            perceptions,
            internal_taxes,
            processor_rate: (!processor_percent.is_zero()).then(|| percent_to_rate(processor_percent)),
            discount,
        },
    })
}

/// Parse CSV text and return the scenarios in file order.
///
/// # Errors
///
/// * [CsvLoadError::Parse] – if the CSV is structurally invalid or a
///   required field cannot be deserialised.
/// * Any of the row-level variants when a row cannot be turned into a
///   [`PricingInput`].
pub fn load_from_str(
    input: &str,
    table: &PerceptionTable,
    settings: &Settings,
) -> Result<Vec<Scenario>, CsvLoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .flexible(false)
        .from_reader(input.as_bytes());

    reader
        .deserialize::<CsvRow>()
        .enumerate()
        .map(|(idx, result)| {
            let row = result?;
            convert_row(row, idx + 1, table, settings)
        })
        .collect()
}

/// Reads a file from disk and delegates to [load_from_str].
pub fn load_from_file(
    path: &Path,
    table: &PerceptionTable,
    settings: &Settings,
) -> Result<Vec<Scenario>, CsvLoadError> {
    let contents = std::fs::read_to_string(path).map_err(|source| CsvLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_from_str(&contents, table, settings)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Command-line definition.
//!
//! Numbers are taken as text and parsed with the separators from the
//! `[input]` config section. Rates are percentages (`30` = 30%).

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Pricing calculators: margin and markup, break-even point, installments
/// versus cash.
#[derive(Debug, Parser)]
#[command(name = "calculadora", version)]
pub struct Cli {
    /// TOML settings file.
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log level or filter directive (e.g. `debug`). Overrides `RUST_LOG`.
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Also append log output to this file.
    #[arg(long, global = true, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Perception table (`jurisdiction,rate`) to use instead of the built-in one.
    #[arg(long, global = true, value_name = "FILE")]
    pub rates_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Price a product from its cost and print the profit breakdown.
    Margin(MarginArgs),
    /// Units and revenue needed to cover fixed costs.
    BreakEven(BreakEvenArgs),
    /// Compare paying in installments against paying cash.
    Installments(InstallmentArgs),
    /// Price every scenario in a CSV file.
    Batch(BatchArgs),
    /// List the jurisdiction perception rates.
    Rates,
}

#[derive(Debug, Default, Args)]
pub struct MarginArgs {
    /// Product cost. Leave out when giving `--component`s.
    #[arg(allow_hyphen_values = true)]
    pub cost: Option<String>,

    /// Markup on cost, in percent.
    #[arg(long, conflicts_with = "margin_on_sale", allow_hyphen_values = true)]
    pub markup: Option<String>,

    /// Margin on the sale price, in percent (below 100).
    #[arg(long, allow_hyphen_values = true)]
    pub margin_on_sale: Option<String>,

    /// The cost already includes purchase VAT.
    #[arg(long)]
    pub cost_includes_vat: bool,

    /// Purchase VAT percent (default from settings).
    #[arg(long, value_name = "PERCENT")]
    pub purchase_vat: Option<String>,

    /// Charge VAT on the sale.
    #[arg(long)]
    pub sell_with_vat: bool,

    /// Sale VAT percent (default from settings).
    #[arg(long, value_name = "PERCENT")]
    pub sale_vat: Option<String>,

    /// Who bears the sale VAT: `customer` or `business`.
    #[arg(long, value_name = "BEARER")]
    pub vat_bearer: Option<String>,

    /// Jurisdiction perception, `NAME` (rate from the table) or `NAME=PERCENT`.
    #[arg(long = "perception", value_name = "NAME[=PERCENT]")]
    pub perceptions: Vec<String>,

    /// Internal tax, `NAME=PERCENT` or a table name.
    #[arg(long = "internal-tax", value_name = "NAME[=PERCENT]")]
    pub internal_taxes: Vec<String>,

    /// Payment-processor commission percent (default from settings).
    #[arg(long, value_name = "PERCENT")]
    pub processor_fee: Option<String>,

    /// Discount as a percent of the sale price.
    #[arg(long, conflicts_with = "discount_amount", value_name = "PERCENT")]
    pub discount: Option<String>,

    /// Discount as a fixed amount.
    #[arg(long, value_name = "AMOUNT")]
    pub discount_amount: Option<String>,

    /// Cost component, `NAME=AMOUNT` or `NAME=AMOUNT@VAT_PERCENT` when the
    /// amount includes VAT. The components add up to the cost.
    #[arg(long = "component", value_name = "NAME=AMOUNT[@VAT]")]
    pub components: Vec<String>,

    /// Also print the income statement.
    #[arg(long)]
    pub statement: bool,
}

#[derive(Debug, Default, Args)]
pub struct BreakEvenArgs {
    /// CSV sheet with `description,amount` columns.
    #[arg(long, value_name = "FILE")]
    pub fixed_costs: Option<PathBuf>,

    /// CSV sheet with `name,variable_cost,selling_price` columns.
    #[arg(long, value_name = "FILE")]
    pub products: Option<PathBuf>,

    /// Inline fixed cost, `DESCRIPTION=AMOUNT`.
    #[arg(long = "fixed-cost", value_name = "DESCRIPTION=AMOUNT")]
    pub fixed_cost: Vec<String>,

    /// Inline product, `NAME=VARIABLE_COST:SELLING_PRICE`.
    #[arg(long = "product", value_name = "NAME=COST:PRICE")]
    pub product: Vec<String>,
}

#[derive(Debug, Default, Args)]
pub struct InstallmentArgs {
    /// Price when paying cash.
    #[arg(long)]
    pub cash: String,

    /// Total price when paying in installments.
    #[arg(long)]
    pub financed: String,

    /// Expected monthly inflation percent (default from settings).
    #[arg(long, value_name = "PERCENT", allow_hyphen_values = true)]
    pub inflation: Option<String>,

    /// Number of installments (default from settings).
    #[arg(long)]
    pub count: Option<u32>,

    /// Print the month-by-month table.
    #[arg(long)]
    pub schedule: bool,
}

#[derive(Debug, Args)]
pub struct BatchArgs {
    /// Scenario CSV file.
    pub file: PathBuf,
}

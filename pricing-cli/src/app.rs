//! Turns parsed command-line arguments into calculator inputs, runs the
//! calculators and renders their reports.

use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use pricing_core::calculations::common::percent_to_rate;
use pricing_core::calculations::{
    BreakEvenCalculator, CostBreakdown, FixedCost, InstallmentInput, PricingEngine, PricingInput,
    Product,
};
use pricing_core::{AdditionalCharge, CostComponent, DiscountSpec, MarginSpec, VatBearer, VatSpec};
use pricing_data::{PerceptionTable, WorksheetLoader};
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{debug, info};

use crate::cli::{BatchArgs, BreakEvenArgs, Cli, Command, InstallmentArgs, MarginArgs};
use crate::config::Settings;
use crate::csv_loader;
use crate::report::{
    BatchReport, BreakEvenReport, InstallmentReport, MarginReport, RatesReport, ScenarioOutcome,
};
use crate::utils::{NumberFormat, ParseDecimalError, parse_decimal, parse_optional_decimal};

/// Errors in the values of individual command-line arguments.
#[derive(Debug, Error)]
pub enum InputError {
    #[error(transparent)]
    Decimal(#[from] ParseDecimalError),

    #[error("'{value}' is not in the form {expected}")]
    Malformed {
        value: String,
        expected: &'static str,
    },

    #[error("unknown jurisdiction '{0}'; give NAME=PERCENT or pick a name from `calculadora rates`")]
    UnknownJurisdiction(String),

    #[error("unknown VAT bearer '{0}', expected customer or business")]
    InvalidVatBearer(String),

    #[error("give either a cost or cost components, not both")]
    CostAndComponents,
}

// =============================================================================
// Argument parsing
// =============================================================================

fn split_named<'a>(
    arg: &'a str,
    expected: &'static str,
) -> Result<(&'a str, &'a str), InputError> {
    match arg.rsplit_once('=') {
        Some((name, value)) if !name.trim().is_empty() && !value.trim().is_empty() => {
            Ok((name.trim(), value.trim()))
        }
        _ => Err(InputError::Malformed {
            value: arg.to_string(),
            expected,
        }),
    }
}

/// Parses a perception or internal tax: `NAME=PERCENT`, or a bare `NAME`
/// whose rate comes from the table.
///
/// ```
/// use rust_decimal_macros::dec;
/// use pricing_cli::app::parse_charge;
/// use pricing_cli::utils::NumberFormat;
/// use pricing_data::PerceptionTable;
///
/// let table = PerceptionTable::embedded().unwrap();
/// let charge = parse_charge("Tasa vial=1.5", &table, &NumberFormat::PLAIN).unwrap();
///
/// assert_eq!(charge.name, "Tasa vial");
/// assert_eq!(charge.rate, dec!(0.015));
/// ```
pub fn parse_charge(
    arg: &str,
    table: &PerceptionTable,
    format: &NumberFormat,
) -> Result<AdditionalCharge, InputError> {
    if arg.contains('=') {
        let (name, percent) = split_named(arg, "NAME=PERCENT")?;
        return Ok(AdditionalCharge::new(
            name,
            percent_to_rate(parse_decimal(percent, format)?),
        ));
    }
    table
        .lookup(arg)
        .map(|entry| entry.to_charge())
        .ok_or_else(|| InputError::UnknownJurisdiction(arg.trim().to_string()))
}

/// `NAME=AMOUNT` or `NAME=AMOUNT@VAT_PERCENT`.
pub fn parse_component(
    arg: &str,
    format: &NumberFormat,
) -> Result<CostComponent, InputError> {
    let (name, value) = match arg.split_once('=') {
        Some((name, value)) => (name.trim(), value.trim()),
        None => ("", arg.trim()),
    };
    match value.split_once('@') {
        Some((amount, vat)) => Ok(CostComponent::with_vat(
            name,
            parse_decimal(amount, format)?,
            percent_to_rate(parse_decimal(vat, format)?),
        )),
        None => Ok(CostComponent::net(name, parse_decimal(value, format)?)),
    }
}

/// `DESCRIPTION=AMOUNT`.
pub fn parse_fixed_cost(
    arg: &str,
    format: &NumberFormat,
) -> Result<FixedCost, InputError> {
    let (description, amount) = split_named(arg, "DESCRIPTION=AMOUNT")?;
    Ok(FixedCost::new(description, parse_decimal(amount, format)?))
}

/// `NAME=VARIABLE_COST:SELLING_PRICE`.
pub fn parse_product(
    arg: &str,
    format: &NumberFormat,
) -> Result<Product, InputError> {
    const EXPECTED: &str = "NAME=COST:PRICE";
    let (name, values) = split_named(arg, EXPECTED)?;
    let (cost, price) = values.split_once(':').ok_or_else(|| InputError::Malformed {
        value: arg.to_string(),
        expected: EXPECTED,
    })?;
    Ok(Product::new(
        name,
        parse_decimal(cost, format)?,
        parse_decimal(price, format)?,
    ))
}

fn parse_percent_or(
    arg: Option<&str>,
    default_percent: Decimal,
    format: &NumberFormat,
) -> Result<Decimal, InputError> {
    let percent = match arg {
        Some(arg) => parse_decimal(arg, format)?,
        None => default_percent,
    };
    Ok(percent_to_rate(percent))
}

/// Builds the pricing input for `margin`. When cost components are given,
/// the returned breakdown has already been applied to the input.
pub fn build_pricing_input(
    args: &MarginArgs,
    table: &PerceptionTable,
    settings: &Settings,
) -> Result<(PricingInput, Option<CostBreakdown>)> {
    let format = settings.input.number_format();

    let cost = match args.cost.as_deref() {
        Some(cost) => parse_optional_decimal(cost, &format)?,
        None => None,
    };
    if cost.is_some() && !args.components.is_empty() {
        return Err(InputError::CostAndComponents.into());
    }

    let margin = match (args.markup.as_deref(), args.margin_on_sale.as_deref()) {
        (_, Some(margin)) => MarginSpec::MarginOnSale(percent_to_rate(parse_decimal(margin, &format)?)),
        (Some(markup), None) => MarginSpec::Markup(percent_to_rate(parse_decimal(markup, &format)?)),
        (None, None) => MarginSpec::Markup(Decimal::ZERO),
    };

    let bearer = match args.vat_bearer.as_deref() {
        Some(value) => {
            VatBearer::parse(value).ok_or_else(|| InputError::InvalidVatBearer(value.to_string()))?
        }
        None => settings.vat.bearer,
    };
    let vat = VatSpec {
        purchase_rate: parse_percent_or(
            args.purchase_vat.as_deref(),
            settings.vat.purchase_percent,
            &format,
        )?,
        cost_includes_vat: args.cost_includes_vat,
        sale_rate: parse_percent_or(args.sale_vat.as_deref(), settings.vat.sale_percent, &format)?,
        sell_with_vat: args.sell_with_vat,
        bearer,
    };

    let perceptions = args
        .perceptions
        .iter()
        .map(|arg| parse_charge(arg, table, &format))
        .collect::<Result<Vec<_>, _>>()?;
    let internal_taxes = args
        .internal_taxes
        .iter()
        .map(|arg| parse_charge(arg, table, &format))
        .collect::<Result<Vec<_>, _>>()?;

    let processor_rate = parse_percent_or(
        args.processor_fee.as_deref(),
        settings.payments.processor_percent,
        &format,
    )?;

    let discount = match (args.discount.as_deref(), args.discount_amount.as_deref()) {
        (Some(percent), _) => Some(DiscountSpec::Percentage(percent_to_rate(parse_decimal(
            percent, &format,
        )?))),
        (None, Some(amount)) => Some(DiscountSpec::Fixed(parse_decimal(amount, &format)?)),
        (None, None) => None,
    };

    let mut input = PricingInput {
        cost: cost.unwrap_or_default(),
        margin,
        vat,
        perceptions,
        internal_taxes,
        processor_rate: (!processor_rate.is_zero()).then_some(processor_rate),
        discount,
    };

    if args.components.is_empty() {
        return Ok((input, None));
    }
    let components = args
        .components
        .iter()
        .map(|arg| parse_component(arg, &format))
        .collect::<Result<Vec<_>, _>>()?;
    let breakdown = CostBreakdown::from_components(&components)?;
    breakdown.apply_to(&mut input);
    debug!(components = components.len(), cost = %input.cost, "cost taken from components");
    Ok((input, Some(breakdown)))
}

// =============================================================================
// Commands
// =============================================================================

/// Loads the perception table from `path`, or the built-in one.
pub fn load_table(path: Option<&Path>) -> Result<PerceptionTable> {
    match path {
        Some(path) => {
            info!(path = %path.display(), "loading perception table");
            let file = File::open(path)
                .with_context(|| format!("cannot open rates file '{}'", path.display()))?;
            PerceptionTable::parse(file)
                .with_context(|| format!("invalid rates file '{}'", path.display()))
        }
        None => PerceptionTable::embedded().context("built-in perception table is invalid"),
    }
}

/// Runs the selected command and returns its report.
pub fn run(
    cli: &Cli,
    settings: &Settings,
) -> Result<String> {
    match &cli.command {
        Command::Margin(args) => {
            let table = load_table(cli.rates_file.as_deref())?;
            run_margin(args, &table, settings)
        }
        Command::BreakEven(args) => run_break_even(args, settings),
        Command::Installments(args) => run_installments(args, settings),
        Command::Batch(args) => {
            let table = load_table(cli.rates_file.as_deref())?;
            run_batch(args, &table, settings)
        }
        Command::Rates => {
            let table = load_table(cli.rates_file.as_deref())?;
            Ok(RatesReport {
                display: &settings.display,
                table: &table,
            }
            .to_string())
        }
    }
}

pub fn run_margin(
    args: &MarginArgs,
    table: &PerceptionTable,
    settings: &Settings,
) -> Result<String> {
    let (input, breakdown) = build_pricing_input(args, table, settings)?;
    let result = PricingEngine::calculate(&input)?;

    Ok(MarginReport {
        display: &settings.display,
        breakdown: breakdown.as_ref(),
        result: result.as_ref(),
        statement: args.statement,
    }
    .to_string())
}

pub fn run_batch(
    args: &BatchArgs,
    table: &PerceptionTable,
    settings: &Settings,
) -> Result<String> {
    let scenarios = csv_loader::load_from_file(&args.file, table, settings)
        .with_context(|| format!("cannot load scenarios from '{}'", args.file.display()))?;
    info!(scenarios = scenarios.len(), "pricing batch");

    let rows: Vec<(String, ScenarioOutcome)> = scenarios
        .into_iter()
        .map(|scenario| {
            let outcome = PricingEngine::calculate(&scenario.input);
            (scenario.name, outcome)
        })
        .collect();

    Ok(BatchReport {
        display: &settings.display,
        rows: &rows,
    }
    .to_string())
}

pub fn run_break_even(
    args: &BreakEvenArgs,
    settings: &Settings,
) -> Result<String> {
    let format = settings.input.number_format();

    let mut fixed_costs = match &args.fixed_costs {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("cannot open fixed-cost sheet '{}'", path.display()))?;
            WorksheetLoader::fixed_costs(file)
                .with_context(|| format!("invalid fixed-cost sheet '{}'", path.display()))?
        }
        None => Vec::new(),
    };
    for arg in &args.fixed_cost {
        fixed_costs.push(parse_fixed_cost(arg, &format)?);
    }

    let mut products = match &args.products {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("cannot open product sheet '{}'", path.display()))?;
            WorksheetLoader::products(file)
                .with_context(|| format!("invalid product sheet '{}'", path.display()))?
        }
        None => Vec::new(),
    };
    for arg in &args.product {
        products.push(parse_product(arg, &format)?);
    }

    let result = BreakEvenCalculator::calculate(&fixed_costs, &products)?;
    Ok(BreakEvenReport {
        display: &settings.display,
        result: &result,
    }
    .to_string())
}

pub fn run_installments(
    args: &InstallmentArgs,
    settings: &Settings,
) -> Result<String> {
    let format = settings.input.number_format();
    let input = InstallmentInput {
        cash_price: parse_decimal(&args.cash, &format)?,
        financed_price: parse_decimal(&args.financed, &format)?,
        monthly_inflation: parse_percent_or(
            args.inflation.as_deref(),
            settings.installments.monthly_inflation_percent,
            &format,
        )?,
        installments: args.count.unwrap_or(settings.installments.count),
    };

    let comparison = input.compare()?;
    Ok(InstallmentReport {
        display: &settings.display,
        comparison: &comparison,
        schedule: args.schedule,
    }
    .to_string())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use pricing_core::calculations::{BreakEvenError, PricingError};
    use rust_decimal_macros::dec;

    use super::*;

    fn table() -> PerceptionTable {
        PerceptionTable::embedded().expect("embedded table should parse")
    }

    fn margin_args(cost: &str) -> MarginArgs {
        MarginArgs {
            cost: Some(cost.to_string()),
            markup: Some("30".to_string()),
            ..MarginArgs::default()
        }
    }

    // =========================================================================
    // Argument parsing
    // =========================================================================

    #[test]
    fn parse_charge_looks_up_bare_names() {
        let charge = parse_charge("iibb - caba", &table(), &NumberFormat::PLAIN).unwrap();

        assert_eq!(charge.name, "IIBB - CABA");
        assert_eq!(charge.rate, dec!(0.030));
    }

    #[test]
    fn parse_charge_explicit_rate_overrides_table() {
        let charge = parse_charge("IIBB - CABA=4.5", &table(), &NumberFormat::PLAIN).unwrap();

        assert_eq!(charge, AdditionalCharge::new("IIBB - CABA", dec!(0.045)));
    }

    #[test]
    fn parse_charge_unknown_name() {
        let err = parse_charge("IIBB - ATLANTIS", &table(), &NumberFormat::PLAIN).unwrap_err();

        assert!(matches!(err, InputError::UnknownJurisdiction(name) if name == "IIBB - ATLANTIS"));
    }

    #[test]
    fn parse_charge_missing_rate_is_malformed() {
        let err = parse_charge("Tasa=", &table(), &NumberFormat::PLAIN).unwrap_err();

        assert!(matches!(err, InputError::Malformed { .. }));
    }

    #[test]
    fn parse_component_with_and_without_vat() {
        assert_eq!(
            parse_component("Materia prima=1.210,00@21", &NumberFormat::ES_AR).unwrap(),
            CostComponent::with_vat("Materia prima", dec!(1210), dec!(0.21))
        );
        assert_eq!(
            parse_component("Mano de obra=500", &NumberFormat::PLAIN).unwrap(),
            CostComponent::net("Mano de obra", dec!(500))
        );
        assert_eq!(
            parse_component("250", &NumberFormat::PLAIN).unwrap(),
            CostComponent::net("", dec!(250))
        );
    }

    #[test]
    fn parse_fixed_cost_and_product() {
        assert_eq!(
            parse_fixed_cost("Alquiler=100,000", &NumberFormat::PLAIN).unwrap(),
            FixedCost::new("Alquiler", dec!(100000))
        );
        assert_eq!(
            parse_product("Mesa=600:1000", &NumberFormat::PLAIN).unwrap(),
            Product::new("Mesa", dec!(600), dec!(1000))
        );
        assert!(matches!(
            parse_product("Mesa=600", &NumberFormat::PLAIN),
            Err(InputError::Malformed { .. })
        ));
    }

    // =========================================================================
    // Margin
    // =========================================================================

    #[test]
    fn build_input_uses_settings_defaults() {
        let mut settings = Settings::default();
        settings.payments.processor_percent = dec!(5);

        let (input, breakdown) = build_pricing_input(&margin_args("1000"), &table(), &settings).unwrap();

        assert!(breakdown.is_none());
        assert_eq!(input.cost, dec!(1000));
        assert_eq!(input.margin, MarginSpec::Markup(dec!(0.30)));
        assert_eq!(input.vat.sale_rate, dec!(0.21));
        assert_eq!(input.processor_rate, Some(dec!(0.05)));
        assert_eq!(input.discount, None);
    }

    #[test]
    fn build_input_flags_override_settings() {
        let args = MarginArgs {
            margin_on_sale: Some("25".to_string()),
            markup: None,
            sell_with_vat: true,
            sale_vat: Some("10.5".to_string()),
            vat_bearer: Some("business".to_string()),
            discount_amount: Some("50".to_string()),
            internal_taxes: vec!["Tasa vial=1".to_string()],
            ..margin_args("750")
        };

        let (input, _) = build_pricing_input(&args, &table(), &Settings::default()).unwrap();

        assert_eq!(input.margin, MarginSpec::MarginOnSale(dec!(0.25)));
        assert_eq!(input.vat.sale_rate, dec!(0.105));
        assert_eq!(input.vat.bearer, VatBearer::BusinessAbsorbs);
        assert_eq!(input.discount, Some(DiscountSpec::Fixed(dec!(50))));
        assert_eq!(input.internal_taxes, vec![AdditionalCharge::new("Tasa vial", dec!(0.01))]);
    }

    #[test]
    fn build_input_from_components() {
        let args = MarginArgs {
            cost: None,
            components: vec!["Materia prima=1210@21".to_string(), "Mano de obra=500".to_string()],
            ..margin_args("")
        };

        let (input, breakdown) = build_pricing_input(&args, &table(), &Settings::default()).unwrap();

        assert_eq!(input.cost, dec!(1710.00));
        assert!(input.vat.cost_includes_vat);
        assert_eq!(breakdown.map(|b| b.total_vat), Some(dec!(210.00)));
    }

    #[test]
    fn build_input_rejects_cost_and_components() {
        let args = MarginArgs {
            components: vec!["Mano de obra=500".to_string()],
            ..margin_args("1000")
        };

        let err = build_pricing_input(&args, &table(), &Settings::default()).unwrap_err();

        assert!(matches!(
            err.downcast_ref::<InputError>(),
            Some(InputError::CostAndComponents)
        ));
    }

    #[test]
    fn run_margin_without_margin_prints_nothing_to_price() {
        let args = MarginArgs {
            markup: None,
            ..margin_args("1000")
        };

        let text = run_margin(&args, &table(), &Settings::default()).unwrap();

        assert!(text.starts_with("Nothing to price"));
    }

    #[test]
    fn run_margin_reports_margin_on_sale_error() {
        let args = MarginArgs {
            markup: None,
            margin_on_sale: Some("100".to_string()),
            ..margin_args("1000")
        };

        let err = run_margin(&args, &table(), &Settings::default()).unwrap_err();

        assert_eq!(
            err.downcast_ref::<PricingError>(),
            Some(&PricingError::MarginOnSaleTooHigh(dec!(1)))
        );
    }

    // =========================================================================
    // Break-even and installments
    // =========================================================================

    #[test]
    fn run_break_even_with_inline_values() {
        let args = BreakEvenArgs {
            fixed_cost: vec!["Alquiler=1000".to_string()],
            product: vec!["Café=3:10".to_string()],
            ..BreakEvenArgs::default()
        };

        let text = run_break_even(&args, &Settings::default()).unwrap();

        assert!(text.contains("$ 1.430,00"), "{text}");
    }

    #[test]
    fn run_break_even_without_products_fails() {
        let args = BreakEvenArgs {
            fixed_cost: vec!["Alquiler=1000".to_string()],
            ..BreakEvenArgs::default()
        };

        let err = run_break_even(&args, &Settings::default()).unwrap_err();

        assert_eq!(err.downcast_ref::<BreakEvenError>(), Some(&BreakEvenError::NoProducts));
    }

    #[test]
    fn run_installments_uses_settings_inflation() {
        let args = InstallmentArgs {
            cash: "100000".to_string(),
            financed: "120000".to_string(),
            ..InstallmentArgs::default()
        };

        let text = run_installments(&args, &Settings::default()).unwrap();

        assert!(text.contains("29,84%"), "{text}");
        assert!(text.contains("Pay cash"));
    }
}

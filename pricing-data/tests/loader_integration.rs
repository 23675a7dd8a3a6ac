//! Integration tests loading worksheet and rate fixtures from disk and
//! feeding them to the calculators.

use std::fs::File;
use std::path::PathBuf;

use pretty_assertions::assert_eq;
use pricing_core::MarginSpec;
use pricing_core::calculations::{BreakEvenCalculator, PricingEngine, PricingInput};
use pricing_data::{PerceptionTable, WorksheetLoader};
use rust_decimal_macros::dec;

fn fixture(name: &str) -> File {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);
    File::open(&path).unwrap_or_else(|e| panic!("cannot open {}: {}", path.display(), e))
}

#[test]
fn test_break_even_from_fixture_sheets() {
    let fixed_costs =
        WorksheetLoader::fixed_costs(fixture("fixed_costs.csv")).expect("Failed to load fixed costs");
    let products = WorksheetLoader::products(fixture("products.csv")).expect("Failed to load products");

    let result = BreakEvenCalculator::calculate(&fixed_costs, &products).expect("should break even");

    assert_eq!(result.total_fixed_costs, dec!(150000));
    assert_eq!(result.break_even_units, dec!(500));
    assert_eq!(result.break_even_revenue, dec!(375000.00));
}

#[test]
fn test_custom_rate_table_replaces_defaults() {
    let table = PerceptionTable::parse(fixture("custom_rates.csv")).expect("Failed to load rates");

    assert_eq!(table.len(), 2);
    assert_eq!(table.lookup("iibb - córdoba").map(|e| e.rate), Some(dec!(0.045)));
    assert_eq!(table.lookup("IIBB - CABA"), None);
}

#[test]
fn test_table_rate_feeds_the_pricing_engine() {
    let table = PerceptionTable::parse(fixture("custom_rates.csv")).expect("Failed to load rates");
    let cordoba = table.lookup("IIBB - CÓRDOBA").expect("jurisdiction should be present");

    let input = PricingInput {
        perceptions: vec![cordoba.to_charge()],
        ..PricingInput::new(dec!(1000), MarginSpec::Markup(dec!(0.30)))
    };
    let result = PricingEngine::calculate(&input)
        .expect("input should be valid")
        .expect("input should produce a result");

    assert_eq!(result.perceptions_total, dec!(58.50));
    assert_eq!(result.net_profit, dec!(241.50));
}

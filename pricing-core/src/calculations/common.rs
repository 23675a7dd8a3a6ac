//! Common helpers shared by the calculators.
//!
//! Rounding, percent/fraction conversion and zero-safe division live here so
//! that every calculator rounds and guards its denominators the same way.

use rust_decimal::Decimal;

/// One hundred, for percent/fraction conversions.
pub const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Rounds a decimal value to exactly two decimal places using half-up rounding.
///
/// Values at exactly 0.005 are rounded away from zero, the convention used for
/// every monetary line and every reported percentage.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use pricing_core::calculations::common::round_half_up;
///
/// assert_eq!(round_half_up(dec!(1428.5714)), dec!(1428.57));
/// assert_eq!(round_half_up(dec!(23.075)), dec!(23.08));
/// assert_eq!(round_half_up(dec!(-63.005)), dec!(-63.01)); // Away from zero
/// ```
pub fn round_half_up(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, rust_decimal::RoundingStrategy::MidpointAwayFromZero)
}

/// Returns the maximum of two decimal values.
///
/// ```
/// use rust_decimal_macros::dec;
/// use pricing_core::calculations::common::max;
///
/// assert_eq!(max(dec!(-12.50), dec!(0)), dec!(0));
/// ```
pub fn max(
    a: Decimal,
    b: Decimal,
) -> Decimal {
    if a > b { a } else { b }
}

/// Converts a percentage as typed by a user (`30` for 30%) to a fraction.
///
/// ```
/// use rust_decimal_macros::dec;
/// use pricing_core::calculations::common::percent_to_rate;
///
/// assert_eq!(percent_to_rate(dec!(21)), dec!(0.21));
/// ```
pub fn percent_to_rate(percent: Decimal) -> Decimal {
    percent / HUNDRED
}

/// Divides `numerator` by `denominator`, yielding zero for a zero denominator
/// and `None` when the quotient is out of the decimal range.
///
/// ```
/// use rust_decimal::Decimal;
/// use rust_decimal_macros::dec;
/// use pricing_core::calculations::common::ratio_or_zero;
///
/// assert_eq!(ratio_or_zero(dec!(10), dec!(4)), Some(dec!(2.5)));
/// assert_eq!(ratio_or_zero(dec!(10), dec!(0)), Some(dec!(0)));
/// assert_eq!(ratio_or_zero(Decimal::MAX, dec!(0.01)), None);
/// ```
pub fn ratio_or_zero(
    numerator: Decimal,
    denominator: Decimal,
) -> Option<Decimal> {
    if denominator.is_zero() {
        Some(Decimal::ZERO)
    } else {
        numerator.checked_div(denominator)
    }
}

/// `part` as a percentage of `whole`, rounded to two decimals; zero when
/// `whole` is zero, `None` when the percentage is out of range.
///
/// ```
/// use rust_decimal_macros::dec;
/// use pricing_core::calculations::common::percentage_of;
///
/// assert_eq!(percentage_of(dec!(300), dec!(1300)), Some(dec!(23.08)));
/// assert_eq!(percentage_of(dec!(300), dec!(0)), Some(dec!(0)));
/// ```
pub fn percentage_of(
    part: Decimal,
    whole: Decimal,
) -> Option<Decimal> {
    ratio_or_zero(part, whole)?
        .checked_mul(HUNDRED)
        .map(round_half_up)
}

//! Conversion between user-facing decimal amounts and base-unit integers.
//!
//! Values fed into a transaction always go through [`parse_amount`], which is
//! exact. [`format_amount`] is for display only.

use crate::U256;

/// Number of decimals between the base unit and the displayed asset unit.
pub const BASE_UNIT_DECIMALS: usize = 18;

/// Why a decimal amount could not be converted to base units.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AmountError {
    /// Nothing was entered
    #[error("amount is empty")]
    Empty,
    /// The input contains something other than digits and one decimal point
    #[error("amount is not a decimal number")]
    NotNumeric,
    /// A leading minus sign
    #[error("amount must not be negative")]
    Negative,
    /// Parses to zero
    #[error("amount must be greater than zero")]
    Zero,
    /// More fractional digits than the base unit can represent
    #[error("amount has more than 18 fractional digits")]
    TooPrecise,
    /// Does not fit into 256 bits once scaled
    #[error("amount is too large")]
    Overflow,
}

fn base_unit_scale() -> U256 {
    U256::exp10(BASE_UNIT_DECIMALS)
}

/// Convert a decimal amount such as `"0.5"` to base units
/// (`500000000000000000`). Rejects anything that cannot be represented
/// exactly and anything not strictly positive.
pub fn parse_amount(input: &str) -> Result<U256, AmountError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(AmountError::Empty);
    }
    if input.starts_with('-') {
        return Err(AmountError::Negative);
    }
    let input = input.strip_prefix('+').unwrap_or(input);

    let (whole, fraction) = match input.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (input, ""),
    };
    if whole.is_empty() && fraction.is_empty() {
        return Err(AmountError::NotNumeric);
    }
    if !whole.chars().chain(fraction.chars()).all(|c| c.is_ascii_digit()) {
        return Err(AmountError::NotNumeric);
    }

    let fraction = fraction.trim_end_matches('0');
    if fraction.len() > BASE_UNIT_DECIMALS {
        return Err(AmountError::TooPrecise);
    }

    let whole = if whole.is_empty() {
        U256::zero()
    } else {
        U256::from_dec_str(whole).map_err(|_| AmountError::Overflow)?
    };
    let fraction = if fraction.is_empty() {
        U256::zero()
    } else {
        let padded = format!("{fraction:0<width$}", width = BASE_UNIT_DECIMALS);
        U256::from_dec_str(&padded).map_err(|_| AmountError::Overflow)?
    };

    let value = whole
        .checked_mul(base_unit_scale())
        .and_then(|scaled| scaled.checked_add(fraction))
        .ok_or(AmountError::Overflow)?;
    if value.is_zero() {
        return Err(AmountError::Zero);
    }
    Ok(value)
}

/// Render a base-unit amount as a decimal string, e.g. `1.0` or `0.25`.
pub fn format_amount(value: U256) -> String {
    let (whole, fraction) = value.div_mod(base_unit_scale());
    let fraction = format!("{:0>width$}", fraction.to_string(), width = BASE_UNIT_DECIMALS);
    let fraction = fraction.trim_end_matches('0');
    if fraction.is_empty() {
        format!("{whole}.0")
    } else {
        format!("{whole}.{fraction}")
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn units(s: &str) -> U256 {
        U256::from_dec_str(s).unwrap()
    }

    #[test]
    fn parses_fractional_amounts_exactly() {
        assert_eq!(parse_amount("0.5").unwrap(), units("500000000000000000"));
        assert_eq!(parse_amount("1").unwrap(), units("1000000000000000000"));
        assert_eq!(parse_amount(".25").unwrap(), units("250000000000000000"));
        assert_eq!(parse_amount("12.").unwrap(), units("12000000000000000000"));
        assert_eq!(parse_amount("0.000000000000000001").unwrap(), U256::one());
        assert_eq!(
            parse_amount("123456789.123456789123456789").unwrap(),
            units("123456789123456789123456789")
        );
    }

    #[test]
    fn trailing_zeros_do_not_count_as_precision() {
        assert_eq!(
            parse_amount("1.0000000000000000000000").unwrap(),
            units("1000000000000000000")
        );
    }

    #[test]
    fn rejects_bad_input() {
        assert_eq!(parse_amount(""), Err(AmountError::Empty));
        assert_eq!(parse_amount("   "), Err(AmountError::Empty));
        assert_eq!(parse_amount("-5"), Err(AmountError::Negative));
        assert_eq!(parse_amount("0"), Err(AmountError::Zero));
        assert_eq!(parse_amount("0.000"), Err(AmountError::Zero));
        assert_eq!(parse_amount("abc"), Err(AmountError::NotNumeric));
        assert_eq!(parse_amount("1.2.3"), Err(AmountError::NotNumeric));
        assert_eq!(parse_amount("1e18"), Err(AmountError::NotNumeric));
        assert_eq!(parse_amount("."), Err(AmountError::NotNumeric));
        assert_eq!(
            parse_amount("0.0000000000000000001"),
            Err(AmountError::TooPrecise)
        );
        assert_eq!(parse_amount(&"9".repeat(80)), Err(AmountError::Overflow));
    }

    #[test]
    fn formats_for_display() {
        assert_eq!(format_amount(U256::zero()), "0.0");
        assert_eq!(format_amount(units("500000000000000000")), "0.5");
        assert_eq!(format_amount(units("3000000000000000000")), "3.0");
        assert_eq!(format_amount(U256::one()), "0.000000000000000001");
    }
}

//! Decimal-string amount scaling shared by the native and contract
//! transaction builders. Amounts on the wire are big-endian unsigned
//! integer byte strings; this module is the only place decimal points
//! are allowed to exist.

use crate::error::AdapterError;
use num_bigint::BigUint;

/// Parses a decimal string like `"5.00000000"` into its scaled integer
/// value at `decimals` fractional digits.
pub fn parse_decimal(input: &str, decimals: u32) -> Result<BigUint, AdapterError> {
    let (whole, frac) = match input.split_once('.') {
        Some((w, f)) => (w, f),
        None => (input, ""),
    };
    if frac.len() > decimals as usize {
        return Err(AdapterError::AbiInvalid(format!(
            "amount {input} has more than {decimals} fractional digits"
        )));
    }
    let mut digits = String::with_capacity(whole.len() + decimals as usize);
    digits.push_str(if whole.is_empty() { "0" } else { whole });
    digits.push_str(frac);
    for _ in 0..(decimals as usize - frac.len()) {
        digits.push('0');
    }
    digits
        .parse::<BigUint>()
        .map_err(|e| AdapterError::AbiInvalid(format!("invalid amount {input}: {e}")))
}

/// Formats a scaled integer value back into a decimal string with
/// exactly `decimals` fractional digits.
pub fn format_amount(value: &BigUint, decimals: u32) -> String {
    let digits = value.to_str_radix(10);
    let decimals = decimals as usize;
    if digits.len() <= decimals {
        let padded = format!("{:0>width$}", digits, width = decimals + 1);
        let split = padded.len() - decimals;
        format!("{}.{}", &padded[..split], &padded[split..])
    } else {
        let split = digits.len() - decimals;
        format!("{}.{}", &digits[..split], &digits[split..])
    }
}

pub fn to_amount_bytes(value: &BigUint) -> Vec<u8> {
    value.to_bytes_be()
}

pub fn from_amount_bytes(bytes: &[u8]) -> BigUint {
    BigUint::from_bytes_be(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_formats_round_trip() {
        let amount = parse_decimal("5.00000000", 8).unwrap();
        assert_eq!(format_amount(&amount, 8), "5.00000000");
    }

    #[test]
    fn parses_without_fraction() {
        let amount = parse_decimal("12", 8).unwrap();
        assert_eq!(amount, BigUint::from(1_200_000_000u64));
    }

    #[test]
    fn rejects_excess_precision() {
        let err = parse_decimal("1.123456789", 8).unwrap_err();
        assert!(matches!(err, AdapterError::AbiInvalid(_)));
    }

    #[test]
    fn formats_small_values_with_leading_zero() {
        let amount = BigUint::from(7u64);
        assert_eq!(format_amount(&amount, 8), "0.00000007");
    }
}

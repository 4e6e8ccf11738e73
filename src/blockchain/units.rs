// src/blockchain/units.rs

use anyhow::{anyhow, Result};
use ethers_core::types::U256;

/// Decimals of the chain's native currency (wei -> ether).
pub const NATIVE_DECIMALS: u32 = 18;

/// Formats an integer amount as a fixed-point decimal string.
///
/// Trailing fractional zeros are trimmed, keeping at least one digit after
/// the point (`1000000000000000000` with 18 decimals is `"1.0"`). With zero
/// decimals the bare integer is returned. Works on the decimal digits, so any
/// decimals count is accepted.
pub fn format_units(value: U256, decimals: u32) -> String {
    let digits = value.to_string();
    if decimals == 0 {
        return digits;
    }
    let decimals = decimals as usize;
    let padded = format!("{:0>width$}", digits, width = decimals + 1);
    let (integer, fraction) = padded.split_at(padded.len() - decimals);
    let trimmed = fraction.trim_end_matches('0');
    let fraction = if trimmed.is_empty() { "0" } else { trimmed };

    format!("{}.{}", integer, fraction)
}

/// Parses a base-10 integer string (as found in `raw_amount`) and formats it.
pub fn format_raw_amount(raw: &str, decimals: u32) -> Result<String> {
    let value = U256::from_dec_str(raw.trim())
        .map_err(|e| anyhow!("invalid raw amount '{}': {}", raw, e))?;
    Ok(format_units(value, decimals))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whole_token() {
        let one = U256::exp10(18);
        assert_eq!(format_units(one, 18), "1.0");
    }

    #[test]
    fn test_fractional_amounts() {
        assert_eq!(format_units(U256::from(1_500_000u64), 6), "1.5");
        assert_eq!(format_units(U256::from(1u64), 18), "0.000000000000000001");
        assert_eq!(format_units(U256::zero(), 18), "0.0");
        assert_eq!(format_units(U256::from(123_456u64), 2), "1234.56");
    }

    #[test]
    fn test_zero_decimals_is_plain_integer() {
        assert_eq!(format_units(U256::from(7u64), 0), "7");
    }

    #[test]
    fn test_raw_amount_parsing() {
        assert_eq!(format_raw_amount("1000000000000000000", 18).unwrap(), "1.0");
        assert!(format_raw_amount("0x10", 18).is_err());
    }

    #[test]
    fn test_decimals_beyond_u256_range() {
        let formatted = format_raw_amount("5", 80).unwrap();
        assert_eq!(formatted, format!("0.{}5", "0".repeat(79)));
        assert_eq!(format_units(U256::from(1234u64), 3), "1.234");
        assert_eq!(format_units(U256::MAX, 77), format!("1.{}", &U256::MAX.to_string()[1..]));
    }
}

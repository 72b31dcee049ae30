//! Display helpers for table output.

use alloy::primitives::Address;
use num_bigint::BigUint;

/// Renders a base-unit amount with `decimals` decimal places, trimming
/// trailing zeros but keeping at least two.
pub fn format_units(value: &BigUint, decimals: u8) -> String {
    if decimals == 0 {
        return value.to_string();
    }

    let divisor = BigUint::from(10u32).pow(u32::from(decimals));
    let integer_part = value / &divisor;
    let fractional_part = value % &divisor;

    let frac_str = format!("{:0>width$}", fractional_part, width = decimals as usize);
    let trimmed = frac_str.trim_end_matches('0');
    let keep = trimmed.len().max(2.min(frac_str.len()));

    format!("{integer_part}.{}", &frac_str[..keep])
}

/// Shortens an address for compact tables.
pub fn short_address(address: &Address) -> String {
    let full = format!("{address:#x}");
    format!("{}…{}", &full[..8], &full[full.len() - 4..])
}

/// Relative error as a signed percentage.
pub fn format_error_pct(relative_error: f64) -> String {
    format!("{:+.4}%", relative_error * 100.0)
}

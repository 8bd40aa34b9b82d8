//! The single place where amounts cross the integer-units/display-float
//! boundary. Every call site scales through these functions exactly once;
//! the token's own declared decimals are authoritative, with the native
//! coin fixed at [`NATIVE_DECIMALS`].

use ruint::Uint;
use ruint::aliases::U256;
use thiserror::Error;

pub const NATIVE_DECIMALS: u8 = 18;

#[derive(Debug, Error, PartialEq)]
pub enum UnitsError {
    #[error("Unparseable amount: {0}")]
    UnparseableAmount(String),

    #[error("Amount {0} exceeds {1} decimal places")]
    ExcessPrecision(String, u8),
}

/// Integer base-unit amount (as returned by upstream APIs) to display float.
/// Unparseable input degrades to 0.0 rather than failing the whole view.
pub fn to_display_amount(raw: &str, decimals: u8) -> f64 {
    let raw: f64 = raw.parse().unwrap_or(0.0);
    raw / 10f64.powi(decimals as i32)
}

/// Display decimal string ("1.5") to base units ("1500000" for 6 decimals).
/// Rejects anything that is not a plain non-negative decimal number.
pub fn to_base_units(amount: &str, decimals: u8) -> Result<U256, UnitsError> {
    let amount = amount.trim();
    if amount.is_empty() {
        return Err(UnitsError::UnparseableAmount(amount.to_string()));
    }

    let (int_part, frac_part) = match amount.split_once('.') {
        Some((i, f)) => (i, f),
        None => (amount, ""),
    };

    if !int_part.chars().all(|c| c.is_ascii_digit())
        || !frac_part.chars().all(|c| c.is_ascii_digit())
        || (int_part.is_empty() && frac_part.is_empty())
    {
        return Err(UnitsError::UnparseableAmount(amount.to_string()));
    }

    if frac_part.len() > decimals as usize {
        return Err(UnitsError::ExcessPrecision(amount.to_string(), decimals));
    }

    let int_units = if int_part.is_empty() {
        U256::ZERO
    } else {
        U256::from_str_radix(int_part, 10)
            .map_err(|_| UnitsError::UnparseableAmount(amount.to_string()))?
            * Uint::from(10).pow(Uint::from(decimals))
    };

    let frac_units = if frac_part.is_empty() {
        U256::ZERO
    } else {
        U256::from_str_radix(frac_part, 10)
            .map_err(|_| UnitsError::UnparseableAmount(amount.to_string()))?
            * Uint::from(10).pow(Uint::from(decimals as usize - frac_part.len()))
    };

    Ok(int_units + frac_units)
}

#[cfg(test)]
mod tests {
    use ruint::Uint;

    use super::*;

    #[test]
    fn test_to_display_amount_uses_declared_decimals() {
        assert_eq!(to_display_amount("1000000", 6), 1.0);
        assert_eq!(to_display_amount("1000000", 18), 1e-12);
        assert_eq!(to_display_amount("2500000000000000000", 18), 2.5);
    }

    #[test]
    fn test_to_display_amount_degrades_on_garbage() {
        assert_eq!(to_display_amount("not-a-number", 18), 0.0);
    }

    #[test]
    fn test_to_base_units() {
        assert_eq!(to_base_units("1.5", 6).unwrap(), Uint::from(1500000));
        assert_eq!(to_base_units("1", 18).unwrap(), Uint::from(10).pow(Uint::from(18)));
        assert_eq!(to_base_units("0.5", 6).unwrap(), Uint::from(500000));
        assert_eq!(to_base_units(".5", 6).unwrap(), Uint::from(500000));
        assert_eq!(to_base_units("0", 6).unwrap(), U256::ZERO);
    }

    #[test]
    fn test_to_base_units_rejects_malformed_input() {
        assert!(to_base_units("", 6).is_err());
        assert!(to_base_units("abc", 6).is_err());
        assert!(to_base_units("-1", 6).is_err());
        assert!(to_base_units("1.2.3", 6).is_err());
        assert_eq!(
            to_base_units("0.1234567", 6).unwrap_err(),
            UnitsError::ExcessPrecision("0.1234567".to_string(), 6)
        );
    }
}

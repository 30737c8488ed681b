//! Parsing of quantity and price text typed by the user.
//!
//! Both normalizers are total: anything unparseable, empty, non-finite or
//! negative comes back as zero. Whether a zero is acceptable is decided later
//! by the draft validator, which looks at the raw text.

use regex::Regex;
use std::sync::LazyLock;

static INT_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*([+-]?\d+)").expect("integer prefix pattern"));

static DECIMAL_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?)").expect("decimal prefix pattern")
});

/// Leading integer of `raw` (`"3 pcs"` is 3), floored at zero.
pub fn normalize_quantity(raw: &str) -> u64 {
    INT_PREFIX
        .captures(raw)
        .and_then(|caps| caps[1].parse::<i128>().ok())
        .map(|n| n.clamp(0, u64::MAX as i128) as u64)
        .unwrap_or(0)
}

/// Leading decimal number of `raw` (`"2.5€"` is 2.5), floored at zero.
pub fn normalize_price(raw: &str) -> f64 {
    DECIMAL_PREFIX
        .captures(raw)
        .and_then(|caps| caps[1].parse::<f64>().ok())
        .map(|n| normalize_amount(Some(n)))
        .unwrap_or(0.0)
}

/// Zero-fallback for amounts coming from optional server fields.
pub fn normalize_amount(value: Option<f64>) -> f64 {
    match value {
        Some(n) if n.is_finite() && n > 0.0 => n,
        _ => 0.0,
    }
}

/// Parses a price without the zero fallback. `None` when the text holds no
/// number at all or the number is not finite.
pub(crate) fn parse_price(raw: &str) -> Option<f64> {
    DECIMAL_PREFIX
        .captures(raw)
        .and_then(|caps| caps[1].parse::<f64>().ok())
        .filter(|n| n.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantity_takes_integer_prefix() {
        assert_eq!(normalize_quantity("3"), 3);
        assert_eq!(normalize_quantity("  12 pcs"), 12);
        assert_eq!(normalize_quantity("2.9"), 2);
        assert_eq!(normalize_quantity("+4"), 4);
    }

    #[test]
    fn quantity_falls_back_to_zero() {
        assert_eq!(normalize_quantity(""), 0);
        assert_eq!(normalize_quantity("abc"), 0);
        assert_eq!(normalize_quantity("-5"), 0);
        assert_eq!(normalize_quantity("NaN"), 0);
    }

    #[test]
    fn price_takes_decimal_prefix() {
        assert_eq!(normalize_price("500"), 500.0);
        assert_eq!(normalize_price("2.5€"), 2.5);
        assert_eq!(normalize_price(".5"), 0.5);
        assert_eq!(normalize_price("1e3"), 1000.0);
    }

    #[test]
    fn price_falls_back_to_zero() {
        assert_eq!(normalize_price(""), 0.0);
        assert_eq!(normalize_price("free"), 0.0);
        assert_eq!(normalize_price("-10"), 0.0);
        assert_eq!(normalize_price("1e999"), 0.0);
    }

    #[test]
    fn amount_treats_missing_and_nan_as_zero() {
        assert_eq!(normalize_amount(None), 0.0);
        assert_eq!(normalize_amount(Some(f64::NAN)), 0.0);
        assert_eq!(normalize_amount(Some(-3.0)), 0.0);
        assert_eq!(normalize_amount(Some(42.0)), 42.0);
    }

    #[test]
    fn parse_price_keeps_sign() {
        assert_eq!(parse_price("-2"), Some(-2.0));
        assert_eq!(parse_price("   "), None);
    }
}

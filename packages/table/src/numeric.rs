//! Total numeric coercion for cell text.
//!
//! Every function here maps arbitrary text to `Some(number)` or `None`;
//! none of them can fail. Thousands separators (`,`) are stripped before
//! parsing, so `"1,250"` is `1250`.

/// Removes thousands separators and surrounding whitespace.
#[must_use]
pub fn strip_thousands(raw: &str) -> String {
    raw.trim().replace(',', "")
}

/// Parses cell text as a finite float.
#[must_use]
pub fn coerce_f64(raw: &str) -> Option<f64> {
    let value = strip_thousands(raw).parse::<f64>().ok()?;
    value.is_finite().then_some(value)
}

/// Parses cell text as an integer.
///
/// Integral floats (`"1250.0"`) are accepted; fractional values are not.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub fn coerce_i64(raw: &str) -> Option<i64> {
    let stripped = strip_thousands(raw);
    if let Ok(value) = stripped.parse::<i64>() {
        return Some(value);
    }

    let value = stripped.parse::<f64>().ok()?;
    if value.is_finite() && value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        Some(value as i64)
    } else {
        None
    }
}

/// Parses a game management unit number.
///
/// Only plain digit strings are units (`"007"` is unit 7); anything else,
/// including `"N/A"` and the empty string, is not.
#[must_use]
pub fn parse_unit(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    trimmed.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_thousands_separators() {
        assert_eq!(coerce_i64("1,250"), Some(1250));
        assert_eq!(coerce_i64(" 12,345,678 "), Some(12_345_678));
        assert_eq!(coerce_f64("1,250.5"), Some(1250.5));
    }

    #[test]
    fn unparseable_text_is_none() {
        for raw in ["", "N/A", "-", "abc", "12*", "nan", "inf"] {
            assert_eq!(coerce_f64(raw), None, "{raw:?}");
            assert_eq!(coerce_i64(raw), None, "{raw:?}");
        }
    }

    #[test]
    fn integral_floats_become_integers() {
        assert_eq!(coerce_i64("1250.0"), Some(1250));
        assert_eq!(coerce_i64("12.5"), None);
    }

    #[test]
    fn ratios_parse_as_floats() {
        assert_eq!(coerce_f64("18"), Some(18.0));
        assert_eq!(coerce_f64("0"), Some(0.0));
    }

    #[test]
    fn unit_numbers() {
        assert_eq!(parse_unit("007"), Some(7));
        assert_eq!(parse_unit(" 12 "), Some(12));
        assert_eq!(parse_unit("000"), Some(0));
        assert_eq!(parse_unit("N/A"), None);
        assert_eq!(parse_unit("7a"), None);
        assert_eq!(parse_unit(""), None);
        assert_eq!(parse_unit("-3"), None);
    }
}

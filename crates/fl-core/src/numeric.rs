use crate::{CoreError, CoreResult};

/// Floating point type used for every block value.
pub type Real = f64;

/// Comparison tolerances for the `equals` family of filters.
#[derive(Clone, Copy, Debug)]
pub struct Tolerances {
    pub abs: Real,
    pub rel: Real,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            abs: 1e-12,
            rel: 1e-9,
        }
    }
}

pub fn nearly_equal(a: Real, b: Real, tol: Tolerances) -> bool {
    let diff = (a - b).abs();
    if diff <= tol.abs {
        return true;
    }
    diff <= tol.rel * a.abs().max(b.abs())
}

pub fn ensure_finite(v: Real, what: &'static str) -> CoreResult<Real> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(CoreError::NonFinite { what, value: v })
    }
}

/// Round a value for on-block display.
///
/// Larger magnitudes get fewer decimals: whole numbers above 10000, one decimal
/// above 1000, two above 100, three otherwise.
pub fn round_for_display(v: Real) -> Real {
    let scale = if v > 10_000.0 {
        1.0
    } else if v > 1_000.0 {
        10.0
    } else if v > 100.0 {
        100.0
    } else {
        1_000.0
    };
    (v * scale).round() / scale
}

/// Parse user-entered numeric text after stripping everything that is not a
/// digit or a decimal point. Returns `None` when nothing parseable remains.
pub fn parse_lenient(text: &str) -> Option<Real> {
    let stripped: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    if stripped.is_empty() {
        return None;
    }
    stripped
        .parse::<Real>()
        .ok()
        .and_then(|v| ensure_finite(v, "entry").ok())
}

/// Parse the longest leading decimal number (optional sign, digits, one
/// decimal point, optional exponent), ignoring leading whitespace and any
/// trailing text. `"12.5kg"` gives 12.5; `"kg"` gives `None`.
pub fn parse_leading_number(text: &str) -> Option<Real> {
    let s = text.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }
    let mut digits = 0;
    let mut seen_dot = false;
    while let Some(&c) = bytes.get(end) {
        if c.is_ascii_digit() {
            digits += 1;
        } else if c == b'.' && !seen_dot {
            seen_dot = true;
        } else {
            break;
        }
        end += 1;
    }
    if digits == 0 {
        return None;
    }
    // Exponent only counts if followed by at least one digit
    if matches!(bytes.get(end), Some(b'e') | Some(b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+') | Some(b'-')) {
            exp_end += 1;
        }
        if bytes.get(exp_end).is_some_and(u8::is_ascii_digit) {
            while bytes.get(exp_end).is_some_and(u8::is_ascii_digit) {
                exp_end += 1;
            }
            end = exp_end;
        }
    }
    s[..end]
        .parse::<Real>()
        .ok()
        .and_then(|v| ensure_finite(v, "entry").ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nearly_equal_basic() {
        let tol = Tolerances {
            abs: 1e-12,
            rel: 1e-9,
        };
        assert!(nearly_equal(1.0, 1.0 + 1e-12, tol));
        assert!(nearly_equal(0.0, 1e-13, tol));
        assert!(!nearly_equal(1.0, 1.0 + 1e-6, tol));
    }

    #[test]
    fn ensure_finite_detects_nan() {
        let err = ensure_finite(Real::NAN, "test").unwrap_err();
        let msg = format!("{err}");
        assert!(msg.contains("Non-finite"));
    }

    #[test]
    fn display_rounding_bands() {
        assert_eq!(round_for_display(12_345.67), 12_346.0);
        assert_eq!(round_for_display(1_234.56), 1_234.6);
        assert_eq!(round_for_display(123.456), 123.46);
        assert_eq!(round_for_display(21.12345), 21.123);
    }

    #[test]
    fn lenient_parse_strips_junk() {
        assert_eq!(parse_lenient("12abc"), Some(12.0));
        assert_eq!(parse_lenient(" 3.5 s"), Some(3.5));
        assert_eq!(parse_lenient("abc"), None);
        assert_eq!(parse_lenient(""), None);
        assert_eq!(parse_lenient("1.2.3"), None);
    }

    #[test]
    fn leading_number_prefix() {
        assert_eq!(parse_leading_number("12.5kg"), Some(12.5));
        assert_eq!(parse_leading_number("  -3"), Some(-3.0));
        assert_eq!(parse_leading_number(".5"), Some(0.5));
        assert_eq!(parse_leading_number("1e3x"), Some(1000.0));
        assert_eq!(parse_leading_number("2e"), Some(2.0));
        assert_eq!(parse_leading_number("kg"), None);
        assert_eq!(parse_leading_number("-"), None);
        assert_eq!(parse_leading_number(""), None);
    }

    proptest::proptest! {
        #[test]
        fn rounding_is_stable(v in -1e7f64..1e7) {
            let once = round_for_display(v);
            proptest::prop_assert_eq!(round_for_display(once), once);
        }

        #[test]
        fn leading_number_reads_formatted_values(v in -1e6f64..1e6) {
            let text = format!("{v}units");
            proptest::prop_assert_eq!(parse_leading_number(&text), Some(v));
        }
    }
}

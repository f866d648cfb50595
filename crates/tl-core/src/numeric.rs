use crate::TlError;

/// Floating point type used throughout system
pub type Real = f64;

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, TlError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(TlError::NonFinite { what, value: v })
    }
}

/// Parse operator-entered text into a finite number.
///
/// Surrounding whitespace is ignored. A decimal comma is accepted
/// (`"0,5"` reads as `0.5`) since tuning values are often typed that way.
pub fn parse_finite(input: &str, what: &'static str) -> Result<Real, TlError> {
    let trimmed = input.trim();
    let normalized = if trimmed.contains(',') && !trimmed.contains('.') {
        trimmed.replacen(',', ".", 1)
    } else {
        trimmed.to_string()
    };
    let value: Real = normalized.parse().map_err(|_| TlError::Malformed {
        what,
        input: input.to_string(),
    })?;
    ensure_finite(value, what)
}

/// Clamp `v` into `[min, max]`. NaN saturates to `min`.
#[inline]
pub fn saturate(v: Real, min: Real, max: Real) -> Real {
    if v.is_nan() { min } else { v.clamp(min, max) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_finite_detects_nan() {
        let err = ensure_finite(Real::NAN, "test").unwrap_err();
        let msg = format!("{err}");
        assert!(msg.contains("Non-finite"));
    }

    #[test]
    fn parse_finite_accepts_plain_and_comma_decimals() {
        assert_eq!(parse_finite("2", "kp").unwrap(), 2.0);
        assert_eq!(parse_finite(" 0.5 ", "ki").unwrap(), 0.5);
        assert_eq!(parse_finite("0,1", "kd").unwrap(), 0.1);
        assert_eq!(parse_finite("-3e1", "sp").unwrap(), -30.0);
    }

    #[test]
    fn parse_finite_rejects_garbage() {
        assert!(matches!(
            parse_finite("abc", "kp"),
            Err(TlError::Malformed { what: "kp", .. })
        ));
        assert!(parse_finite("", "kp").is_err());
        assert!(parse_finite("1.2.3", "kp").is_err());
        assert!(matches!(
            parse_finite("inf", "kp"),
            Err(TlError::NonFinite { .. })
        ));
        assert!(parse_finite("NaN", "kp").is_err());
    }

    #[test]
    fn saturate_clamps_and_absorbs_nan() {
        assert_eq!(saturate(150.0, 0.0, 100.0), 100.0);
        assert_eq!(saturate(-1.0, 0.0, 100.0), 0.0);
        assert_eq!(saturate(42.0, 0.0, 100.0), 42.0);
        assert_eq!(saturate(Real::NAN, 10.0, 100.0), 10.0);
    }
}

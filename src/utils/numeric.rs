use crate::utils::constants::MISSING_SENTINEL;

/// Parse a raw cell as a number; blank cells and text are absent
pub fn parse_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Drop the `-999.0` missing-value sentinel
pub fn without_sentinel(value: f64) -> Option<f64> {
    if value == MISSING_SENTINEL {
        None
    } else {
        Some(value)
    }
}

/// Zero-pad a calendar component to `width` digits.
///
/// Numeric storage may have stripped leading zeros (`6`) or added a
/// fractional part (`6.0`); both become `06` for width 2. Non-numeric
/// values are returned trimmed and unpadded so the later parse fails.
pub fn zero_pad(raw: &str, width: usize) -> String {
    let trimmed = raw.trim();

    let whole = trimmed.parse::<i64>().ok().or_else(|| {
        trimmed
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite() && v.fract() == 0.0)
            .map(|v| v as i64)
    });

    match whole {
        Some(value) if value >= 0 => format!("{:0width$}", value, width = width),
        _ => trimmed.to_string(),
    }
}

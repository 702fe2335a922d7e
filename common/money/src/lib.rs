use bigdecimal::{BigDecimal, ToPrimitive};

/// Normalize a stored monetary value to 2 decimal places.
/// with_scale truncates/extends with zeros, matching NUMERIC(10,2) columns.
pub fn normalize_2dp(value: &BigDecimal) -> BigDecimal {
    value.with_scale(2)
}

/// Round a computed monetary amount (tax, line totals) half-up to 2 decimal
/// places. with_scale truncates toward zero, so nudging the value half a cent
/// away from zero first turns that truncation into half-up rounding.
pub fn round_half_up_2dp(value: &BigDecimal) -> BigDecimal {
    let half_cent = BigDecimal::from(5) / BigDecimal::from(1000);
    let adjusted = if *value < BigDecimal::from(0) {
        value.clone() - half_cent
    } else {
        value.clone() + half_cent
    };
    adjusted.with_scale(2)
}

/// Render an amount in the API's 2-decimal string form, e.g. "6.48".
pub fn display_2dp(value: &BigDecimal) -> String {
    round_half_up_2dp(value).to_string()
}

/// Convert to f64 for JSON number fields. Catalog prices fit NUMERIC(10,2),
/// well inside f64's exact range, so the conversion is safe for our values.
pub fn to_f64_lossy(value: &BigDecimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}

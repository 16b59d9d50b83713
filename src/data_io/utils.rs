/// Utility functions for interpreting gridded input metadata

/// Seconds per day, used when converting CF time units
const SECONDS_PER_DAY: f64 = 86400.0;

/// Length of one unit of a CF-style time axis, in days.
///
/// Only the leading unit word of strings like `"hours since 1979-01-01"` is
/// used. Returns `None` for unrecognised units so the caller can decide on a
/// fallback.
pub fn time_unit_in_days(units: &str) -> Option<f64> {
    let unit = units.split_whitespace().next()?.to_lowercase();
    match unit.as_str() {
        "days" | "day" | "d" => Some(1.0),
        "hours" | "hour" | "hrs" | "hr" | "h" => Some(3600.0 / SECONDS_PER_DAY),
        "minutes" | "minute" | "mins" | "min" => Some(60.0 / SECONDS_PER_DAY),
        "seconds" | "second" | "secs" | "sec" | "s" => Some(1.0 / SECONDS_PER_DAY),
        _ => None,
    }
}

/// Validate dimension ordering for the raw input fields.
/// Expected order: [time, plev, lat, lon]
pub fn validate_field_dimensions(name: &str, dimensions: &[String]) -> Result<(), String> {
    if dimensions.len() != 4 {
        return Err(format!(
            "Variable {} has {} dimensions, expected 4 (time, plev, lat, lon)",
            name,
            dimensions.len()
        ));
    }
    Ok(())
}

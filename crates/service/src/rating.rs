//! Rating aggregation over a worker's rating sequence.

/// Arithmetic mean rounded to two decimals; `0.0` for an empty sequence.
pub fn average(values: &[i16]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let sum: i64 = values.iter().map(|v| i64::from(*v)).sum();
    let mean = sum as f64 / values.len() as f64;
    (mean * 100.0).round() / 100.0
}

pub fn validate(value: i16) -> Result<(), crate::errors::ServiceError> {
    models::user_rating::validate_value(value).map_err(Into::into)
}

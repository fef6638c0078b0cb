//! Validation utilities for stock queries

/// Parse the low-stock threshold query parameter.
///
/// The threshold has no default: a missing, empty or non-integer value is
/// rejected before any data is read.
pub fn parse_threshold(raw: Option<&str>) -> Result<i64, &'static str> {
    let raw = match raw.map(str::trim) {
        None | Some("") => return Err("Missing threshold parameter"),
        Some(value) => value,
    };
    raw.parse::<i64>()
        .map_err(|_| "Threshold must be an integer")
}

/// Parse the optional category filter of product listings.
///
/// A missing or blank value means no filter.
pub fn parse_category_id(raw: Option<&str>) -> Result<Option<i64>, &'static str> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value
            .parse::<i64>()
            .map(Some)
            .map_err(|_| "Category id must be an integer"),
    }
}

/// Validate a movement quantity (detail lines never carry negative counts)
pub fn validate_quantity(quantity: i32) -> Result<(), &'static str> {
    if quantity < 0 {
        return Err("Quantity cannot be negative");
    }
    Ok(())
}

//! Shared primitive types used across the reporting core.

/// Opaque identifier of a parent trip record.
pub type TripId = String;

/// Identifier into a type-specific source table.
pub type RefId = String;

/// Currency in the smallest subunit. All fare arithmetic stays in paise;
/// conversion to major units happens only in `format_paise`.
pub type Paise = i64;

/// Render paise as a major-unit string with two decimals (`50000` -> `"500.00"`).
pub fn format_paise(amount: Paise) -> String {
    let sign = if amount < 0 { "-" } else { "" };
    let abs = amount.unsigned_abs();
    format!("{sign}{}.{:02}", abs / 100, abs % 100)
}

/// `numerator / denominator * 100`, or exactly `0.0` when the denominator is zero.
pub fn percentage(numerator: i64, denominator: i64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        (numerator as f64 / denominator as f64) * 100.0
    }
}

/// Plain ratio with the same zero-denominator rule as `percentage`.
pub fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

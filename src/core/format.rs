//! Display formatting for amounts, percentages and category names.
//!
//! These helpers are presentation-only. Aggregation always works on the raw `f64`
//! amounts; formatting is applied to the results.

/// Formats an amount as Indonesian rupiah with no fractional digits.
///
/// Uses `.` as the thousands separator, e.g. `Rp 1.500.000` or `-Rp 50.000`.
#[must_use]
pub fn format_rupiah(amount: f64) -> String {
    // Cast safety: display-only; amounts beyond i64 range are not meaningful here.
    #[allow(clippy::cast_possible_truncation)]
    let rounded = amount.round() as i64;
    let digits = rounded.unsigned_abs().to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    if rounded < 0 {
        format!("-Rp {grouped}")
    } else {
        format!("Rp {grouped}")
    }
}

/// Formats a percentage with one decimal, e.g. `133.3%`.
#[must_use]
pub fn format_percentage(percentage: f64) -> String {
    format!("{percentage:.1}%")
}

/// Turns a stored category value into its report heading: `"sewa-lapangan"` → `"SEWA LAPANGAN"`.
#[must_use]
pub fn category_label(value: &str) -> String {
    value.replace('-', " ").to_uppercase()
}

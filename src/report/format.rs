//! Text formatting for report rows.

use rust_decimal::Decimal;
use time::OffsetDateTime;
use unicode_segmentation::UnicodeSegmentation;

/// The max number of graphemes to display in report rows before truncating
/// and displaying ellipses.
pub const MAX_DESCRIPTION_GRAPHEMES: usize = 30;

/// Format a monetary amount with a dollar sign, thousands separators and
/// two decimal places, e.g. `$1,234.50` or `-$20.00`.
pub fn format_currency(amount: Decimal) -> String {
    let mut magnitude = amount.abs().round_dp(2);
    magnitude.rescale(2);

    let sign = if amount.is_sign_negative() && !magnitude.is_zero() {
        "-"
    } else {
        ""
    };

    let digits = magnitude.to_string();
    let (whole, cents) = digits.split_once('.').unwrap_or((&digits, "00"));

    format!("{sign}${}.{cents}", group_thousands(whole))
}

fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);

    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    grouped
}

/// Shorten `description` to at most [MAX_DESCRIPTION_GRAPHEMES] grapheme clusters.
pub fn truncate_description(description: &str) -> String {
    let description_length = description.graphemes(true).count();

    if description_length <= MAX_DESCRIPTION_GRAPHEMES {
        description.to_owned()
    } else {
        let truncated: String = description
            .graphemes(true)
            .take(MAX_DESCRIPTION_GRAPHEMES - 3)
            .collect();
        truncated + "..."
    }
}

/// Format the calendar date of `date_time` as `YYYY-MM-DD`.
pub fn format_date(date_time: OffsetDateTime) -> String {
    date_time.date().to_string()
}

//! Alert text rendering.

use serde::{Deserialize, Serialize};

use crate::balance::BalanceReading;

/// How a provider's alerts look in a shared chat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertStyle {
    /// Icon prefix, e.g. "⚠️".
    pub marker: String,
    /// Provider name shown in the title.
    pub title: String,
    /// Unit label shown after amounts, e.g. "T" or "IRR".
    pub display_unit: String,
    /// Raw amounts are divided by `10^display_decimals` before display.
    pub display_decimals: u32,
}

/// Format `value / 10^decimals` with `,` thousands separators and at most
/// `decimals` fraction digits, trailing zeros dropped.
///
/// `format_grouped(12_345_670, 1)` is `"1,234,567"`;
/// `format_grouped(12_345, 1)` is `"1,234.5"`.
pub fn format_grouped(value: i64, decimals: u32) -> String {
    let magnitude = value.unsigned_abs();
    let (whole, fraction) = match 10_u64.checked_pow(decimals) {
        Some(scale) => (magnitude / scale, magnitude % scale),
        // every i64 magnitude is below 10^19
        None => (0, magnitude),
    };

    let digits = whole.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 2 + decimals as usize);
    if value < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }

    if fraction > 0 {
        let padded = format!("{:0width$}", fraction, width = decimals as usize);
        out.push('.');
        out.push_str(padded.trim_end_matches('0'));
    }

    out
}

/// Markdown body of a low-balance alert.
pub fn render_low_balance(style: &AlertStyle, reading: &BalanceReading, threshold: i64) -> String {
    let amount = |raw: i64| {
        format!(
            "{} {}",
            format_grouped(raw, style.display_decimals),
            style.display_unit
        )
    };

    format!(
        "*{} {} Wallet Low Balance*\n\n```\nThreshold: {}\nCurrent Balance: {}\nChecked: {}\n```",
        style.marker,
        style.title,
        amount(threshold),
        amount(reading.value),
        reading.observed_at.format("%Y-%m-%d %H:%M UTC"),
    )
}

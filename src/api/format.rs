//! Display strings for the browser UI and the `calc` text summary.

use crate::core::{MAX_MONTHS, PaymentType, PayoffInput, PayoffResult};

/// US-dollar amount with thousands separators, rounded half away from zero.
pub fn format_money(value: f64, decimals: usize) -> String {
    let scale = 10f64.powi(decimals as i32);
    let rounded = (value.abs() * scale).round() / scale;
    let rendered = format!("{rounded:.decimals$}");
    let (whole, fraction) = match rendered.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (rendered.as_str(), None),
    };

    let mut out = String::with_capacity(rendered.len() + whole.len() / 3 + 2);
    if value < 0.0 && rounded > 0.0 {
        out.push('-');
    }
    out.push('$');
    out.push_str(&group_thousands(whole));
    if let Some(fraction) = fraction {
        out.push('.');
        out.push_str(fraction);
    }
    out
}

fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

/// "2 years, 3 months" style, or "50+ years" at the simulation cap.
pub fn format_duration_long(months: u32) -> String {
    if months >= MAX_MONTHS {
        return "50+ years".to_string();
    }
    let (years, rest) = (months / 12, months % 12);
    match (years, rest) {
        (0, _) => format!("{rest} months"),
        (_, 0) => format!("{years} years"),
        _ => format!("{years} years, {rest} months"),
    }
}

/// "2 yr 3 mo" style, or "50+ years" at the simulation cap.
pub fn format_duration_short(months: u32) -> String {
    if months >= MAX_MONTHS {
        return "50+ years".to_string();
    }
    let (years, rest) = (months / 12, months % 12);
    match (years, rest) {
        (0, _) => format!("{rest} mo"),
        (_, 0) => format!("{years} yr"),
        _ => format!("{years} yr {rest} mo"),
    }
}

pub fn show_savings(input: &PayoffInput, result: &PayoffResult) -> bool {
    input.payment_type != PaymentType::Minimum && result.interest_savings > 0.0
}

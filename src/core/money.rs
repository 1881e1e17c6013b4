use num_format::{Buffer, CustomFormat};

/// Formats an amount as en-US dollars with two decimals and comma grouping,
/// e.g. `-$1,234.50`. Only used to build human-readable summaries.
pub fn format_currency(value: f64) -> String {
    if !value.is_finite() {
        return format!("${value}");
    }

    let fixed = format!("{:.2}", value.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let sign = if value < 0.0 { "-" } else { "" };
    format!("{sign}${}.{cents}", group_thousands(whole))
}

fn group_thousands(digits: &str) -> String {
    let Ok(dollars) = digits.parse::<u128>() else {
        return digits.to_string();
    };
    let Ok(format) = CustomFormat::builder().separator(",").build() else {
        return digits.to_string();
    };

    let mut buf = Buffer::new();
    buf.write_formatted(&dollars, &format);
    buf.to_string()
}

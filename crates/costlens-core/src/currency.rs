//! Money formatting by ISO currency code
//!
//! Every entity formats with its own currency code, never a global default.

/// Currencies conventionally displayed without decimal places.
const ZERO_DECIMAL: &[&str] = &["JPY", "KRW", "VND"];

/// Format a monthly cost for display, e.g. `format_cost("USD", 12.5)`
/// yields `"$12.50"`. Unknown codes fall back to a `CODE amount` prefix.
pub fn format_cost(currency: &str, amount: f64) -> String {
    let decimals = if ZERO_DECIMAL.contains(&currency) { 0 } else { 2 };
    let grouped = group_digits(amount.abs(), decimals);

    let body = match symbol(currency) {
        Some(sym) => format!("{sym}{grouped}"),
        None => format!("{currency} {grouped}"),
    };

    if amount < 0.0 {
        format!("-{body}")
    } else {
        body
    }
}

fn symbol(currency: &str) -> Option<&'static str> {
    Some(match currency {
        "USD" => "$",
        "EUR" => "\u{20ac}",
        "GBP" => "\u{a3}",
        "JPY" => "\u{a5}",
        "CNY" => "CN\u{a5}",
        "INR" => "\u{20b9}",
        "KRW" => "\u{20a9}",
        "AUD" => "A$",
        "CAD" => "CA$",
        "NZD" => "NZ$",
        "BRL" => "R$",
        _ => return None,
    })
}

/// Render a non-negative amount with a fixed number of decimals and
/// comma-grouped integer digits.
fn group_digits(amount: f64, decimals: usize) -> String {
    let raw = format!("{amount:.decimals$}");
    let (int_part, frac_part) = match raw.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part.to_string())),
        None => (raw.as_str(), None),
    };

    let mut grouped = String::with_capacity(raw.len() + raw.len() / 3);
    for (idx, ch) in int_part.chars().enumerate() {
        if idx > 0 && (int_part.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if let Some(frac) = frac_part {
        grouped.push('.');
        grouped.push_str(&frac);
    }
    grouped
}

//! Number and label formatting shared by tooltips, legends and charts.

use regex::Regex;
use std::sync::LazyLock;

static LEADING_INT: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^\s*([+-]?\d+)").ok());

static LEADING_FLOAT: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^\s*([+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?)").ok());

/// Lenient integer parse: takes the leading integer of the text.
///
/// "12.7" => 12, " 40 tuples" => 40, "n/a" => None.
pub fn parse_leading_int(s: &str) -> Option<i64> {
    let caps = LEADING_INT.as_ref()?.captures(s)?;
    caps.get(1)?.as_str().parse().ok()
}

/// Lenient float parse with the same rules as [`parse_leading_int`].
pub fn parse_leading_float(s: &str) -> Option<f64> {
    let caps = LEADING_FLOAT.as_ref()?.captures(s)?;
    caps.get(1)?.as_str().parse().ok()
}

/// Group the integer digits with commas: 1234567 => "1,234,567".
pub fn thousands(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if n < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Comma grouping for values that may carry a fraction (node flow totals).
pub fn thousands_f64(v: f64) -> String {
    if !v.is_finite() {
        return String::from("0");
    }
    let v = (v * 1000.0).round() / 1000.0;
    let int = v.trunc() as i64;
    let frac = (v - v.trunc()).abs();
    if frac < 1e-9 {
        return thousands(int);
    }
    let frac_text = format!("{:.3}", frac);
    let frac_text = frac_text.trim_start_matches('0').trim_end_matches('0');
    let sign = if v < 0.0 && int == 0 { "-" } else { "" };
    format!("{}{}{}", sign, thousands(int), frac_text)
}

/// Link hover text: rounded, grouped, with the unit.
pub fn tuples(v: i64) -> String {
    format!("{} tuples", thousands(v))
}

/// Shorten a fully qualified operator kind: "a.b.Filter" => "Filter (a.b)".
pub fn oplet_kind_label(kind: &str) -> String {
    match kind.rsplit_once('.') {
        Some((package, name)) if !package.is_empty() => format!("{} ({})", name, package),
        _ => kind.to_string(),
    }
}

/// "RUNNING" => "Running".
pub fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_string() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn groups_thousands() {
        assert_eq!(thousands(0), "0");
        assert_eq!(thousands(999), "999");
        assert_eq!(thousands(1000), "1,000");
        assert_eq!(thousands(1234567), "1,234,567");
        assert_eq!(thousands(-4500), "-4,500");
    }

    #[test]
    fn groups_fractional_values() {
        assert_eq!(thousands_f64(1234.0), "1,234");
        assert_eq!(thousands_f64(0.45), "0.45");
        assert_eq!(thousands_f64(2500.5), "2,500.5");
    }

    #[test]
    fn leading_integer_is_lenient() {
        assert_eq!(parse_leading_int("42"), Some(42));
        assert_eq!(parse_leading_int(" 12.7"), Some(12));
        assert_eq!(parse_leading_int("7 tuples"), Some(7));
        assert_eq!(parse_leading_int("n/a"), None);
        assert_eq!(parse_leading_float("3.5e2"), Some(350.0));
    }

    #[test]
    fn shortens_oplet_kinds() {
        assert_eq!(
            oplet_kind_label("quarks.oplet.functional.Filter"),
            "Filter (quarks.oplet.functional)"
        );
        assert_eq!(oplet_kind_label("Custom"), "Custom");
    }

    #[test]
    fn capitalizes_states() {
        assert_eq!(capitalize("RUNNING"), "Running");
        assert_eq!(capitalize(""), "");
    }
}

/// Marker used wherever a value or column is missing.
pub const UNKNOWN: &str = "정보 없음";

const JO: i64 = 1_000_000_000_000;
const EOK: i64 = 100_000_000;
const MAN: i64 = 10_000;

/// Parse a DART amount string such as `"1,234,567"` or `"-5,000"`.
///
/// Missing, empty and whitespace-only input is zero. Anything else that is not
/// a comma-grouped integer is logged and treated as zero.
pub fn parse_amount(raw: Option<&str>) -> i64 {
    let Some(raw) = raw else {
        return 0;
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return 0;
    }
    let digits: String = trimmed.chars().filter(|c| *c != ',').collect();
    match digits.parse::<i64>() {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!("Unparseable amount {:?}: {}", raw, e);
            0
        }
    }
}

/// Render an amount in won using 조 / 억 / 만 bands.
pub fn format_currency(amount: Option<i64>) -> String {
    format_currency_with_unit(amount, "원")
}

/// Render an amount with a caller-supplied unit.
///
/// The band is picked from the absolute value and the sign is kept, so a
/// year-over-year drop of 2000억 renders as `-2000.00억 원` rather than
/// falling through to the raw `-200,000,000,000 원` form.
pub fn format_currency_with_unit(amount: Option<i64>, unit: &str) -> String {
    let Some(amount) = amount else {
        return UNKNOWN.to_string();
    };
    let magnitude = amount.unsigned_abs();
    if magnitude >= JO as u64 {
        format!("{:.2}조 {}", amount as f64 / JO as f64, unit)
    } else if magnitude >= EOK as u64 {
        format!("{:.2}억 {}", amount as f64 / EOK as f64, unit)
    } else if magnitude >= MAN as u64 {
        format!("{:.2}만 {}", amount as f64 / MAN as f64, unit)
    } else {
        format!("{} {}", group_thousands(amount), unit)
    }
}

/// `1234567` -> `"1,234,567"`.
pub fn group_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if value < 0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount_empty_inputs_are_zero() {
        assert_eq!(parse_amount(None), 0);
        assert_eq!(parse_amount(Some("")), 0);
        assert_eq!(parse_amount(Some("   ")), 0);
    }

    #[test]
    fn test_parse_amount_strips_separators() {
        assert_eq!(parse_amount(Some("1,234,567")), 1_234_567);
        assert_eq!(parse_amount(Some("-5,000")), -5_000);
        assert_eq!(parse_amount(Some("1,000,000,000,000")), 1_000_000_000_000);
    }

    #[test]
    fn test_parse_amount_malformed_is_zero() {
        assert_eq!(parse_amount(Some("n/a")), 0);
    }

    #[test]
    fn test_format_currency_bands() {
        assert_eq!(format_currency(Some(1_500_000_000_000)), "1.50조 원");
        assert_eq!(format_currency(Some(250_000_000)), "2.50억 원");
        assert_eq!(format_currency(Some(12_345)), "1.23만 원");
        assert_eq!(format_currency(Some(9_999)), "9,999 원");
        assert_eq!(format_currency(Some(0)), "0 원");
        assert_eq!(format_currency(None), UNKNOWN);
    }

    #[test]
    fn test_format_currency_negative_uses_magnitude() {
        assert_eq!(format_currency(Some(-200_000_000_000)), "-2000.00억 원");
        assert_eq!(format_currency(Some(-1_234)), "-1,234 원");
    }

    #[test]
    fn test_format_currency_custom_unit() {
        assert_eq!(format_currency_with_unit(Some(300_000_000), "KRW"), "3.00억 KRW");
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1000), "1,000");
        assert_eq!(group_thousands(-1_234_567), "-1,234,567");
    }
}

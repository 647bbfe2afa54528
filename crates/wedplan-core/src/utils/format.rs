use chrono::NaiveDate;

/// Format an amount in rupiah with dot thousands separators: `Rp 1.500.000`
pub fn format_currency(amount: f64) -> String {
    let rounded = amount.round() as i64;
    let digits = rounded.unsigned_abs().to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }

    if rounded < 0 {
        format!("-Rp {}", grouped)
    } else {
        format!("Rp {}", grouped)
    }
}

/// Truncate a string to a maximum length, adding ellipsis if needed
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

/// Format a YYYY-MM-DD date as `14 Feb 2025`
pub fn format_date(date: &str) -> String {
    match NaiveDate::parse_from_str(date, "%Y-%m-%d") {
        Ok(d) => d.format("%d %b %Y").to_string(),
        Err(_) if date.is_empty() => "TBD".to_string(),
        Err(_) => date.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(0.0), "Rp 0");
        assert_eq!(format_currency(950.0), "Rp 950");
        assert_eq!(format_currency(1500.0), "Rp 1.500");
        assert_eq!(format_currency(1_500_000.0), "Rp 1.500.000");
        assert_eq!(format_currency(12_345_678.4), "Rp 12.345.678");
        assert_eq!(format_currency(-250_000.0), "-Rp 250.000");
    }

    #[test]
    fn test_truncate_string() {
        assert_eq!(truncate_string("Hello", 10), "Hello");
        assert_eq!(truncate_string("Hello World", 8), "Hello...");
        assert_eq!(truncate_string("Hi", 2), "Hi");
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date("2025-02-14"), "14 Feb 2025");
        assert_eq!(format_date(""), "TBD");
        assert_eq!(format_date("next spring"), "next spring");
    }
}

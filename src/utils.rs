use chrono::{Datelike, Days, NaiveDate};

pub fn last_day_of_month(year: i32, month: u32) -> NaiveDate {
    let next_month = if month == 12 { 1 } else { month + 1 };
    let next_year = if month == 12 { year + 1 } else { year };

    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .unwrap()
        .checked_sub_days(Days::new(1))
        .unwrap()
}

/// Maps a calendar month to its April-start fiscal quarter.
/// Returns (quarter, fiscal_year): Jan-Mar belong to Q4 of the previous
/// fiscal year, so `(2024, 2)` maps to `(4, 2023)`.
pub fn fiscal_quarter_of_month(year: i32, month: u32) -> (u8, i32) {
    match month {
        4..=6 => (1, year),
        7..=9 => (2, year),
        10..=12 => (3, year),
        _ => (4, year - 1),
    }
}

/// Calendar bounds of a fiscal quarter. Q4 spills into the next calendar
/// year: Q4 2023 is 2024-01-01 through 2024-03-31.
pub fn fiscal_quarter_bounds(quarter: u8, fiscal_year: i32) -> (NaiveDate, NaiveDate) {
    let (start_year, start_month) = match quarter {
        1 => (fiscal_year, 4),
        2 => (fiscal_year, 7),
        3 => (fiscal_year, 10),
        _ => (fiscal_year + 1, 1),
    };
    let start = NaiveDate::from_ymd_opt(start_year, start_month, 1).unwrap();
    let end = last_day_of_month(start_year, start_month + 2);
    (start, end)
}

/// The fiscal year (April through March) containing `date`.
/// Returns (fiscal_year_label, start, end).
pub fn fiscal_year_of_date(date: NaiveDate) -> (i32, NaiveDate, NaiveDate) {
    let label = if date.month() >= 4 {
        date.year()
    } else {
        date.year() - 1
    };
    (
        label,
        NaiveDate::from_ymd_opt(label, 4, 1).unwrap(),
        NaiveDate::from_ymd_opt(label + 1, 3, 31).unwrap(),
    )
}

/// Formats a monetary value with a currency symbol, thousands separators
/// and two decimals: `format_money("₹", 1234567.891)` is "₹1,234,567.89".
pub fn format_money(symbol: &str, value: f64) -> String {
    format!("{}{}", symbol, grouped(value, false))
}

/// Same as [`format_money`] but with an explicit sign, for deltas.
pub fn format_money_signed(symbol: &str, value: f64) -> String {
    format!("{}{}", symbol, grouped(value, true))
}

pub fn format_count(value: usize) -> String {
    let digits: Vec<char> = value.to_string().chars().collect();
    group_digits(&digits)
}

fn grouped(value: f64, explicit_plus: bool) -> String {
    let formatted = format!("{:.2}", value.abs());
    let (int_part, frac_part) = formatted.split_once('.').unwrap_or((&formatted, "00"));
    let digits: Vec<char> = int_part.chars().collect();
    let sign = if value < 0.0 {
        "-"
    } else if explicit_plus {
        "+"
    } else {
        ""
    };
    format!("{}{}.{}", sign, group_digits(&digits), frac_part)
}

fn group_digits(digits: &[char]) -> String {
    let mut out = String::new();
    for (i, c) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(*c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_day_of_month() {
        assert_eq!(
            last_day_of_month(2023, 2),
            NaiveDate::from_ymd_opt(2023, 2, 28).unwrap()
        );
        assert_eq!(
            last_day_of_month(2024, 2),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
        assert_eq!(
            last_day_of_month(2023, 12),
            NaiveDate::from_ymd_opt(2023, 12, 31).unwrap()
        );
    }

    #[test]
    fn test_fiscal_quarter_of_month() {
        assert_eq!(fiscal_quarter_of_month(2023, 4), (1, 2023));
        assert_eq!(fiscal_quarter_of_month(2023, 9), (2, 2023));
        assert_eq!(fiscal_quarter_of_month(2023, 12), (3, 2023));
        // Jan-Mar roll back into the previous fiscal year
        assert_eq!(fiscal_quarter_of_month(2024, 2), (4, 2023));
    }

    #[test]
    fn test_fiscal_quarter_bounds() {
        let (start, end) = fiscal_quarter_bounds(1, 2023);
        assert_eq!(start, NaiveDate::from_ymd_opt(2023, 4, 1).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2023, 6, 30).unwrap());

        let (start, end) = fiscal_quarter_bounds(4, 2023);
        assert_eq!(start, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2024, 3, 31).unwrap());
    }

    #[test]
    fn test_fiscal_year_of_date() {
        let (label, start, end) = fiscal_year_of_date(NaiveDate::from_ymd_opt(2024, 2, 15).unwrap());
        assert_eq!(label, 2023);
        assert_eq!(start, NaiveDate::from_ymd_opt(2023, 4, 1).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2024, 3, 31).unwrap());

        let (label, _, _) = fiscal_year_of_date(NaiveDate::from_ymd_opt(2024, 4, 1).unwrap());
        assert_eq!(label, 2024);
    }

    #[test]
    fn test_format_money() {
        assert_eq!(format_money("₹", 1234567.891), "₹1,234,567.89");
        assert_eq!(format_money("₹", 0.0), "₹0.00");
        assert_eq!(format_money("₹", -4500.5), "₹-4,500.50");
        assert_eq!(format_money_signed("₹", 4500.0), "₹+4,500.00");
        assert_eq!(format_money_signed("₹", -99.999), "₹-100.00");
    }

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1234567), "1,234,567");
    }
}

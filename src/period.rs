use crate::schema::{PeriodRange, PeriodResolution};
use crate::utils::{fiscal_quarter_bounds, fiscal_year_of_date, last_day_of_month};
use chrono::{Datelike, NaiveDate};
use log::debug;

const MONTHS: [(&str, u32); 12] = [
    ("january", 1),
    ("february", 2),
    ("march", 3),
    ("april", 4),
    ("may", 5),
    ("june", 6),
    ("july", 7),
    ("august", 8),
    ("september", 9),
    ("october", 10),
    ("november", 11),
    ("december", 12),
];

const QUARTER_WORDS: [(&str, u8); 4] = [
    ("first", 1),
    ("second", 2),
    ("third", 3),
    ("fourth", 4),
];

/// Turns free-form period expressions into canonical date ranges.
///
/// Resolution priority: explicit range > explicit quarter > month+year >
/// bare year > relative keyword > default fiscal year. Quarters follow the
/// April-start fiscal year, so "Q4 2023" is January through March of 2024.
///
/// The resolver is total: unparseable input never errors, it resolves to
/// the current fiscal year of the reference date and is tagged as such.
/// The reference date is injected rather than read from the wall clock so
/// that resolution stays deterministic against fixed fixtures.
#[derive(Debug, Clone)]
pub struct PeriodResolver {
    reference: NaiveDate,
}

impl PeriodResolver {
    pub fn new(reference: NaiveDate) -> Self {
        Self { reference }
    }

    pub fn reference(&self) -> NaiveDate {
        self.reference
    }

    pub fn resolve(&self, input: &str) -> PeriodRange {
        let text = input.trim().to_lowercase();
        let years = extract_years(&text);

        // Explicit range: "2023 to 2024", "2023-2024"
        if (text.contains(" to ") || text.contains('-')) && years.len() >= 2 {
            let start_year = years[0];
            let end_year = *years.last().unwrap();
            return PeriodRange {
                start: NaiveDate::from_ymd_opt(start_year, 1, 1).unwrap(),
                end: NaiveDate::from_ymd_opt(end_year, 12, 31).unwrap(),
                description: format!("From {} to {}", start_year, end_year),
                is_range: true,
                resolution: PeriodResolution::ExplicitRange,
            };
        }

        // Explicit fiscal quarter: "Q1 2023", "quarter 2 2023", "third quarter 2023"
        if let Some(quarter) = detect_quarter(&text) {
            let fiscal_year = years
                .first()
                .copied()
                .unwrap_or_else(|| fiscal_year_of_date(self.reference).0);
            let (start, end) = fiscal_quarter_bounds(quarter, fiscal_year);
            return PeriodRange {
                start,
                end,
                description: format!("Q{} {}", quarter, fiscal_year),
                is_range: true,
                resolution: PeriodResolution::FiscalQuarter,
            };
        }

        // Month + year: "April 2023"; a bare month name uses the reference year
        if let Some((name, month)) = MONTHS.iter().find(|(name, _)| text.contains(name)) {
            let year = years.first().copied().unwrap_or(self.reference.year());
            return PeriodRange {
                start: NaiveDate::from_ymd_opt(year, *month, 1).unwrap(),
                end: last_day_of_month(year, *month),
                description: format!("{} {}", capitalize(name), year),
                is_range: false,
                resolution: PeriodResolution::MonthYear,
            };
        }

        // Bare 4-digit year: calendar year
        if text.len() == 4 {
            if let Ok(year) = text.parse::<i32>() {
                if year >= 1000 {
                    return PeriodRange {
                        start: NaiveDate::from_ymd_opt(year, 1, 1).unwrap(),
                        end: NaiveDate::from_ymd_opt(year, 12, 31).unwrap(),
                        description: format!("Year {}", year),
                        is_range: false,
                        resolution: PeriodResolution::CalendarYear,
                    };
                }
            }
        }

        // Relative keywords
        if ["this year", "current year", "ytd", "year to date"]
            .iter()
            .any(|term| text.contains(term))
        {
            let year = self.reference.year();
            return PeriodRange {
                start: NaiveDate::from_ymd_opt(year, 1, 1).unwrap(),
                end: NaiveDate::from_ymd_opt(year, 12, 31).unwrap(),
                description: format!("Year to Date {}", year),
                is_range: false,
                resolution: PeriodResolution::Relative,
            };
        }

        if ["last year", "previous year"]
            .iter()
            .any(|term| text.contains(term))
        {
            let year = self.reference.year() - 1;
            return PeriodRange {
                start: NaiveDate::from_ymd_opt(year, 1, 1).unwrap(),
                end: NaiveDate::from_ymd_opt(year, 12, 31).unwrap(),
                description: format!("Previous Year {}", year),
                is_range: false,
                resolution: PeriodResolution::Relative,
            };
        }

        debug!("Could not parse period expression '{}', using default fiscal year", input);
        self.default_period()
    }

    /// The current fiscal year of the reference date, used whenever an
    /// expression matches no rule.
    pub fn default_period(&self) -> PeriodRange {
        let (label, start, end) = fiscal_year_of_date(self.reference);
        PeriodRange {
            start,
            end,
            description: format!("Fiscal Year {}-{} (default)", label, label + 1),
            is_range: true,
            resolution: PeriodResolution::Default,
        }
    }
}

fn detect_quarter(text: &str) -> Option<u8> {
    for q in 1..=4u8 {
        if text.contains(&format!("q{}", q)) || text.contains(&format!("quarter {}", q)) {
            return Some(q);
        }
    }
    QUARTER_WORDS
        .iter()
        .find(|(word, _)| text.contains(&format!("{} quarter", word)))
        .map(|(_, q)| *q)
}

fn extract_years(text: &str) -> Vec<i32> {
    let bytes = text.as_bytes();
    let mut years = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i].is_ascii_digit() {
            let start = i;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
            if i - start == 4 {
                if let Ok(year) = text[start..i].parse::<i32>() {
                    years.push(year);
                }
            }
        } else {
            i += 1;
        }
    }
    years
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

use crate::error::Result;
use crate::schema::PeriodRange;
use crate::store::{MonthlyActivity, TransactionStore};
use crate::utils::last_day_of_month;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A year counts as Complete above this many vouchers; anything lower is
/// Partial coverage.
const COMPLETE_YEAR_THRESHOLD: usize = 1000;
const GOOD_PERIOD_THRESHOLD: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataQuality {
    Complete,
    Partial,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YearCoverage {
    pub year: i32,
    pub voucher_count: usize,
    pub months_covered: usize,
    pub quality: DataQuality,
}

/// What the store actually holds: overall span, per-year coverage and the
/// monthly breakdown. Drives "latest" resolution hints and period
/// suggestions when a requested range comes back empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataAvailability {
    pub earliest: Option<NaiveDate>,
    pub latest: Option<NaiveDate>,
    pub total_vouchers: usize,
    pub years: Vec<YearCoverage>,
    pub monthly: Vec<MonthlyActivity>,
}

pub fn data_availability<S: TransactionStore + ?Sized>(store: &S) -> Result<DataAvailability> {
    let monthly = store.monthly_activity()?;

    let earliest = monthly
        .first()
        .map(|m| NaiveDate::from_ymd_opt(m.year, m.month, 1).unwrap());
    let latest = monthly.last().map(|m| last_day_of_month(m.year, m.month));
    let total_vouchers = monthly.iter().map(|m| m.voucher_count).sum();

    let mut per_year: BTreeMap<i32, (usize, usize)> = BTreeMap::new();
    for m in &monthly {
        let slot = per_year.entry(m.year).or_insert((0, 0));
        slot.0 += m.voucher_count;
        slot.1 += 1;
    }
    let years = per_year
        .into_iter()
        .map(|(year, (voucher_count, months_covered))| YearCoverage {
            year,
            voucher_count,
            months_covered,
            quality: if voucher_count > COMPLETE_YEAR_THRESHOLD {
                DataQuality::Complete
            } else {
                DataQuality::Partial
            },
        })
        .collect();

    Ok(DataAvailability {
        earliest,
        latest,
        total_vouchers,
        years,
        monthly,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoverageQuality {
    Good,
    Limited,
    NoData,
}

/// Outcome of checking a resolved period against actual data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodValidation {
    pub period: PeriodRange,
    pub available: bool,
    pub voucher_count: usize,
    pub quality: CoverageQuality,
    /// Years with solid coverage, offered as alternatives when the
    /// requested period is empty.
    pub suggested_years: Vec<i32>,
}

pub fn validate_period<S: TransactionStore + ?Sized>(
    store: &S,
    period: &PeriodRange,
) -> Result<PeriodValidation> {
    let voucher_count = store.voucher_count_in_period(period)?;
    let availability = data_availability(store)?;

    let quality = if voucher_count > GOOD_PERIOD_THRESHOLD {
        CoverageQuality::Good
    } else if voucher_count > 0 {
        CoverageQuality::Limited
    } else {
        CoverageQuality::NoData
    };

    Ok(PeriodValidation {
        period: period.clone(),
        available: voucher_count > 0,
        voucher_count,
        quality,
        suggested_years: availability
            .years
            .iter()
            .filter(|y| y.voucher_count > GOOD_PERIOD_THRESHOLD)
            .map(|y| y.year)
            .collect(),
    })
}

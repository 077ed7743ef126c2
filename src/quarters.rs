use crate::profit_loss::build_profit_loss;
use crate::schema::{EngineConfig, PeriodRange, PeriodResolution};
use crate::store::TransactionStore;
use crate::utils::{fiscal_quarter_bounds, fiscal_quarter_of_month};
use chrono::{Datelike, NaiveDate};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// A quarter of the April-start fiscal year. `fiscal_year` is the label
/// year: Q4 2023 runs January through March of calendar 2024.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiscalQuarter {
    pub quarter: u8,
    pub fiscal_year: i32,
}

impl FiscalQuarter {
    pub fn new(quarter: u8, fiscal_year: i32) -> Self {
        Self {
            quarter: quarter.clamp(1, 4),
            fiscal_year,
        }
    }

    /// The fiscal quarter containing a calendar date.
    pub fn containing(date: NaiveDate) -> Self {
        let (quarter, fiscal_year) = fiscal_quarter_of_month(date.year(), date.month());
        Self {
            quarter,
            fiscal_year,
        }
    }

    /// Parses "Q3 2023" or "quarter 3 2023"; a bare year reads as that
    /// year's Q4, matching how annual requests land on the closing quarter.
    pub fn parse(token: &str) -> Option<Self> {
        let text = token.trim().to_uppercase();
        if let Some(rest) = text.strip_prefix("QUARTER").or_else(|| text.strip_prefix('Q')) {
            let mut parts = rest.split_whitespace();
            let first = parts.next()?;
            let quarter: u8 = first.parse().ok()?;
            if !(1..=4).contains(&quarter) {
                return None;
            }
            let fiscal_year = parts.next().and_then(|y| y.parse().ok())?;
            return Some(Self::new(quarter, fiscal_year));
        }
        let year: i32 = text.parse().ok()?;
        if (1000..10000).contains(&year) {
            return Some(Self::new(4, year));
        }
        None
    }

    pub fn label(&self) -> String {
        format!("Q{} {}", self.quarter, self.fiscal_year)
    }

    pub fn period(&self) -> PeriodRange {
        let (start, end) = fiscal_quarter_bounds(self.quarter, self.fiscal_year);
        PeriodRange {
            start,
            end,
            description: self.label(),
            is_range: true,
            resolution: PeriodResolution::FiscalQuarter,
        }
    }

    pub fn previous(&self) -> Self {
        if self.quarter > 1 {
            Self::new(self.quarter - 1, self.fiscal_year)
        } else {
            Self::new(4, self.fiscal_year - 1)
        }
    }

    pub fn same_quarter_previous_year(&self) -> Self {
        Self::new(self.quarter, self.fiscal_year - 1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivityLevel {
    High,
    Moderate,
    Low,
    NoData,
}

fn activity_level(transactions: usize) -> ActivityLevel {
    if transactions > 200 {
        ActivityLevel::High
    } else if transactions > 100 {
        ActivityLevel::Moderate
    } else {
        ActivityLevel::Low
    }
}

/// One quarter's headline figures, produced by the P&L builder. Expenses
/// here are cost of goods sold; profit is the gross figure, which is the
/// number quarter comparisons have always tracked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuarterPerformance {
    pub label: String,
    pub period: PeriodRange,
    pub revenue: f64,
    pub expenses: f64,
    pub profit: f64,
    pub margin: f64,
    pub transactions: usize,
    pub activity: ActivityLevel,
}

fn quarter_performance<S: TransactionStore + ?Sized>(
    store: &S,
    config: &EngineConfig,
    quarter: &FiscalQuarter,
) -> QuarterPerformance {
    let period = quarter.period();
    match build_profit_loss(store, config, &period) {
        Ok(pl) => {
            let revenue = pl.revenue.total;
            let expenses = pl.cost_of_goods_sold.total;
            let profit = revenue - expenses;
            let margin = if revenue > 0.0 {
                profit / revenue.max(1.0) * 100.0
            } else {
                0.0
            };
            QuarterPerformance {
                label: quarter.label(),
                period,
                revenue,
                expenses,
                profit,
                margin,
                transactions: pl.total_transactions,
                activity: activity_level(pl.total_transactions),
            }
        }
        Err(e) => {
            warn!("No quarter data for {}: {}", quarter.label(), e);
            QuarterPerformance {
                label: quarter.label(),
                period,
                revenue: 0.0,
                expenses: 0.0,
                profit: 0.0,
                margin: 0.0,
                transactions: 0,
                activity: ActivityLevel::NoData,
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComparisonType {
    SequentialQuarter,
    SameYearQuarter,
    YearOverYear,
    MultiPeriod,
    General,
}

fn comparison_type(base: &FiscalQuarter, other: &FiscalQuarter) -> ComparisonType {
    if base == other {
        return ComparisonType::General;
    }
    if base.fiscal_year == other.fiscal_year {
        if (base.quarter as i8 - other.quarter as i8).abs() == 1 {
            ComparisonType::SequentialQuarter
        } else {
            ComparisonType::SameYearQuarter
        }
    } else if base.fiscal_year - other.fiscal_year == 1 && base.quarter == other.quarter {
        ComparisonType::YearOverYear
    } else {
        ComparisonType::MultiPeriod
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PerformanceTrend {
    Improving,
    Mixed,
    Declining,
    Stable,
}

pub(crate) fn classify_trend(revenue_change: f64, profit_change: f64) -> PerformanceTrend {
    if revenue_change == 0.0 && profit_change == 0.0 {
        PerformanceTrend::Stable
    } else if revenue_change > 0.0 && profit_change > 0.0 {
        PerformanceTrend::Improving
    } else if revenue_change > 0.0 || profit_change > 0.0 {
        PerformanceTrend::Mixed
    } else {
        PerformanceTrend::Declining
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuarterComparison {
    pub comparison_type: ComparisonType,
    pub revenue_change_pct: f64,
    pub profit_change_pct: f64,
    pub revenue_change_abs: f64,
    pub profit_change_abs: f64,
    pub trend: PerformanceTrend,
    pub performance: QuarterPerformance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OverallTrend {
    Growth,
    Decline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConsistencyRating {
    High,
    Variable,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonSummary {
    pub best_comparison: Option<String>,
    pub overall_trend: OverallTrend,
    /// Fraction of comparisons whose trend is Improving.
    pub improving_fraction: f64,
    pub consistency: ConsistencyRating,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuarterComparisonReport {
    pub company_name: String,
    pub base: QuarterPerformance,
    pub comparisons: Vec<QuarterComparison>,
    pub summary: ComparisonSummary,
}

/// Resolves the base-period token. "latest" maps the newest month with
/// any recorded voucher to its fiscal quarter, so the answer comes from
/// the data rather than the wall clock; with no data at all the quarter
/// containing the reference date is used.
pub fn resolve_base_quarter<S: TransactionStore + ?Sized>(
    store: &S,
    token: &str,
    reference: NaiveDate,
) -> FiscalQuarter {
    if token.trim().eq_ignore_ascii_case("latest") {
        match store.monthly_activity() {
            Ok(months) => {
                if let Some(last) = months.last() {
                    let (quarter, fiscal_year) = fiscal_quarter_of_month(last.year, last.month);
                    return FiscalQuarter::new(quarter, fiscal_year);
                }
                debug!("No recorded months; falling back to reference quarter");
            }
            Err(e) => warn!("Could not read monthly activity for 'latest': {}", e),
        }
        return FiscalQuarter::containing(reference);
    }
    FiscalQuarter::parse(token).unwrap_or_else(|| FiscalQuarter::containing(reference))
}

/// Compares a base quarter against a comparison set. When no explicit set
/// is given, the default is the immediately preceding quarter, the same
/// quarter of the prior fiscal year, and the remaining quarters of the
/// base year. Unparseable comparison tokens are skipped; quarters where
/// neither side has revenue are left out of the comparison list.
pub fn compare_quarters<S: TransactionStore + ?Sized>(
    store: &S,
    config: &EngineConfig,
    base_token: &str,
    comparison_tokens: Option<&[String]>,
    reference: NaiveDate,
) -> QuarterComparisonReport {
    let base_quarter = resolve_base_quarter(store, base_token, reference);
    let base = quarter_performance(store, config, &base_quarter);

    let mut candidates: Vec<FiscalQuarter> = Vec::new();
    match comparison_tokens {
        Some(tokens) => {
            for token in tokens {
                match FiscalQuarter::parse(token) {
                    Some(q) => candidates.push(q),
                    None => warn!("Skipping unparseable comparison period '{}'", token),
                }
            }
        }
        None => {
            candidates.push(base_quarter.previous());
            candidates.push(base_quarter.same_quarter_previous_year());
            for q in 1..=4u8 {
                if q != base_quarter.quarter {
                    candidates.push(FiscalQuarter::new(q, base_quarter.fiscal_year));
                }
            }
        }
    }

    let mut seen: Vec<String> = Vec::new();
    let mut comparisons = Vec::new();
    for candidate in candidates {
        let label = candidate.label();
        if seen.contains(&label) {
            continue;
        }
        seen.push(label);

        let performance = quarter_performance(store, config, &candidate);
        if base.revenue <= 0.0 && performance.revenue <= 0.0 {
            continue;
        }

        let revenue_change_pct =
            (base.revenue - performance.revenue) / performance.revenue.max(1.0) * 100.0;
        let profit_change_pct =
            (base.profit - performance.profit) / performance.profit.abs().max(1.0) * 100.0;

        comparisons.push(QuarterComparison {
            comparison_type: comparison_type(&base_quarter, &candidate),
            revenue_change_pct,
            profit_change_pct,
            revenue_change_abs: base.revenue - performance.revenue,
            profit_change_abs: base.profit - performance.profit,
            trend: classify_trend(revenue_change_pct, profit_change_pct),
            performance,
        });
    }

    let best_comparison = comparisons
        .iter()
        .max_by(|a, b| a.revenue_change_pct.total_cmp(&b.revenue_change_pct))
        .map(|c| c.performance.label.clone());
    let revenue_change_sum: f64 = comparisons.iter().map(|c| c.revenue_change_pct).sum();
    let improving = comparisons
        .iter()
        .filter(|c| c.trend == PerformanceTrend::Improving)
        .count();
    let improving_fraction = if comparisons.is_empty() {
        0.0
    } else {
        improving as f64 / comparisons.len() as f64
    };

    QuarterComparisonReport {
        company_name: config.company_name.clone(),
        base,
        comparisons,
        summary: ComparisonSummary {
            best_comparison,
            overall_trend: if revenue_change_sum > 0.0 {
                OverallTrend::Growth
            } else {
                OverallTrend::Decline
            },
            improving_fraction,
            consistency: if improving_fraction > 0.5 {
                ConsistencyRating::High
            } else {
                ConsistencyRating::Variable
            },
        },
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GrowthTrend {
    Growing,
    Declining,
    Stable,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuarterGrowth {
    pub from: String,
    pub to: String,
    pub revenue_growth_pct: f64,
    pub trend: GrowthTrend,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuarterlyAnalysis {
    pub fiscal_year: i32,
    pub quarters: Vec<QuarterPerformance>,
    pub quarter_over_quarter: Vec<QuarterGrowth>,
    pub total_revenue: f64,
    pub total_expenses: f64,
    pub total_profit: f64,
    pub best_quarter: String,
    pub worst_quarter: String,
    pub most_active_quarter: String,
}

/// All four quarters of a fiscal year through the P&L builder, with
/// quarter-over-quarter revenue growth and annual totals.
pub fn quarterly_analysis<S: TransactionStore + ?Sized>(
    store: &S,
    config: &EngineConfig,
    fiscal_year: i32,
) -> QuarterlyAnalysis {
    let quarters: Vec<QuarterPerformance> = (1..=4u8)
        .map(|q| quarter_performance(store, config, &FiscalQuarter::new(q, fiscal_year)))
        .collect();

    let mut quarter_over_quarter = Vec::new();
    for pair in quarters.windows(2) {
        let (prev, cur) = (&pair[0], &pair[1]);
        let growth = if prev.revenue > 0.0 {
            (cur.revenue - prev.revenue) / prev.revenue * 100.0
        } else {
            0.0
        };
        quarter_over_quarter.push(QuarterGrowth {
            from: prev.label.clone(),
            to: cur.label.clone(),
            revenue_growth_pct: growth,
            trend: if growth > 0.0 {
                GrowthTrend::Growing
            } else if growth < 0.0 {
                GrowthTrend::Declining
            } else {
                GrowthTrend::Stable
            },
        });
    }

    let best = quarters
        .iter()
        .max_by(|a, b| a.revenue.total_cmp(&b.revenue))
        .unwrap();
    let worst = quarters
        .iter()
        .min_by(|a, b| a.revenue.total_cmp(&b.revenue))
        .unwrap();
    let most_active = quarters.iter().max_by_key(|q| q.transactions).unwrap();

    QuarterlyAnalysis {
        fiscal_year,
        total_revenue: quarters.iter().map(|q| q.revenue).sum(),
        total_expenses: quarters.iter().map(|q| q.expenses).sum(),
        total_profit: quarters.iter().map(|q| q.profit).sum(),
        best_quarter: best.label.clone(),
        worst_quarter: worst.label.clone(),
        most_active_quarter: most_active.label.clone(),
        quarter_over_quarter,
        quarters,
    }
}

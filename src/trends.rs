use crate::error::{EngineError, Result};
use crate::period::PeriodResolver;
use crate::profit_loss::build_profit_loss;
use crate::quarters::{classify_trend, PerformanceTrend};
use crate::schema::{EngineConfig, PeriodRange};
use crate::store::TransactionStore;
use log::debug;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Increasing,
    Decreasing,
    Stable,
}

fn direction_of(value: f64) -> Direction {
    if value > 0.0 {
        Direction::Increasing
    } else if value < 0.0 {
        Direction::Decreasing
    } else {
        Direction::Stable
    }
}

/// Headline P&L figures for one expressed period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodPerformance {
    pub expression: String,
    pub period: PeriodRange,
    pub revenue: f64,
    pub gross_profit: f64,
    pub net_profit: f64,
    pub expenses: f64,
    pub transactions: usize,
}

fn period_performance<S: TransactionStore + ?Sized>(
    store: &S,
    config: &EngineConfig,
    resolver: &PeriodResolver,
    expression: &str,
) -> Result<PeriodPerformance> {
    let period = resolver.resolve(expression);
    let pl = build_profit_loss(store, config, &period)?;
    Ok(PeriodPerformance {
        expression: expression.to_string(),
        expenses: pl.total_expenses(),
        revenue: pl.revenue.total,
        gross_profit: pl.gross_profit,
        net_profit: pl.net_profit,
        transactions: pl.total_transactions,
        period,
    })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodComparison {
    pub from: String,
    pub to: String,
    pub revenue_change_pct: f64,
    pub profit_change_pct: f64,
    pub trend: PerformanceTrend,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MultiPeriodTrend {
    Growth,
    Stable,
}

/// Period-over-period comparison across an ordered list of period
/// expressions. Consecutive periods are diffed pairwise.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparativeAnalysis {
    pub periods: Vec<PeriodPerformance>,
    pub comparisons: Vec<PeriodComparison>,
    pub overall_trend: MultiPeriodTrend,
    pub revenue_trend: Direction,
    pub profitability_trend: Direction,
    pub best_period: Option<String>,
    pub most_profitable_period: Option<String>,
}

pub fn comparative_analysis<S: TransactionStore + ?Sized>(
    store: &S,
    config: &EngineConfig,
    resolver: &PeriodResolver,
    expressions: &[String],
) -> Result<ComparativeAnalysis> {
    if expressions.is_empty() {
        return Err(EngineError::NoDataFound(
            "comparative analysis needs at least one period".to_string(),
        ));
    }
    debug!("Comparative analysis across {} periods", expressions.len());

    let mut periods = Vec::with_capacity(expressions.len());
    for expression in expressions {
        periods.push(period_performance(store, config, resolver, expression)?);
    }

    let mut comparisons = Vec::new();
    for pair in periods.windows(2) {
        let (prev, cur) = (&pair[0], &pair[1]);
        let revenue_change_pct = (cur.revenue - prev.revenue) / prev.revenue.max(1.0) * 100.0;
        let profit_change_pct =
            (cur.net_profit - prev.net_profit) / prev.net_profit.abs().max(1.0) * 100.0;
        comparisons.push(PeriodComparison {
            from: prev.expression.clone(),
            to: cur.expression.clone(),
            revenue_change_pct,
            profit_change_pct,
            trend: classify_trend(revenue_change_pct, profit_change_pct),
        });
    }

    let improving = comparisons
        .iter()
        .filter(|c| c.trend == PerformanceTrend::Improving)
        .count();
    let revenue_change_sum: f64 = comparisons.iter().map(|c| c.revenue_change_pct).sum();
    let profit_change_sum: f64 = comparisons.iter().map(|c| c.profit_change_pct).sum();

    let best_period = periods
        .iter()
        .max_by(|a, b| a.revenue.total_cmp(&b.revenue))
        .map(|p| p.expression.clone());
    let most_profitable_period = periods
        .iter()
        .max_by(|a, b| a.net_profit.total_cmp(&b.net_profit))
        .map(|p| p.expression.clone());

    Ok(ComparativeAnalysis {
        overall_trend: if !comparisons.is_empty() && improving * 2 > comparisons.len() {
            MultiPeriodTrend::Growth
        } else {
            MultiPeriodTrend::Stable
        },
        revenue_trend: direction_of(revenue_change_sum),
        profitability_trend: direction_of(profit_change_sum),
        best_period,
        most_profitable_period,
        periods,
        comparisons,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VolatilityLevel {
    High,
    Moderate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    High,
    Moderate,
    Low,
}

/// Linear projection over historical periods. The estimate assumes the
/// trend continues unchanged; it is a straight-line extrapolation, not a
/// model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendProjection {
    pub periods_analyzed: usize,
    pub average_revenue: f64,
    pub average_profit: f64,
    pub average_expenses: f64,
    pub revenue_trend_per_period: f64,
    pub profit_trend_per_period: f64,
    pub revenue_direction: Direction,
    pub profit_direction: Direction,
    pub next_period_revenue_estimate: f64,
    pub next_period_profit_estimate: f64,
    pub volatility: VolatilityLevel,
    pub revenue_risk: RiskLevel,
    pub profitability_risk: RiskLevel,
}

pub fn trend_projection<S: TransactionStore + ?Sized>(
    store: &S,
    config: &EngineConfig,
    resolver: &PeriodResolver,
    expressions: &[String],
) -> Result<TrendProjection> {
    if expressions.len() < 2 {
        return Err(EngineError::NoDataFound(
            "trend projection needs at least two historical periods".to_string(),
        ));
    }

    let mut history = Vec::with_capacity(expressions.len());
    for expression in expressions {
        history.push(period_performance(store, config, resolver, expression)?);
    }

    let count = history.len() as f64;
    let steps = (history.len() - 1).max(1) as f64;
    let first = history.first().unwrap();
    let last = history.last().unwrap();

    let revenue_trend = (last.revenue - first.revenue) / steps;
    let profit_trend = (last.net_profit - first.net_profit) / steps;

    let max_revenue = history.iter().map(|p| p.revenue).fold(f64::MIN, f64::max);
    let min_revenue = history.iter().map(|p| p.revenue).fold(f64::MAX, f64::min);
    let volatility = if max_revenue / min_revenue.max(1.0) > 2.0 {
        VolatilityLevel::High
    } else {
        VolatilityLevel::Moderate
    };

    Ok(TrendProjection {
        periods_analyzed: history.len(),
        average_revenue: history.iter().map(|p| p.revenue).sum::<f64>() / count,
        average_profit: history.iter().map(|p| p.net_profit).sum::<f64>() / count,
        average_expenses: history.iter().map(|p| p.expenses).sum::<f64>() / count,
        revenue_trend_per_period: revenue_trend,
        profit_trend_per_period: profit_trend,
        revenue_direction: direction_of(revenue_trend),
        profit_direction: direction_of(profit_trend),
        next_period_revenue_estimate: last.revenue + revenue_trend,
        next_period_profit_estimate: last.net_profit + profit_trend,
        volatility,
        revenue_risk: if revenue_trend < 0.0 {
            RiskLevel::High
        } else {
            RiskLevel::Moderate
        },
        profitability_risk: if profit_trend < 0.0 {
            RiskLevel::High
        } else {
            RiskLevel::Low
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{AccountingEntry, Voucher};
    use crate::store::MemoryStore;
    use chrono::NaiveDate;

    fn day(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn yearly_sales_store() -> MemoryStore {
        let mut vouchers = Vec::new();
        let mut entries = Vec::new();
        for (i, (year, amount)) in [(2021, 100000.0), (2022, 150000.0), (2023, 250000.0)]
            .iter()
            .enumerate()
        {
            let id = format!("v{}", i);
            vouchers.push(Voucher {
                id: id.clone(),
                date: day(*year, 6, 15),
                voucher_type: "Sales".to_string(),
            });
            entries.push(AccountingEntry {
                voucher_id: id,
                ledger_name: "Mobile Sales".to_string(),
                amount: *amount,
            });
        }
        MemoryStore::new(vouchers, entries, vec![], vec![])
    }

    fn fixtures() -> (MemoryStore, EngineConfig, PeriodResolver) {
        (
            yearly_sales_store(),
            EngineConfig::new("VASAVI TRADE ZONE"),
            PeriodResolver::new(day(2024, 3, 31)),
        )
    }

    #[test]
    fn test_comparative_analysis_trends() {
        let (store, config, resolver) = fixtures();
        let periods: Vec<String> = ["2021", "2022", "2023"].iter().map(|s| s.to_string()).collect();
        let analysis = comparative_analysis(&store, &config, &resolver, &periods).unwrap();

        assert_eq!(analysis.periods.len(), 3);
        assert_eq!(analysis.comparisons.len(), 2);
        assert_eq!(analysis.overall_trend, MultiPeriodTrend::Growth);
        assert_eq!(analysis.revenue_trend, Direction::Increasing);
        assert_eq!(analysis.best_period.as_deref(), Some("2023"));
        assert!((analysis.comparisons[0].revenue_change_pct - 50.0).abs() < 0.01);
    }

    #[test]
    fn test_comparative_analysis_rejects_empty_input() {
        let (store, config, resolver) = fixtures();
        let result = comparative_analysis(&store, &config, &resolver, &[]);
        assert!(matches!(result, Err(EngineError::NoDataFound(_))));
    }

    #[test]
    fn test_trend_projection_linear_estimate() {
        let (store, config, resolver) = fixtures();
        let periods: Vec<String> = ["2021", "2022", "2023"].iter().map(|s| s.to_string()).collect();
        let projection = trend_projection(&store, &config, &resolver, &periods).unwrap();

        // (250k - 100k) / 2 steps = 75k per period
        assert!((projection.revenue_trend_per_period - 75000.0).abs() < 0.01);
        assert!((projection.next_period_revenue_estimate - 325000.0).abs() < 0.01);
        assert_eq!(projection.revenue_direction, Direction::Increasing);
        assert_eq!(projection.volatility, VolatilityLevel::High);
        assert_eq!(projection.revenue_risk, RiskLevel::Moderate);
    }

    #[test]
    fn test_trend_projection_needs_two_periods() {
        let (store, config, resolver) = fixtures();
        let result = trend_projection(&store, &config, &resolver, &["2023".to_string()]);
        assert!(matches!(result, Err(EngineError::NoDataFound(_))));
    }
}

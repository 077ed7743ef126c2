//! # Ledger Statements
//!
//! A library for turning a raw, immutable ledger of accounting transactions
//! into classified financial statements, derived ratios and period
//! comparisons, wrapped in a resilient multi-tier query strategy that
//! always returns a structured answer.
//!
//! ## Core Concepts
//!
//! - **Period Resolution**: free-form period expressions ("2023",
//!   "Q1 2023", "April 2023", "this year") become canonical date ranges.
//!   Quarters follow the April-start fiscal year, and unparseable input
//!   degrades to a default period instead of erroring.
//! - **Classification**: transactions of unknown provenance are tagged
//!   into financial categories by layered heuristics; voucher semantics
//!   beat ledger text, which beats parent-group text. Unmatched entries
//!   stay visible as diagnostics.
//! - **Statements**: P&L, balance sheet/net worth and cash flow builders
//!   aggregate classified entries into line items and summary metrics,
//!   plus ratios and a composite health score on top.
//! - **Resilient Resolution**: semantic requests run through an ordered
//!   fallback chain (targeted, broadened, full scan, emergency) and every
//!   result carries a method and confidence tag.
//!
//! ## Example
//!
//! ```rust,ignore
//! use ledger_statements::*;
//!
//! let store = MemoryStore::new(vouchers, entries, ledgers, stock_items);
//! let engine = ReportEngine::new(store, EngineConfig::new("ACME Traders"));
//!
//! let report = engine.comprehensive_report("Q1 2023");
//! println!("{:?}", report.health.overall_health);
//!
//! let result = engine.query_text("verify client AR Mobiles", &QueryContext::default());
//! assert!(result.provenance.method.len() > 0);
//! ```

pub mod availability;
pub mod balances;
pub mod cash_flow;
pub mod classify;
pub mod error;
pub mod inventory;
pub mod metrics;
pub mod net_worth;
pub mod period;
pub mod profit_loss;
pub mod quarters;
pub mod report;
pub mod resolver;
pub mod sales;
pub mod schema;
pub mod store;
pub mod trends;
pub mod utils;

pub use availability::{
    data_availability, validate_period, CoverageQuality, DataAvailability, DataQuality,
    PeriodValidation, YearCoverage,
};
pub use balances::{
    cash_balances, customer_outstanding, CashAccount, CashBalances, CashPosition,
    OutstandingItem, OutstandingReport,
};
pub use cash_flow::{build_cash_flow, CashFlowStatement, FlowItem, FlowStatus};
pub use classify::{
    classify_balance, classify_cash_flow, classify_profit_loss, BalanceClassification,
    BalanceKind, FlowActivity, GapDiagnostics, UnclassifiedEntry,
};
pub use error::{EngineError, Result};
pub use inventory::{inventory_summary, CategoryValue, InventorySummary, StockLine};
pub use metrics::{
    derive_metrics, EfficiencyMetrics, FinancialMetrics, Grade, HealthScore, LeverageRatios,
    ProfitabilityRatios, StabilityLevel, UtilizationLevel,
};
pub use net_worth::{build_net_worth, BalanceBucket, BalanceItem, NetWorthStatement, Solvency};
pub use period::PeriodResolver;
pub use profit_loss::{build_profit_loss, CategoryBucket, ProfitLossStatement};
pub use quarters::{
    compare_quarters, quarterly_analysis, resolve_base_quarter, ActivityLevel, ComparisonSummary,
    ComparisonType, ConsistencyRating, FiscalQuarter, GrowthTrend, OverallTrend,
    PerformanceTrend, QuarterComparison, QuarterComparisonReport, QuarterGrowth,
    QuarterPerformance, QuarterlyAnalysis,
};
pub use report::{
    build_comprehensive_report, ComprehensiveReport, HealthIndicators, Liquidity, OverallHealth,
    Profitability,
};
pub use resolver::{
    resolve_query, resolve_query_text, BusinessMetrics, CapabilityInfo, CashActivity,
    ClientMatch, ClientVerification, EmergencyInfo, FinancialOverview, QueryData, QueryResult,
    RequestKind, SalesBreakdownRow, SalesTotals, YearlyFinancials,
};
pub use sales::{
    build_sales_analysis, categorize_sales_ledger, SalesAnalysis, SalesCategory, SalesLine,
};
pub use schema::{
    AccountingEntry, Category, Confidence, EngineConfig, LedgerAccount, LineItem, PeriodRange,
    PeriodResolution, PostedEntry, Provenance, QueryContext, StockItem, Voucher,
};
pub use store::{EntryFilter, LedgerActivity, MemoryStore, MonthlyActivity, TransactionStore};
pub use trends::{
    comparative_analysis, trend_projection, ComparativeAnalysis, Direction, MultiPeriodTrend,
    PeriodComparison, PeriodPerformance, RiskLevel, TrendProjection, VolatilityLevel,
};

use chrono::NaiveDate;
use log::info;
use utils::last_day_of_month;

/// Used when the store is empty and no reference date was configured.
/// A fixed fiscal-year closing day, never the wall clock, so empty-store
/// behavior is reproducible.
const FALLBACK_REFERENCE: (i32, u32, u32) = (2024, 3, 31);

/// The engine facade: an injected read-only store plus configuration.
/// Every report entry point absorbs store failures into error-tagged,
/// zero-valued results, so callers can always render something.
pub struct ReportEngine<S: TransactionStore> {
    store: S,
    config: EngineConfig,
}

impl<S: TransactionStore> ReportEngine<S> {
    pub fn new(store: S, config: EngineConfig) -> Self {
        info!("Report engine ready for {}", config.company_name);
        Self { store, config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// The date relative period expressions resolve against: configured
    /// explicitly, else the newest recorded voucher month, else a fixed
    /// fallback. Never the wall clock, so fixtures behave the same on
    /// every run.
    pub fn reference_date(&self) -> NaiveDate {
        if let Some(date) = self.config.reference_date {
            return date;
        }
        if let Ok(months) = self.store.monthly_activity() {
            if let Some(last) = months.last() {
                return last_day_of_month(last.year, last.month);
            }
        }
        let (y, m, d) = FALLBACK_REFERENCE;
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    pub fn period_resolver(&self) -> PeriodResolver {
        PeriodResolver::new(self.reference_date())
    }

    pub fn resolve_period(&self, expression: &str) -> PeriodRange {
        self.period_resolver().resolve(expression)
    }

    pub fn profit_loss(&self, expression: &str) -> ProfitLossStatement {
        let period = self.resolve_period(expression);
        build_profit_loss(&self.store, &self.config, &period)
            .unwrap_or_else(|e| ProfitLossStatement::unavailable(&self.config, &period, &e))
    }

    pub fn net_worth(&self) -> NetWorthStatement {
        build_net_worth(&self.store, &self.config)
            .unwrap_or_else(|e| NetWorthStatement::unavailable(&self.config, &e))
    }

    pub fn cash_flow(&self, expression: &str) -> CashFlowStatement {
        let period = self.resolve_period(expression);
        build_cash_flow(&self.store, &self.config, &period)
            .unwrap_or_else(|e| CashFlowStatement::unavailable(&self.config, &period, &e))
    }

    pub fn sales_analysis(&self, expression: &str) -> SalesAnalysis {
        let period = self.resolve_period(expression);
        build_sales_analysis(&self.store, &self.config, &period)
            .unwrap_or_else(|e| SalesAnalysis::unavailable(&self.config, &period, &e))
    }

    pub fn comprehensive_report(&self, expression: &str) -> ComprehensiveReport {
        let period = self.resolve_period(expression);
        build_comprehensive_report(&self.store, &self.config, &period)
    }

    pub fn financial_metrics(&self, expression: &str) -> FinancialMetrics {
        let report = self.comprehensive_report(expression);
        derive_metrics(&report, &self.config)
    }

    pub fn quarterly_analysis(&self, fiscal_year: i32) -> QuarterlyAnalysis {
        quarterly_analysis(&self.store, &self.config, fiscal_year)
    }

    /// Quarter comparison. The base token may be "Q<k> <year>", a bare
    /// year (read as its Q4) or "latest", which resolves against the
    /// newest recorded data.
    pub fn quarter_comparison(
        &self,
        base: &str,
        comparison_periods: Option<&[String]>,
    ) -> QuarterComparisonReport {
        compare_quarters(
            &self.store,
            &self.config,
            base,
            comparison_periods,
            self.reference_date(),
        )
    }

    pub fn comparative_analysis(&self, periods: &[String]) -> Result<ComparativeAnalysis> {
        comparative_analysis(&self.store, &self.config, &self.period_resolver(), periods)
    }

    pub fn trend_projection(&self, periods: &[String]) -> Result<TrendProjection> {
        trend_projection(&self.store, &self.config, &self.period_resolver(), periods)
    }

    pub fn data_availability(&self) -> Result<DataAvailability> {
        data_availability(&self.store)
    }

    pub fn validate_period(&self, expression: &str) -> Result<PeriodValidation> {
        validate_period(&self.store, &self.resolve_period(expression))
    }

    pub fn cash_balances(&self) -> Result<CashBalances> {
        cash_balances(&self.store, &self.config)
    }

    pub fn customer_outstanding(&self, customer: Option<&str>) -> Result<OutstandingReport> {
        customer_outstanding(&self.store, &self.config, customer)
    }

    pub fn inventory_summary(&self) -> Result<InventorySummary> {
        inventory_summary(&self.store, &self.config)
    }

    /// Resolver entry point for typed request kinds.
    pub fn query(&self, kind: RequestKind, context: &QueryContext) -> QueryResult {
        resolve_query(&self.store, &self.config, &self.period_resolver(), kind, context)
    }

    /// Resolver entry point for free-form request text.
    pub fn query_text(&self, request: &str, context: &QueryContext) -> QueryResult {
        resolve_query_text(&self.store, &self.config, &self.period_resolver(), request, context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn day(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn engine() -> ReportEngine<MemoryStore> {
        let store = MemoryStore::new(
            vec![
                Voucher {
                    id: "v1".to_string(),
                    date: day(2023, 4, 12),
                    voucher_type: "Sales".to_string(),
                },
                Voucher {
                    id: "v2".to_string(),
                    date: day(2023, 5, 3),
                    voucher_type: "Purchase".to_string(),
                },
            ],
            vec![
                AccountingEntry {
                    voucher_id: "v1".to_string(),
                    ledger_name: "Mobile Sales".to_string(),
                    amount: 100000.0,
                },
                AccountingEntry {
                    voucher_id: "v2".to_string(),
                    ledger_name: "Samsung Purchases".to_string(),
                    amount: 60000.0,
                },
            ],
            vec![LedgerAccount {
                name: "HDFC Bank".to_string(),
                parent_group: "Bank Accounts".to_string(),
                opening_balance: 500000.0,
            }],
            vec![],
        );
        ReportEngine::new(store, EngineConfig::new("VASAVI TRADE ZONE"))
    }

    #[test]
    fn test_reference_date_derived_from_data() {
        let engine = engine();
        // Newest voucher is May 2023, so the reference is that month's end
        assert_eq!(engine.reference_date(), day(2023, 5, 31));
    }

    #[test]
    fn test_reference_date_fallback_when_empty() {
        let engine = ReportEngine::new(MemoryStore::default(), EngineConfig::new("Empty"));
        assert_eq!(engine.reference_date(), day(2024, 3, 31));
    }

    #[test]
    fn test_configured_reference_date_wins() {
        let engine = ReportEngine::new(
            MemoryStore::default(),
            EngineConfig::new("Pinned").with_reference_date(day(2022, 12, 1)),
        );
        assert_eq!(engine.reference_date(), day(2022, 12, 1));
    }

    #[test]
    fn test_end_to_end_worked_example() {
        let engine = engine();
        let statement = engine.profit_loss("Q1 2023");

        assert!((statement.revenue.total - 100000.0).abs() < 0.01);
        assert!((statement.cost_of_goods_sold.total - 60000.0).abs() < 0.01);
        assert!((statement.gross_profit - 40000.0).abs() < 0.01);
        assert!((statement.gross_margin - 40.0).abs() < 0.01);
        assert!(statement.error.is_none());
    }

    #[test]
    fn test_comprehensive_report_and_metrics() {
        let engine = engine();
        let report = engine.comprehensive_report("2023");
        assert_eq!(report.health.profitability, Profitability::Profitable);
        assert_eq!(report.health.solvency, Solvency::Solvent);

        let metrics = engine.financial_metrics("2023");
        assert!(metrics.score.overall > 0.0);
        assert!(metrics.score.overall <= 100.0);
    }

    #[test]
    fn test_query_text_round_trip() {
        let engine = engine();
        let result = engine.query_text("business overview please", &QueryContext::default());
        assert!(result.request_fulfilled);
        assert_eq!(result.kind, RequestKind::Overview);
    }
}

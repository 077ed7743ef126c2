use chrono::NaiveDate;
use ledger_statements::*;

fn day(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

struct FixtureBuilder {
    vouchers: Vec<Voucher>,
    entries: Vec<AccountingEntry>,
    next_id: usize,
}

impl FixtureBuilder {
    fn new() -> Self {
        Self {
            vouchers: Vec::new(),
            entries: Vec::new(),
            next_id: 0,
        }
    }

    fn voucher(&mut self, date: NaiveDate, voucher_type: &str, postings: &[(&str, f64)]) {
        let id = format!("v{}", self.next_id);
        self.next_id += 1;
        self.vouchers.push(Voucher {
            id: id.clone(),
            date,
            voucher_type: voucher_type.to_string(),
        });
        for (ledger, amount) in postings {
            self.entries.push(AccountingEntry {
                voucher_id: id.clone(),
                ledger_name: ledger.to_string(),
                amount: *amount,
            });
        }
    }
}

/// A year of trading for a small mobile shop: sales and purchases through
/// the fiscal year 2023, expenses, a loan drawdown and a ledger snapshot.
fn trading_store() -> MemoryStore {
    let mut fb = FixtureBuilder::new();

    // Fiscal Q1 2023 (Apr-Jun): strong start. Sales vouchers debit the
    // bank and credit the sales ledger; the positive leg is what the
    // voucher-type rule counts.
    fb.voucher(day(2023, 4, 10), "GST Sales", &[("HDFC Bank", 100000.0), ("Mobile Sales", -100000.0)]);
    fb.voucher(day(2023, 5, 15), "Purchase", &[("Samsung Purchases", 60000.0), ("HDFC Bank", -60000.0)]);
    fb.voucher(day(2023, 6, 1), "Payment", &[("Shop Rent", 12000.0), ("HDFC Bank", -12000.0)]);

    // Fiscal Q2 2023 (Jul-Sep): growth
    fb.voucher(day(2023, 7, 12), "GST Sales", &[("HDFC Bank", 140000.0), ("Mobile Sales", -140000.0)]);
    fb.voucher(day(2023, 8, 2), "Purchase", &[("Samsung Purchases", 80000.0), ("HDFC Bank", -80000.0)]);
    fb.voucher(day(2023, 9, 1), "Payment", &[("Staff Salary", 18000.0), ("Cash in Hand", -18000.0)]);

    // Fiscal Q3 2023 (Oct-Dec): festival quarter
    fb.voucher(day(2023, 10, 20), "GST Sales", &[("HDFC Bank", 220000.0), ("Mobile Sales", -220000.0)]);
    fb.voucher(day(2023, 11, 5), "GST Sales", &[("Cash in Hand", 30000.0), ("Accessory Sales", -30000.0)]);
    fb.voucher(day(2023, 12, 1), "Purchase", &[("Samsung Purchases", 150000.0), ("HDFC Bank", -150000.0)]);

    // Fiscal Q4 2023 (Jan-Mar 2024): cooling off, loan drawdown
    fb.voucher(day(2024, 1, 15), "GST Sales", &[("HDFC Bank", 90000.0), ("Mobile Sales", -90000.0)]);
    fb.voucher(day(2024, 2, 1), "Journal", &[("Business Loan Cash", 50000.0)]);
    fb.voucher(day(2024, 2, 20), "Receipt", &[("HDFC Bank", 3000.0), ("Interest on Deposit", -3000.0)]);
    fb.voucher(day(2024, 3, 5), "Journal", &[("Misc Suspense", 777.0)]);

    MemoryStore::new(
        fb.vouchers,
        fb.entries,
        vec![
            LedgerAccount {
                name: "HDFC Bank".to_string(),
                parent_group: "Bank Accounts".to_string(),
                opening_balance: 450000.0,
            },
            LedgerAccount {
                name: "Cash in Hand".to_string(),
                parent_group: "Cash-in-Hand".to_string(),
                opening_balance: 80000.0,
            },
            LedgerAccount {
                name: "Delivery Van".to_string(),
                parent_group: "Motor Vehicles".to_string(),
                opening_balance: 250000.0,
            },
            LedgerAccount {
                name: "Acme Distributors".to_string(),
                parent_group: "Sundry Creditors".to_string(),
                opening_balance: 180000.0,
            },
            LedgerAccount {
                name: "AR Mobiles".to_string(),
                parent_group: "Sundry Debtors".to_string(),
                opening_balance: 95000.0,
            },
            LedgerAccount {
                name: "Owner Capital".to_string(),
                parent_group: "Capital Account".to_string(),
                opening_balance: 400000.0,
            },
        ],
        vec![
            StockItem {
                name: "Galaxy S23".to_string(),
                category: "Mobile".to_string(),
                quantity: 6.0,
                rate: 70000.0,
            },
            StockItem {
                name: "Flip Cover".to_string(),
                category: "Accessory".to_string(),
                quantity: 200.0,
                rate: 250.0,
            },
        ],
    )
}

fn engine() -> ReportEngine<MemoryStore> {
    ReportEngine::new(trading_store(), EngineConfig::new("VASAVI TRADE ZONE"))
}

#[test]
fn test_fiscal_year_profit_and_loss() {
    let engine = engine();
    let statement = engine.profit_loss("Q3 2023");

    // Festival quarter: two sales vouchers, one purchase
    assert!((statement.revenue.total - 250000.0).abs() < 0.01);
    assert!((statement.cost_of_goods_sold.total - 150000.0).abs() < 0.01);
    assert!((statement.gross_profit - 100000.0).abs() < 0.01);
    assert!((statement.gross_margin - 40.0).abs() < 0.01);
}

#[test]
fn test_profit_identity_over_whole_ledger() {
    let engine = engine();
    for expression in ["2023", "2024", "Q1 2023", "Q4 2023", "2023 to 2024"] {
        let s = engine.profit_loss(expression);
        let identity = s.revenue.total - s.cost_of_goods_sold.total - s.operating_expenses.total
            + s.other_income.total
            - s.other_expenses.total;
        assert!(
            (s.net_profit - identity).abs() < 0.005,
            "identity broken for {}",
            expression
        );
    }
}

#[test]
fn test_unclassified_entries_surface_in_diagnostics() {
    let engine = engine();
    let statement = engine.profit_loss("Q4 2023");
    assert_eq!(statement.gaps.unclassified_count(), 2);
    let gapped: Vec<&str> = statement
        .gaps
        .unclassified
        .iter()
        .map(|g| g.ledger_name.as_str())
        .collect();
    assert!(gapped.contains(&"Misc Suspense"));
    assert!(gapped.contains(&"Business Loan Cash"));
}

#[test]
fn test_net_worth_from_snapshot() {
    let engine = engine();
    let statement = engine.net_worth();

    // Assets: bank 450k + cash 80k + van 250k. Positive sundry balances
    // (debtors included) land in liabilities under the parent-group rules.
    assert!((statement.assets.total - 780000.0).abs() < 0.01);
    assert!((statement.liabilities.total - 275000.0).abs() < 0.01);
    assert!((statement.capital.total - 400000.0).abs() < 0.01);
    assert!((statement.net_worth - 505000.0).abs() < 0.01);
    assert!(statement.is_solvent());
}

#[test]
fn test_cash_flow_splits_activities() {
    let engine = engine();
    let statement = engine.cash_flow("2023");

    assert!(statement.total_inflows > 0.0);
    assert!(statement.total_outflows > 0.0);
    assert!(
        (statement.net_cash_flow - (statement.total_inflows - statement.total_outflows)).abs()
            < 0.005
    );
    assert!(!statement.operating_inflows.is_empty());
    assert!(!statement.operating_outflows.is_empty());
}

#[test]
fn test_comprehensive_report_health() {
    let engine = engine();
    let report = engine.comprehensive_report("2023");

    assert_eq!(report.health.profitability, Profitability::Profitable);
    assert_eq!(report.health.solvency, Solvency::Solvent);
    assert_eq!(report.health.overall_health, OverallHealth::Good);

    let metrics = engine.financial_metrics("2023");
    assert!(metrics.score.overall >= 0.0 && metrics.score.overall <= 100.0);
    assert!(metrics.profitability.net_margin > 0.0);
}

#[test]
fn test_latest_quarter_comes_from_data() {
    let engine = engine();
    let report = engine.quarter_comparison("latest", None);

    // Newest voucher is March 2024, which sits in fiscal Q4 2023
    assert_eq!(report.base.label, "Q4 2023");
    assert!(!report.comparisons.is_empty());
    assert!(report.summary.best_comparison.is_some());
}

#[test]
fn test_quarterly_analysis_ranks_quarters() {
    let engine = engine();
    let analysis = engine.quarterly_analysis(2023);

    assert_eq!(analysis.quarters.len(), 4);
    assert_eq!(analysis.best_quarter, "Q3 2023");
    assert!((analysis.total_revenue - 580000.0).abs() < 0.01);
}

#[test]
fn test_degenerate_quarter_comparison() {
    let engine = engine();
    let tokens = vec!["Q2 2023".to_string()];
    let report = engine.quarter_comparison("Q2 2023", Some(&tokens));

    assert_eq!(report.comparisons.len(), 1);
    assert_eq!(report.comparisons[0].revenue_change_pct, 0.0);
    assert_eq!(report.comparisons[0].trend, PerformanceTrend::Stable);
}

#[test]
fn test_comparative_analysis_and_projection() {
    let engine = engine();
    let periods: Vec<String> = ["Q1 2023", "Q2 2023", "Q3 2023"]
        .iter()
        .map(|s| s.to_string())
        .collect();

    let analysis = engine.comparative_analysis(&periods).unwrap();
    assert_eq!(analysis.best_period.as_deref(), Some("Q3 2023"));
    assert_eq!(analysis.comparisons.len(), 2);

    let projection = engine.trend_projection(&periods).unwrap();
    assert_eq!(projection.periods_analyzed, 3);
    assert_eq!(projection.revenue_direction, Direction::Increasing);
    // Q1 100k -> Q3 250k over 2 steps
    assert!((projection.revenue_trend_per_period - 75000.0).abs() < 0.01);
}

#[test]
fn test_period_validation_suggests_alternatives() {
    let engine = engine();
    let validation = engine.validate_period("2019").unwrap();
    assert!(!validation.available);
    assert_eq!(validation.quality, CoverageQuality::NoData);

    let validation = engine.validate_period("2023").unwrap();
    assert!(validation.available);
}

#[test]
fn test_outstanding_and_cash_balances() {
    let engine = engine();

    let balances = engine.cash_balances().unwrap();
    assert!((balances.total - 530000.0).abs() < 0.01);
    assert_eq!(balances.primary_account.as_deref(), Some("HDFC Bank"));

    let outstanding = engine.customer_outstanding(None).unwrap();
    assert!((outstanding.total_receivables - 275000.0).abs() < 0.01);
    assert_eq!(outstanding.payable_count, 0);
}

#[test]
fn test_inventory_summary_values_stock() {
    let engine = engine();
    let summary = engine.inventory_summary().unwrap();
    assert_eq!(summary.item_count, 2);
    assert!((summary.total_value - 470000.0).abs() < 0.01);
    assert_eq!(summary.items[0].name, "Galaxy S23");
}

#[test]
fn test_resolver_liveness_for_every_kind_and_bogus_context() {
    let engine = engine();
    let contexts = [
        QueryContext::default(),
        QueryContext {
            client_name: Some("AR Mobiles".to_string()),
            period: Some("Q2 2023".to_string()),
            ..QueryContext::default()
        },
        QueryContext {
            client_name: Some("".to_string()),
            period: Some("absolute nonsense".to_string()),
            historical_periods: vec!["???".to_string()],
            service_level: Some("premium".to_string()),
        },
    ];

    for context in &contexts {
        for kind in RequestKind::all() {
            let result = engine.query(kind, context);
            assert!(!result.provenance.method.is_empty());
        }
    }
}

#[test]
fn test_resolver_results_serialize() -> anyhow::Result<()> {
    let engine = engine();
    let result = engine.query_text("financial summary for 2023", &QueryContext::default());
    let json = serde_json::to_string(&result)?;
    assert!(json.contains("provenance"));
    assert!(json.contains("method"));
    Ok(())
}

/// Every read fails; builders must still hand back renderable statements
/// and the resolver must still answer.
struct UnreachableStore;

impl TransactionStore for UnreachableStore {
    fn entries(&self, _: &EntryFilter) -> Result<Vec<PostedEntry>> {
        Err(EngineError::StoreUnavailable("socket closed".to_string()))
    }
    fn ledger_accounts(&self) -> Result<Vec<LedgerAccount>> {
        Err(EngineError::StoreUnavailable("socket closed".to_string()))
    }
    fn ledgers_matching(&self, _: &[&str]) -> Result<Vec<LedgerAccount>> {
        Err(EngineError::StoreUnavailable("socket closed".to_string()))
    }
    fn ledger_names(&self) -> Result<Vec<String>> {
        Err(EngineError::StoreUnavailable("socket closed".to_string()))
    }
    fn ledger_activity(&self, _: Option<&str>) -> Result<Vec<LedgerActivity>> {
        Err(EngineError::StoreUnavailable("socket closed".to_string()))
    }
    fn stock_items(&self) -> Result<Vec<StockItem>> {
        Err(EngineError::StoreUnavailable("socket closed".to_string()))
    }
    fn all_stock_items(&self) -> Result<Vec<StockItem>> {
        Err(EngineError::StoreUnavailable("socket closed".to_string()))
    }
    fn monthly_activity(&self) -> Result<Vec<MonthlyActivity>> {
        Err(EngineError::StoreUnavailable("socket closed".to_string()))
    }
    fn voucher_count_in_period(&self, _: &PeriodRange) -> Result<usize> {
        Err(EngineError::StoreUnavailable("socket closed".to_string()))
    }
}

#[test]
fn test_unreachable_store_yields_error_tagged_statements() {
    let engine = ReportEngine::new(UnreachableStore, EngineConfig::new("VASAVI TRADE ZONE"));

    let pl = engine.profit_loss("2023");
    assert!(pl.error.is_some());
    assert_eq!(pl.net_profit, 0.0);

    let nw = engine.net_worth();
    assert!(nw.error.is_some());
    assert_eq!(nw.net_worth, 0.0);

    let cf = engine.cash_flow("2023");
    assert!(cf.error.is_some());
    assert_eq!(cf.net_cash_flow, 0.0);

    let report = engine.comprehensive_report("2023");
    assert_eq!(report.health.overall_health, OverallHealth::NeedsAttention);
}

#[test]
fn test_unreachable_store_reaches_emergency_tier() {
    let engine = ReportEngine::new(UnreachableStore, EngineConfig::new("VASAVI TRADE ZONE"));
    let result = engine.query(RequestKind::FinancialSummary, &QueryContext::default());

    assert!(!result.request_fulfilled);
    assert_eq!(result.provenance.confidence, Confidence::None);
    match result.data {
        QueryData::Emergency(info) => {
            assert!(!info.available_request_kinds.is_empty());
        }
        other => panic!("expected emergency payload, got {:?}", other),
    }
}

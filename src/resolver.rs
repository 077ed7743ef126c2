use crate::availability::{data_availability, DataAvailability};
use crate::balances::{cash_balances, CashBalances};
use crate::cash_flow::{build_cash_flow, CashFlowStatement};
use crate::error::Result;
use crate::inventory::{inventory_summary, CategoryValue, InventorySummary};
use crate::period::PeriodResolver;
use crate::report::{build_comprehensive_report, ComprehensiveReport};
use crate::sales::{build_sales_analysis, SalesAnalysis};
use crate::schema::{Confidence, EngineConfig, PeriodRange, Provenance, QueryContext};
use crate::store::{EntryFilter, LedgerActivity, TransactionStore};
use chrono::Datelike;
use log::{debug, warn};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Closed set of request kinds the resolver serves. String callers go
/// through [`RequestKind::from_request_text`], which applies the same
/// keyword heuristics the upstream agents use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    ClientVerification,
    FinancialSummary,
    Sales,
    Cash,
    Inventory,
    Overview,
}

impl RequestKind {
    pub fn name(&self) -> &'static str {
        match self {
            RequestKind::ClientVerification => "client_verification",
            RequestKind::FinancialSummary => "financial_summary",
            RequestKind::Sales => "sales",
            RequestKind::Cash => "cash",
            RequestKind::Inventory => "inventory",
            RequestKind::Overview => "overview",
        }
    }

    pub fn all() -> [RequestKind; 6] {
        [
            RequestKind::ClientVerification,
            RequestKind::FinancialSummary,
            RequestKind::Sales,
            RequestKind::Cash,
            RequestKind::Inventory,
            RequestKind::Overview,
        ]
    }

    /// Keyword dispatch for free-form request text. Unknown text falls
    /// through a second round of looser heuristics and lands on Overview.
    pub fn from_request_text(text: &str) -> Self {
        let request = text.to_lowercase();
        let has = |terms: &[&str]| terms.iter().any(|t| request.contains(t));

        if has(&["client", "customer", "verification"]) {
            RequestKind::ClientVerification
        } else if has(&["financial", "profit", "loss", "income"]) {
            RequestKind::FinancialSummary
        } else if has(&["sales", "selling", "revenue"]) {
            RequestKind::Sales
        } else if has(&["cash", "balance", "bank", "funds"]) {
            RequestKind::Cash
        } else if has(&["inventory", "stock", "products", "mobile", "samsung"]) {
            RequestKind::Inventory
        } else if has(&["business", "summary", "overview", "general"]) {
            RequestKind::Overview
        } else if has(&["money", "amount", "total"]) {
            RequestKind::FinancialSummary
        } else {
            RequestKind::Overview
        }
    }
}

/// One verified ledger match for a client lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientMatch {
    pub name: String,
    pub transaction_count: usize,
    pub total_inflow: f64,
    pub total_outflow: f64,
    pub net_amount: f64,
    pub first_transaction: chrono::NaiveDate,
    pub last_transaction: chrono::NaiveDate,
}

impl From<LedgerActivity> for ClientMatch {
    fn from(activity: LedgerActivity) -> Self {
        Self {
            name: activity.ledger_name.clone(),
            transaction_count: activity.transaction_count,
            total_inflow: activity.total_inflow,
            total_outflow: activity.total_outflow,
            net_amount: activity.net_amount(),
            first_transaction: activity.first_transaction,
            last_transaction: activity.last_transaction,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientVerification {
    pub search_term: String,
    pub verified: bool,
    pub matches: Vec<ClientMatch>,
    /// Names from the full-scan tier, where only the ledger list is
    /// available.
    pub name_matches: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YearlyFinancials {
    pub year: i32,
    pub income: f64,
    pub expenses: f64,
    pub profit: f64,
    pub margin: f64,
    pub transactions: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinancialOverview {
    pub years: Vec<YearlyFinancials>,
    pub total_profit: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalesBreakdownRow {
    pub voucher_type: String,
    pub year: i32,
    pub amount: f64,
    pub transaction_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalesTotals {
    pub total_sales: f64,
    pub transaction_count: usize,
    pub breakdown: Vec<SalesBreakdownRow>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashActivity {
    pub accounts: Vec<LedgerActivity>,
    pub net_movement: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessMetrics {
    pub company_name: String,
    pub total_vouchers: usize,
    pub total_accounts: usize,
    pub gross_amount: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapabilityInfo {
    pub company_name: String,
    pub request_kinds: Vec<String>,
}

/// Static emergency payload: the final tier always materializes this,
/// even when every read against the store has failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmergencyInfo {
    pub original_request: String,
    pub error: Option<String>,
    pub message: String,
    pub available_request_kinds: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum QueryData {
    ClientVerification(ClientVerification),
    Report(Box<ComprehensiveReport>),
    YearlyFinancials(FinancialOverview),
    SalesAnalysis(SalesAnalysis),
    SalesTotals(SalesTotals),
    CashFlow(CashFlowStatement),
    CashBalances(CashBalances),
    CashActivity(CashActivity),
    Inventory(InventorySummary),
    StockCategories(Vec<CategoryValue>),
    StockCount(usize),
    Availability(DataAvailability),
    BusinessMetrics(BusinessMetrics),
    Capabilities(CapabilityInfo),
    Emergency(EmergencyInfo),
}

/// What the resolver hands back: always well-formed, always tagged with
/// the method and confidence of the tier that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResult {
    pub kind: RequestKind,
    pub request_fulfilled: bool,
    pub provenance: Provenance,
    pub data: QueryData,
}

fn absorb<T>(result: Result<T>, tier: &str) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("{} found nothing: {}", tier, e);
            None
        }
    }
}

fn fulfilled(kind: RequestKind, method: &str, confidence: Confidence, data: QueryData) -> QueryResult {
    QueryResult {
        kind,
        request_fulfilled: true,
        provenance: Provenance::new(method, confidence),
        data,
    }
}

fn emergency(kind: RequestKind, request: &str, error: Option<String>) -> QueryResult {
    QueryResult {
        kind,
        request_fulfilled: false,
        provenance: Provenance::new("Emergency capability response", Confidence::None),
        data: QueryData::Emergency(EmergencyInfo {
            original_request: request.to_string(),
            error,
            message: "The preferred query paths found nothing usable; the engine can still serve the listed request kinds.".to_string(),
            available_request_kinds: RequestKind::all().iter().map(|k| k.name().to_string()).collect(),
        }),
    }
}

/// Resolves a request through the ordered strategy chain: targeted query,
/// broadened query, full scan, then the constant emergency response.
/// Each tier's failure is absorbed as "this tier found nothing"; the
/// function itself always returns.
pub fn resolve_query<S: TransactionStore + ?Sized>(
    store: &S,
    config: &EngineConfig,
    periods: &PeriodResolver,
    kind: RequestKind,
    context: &QueryContext,
) -> QueryResult {
    debug!("Resolving {} request", kind.name());
    match kind {
        RequestKind::ClientVerification => resolve_client(store, kind, context),
        RequestKind::FinancialSummary => resolve_financial(store, config, periods, kind, context),
        RequestKind::Sales => resolve_sales(store, config, periods, kind, context),
        RequestKind::Cash => resolve_cash(store, config, periods, kind, context),
        RequestKind::Inventory => resolve_inventory(store, config, kind),
        RequestKind::Overview => resolve_overview(store, config, kind),
    }
}

/// Same chain, but the request kind is inferred from free-form text.
pub fn resolve_query_text<S: TransactionStore + ?Sized>(
    store: &S,
    config: &EngineConfig,
    periods: &PeriodResolver,
    request: &str,
    context: &QueryContext,
) -> QueryResult {
    resolve_query(store, config, periods, RequestKind::from_request_text(request), context)
}

fn requested_period(periods: &PeriodResolver, context: &QueryContext) -> PeriodRange {
    match &context.period {
        Some(expr) => periods.resolve(expr),
        None => periods.default_period(),
    }
}

fn resolve_client<S: TransactionStore + ?Sized>(
    store: &S,
    kind: RequestKind,
    context: &QueryContext,
) -> QueryResult {
    let term = context.client_name.clone().unwrap_or_default();

    if !term.is_empty() {
        // Tier 1: targeted activity lookup on the full term
        if let Some(matches) = absorb(store.ledger_activity(Some(&term)), "Targeted client query") {
            if !matches.is_empty() {
                return fulfilled(
                    kind,
                    "Targeted ledger activity query",
                    Confidence::High,
                    QueryData::ClientVerification(ClientVerification {
                        search_term: term,
                        verified: true,
                        matches: matches.into_iter().map(ClientMatch::from).collect(),
                        name_matches: Vec::new(),
                    }),
                );
            }
        }

        // Tier 2: broadened per-word lookups
        let words: Vec<&str> = term.split_whitespace().filter(|w| w.len() >= 3).collect();
        let mut merged: BTreeMap<String, LedgerActivity> = BTreeMap::new();
        for word in &words {
            if let Some(matches) = absorb(store.ledger_activity(Some(word)), "Broadened client query")
            {
                for m in matches {
                    merged.entry(m.ledger_name.clone()).or_insert(m);
                }
            }
        }
        if !merged.is_empty() {
            return fulfilled(
                kind,
                "Broadened ledger activity scan",
                Confidence::Medium,
                QueryData::ClientVerification(ClientVerification {
                    search_term: term,
                    verified: true,
                    matches: merged.into_values().map(ClientMatch::from).collect(),
                    name_matches: Vec::new(),
                }),
            );
        }
    }

    // Tier 3: full ledger-name scan with in-process filtering
    if let Some(names) = absorb(store.ledger_names(), "Full ledger scan") {
        let upper = term.to_uppercase();
        let name_matches: Vec<String> = if upper.is_empty() {
            names
        } else {
            names
                .into_iter()
                .filter(|n| n.to_uppercase().contains(&upper))
                .collect()
        };
        if !name_matches.is_empty() {
            return fulfilled(
                kind,
                "Full ledger-name scan",
                Confidence::Low,
                QueryData::ClientVerification(ClientVerification {
                    verified: !term.is_empty(),
                    search_term: term,
                    matches: Vec::new(),
                    name_matches,
                }),
            );
        }
    }

    emergency(kind, &format!("client_verification:{}", term), None)
}

fn resolve_financial<S: TransactionStore + ?Sized>(
    store: &S,
    config: &EngineConfig,
    periods: &PeriodResolver,
    kind: RequestKind,
    context: &QueryContext,
) -> QueryResult {
    let period = requested_period(periods, context);

    // Tier 1: comprehensive report for the requested period
    let report = build_comprehensive_report(store, config, &period);
    if report.profit_loss.error.is_none() && report.profit_loss.total_transactions > 0 {
        return fulfilled(
            kind,
            "Comprehensive report for requested period",
            Confidence::High,
            QueryData::Report(Box::new(report)),
        );
    }

    // Tier 2: year-by-year totals over the whole ledger
    if let Some(rows) = absorb(store.entries(&EntryFilter::default()), "Yearly financial scan") {
        if !rows.is_empty() {
            let mut per_year: BTreeMap<i32, YearlyFinancials> = BTreeMap::new();
            for row in &rows {
                let slot = per_year
                    .entry(row.date.year())
                    .or_insert_with(|| YearlyFinancials {
                        year: row.date.year(),
                        income: 0.0,
                        expenses: 0.0,
                        profit: 0.0,
                        margin: 0.0,
                        transactions: 0,
                    });
                if row.amount > 0.0 {
                    slot.income += row.amount;
                } else {
                    slot.expenses += row.amount.abs();
                }
                slot.transactions += 1;
            }
            let mut years: Vec<YearlyFinancials> = per_year.into_values().collect();
            for y in &mut years {
                y.profit = y.income - y.expenses;
                y.margin = y.profit / y.income.max(1.0) * 100.0;
            }
            years.reverse();
            let total_profit = years.iter().map(|y| y.profit).sum();
            return fulfilled(
                kind,
                "Year-by-year financial totals",
                Confidence::Medium,
                QueryData::YearlyFinancials(FinancialOverview {
                    years,
                    total_profit,
                }),
            );
        }
    }

    // Tier 3: bare activity counts
    if let Some(metrics) = business_metrics(store, config) {
        if metrics.total_vouchers > 0 || metrics.total_accounts > 0 {
            return fulfilled(
                kind,
                "Basic transaction counts",
                Confidence::Low,
                QueryData::BusinessMetrics(metrics),
            );
        }
    }

    emergency(kind, "financial_summary", None)
}

fn resolve_sales<S: TransactionStore + ?Sized>(
    store: &S,
    config: &EngineConfig,
    periods: &PeriodResolver,
    kind: RequestKind,
    context: &QueryContext,
) -> QueryResult {
    let period = requested_period(periods, context);

    // Tier 1: categorized sales for the requested period
    if let Some(analysis) = absorb(
        build_sales_analysis(store, config, &period),
        "Targeted sales analysis",
    ) {
        if analysis.total_sales > 0.0 {
            return fulfilled(
                kind,
                "Sales analysis for requested period",
                Confidence::High,
                QueryData::SalesAnalysis(analysis),
            );
        }
    }

    // Tier 2: anything that looks like sales, any period
    let filter = EntryFilter {
        ledger_contains: vec!["SALES".to_string()],
        voucher_type_contains: vec!["SALES".to_string()],
        ..EntryFilter::default()
    };
    if let Some(rows) = absorb(store.entries(&filter), "Broadened sales scan") {
        let positive: Vec<_> = rows.into_iter().filter(|r| r.amount > 0.0).collect();
        if !positive.is_empty() {
            let mut grouped: BTreeMap<(String, i32), SalesBreakdownRow> = BTreeMap::new();
            let mut total_sales = 0.0;
            for row in &positive {
                let slot = grouped
                    .entry((row.voucher_type.clone(), row.date.year()))
                    .or_insert_with(|| SalesBreakdownRow {
                        voucher_type: row.voucher_type.clone(),
                        year: row.date.year(),
                        amount: 0.0,
                        transaction_count: 0,
                    });
                slot.amount += row.amount;
                slot.transaction_count += 1;
                total_sales += row.amount;
            }
            let mut breakdown: Vec<SalesBreakdownRow> = grouped.into_values().collect();
            breakdown.sort_by(|a, b| b.amount.total_cmp(&a.amount));
            return fulfilled(
                kind,
                "Sales-pattern scan across all periods",
                Confidence::Medium,
                QueryData::SalesTotals(SalesTotals {
                    total_sales,
                    transaction_count: positive.len(),
                    breakdown,
                }),
            );
        }
    }

    // Tier 3: every positive entry, as a coarse upper bound on sales
    if let Some(rows) = absorb(store.entries(&EntryFilter::default()), "Full positive scan") {
        let positive: Vec<_> = rows.into_iter().filter(|r| r.amount > 0.0).collect();
        if !positive.is_empty() {
            return fulfilled(
                kind,
                "All positive transactions",
                Confidence::Low,
                QueryData::SalesTotals(SalesTotals {
                    total_sales: positive.iter().map(|r| r.amount).sum(),
                    transaction_count: positive.len(),
                    breakdown: Vec::new(),
                }),
            );
        }
    }

    emergency(kind, "sales", None)
}

fn resolve_cash<S: TransactionStore + ?Sized>(
    store: &S,
    config: &EngineConfig,
    periods: &PeriodResolver,
    kind: RequestKind,
    context: &QueryContext,
) -> QueryResult {
    let period = requested_period(periods, context);

    // Tier 1: cash-flow statement for the requested period
    if let Some(statement) = absorb(
        build_cash_flow(store, config, &period),
        "Targeted cash flow",
    ) {
        if statement.total_transactions > 0 {
            return fulfilled(
                kind,
                "Cash flow for requested period",
                Confidence::High,
                QueryData::CashFlow(statement),
            );
        }
    }

    // Tier 2: snapshot balances from the ledger master
    if let Some(balances) = absorb(cash_balances(store, config), "Cash balance snapshot") {
        if !balances.accounts.is_empty() {
            return fulfilled(
                kind,
                "Cash and bank balance snapshot",
                Confidence::Medium,
                QueryData::CashBalances(balances),
            );
        }
    }

    // Tier 3: full activity scan over cash/bank ledgers
    let mut merged: BTreeMap<String, LedgerActivity> = BTreeMap::new();
    for pattern in ["CASH", "BANK"] {
        if let Some(matches) = absorb(store.ledger_activity(Some(pattern)), "Cash activity scan") {
            for m in matches {
                merged.entry(m.ledger_name.clone()).or_insert(m);
            }
        }
    }
    if !merged.is_empty() {
        let accounts: Vec<LedgerActivity> = merged.into_values().collect();
        let net_movement = accounts.iter().map(|a| a.net_amount()).sum();
        return fulfilled(
            kind,
            "Cash/bank transaction activity",
            Confidence::Low,
            QueryData::CashActivity(CashActivity {
                accounts,
                net_movement,
            }),
        );
    }

    emergency(kind, "cash", None)
}

fn resolve_inventory<S: TransactionStore + ?Sized>(
    store: &S,
    config: &EngineConfig,
    kind: RequestKind,
) -> QueryResult {
    // Tier 1: valued summary of in-stock items
    if let Some(summary) = absorb(inventory_summary(store, config), "Targeted inventory query") {
        if summary.item_count > 0 {
            return fulfilled(
                kind,
                "Stock item analysis",
                Confidence::High,
                QueryData::Inventory(summary),
            );
        }
    }

    // Tier 2: category rollup over all stock, in or out of stock
    if let Some(stock) = absorb(store.all_stock_items(), "Broadened stock scan") {
        if !stock.is_empty() {
            let mut per_category: BTreeMap<String, CategoryValue> = BTreeMap::new();
            for item in &stock {
                let slot = per_category
                    .entry(item.category.clone())
                    .or_insert_with(|| CategoryValue {
                        category: item.category.clone(),
                        item_count: 0,
                        total_value: 0.0,
                    });
                slot.item_count += 1;
                slot.total_value += item.value();
            }
            return fulfilled(
                kind,
                "Stock category rollup",
                Confidence::Medium,
                QueryData::StockCategories(per_category.into_values().collect()),
            );
        }
    }

    // Tier 3: bare item count
    if let Some(stock) = absorb(store.all_stock_items(), "Full stock count") {
        if !stock.is_empty() {
            return fulfilled(kind, "Stock item count", Confidence::Low, QueryData::StockCount(stock.len()));
        }
    }

    emergency(kind, "inventory", None)
}

fn business_metrics<S: TransactionStore + ?Sized>(
    store: &S,
    config: &EngineConfig,
) -> Option<BusinessMetrics> {
    let total_vouchers = absorb(store.monthly_activity(), "Voucher count")?
        .iter()
        .map(|m| m.voucher_count)
        .sum();
    let total_accounts = absorb(store.ledger_names(), "Account count")?.len();
    let gross_amount = absorb(store.entries(&EntryFilter::default()), "Gross amount")?
        .iter()
        .map(|r| r.amount.abs())
        .sum();
    Some(BusinessMetrics {
        company_name: config.company_name.clone(),
        total_vouchers,
        total_accounts,
        gross_amount,
    })
}

fn resolve_overview<S: TransactionStore + ?Sized>(
    store: &S,
    config: &EngineConfig,
    kind: RequestKind,
) -> QueryResult {
    // Tier 1: headline business metrics
    if let Some(metrics) = business_metrics(store, config) {
        if metrics.total_vouchers > 0 || metrics.total_accounts > 0 {
            return fulfilled(
                kind,
                "Business metrics analysis",
                Confidence::High,
                QueryData::BusinessMetrics(metrics),
            );
        }
    }

    // Tier 2: what data exists at all
    if let Some(availability) = absorb(data_availability(store), "Availability scan") {
        if availability.total_vouchers > 0 {
            return fulfilled(
                kind,
                "Data availability summary",
                Confidence::Medium,
                QueryData::Availability(availability),
            );
        }
    }

    // Tier 3: static capability listing; this tier cannot fail
    fulfilled(
        kind,
        "Capability listing",
        Confidence::Low,
        QueryData::Capabilities(CapabilityInfo {
            company_name: config.company_name.clone(),
            request_kinds: RequestKind::all().iter().map(|k| k.name().to_string()).collect(),
        }),
    )
}

use crate::classify::{classify_profit_loss, GapDiagnostics};
use crate::error::{EngineError, Result};
use crate::schema::{Category, EngineConfig, LineItem, PeriodRange};
use crate::store::{EntryFilter, TransactionStore};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How many line items each bucket exposes in its breakdown. Totals always
/// cover every classified entry.
pub const BREAKDOWN_LIMIT: usize = 10;

/// One classified bucket of a statement: full totals plus the most
/// material line items.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategoryBucket {
    pub total: f64,
    pub transaction_count: usize,
    pub breakdown: Vec<LineItem>,
}

impl CategoryBucket {
    fn from_items(mut items: Vec<LineItem>) -> Self {
        items.sort_by(|a, b| b.amount.total_cmp(&a.amount));
        let total = items.iter().map(|i| i.amount).sum();
        let transaction_count = items.iter().map(|i| i.transaction_count).sum();
        items.truncate(BREAKDOWN_LIMIT);
        Self {
            total,
            transaction_count,
            breakdown: items,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfitLossStatement {
    pub company_name: String,
    pub period: PeriodRange,

    pub revenue: CategoryBucket,
    pub cost_of_goods_sold: CategoryBucket,
    pub operating_expenses: CategoryBucket,
    pub other_income: CategoryBucket,
    pub other_expenses: CategoryBucket,

    pub gross_profit: f64,
    pub gross_margin: f64,
    pub operating_profit: f64,
    pub operating_margin: f64,
    pub net_profit: f64,
    pub net_margin: f64,

    pub total_transactions: usize,
    pub gaps: GapDiagnostics,

    /// Set when the backing store could not be read; the summary above is
    /// zero-valued so callers can still render.
    pub error: Option<String>,
}

impl ProfitLossStatement {
    pub fn is_profitable(&self) -> bool {
        self.net_profit > 0.0
    }

    /// COGS plus operating and other expenses, the divisor side of the
    /// cost ratio.
    pub fn total_expenses(&self) -> f64 {
        self.cost_of_goods_sold.total + self.operating_expenses.total + self.other_expenses.total
    }

    pub fn unavailable(config: &EngineConfig, period: &PeriodRange, error: &EngineError) -> Self {
        Self {
            company_name: config.company_name.clone(),
            period: period.clone(),
            revenue: CategoryBucket::default(),
            cost_of_goods_sold: CategoryBucket::default(),
            operating_expenses: CategoryBucket::default(),
            other_income: CategoryBucket::default(),
            other_expenses: CategoryBucket::default(),
            gross_profit: 0.0,
            gross_margin: 0.0,
            operating_profit: 0.0,
            operating_margin: 0.0,
            net_profit: 0.0,
            net_margin: 0.0,
            total_transactions: 0,
            gaps: GapDiagnostics::default(),
            error: Some(error.to_string()),
        }
    }
}

/// Builds a P&L statement for the period.
///
/// Classified entries with positive amounts aggregate per (category,
/// ledger). Margins divide by max(revenue, 1) so zero-revenue periods
/// report 0% instead of failing; that floor is the documented policy.
pub fn build_profit_loss<S: TransactionStore + ?Sized>(
    store: &S,
    config: &EngineConfig,
    period: &PeriodRange,
) -> Result<ProfitLossStatement> {
    let rows = store.entries(&EntryFilter::for_period(period))?;
    debug!(
        "Building P&L for {}: {} entries",
        period.description,
        rows.len()
    );

    let mut buckets: BTreeMap<&str, BTreeMap<String, LineItem>> = BTreeMap::new();
    let mut gaps = GapDiagnostics::default();
    let total_transactions = rows.len();

    for row in &rows {
        let category = classify_profit_loss(&row.voucher_type, &row.ledger_name, &row.parent_group);
        if category == Category::Unclassified {
            gaps.record_gap(&row.ledger_name, &row.voucher_type, row.amount);
            continue;
        }
        gaps.record_classified();
        if row.amount <= 0.0 {
            continue;
        }
        let key = match category {
            Category::Revenue => "revenue",
            Category::CostOfGoodsSold => "cogs",
            Category::OperatingExpense => "opex",
            Category::OtherIncome => "other_income",
            _ => "other_expenses",
        };
        let item = buckets
            .entry(key)
            .or_default()
            .entry(row.ledger_name.clone())
            .or_insert_with(|| LineItem {
                category,
                ledger_name: row.ledger_name.clone(),
                amount: 0.0,
                transaction_count: 0,
            });
        item.amount += row.amount;
        item.transaction_count += 1;
    }

    let mut bucket = |key: &str| {
        CategoryBucket::from_items(
            buckets
                .remove(key)
                .map(|m| m.into_values().collect())
                .unwrap_or_default(),
        )
    };

    let revenue = bucket("revenue");
    let cost_of_goods_sold = bucket("cogs");
    let operating_expenses = bucket("opex");
    let other_income = bucket("other_income");
    let other_expenses = bucket("other_expenses");

    let gross_profit = revenue.total - cost_of_goods_sold.total;
    let operating_profit = gross_profit - operating_expenses.total;
    let net_profit = operating_profit + other_income.total - other_expenses.total;
    let margin_base = revenue.total.max(1.0);

    if !gaps.unclassified.is_empty() {
        debug!(
            "P&L for {}: {} of {} entries unclassified",
            period.description,
            gaps.unclassified_count(),
            gaps.total_entries
        );
    }

    Ok(ProfitLossStatement {
        company_name: config.company_name.clone(),
        period: period.clone(),
        gross_profit,
        gross_margin: gross_profit / margin_base * 100.0,
        operating_profit,
        operating_margin: operating_profit / margin_base * 100.0,
        net_profit,
        net_margin: net_profit / margin_base * 100.0,
        revenue,
        cost_of_goods_sold,
        operating_expenses,
        other_income,
        other_expenses,
        total_transactions,
        gaps,
        error: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::period::PeriodResolver;
    use crate::schema::{AccountingEntry, Voucher};
    use crate::store::MemoryStore;
    use chrono::NaiveDate;

    fn day(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn voucher(id: &str, date: NaiveDate, vtype: &str) -> Voucher {
        Voucher {
            id: id.to_string(),
            date,
            voucher_type: vtype.to_string(),
        }
    }

    fn entry(voucher_id: &str, ledger: &str, amount: f64) -> AccountingEntry {
        AccountingEntry {
            voucher_id: voucher_id.to_string(),
            ledger_name: ledger.to_string(),
            amount,
        }
    }

    fn config() -> EngineConfig {
        EngineConfig::new("VASAVI TRADE ZONE")
    }

    #[test]
    fn test_worked_example_q1_2023() {
        let store = MemoryStore::new(
            vec![
                voucher("v1", day(2023, 4, 12), "Sales"),
                voucher("v2", day(2023, 5, 3), "Purchase"),
            ],
            vec![
                entry("v1", "Mobile Sales", 100000.0),
                entry("v2", "Samsung Stock", 60000.0),
            ],
            vec![],
            vec![],
        );
        let period = PeriodResolver::new(day(2024, 3, 31)).resolve("Q1 2023");
        let statement = build_profit_loss(&store, &config(), &period).unwrap();

        assert!((statement.revenue.total - 100000.0).abs() < 0.01);
        assert!((statement.cost_of_goods_sold.total - 60000.0).abs() < 0.01);
        assert!((statement.gross_profit - 40000.0).abs() < 0.01);
        assert!((statement.gross_margin - 40.0).abs() < 0.01);
    }

    #[test]
    fn test_net_profit_identity() {
        let store = MemoryStore::new(
            vec![
                voucher("v1", day(2023, 6, 1), "Sales"),
                voucher("v2", day(2023, 6, 5), "Purchase"),
                voucher("v3", day(2023, 6, 9), "Payment"),
                voucher("v4", day(2023, 6, 11), "Receipt"),
            ],
            vec![
                entry("v1", "Mobile Sales", 80000.0),
                entry("v2", "Accessory Purchases", 30000.0),
                entry("v3", "Shop Rent", 12000.0),
                entry("v4", "Commission Earned", 4000.0),
            ],
            vec![],
            vec![],
        );
        let period = PeriodResolver::new(day(2024, 3, 31)).resolve("2023");
        let s = build_profit_loss(&store, &config(), &period).unwrap();

        let identity = s.revenue.total - s.cost_of_goods_sold.total - s.operating_expenses.total
            + s.other_income.total
            - s.other_expenses.total;
        assert!((s.net_profit - identity).abs() < 0.005);
        assert!((s.net_profit - 42000.0).abs() < 0.01);
    }

    #[test]
    fn test_zero_revenue_margins_use_floor() {
        let store = MemoryStore::new(
            vec![voucher("v1", day(2023, 6, 9), "Payment")],
            vec![entry("v1", "Shop Rent", 5000.0)],
            vec![],
            vec![],
        );
        let period = PeriodResolver::new(day(2024, 3, 31)).resolve("2023");
        let s = build_profit_loss(&store, &config(), &period).unwrap();

        // max(revenue, 1) floor: margin is a huge negative number, not NaN
        assert!(s.net_margin.is_finite());
        assert!((s.net_margin + 500000.0).abs() < 0.01);
    }

    #[test]
    fn test_unclassified_entries_are_diagnosed_not_dropped() {
        let store = MemoryStore::new(
            vec![
                voucher("v1", day(2023, 6, 1), "Sales"),
                voucher("v2", day(2023, 6, 2), "Journal"),
            ],
            vec![
                entry("v1", "Mobile Sales", 50000.0),
                entry("v2", "Misc Suspense", 999.0),
            ],
            vec![],
            vec![],
        );
        let period = PeriodResolver::new(day(2024, 3, 31)).resolve("2023");
        let s = build_profit_loss(&store, &config(), &period).unwrap();

        assert!((s.revenue.total - 50000.0).abs() < 0.01);
        assert_eq!(s.gaps.unclassified_count(), 1);
        assert_eq!(s.gaps.unclassified[0].ledger_name, "Misc Suspense");
        assert_eq!(s.total_transactions, 2);
    }

    #[test]
    fn test_breakdown_is_capped_but_totals_are_not() {
        let mut vouchers = Vec::new();
        let mut entries = Vec::new();
        for i in 0..15 {
            let id = format!("v{}", i);
            vouchers.push(voucher(&id, day(2023, 6, 1), "Sales"));
            entries.push(entry(&id, &format!("Sales Counter {}", i), 1000.0));
        }
        let store = MemoryStore::new(vouchers, entries, vec![], vec![]);
        let period = PeriodResolver::new(day(2024, 3, 31)).resolve("2023");
        let s = build_profit_loss(&store, &config(), &period).unwrap();

        assert_eq!(s.revenue.breakdown.len(), BREAKDOWN_LIMIT);
        assert!((s.revenue.total - 15000.0).abs() < 0.01);
        assert_eq!(s.revenue.transaction_count, 15);
    }
}

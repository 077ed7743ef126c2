use crate::error::Result;
use crate::schema::{
    AccountingEntry, LedgerAccount, PeriodRange, PostedEntry, StockItem, Voucher,
};
use chrono::{Datelike, NaiveDate};
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Voucher volume for one calendar month, used for latest-quarter
/// resolution and data-availability reporting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthlyActivity {
    pub year: i32,
    pub month: u32,
    pub voucher_count: usize,
}

/// Per-ledger transaction summary, the read surface behind client
/// verification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerActivity {
    pub ledger_name: String,
    pub transaction_count: usize,
    pub total_inflow: f64,
    pub total_outflow: f64,
    pub first_transaction: NaiveDate,
    pub last_transaction: NaiveDate,
}

impl LedgerActivity {
    /// Outflow is carried as a negative sum, so net is a plain addition.
    pub fn net_amount(&self) -> f64 {
        self.total_inflow + self.total_outflow
    }
}

/// Declarative row filter for the joined voucher/entry/ledger read.
/// Text patterns are case-insensitive substrings, OR-combined; a row
/// passes the text test when any pattern matches its field, or when no
/// patterns are set at all. The period test is independent.
#[derive(Debug, Clone, Default)]
pub struct EntryFilter {
    pub period: Option<PeriodRange>,
    pub ledger_contains: Vec<String>,
    pub parent_contains: Vec<String>,
    pub voucher_type_contains: Vec<String>,
}

impl EntryFilter {
    pub fn for_period(period: &PeriodRange) -> Self {
        Self {
            period: Some(period.clone()),
            ..Self::default()
        }
    }

    fn has_text_patterns(&self) -> bool {
        !self.ledger_contains.is_empty()
            || !self.parent_contains.is_empty()
            || !self.voucher_type_contains.is_empty()
    }

    fn matches(&self, row: &PostedEntry) -> bool {
        if let Some(period) = &self.period {
            if !period.contains(row.date) {
                return false;
            }
        }
        if !self.has_text_patterns() {
            return true;
        }
        let ledger = row.ledger_name.to_uppercase();
        let parent = row.parent_group.to_uppercase();
        let voucher_type = row.voucher_type.to_uppercase();
        self.ledger_contains
            .iter()
            .any(|p| ledger.contains(&p.to_uppercase()))
            || self
                .parent_contains
                .iter()
                .any(|p| parent.contains(&p.to_uppercase()))
            || self
                .voucher_type_contains
                .iter()
                .any(|p| voucher_type.contains(&p.to_uppercase()))
    }
}

/// Read-only access to the historical transaction store. The engine only
/// issues parameterized filter/aggregate reads; nothing here can mutate a
/// row. Implementations that enforce deadlines should return
/// `EngineError::QueryTimeout`, which the resolver chain absorbs as "this
/// tier found nothing".
pub trait TransactionStore {
    /// Joined voucher + entry + ledger rows passing the filter, ordered by
    /// descending absolute amount so material rows surface first.
    fn entries(&self, filter: &EntryFilter) -> Result<Vec<PostedEntry>>;

    /// Ledger master rows with nonzero opening balances, ordered by
    /// descending balance.
    fn ledger_accounts(&self) -> Result<Vec<LedgerAccount>>;

    /// Ledger master rows whose name or parent group matches any pattern.
    fn ledgers_matching(&self, patterns: &[&str]) -> Result<Vec<LedgerAccount>>;

    /// Every distinct ledger name seen in the transaction rows.
    fn ledger_names(&self) -> Result<Vec<String>>;

    /// Per-ledger activity summaries, optionally restricted to names
    /// matching a pattern, ordered by descending transaction count.
    fn ledger_activity(&self, pattern: Option<&str>) -> Result<Vec<LedgerActivity>>;

    /// Positive-quantity stock items, ordered by descending value.
    fn stock_items(&self) -> Result<Vec<StockItem>>;

    /// Every stock item regardless of quantity, for full-scan fallbacks.
    fn all_stock_items(&self) -> Result<Vec<StockItem>>;

    /// Voucher counts per calendar month, ascending.
    fn monthly_activity(&self) -> Result<Vec<MonthlyActivity>>;

    fn voucher_count_in_period(&self, period: &PeriodRange) -> Result<usize>;
}

/// In-memory store over read-only vectors handed over at construction.
/// Joins go through an id map built once; entries referencing an unknown
/// voucher are skipped with a warning rather than failing the read.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    vouchers: Vec<Voucher>,
    entries: Vec<AccountingEntry>,
    ledgers: Vec<LedgerAccount>,
    stock: Vec<StockItem>,
}

impl MemoryStore {
    pub fn new(
        vouchers: Vec<Voucher>,
        entries: Vec<AccountingEntry>,
        ledgers: Vec<LedgerAccount>,
        stock: Vec<StockItem>,
    ) -> Self {
        Self {
            vouchers,
            entries,
            ledgers,
            stock,
        }
    }

    fn joined(&self) -> Vec<PostedEntry> {
        let vouchers: HashMap<&str, &Voucher> = self
            .vouchers
            .iter()
            .map(|v| (v.id.as_str(), v))
            .collect();
        let parents: HashMap<&str, &str> = self
            .ledgers
            .iter()
            .map(|l| (l.name.as_str(), l.parent_group.as_str()))
            .collect();

        let mut rows = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            let Some(voucher) = vouchers.get(entry.voucher_id.as_str()) else {
                warn!(
                    "Skipping entry for ledger '{}': no voucher with id '{}'",
                    entry.ledger_name, entry.voucher_id
                );
                continue;
            };
            rows.push(PostedEntry {
                date: voucher.date,
                voucher_type: voucher.voucher_type.clone(),
                ledger_name: entry.ledger_name.clone(),
                parent_group: parents
                    .get(entry.ledger_name.as_str())
                    .unwrap_or(&"")
                    .to_string(),
                amount: entry.amount,
            });
        }
        rows
    }
}

impl TransactionStore for MemoryStore {
    fn entries(&self, filter: &EntryFilter) -> Result<Vec<PostedEntry>> {
        let mut rows: Vec<PostedEntry> = self
            .joined()
            .into_iter()
            .filter(|row| filter.matches(row))
            .collect();
        rows.sort_by(|a, b| b.amount.abs().total_cmp(&a.amount.abs()));
        Ok(rows)
    }

    fn ledger_accounts(&self) -> Result<Vec<LedgerAccount>> {
        let mut accounts: Vec<LedgerAccount> = self
            .ledgers
            .iter()
            .filter(|l| l.opening_balance != 0.0)
            .cloned()
            .collect();
        accounts.sort_by(|a, b| b.opening_balance.total_cmp(&a.opening_balance));
        Ok(accounts)
    }

    fn ledgers_matching(&self, patterns: &[&str]) -> Result<Vec<LedgerAccount>> {
        let upper: Vec<String> = patterns.iter().map(|p| p.to_uppercase()).collect();
        let mut accounts: Vec<LedgerAccount> = self
            .ledgers
            .iter()
            .filter(|l| l.opening_balance != 0.0)
            .filter(|l| {
                let name = l.name.to_uppercase();
                let parent = l.parent_group.to_uppercase();
                upper.iter().any(|p| name.contains(p) || parent.contains(p))
            })
            .cloned()
            .collect();
        accounts.sort_by(|a, b| b.opening_balance.total_cmp(&a.opening_balance));
        Ok(accounts)
    }

    fn ledger_names(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self
            .entries
            .iter()
            .map(|e| e.ledger_name.clone())
            .collect();
        names.sort();
        names.dedup();
        Ok(names)
    }

    fn ledger_activity(&self, pattern: Option<&str>) -> Result<Vec<LedgerActivity>> {
        let needle = pattern.map(|p| p.to_uppercase());
        let mut grouped: BTreeMap<String, LedgerActivity> = BTreeMap::new();

        for row in self.joined() {
            if let Some(needle) = &needle {
                if !row.ledger_name.to_uppercase().contains(needle) {
                    continue;
                }
            }
            let activity = grouped
                .entry(row.ledger_name.clone())
                .or_insert_with(|| LedgerActivity {
                    ledger_name: row.ledger_name.clone(),
                    transaction_count: 0,
                    total_inflow: 0.0,
                    total_outflow: 0.0,
                    first_transaction: row.date,
                    last_transaction: row.date,
                });
            activity.transaction_count += 1;
            if row.amount > 0.0 {
                activity.total_inflow += row.amount;
            } else {
                activity.total_outflow += row.amount;
            }
            activity.first_transaction = activity.first_transaction.min(row.date);
            activity.last_transaction = activity.last_transaction.max(row.date);
        }

        let mut activities: Vec<LedgerActivity> = grouped.into_values().collect();
        activities.sort_by(|a, b| b.transaction_count.cmp(&a.transaction_count));
        Ok(activities)
    }

    fn stock_items(&self) -> Result<Vec<StockItem>> {
        let mut items: Vec<StockItem> = self
            .stock
            .iter()
            .filter(|s| s.quantity > 0.0)
            .cloned()
            .collect();
        items.sort_by(|a, b| b.value().total_cmp(&a.value()));
        Ok(items)
    }

    fn all_stock_items(&self) -> Result<Vec<StockItem>> {
        let mut items = self.stock.clone();
        items.sort_by(|a, b| b.value().total_cmp(&a.value()));
        Ok(items)
    }

    fn monthly_activity(&self) -> Result<Vec<MonthlyActivity>> {
        let mut grouped: BTreeMap<(i32, u32), usize> = BTreeMap::new();
        for voucher in &self.vouchers {
            *grouped
                .entry((voucher.date.year(), voucher.date.month()))
                .or_insert(0) += 1;
        }
        Ok(grouped
            .into_iter()
            .map(|((year, month), voucher_count)| MonthlyActivity {
                year,
                month,
                voucher_count,
            })
            .collect())
    }

    fn voucher_count_in_period(&self, period: &PeriodRange) -> Result<usize> {
        Ok(self
            .vouchers
            .iter()
            .filter(|v| period.contains(v.date))
            .count())
    }
}

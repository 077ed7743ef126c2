use crate::error::Result;
use crate::schema::EngineConfig;
use crate::store::TransactionStore;
use crate::utils::format_money;
use log::debug;
use serde::{Deserialize, Serialize};

const OUTSTANDING_BREAKDOWN_LIMIT: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CashPosition {
    Strong,
    Moderate,
    Weak,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashAccount {
    pub name: String,
    pub parent_group: String,
    pub balance: f64,
    pub balance_formatted: String,
}

/// Cash and bank position from the current ledger snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashBalances {
    pub total: f64,
    pub total_formatted: String,
    pub accounts: Vec<CashAccount>,
    pub position: CashPosition,
    pub primary_account: Option<String>,
    /// Share of the total sitting in the largest single account.
    pub concentration_pct: f64,
}

pub fn cash_balances<S: TransactionStore + ?Sized>(
    store: &S,
    config: &EngineConfig,
) -> Result<CashBalances> {
    let accounts = store.ledgers_matching(&["CASH", "BANK"])?;
    debug!("Cash balance snapshot over {} accounts", accounts.len());

    let total: f64 = accounts.iter().map(|a| a.opening_balance).sum();
    let symbol = &config.currency_symbol;

    let position = if total > 1_000_000.0 {
        CashPosition::Strong
    } else if total > 100_000.0 {
        CashPosition::Moderate
    } else {
        CashPosition::Weak
    };
    let primary_account = accounts.first().map(|a| a.name.clone());
    let concentration_pct = accounts
        .first()
        .map(|a| a.opening_balance / total.max(1.0) * 100.0)
        .unwrap_or(0.0);

    Ok(CashBalances {
        total,
        total_formatted: format_money(symbol, total),
        accounts: accounts
            .into_iter()
            .map(|a| CashAccount {
                balance_formatted: format_money(symbol, a.opening_balance),
                name: a.name,
                parent_group: a.parent_group,
                balance: a.opening_balance,
            })
            .collect(),
        position,
        primary_account,
        concentration_pct,
    })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutstandingItem {
    pub name: String,
    pub parent_group: String,
    pub amount: f64,
    pub amount_formatted: String,
}

/// Receivables and payables split out of customer/supplier ledger
/// balances: positive balances are owed to us, negative balances are owed
/// by us (reported as magnitudes).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutstandingReport {
    pub search_term: Option<String>,
    pub total_receivables: f64,
    pub total_receivables_formatted: String,
    pub total_payables: f64,
    pub total_payables_formatted: String,
    pub net_position: f64,
    pub net_position_formatted: String,
    pub receivables: Vec<OutstandingItem>,
    pub payables: Vec<OutstandingItem>,
    pub receivable_count: usize,
    pub payable_count: usize,
    pub largest_receivable: Option<String>,
    pub largest_payable: Option<String>,
}

pub fn customer_outstanding<S: TransactionStore + ?Sized>(
    store: &S,
    config: &EngineConfig,
    customer: Option<&str>,
) -> Result<OutstandingReport> {
    let accounts = match customer {
        Some(name) => store.ledgers_matching(&[name])?,
        None => store.ledgers_matching(&["SUNDRY", "CUSTOMER", "MOBILES", "CELL", "COMMUNICATION"])?,
    };

    let symbol = &config.currency_symbol;
    let mut receivables = Vec::new();
    let mut payables = Vec::new();
    let mut total_receivables = 0.0;
    let mut total_payables = 0.0;

    for account in &accounts {
        let balance = account.opening_balance;
        let item = OutstandingItem {
            name: account.name.clone(),
            parent_group: account.parent_group.clone(),
            amount: balance.abs(),
            amount_formatted: format_money(symbol, balance.abs()),
        };
        if balance > 0.0 {
            total_receivables += balance;
            receivables.push(item);
        } else if balance < 0.0 {
            total_payables += balance.abs();
            payables.push(item);
        }
    }

    payables.sort_by(|a, b| b.amount.total_cmp(&a.amount));
    let largest_receivable = receivables.first().map(|i| i.name.clone());
    let largest_payable = payables.first().map(|i| i.name.clone());
    let receivable_count = receivables.len();
    let payable_count = payables.len();
    receivables.truncate(OUTSTANDING_BREAKDOWN_LIMIT);
    payables.truncate(OUTSTANDING_BREAKDOWN_LIMIT);

    let net_position = total_receivables - total_payables;
    Ok(OutstandingReport {
        search_term: customer.map(|c| c.to_string()),
        total_receivables,
        total_receivables_formatted: format_money(symbol, total_receivables),
        total_payables,
        total_payables_formatted: format_money(symbol, total_payables),
        net_position,
        net_position_formatted: format_money(symbol, net_position),
        receivables,
        payables,
        receivable_count,
        payable_count,
        largest_receivable,
        largest_payable,
    })
}

use crate::classify::{classify_balance, BalanceKind};
use crate::error::{EngineError, Result};
use crate::schema::{Category, EngineConfig};
use crate::store::TransactionStore;
use crate::utils::format_money;
use log::debug;
use serde::{Deserialize, Serialize};

const BALANCE_BREAKDOWN_LIMIT: usize = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceItem {
    pub name: String,
    pub parent_group: String,
    pub amount: f64,
    pub kind: BalanceKind,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BalanceBucket {
    pub total: f64,
    pub count: usize,
    pub breakdown: Vec<BalanceItem>,
}

impl BalanceBucket {
    fn from_items(items: Vec<BalanceItem>, limit: Option<usize>) -> Self {
        let total = items.iter().map(|i| i.amount).sum();
        let count = items.len();
        let mut breakdown = items;
        if let Some(limit) = limit {
            breakdown.truncate(limit);
        }
        Self {
            total,
            count,
            breakdown,
        }
    }
}

/// Whether the snapshot says the business is solvent. The boundary case
/// (assets equal to liabilities, net worth zero) reports NeedsAttention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Solvency {
    Solvent,
    NeedsAttention,
}

impl Solvency {
    pub fn label(&self) -> &'static str {
        match self {
            Solvency::Solvent => "Positive Net Worth",
            Solvency::NeedsAttention => "Negative Net Worth - Liabilities exceed Assets",
        }
    }
}

/// Balance-sheet summary from the current ledger snapshot.
///
/// Only current opening balances are available from the source, so this is
/// a present-state view; there is no point-in-time reconstruction of
/// historical balances.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetWorthStatement {
    pub company_name: String,
    pub net_worth: f64,
    pub net_worth_formatted: String,
    pub assets: BalanceBucket,
    pub liabilities: BalanceBucket,
    /// Owner's capital, reported separately from the net-worth formula.
    pub capital: BalanceBucket,
    pub solvency: Solvency,
    pub error: Option<String>,
}

impl NetWorthStatement {
    pub fn is_solvent(&self) -> bool {
        self.solvency == Solvency::Solvent
    }

    pub fn unavailable(config: &EngineConfig, error: &EngineError) -> Self {
        Self {
            company_name: config.company_name.clone(),
            net_worth: 0.0,
            net_worth_formatted: format_money(&config.currency_symbol, 0.0),
            assets: BalanceBucket::default(),
            liabilities: BalanceBucket::default(),
            capital: BalanceBucket::default(),
            solvency: Solvency::NeedsAttention,
            error: Some(error.to_string()),
        }
    }
}

/// Classifies every nonzero ledger balance and sums the buckets.
/// Net worth is assets minus liabilities; capital stays out of the
/// formula and is reported on its own.
pub fn build_net_worth<S: TransactionStore + ?Sized>(
    store: &S,
    config: &EngineConfig,
) -> Result<NetWorthStatement> {
    let accounts = store.ledger_accounts()?;
    debug!("Building net worth from {} ledger balances", accounts.len());

    let mut assets = Vec::new();
    let mut liabilities = Vec::new();
    let mut capital = Vec::new();

    for account in &accounts {
        let classified = classify_balance(account);
        let item = BalanceItem {
            name: account.name.clone(),
            parent_group: account.parent_group.clone(),
            amount: classified.amount,
            kind: classified.kind,
        };
        match classified.category {
            Category::Asset => assets.push(item),
            Category::Liability => liabilities.push(item),
            Category::Capital => capital.push(item),
            _ => {}
        }
    }

    let assets = BalanceBucket::from_items(assets, Some(BALANCE_BREAKDOWN_LIMIT));
    let liabilities = BalanceBucket::from_items(liabilities, Some(BALANCE_BREAKDOWN_LIMIT));
    let capital = BalanceBucket::from_items(capital, None);

    let net_worth = assets.total - liabilities.total;
    let solvency = if net_worth > 0.0 {
        Solvency::Solvent
    } else {
        Solvency::NeedsAttention
    };

    Ok(NetWorthStatement {
        company_name: config.company_name.clone(),
        net_worth,
        net_worth_formatted: format_money(&config.currency_symbol, net_worth),
        assets,
        liabilities,
        capital,
        solvency,
        error: None,
    })
}

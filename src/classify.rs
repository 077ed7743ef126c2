use crate::schema::{Category, LedgerAccount};
use serde::{Deserialize, Serialize};

/// P&L classification. Ordered rules, first match wins; the ordering
/// encodes a confidence ranking: voucher semantics beat ledger text,
/// which beats parent-group text. Pure function of the three fields.
pub fn classify_profit_loss(voucher_type: &str, ledger_name: &str, parent_group: &str) -> Category {
    let vtype = voucher_type.to_uppercase();
    let ledger = ledger_name.to_uppercase();
    let parent = parent_group.to_uppercase();

    if vtype.contains("SALES") || ledger.contains("SALES") {
        return Category::Revenue;
    }
    if vtype.contains("PURCHASE") || ledger.contains("PURCHASE") {
        return Category::CostOfGoodsSold;
    }
    if ["EXPENSE", "INDIRECT"].iter().any(|k| parent.contains(k))
        || ["RENT", "SALARY", "ELECTRICITY", "TELEPHONE"]
            .iter()
            .any(|k| ledger.contains(k))
    {
        return Category::OperatingExpense;
    }
    if vtype.contains("RECEIPT") || ["INTEREST", "COMMISSION"].iter().any(|k| ledger.contains(k)) {
        return Category::OtherIncome;
    }
    Category::Unclassified
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BalanceKind {
    Capital,
    CurrentAsset,
    FixedAsset,
    Liability,
}

impl BalanceKind {
    pub fn label(&self) -> &'static str {
        match self {
            BalanceKind::Capital => "Capital",
            BalanceKind::CurrentAsset => "Current Asset",
            BalanceKind::FixedAsset => "Fixed Asset",
            BalanceKind::Liability => "Liability",
        }
    }
}

/// Outcome of classifying one ledger master row for the balance sheet.
/// `amount` is the balance as it should enter the bucket totals, which is
/// not always the raw balance (see the sign-folding rule below).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceClassification {
    pub category: Category,
    pub kind: BalanceKind,
    pub amount: f64,
}

/// Balance-sheet classification of a ledger account via its parent group
/// and balance sign.
///
/// A negative opening balance is folded into fixed assets at its absolute
/// value regardless of parent group. That rule is inherited behavior the
/// downstream reports depend on; keep it until the ledger source changes
/// its sign conventions.
pub fn classify_balance(account: &LedgerAccount) -> BalanceClassification {
    let name = account.name.to_uppercase();
    let parent = account.parent_group.to_uppercase();
    let balance = account.opening_balance;

    if parent.contains("CAPITAL") || name.contains("CAPITAL") {
        return BalanceClassification {
            category: Category::Capital,
            kind: BalanceKind::Capital,
            amount: balance,
        };
    }
    if ["BANK", "CASH", "DEPOSIT"].iter().any(|k| parent.contains(k)) && balance > 0.0 {
        return BalanceClassification {
            category: Category::Asset,
            kind: BalanceKind::CurrentAsset,
            amount: balance,
        };
    }
    if ["MOTOR", "FIXED", "ASSET"].iter().any(|k| parent.contains(k)) || balance < 0.0 {
        return BalanceClassification {
            category: Category::Asset,
            kind: BalanceKind::FixedAsset,
            amount: balance.abs(),
        };
    }
    BalanceClassification {
        category: Category::Liability,
        kind: BalanceKind::Liability,
        amount: balance,
    }
}

/// Cash-flow activity bucket for an entry touching a cash or bank ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowActivity {
    Operating,
    Financing,
    Other,
}

pub fn classify_cash_flow(voucher_type: &str, ledger_name: &str) -> FlowActivity {
    let vtype = voucher_type.to_uppercase();
    let ledger = ledger_name.to_uppercase();

    if ["SALES", "RECEIPT", "PAYMENT", "PURCHASE"]
        .iter()
        .any(|k| vtype.contains(k))
    {
        return FlowActivity::Operating;
    }
    if ledger.contains("LOAN") || ledger.contains("CAPITAL") {
        return FlowActivity::Financing;
    }
    FlowActivity::Other
}

/// An entry no rule matched. Kept so rule-coverage gaps stay visible
/// instead of silently dropping rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnclassifiedEntry {
    pub ledger_name: String,
    pub voucher_type: String,
    pub amount: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GapDiagnostics {
    pub total_entries: usize,
    pub unclassified: Vec<UnclassifiedEntry>,
}

impl GapDiagnostics {
    pub fn record_classified(&mut self) {
        self.total_entries += 1;
    }

    pub fn record_gap(&mut self, ledger_name: &str, voucher_type: &str, amount: f64) {
        self.total_entries += 1;
        self.unclassified.push(UnclassifiedEntry {
            ledger_name: ledger_name.to_string(),
            voucher_type: voucher_type.to_string(),
            amount,
        });
    }

    pub fn unclassified_count(&self) -> usize {
        self.unclassified.len()
    }

    pub fn coverage_percent(&self) -> f64 {
        if self.total_entries == 0 {
            return 100.0;
        }
        (self.total_entries - self.unclassified.len()) as f64 / self.total_entries as f64 * 100.0
    }

    /// The gap as a typed error, for callers that want to escalate
    /// coverage holes instead of just reporting them.
    pub fn as_error(&self) -> Option<crate::error::EngineError> {
        if self.unclassified.is_empty() {
            None
        } else {
            Some(crate::error::EngineError::ClassificationGap {
                unclassified: self.unclassified.len(),
                total: self.total_entries,
            })
        }
    }
}

use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One recorded transaction event. Vouchers are created by the upstream
/// accounting system and are read-only from this engine's perspective.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Voucher {
    pub id: String,

    pub date: NaiveDate,

    #[schemars(
        description = "The voucher type as recorded at entry time (e.g. 'Sales', 'GST Sales', 'Purchase', 'Receipt', 'Payment'). Drives the highest-confidence classification rules."
    )]
    pub voucher_type: String,
}

/// One signed ledger posting belonging to a voucher. A voucher carries one
/// or more entries; they should net to zero but that is not enforced here.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AccountingEntry {
    pub voucher_id: String,

    pub ledger_name: String,

    #[schemars(description = "Signed amount. Sign conventions follow the source system; the engine classifies by sign and text heuristics rather than debit/credit columns.")]
    pub amount: f64,
}

/// An account in the chart of accounts. The free-text parent group drives
/// the asset/liability/capital heuristics.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct LedgerAccount {
    pub name: String,

    #[schemars(description = "Free-text group the account belongs to (e.g. 'Bank Accounts', 'Sundry Debtors', 'Capital Account').")]
    pub parent_group: String,

    pub opening_balance: f64,
}

/// A stock item snapshot. Value is quantity x rate.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct StockItem {
    pub name: String,
    pub category: String,
    pub quantity: f64,
    pub rate: f64,
}

impl StockItem {
    pub fn value(&self) -> f64 {
        self.quantity * self.rate
    }
}

/// One accounting entry joined to its voucher and ledger master row.
/// This is the row shape every read surface of the store returns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostedEntry {
    pub date: NaiveDate,
    pub voucher_type: String,
    pub ledger_name: String,
    pub parent_group: String,
    pub amount: f64,
}

/// Which resolution rule produced a period range. Ordering mirrors the
/// resolution priority: explicit forms win over relative keywords, and
/// anything unrecognized falls through to the default fiscal year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PeriodResolution {
    ExplicitRange,
    FiscalQuarter,
    MonthYear,
    CalendarYear,
    Relative,
    Default,
}

/// A canonical date range derived from a period expression. Never
/// persisted; produced per request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub description: String,
    pub is_range: bool,
    pub resolution: PeriodResolution,
}

impl PeriodRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    pub fn date_span(&self) -> String {
        format!("{} to {}", self.start, self.end)
    }

    /// Whether this range came out of the unparseable-input fallback.
    pub fn is_default(&self) -> bool {
        self.resolution == PeriodResolution::Default
    }
}

/// Financial category assigned to a classified entry or account. The same
/// ledger may classify differently for P&L versus balance-sheet purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Revenue,
    CostOfGoodsSold,
    OperatingExpense,
    OtherIncome,
    OtherExpense,
    FinancingFlow,
    InvestingFlow,
    Asset,
    Liability,
    Capital,
    Unclassified,
}

/// Atomic aggregation unit for all statement builders: one ledger's
/// classified activity within a period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItem {
    pub category: Category,
    pub ledger_name: String,
    pub amount: f64,
    pub transaction_count: usize,
}

/// How much trust to place in a resolver result, by the tier that
/// produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Confidence {
    High,
    Medium,
    Low,
    None,
}

/// Provenance tag attached to every resolver-driven result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Provenance {
    pub method: String,
    pub confidence: Confidence,
}

impl Provenance {
    pub fn new(method: impl Into<String>, confidence: Confidence) -> Self {
        Self {
            method: method.into(),
            confidence,
        }
    }
}

/// Engine-level configuration: identity and formatting. The reference
/// date anchors relative period expressions; when unset, the engine
/// derives it from the newest voucher in the store so behavior stays
/// deterministic against fixtures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub company_name: String,
    pub currency_symbol: String,
    pub reference_date: Option<NaiveDate>,
}

impl EngineConfig {
    pub fn new(company_name: impl Into<String>) -> Self {
        Self {
            company_name: company_name.into(),
            currency_symbol: "₹".to_string(),
            reference_date: None,
        }
    }

    pub fn with_reference_date(mut self, date: NaiveDate) -> Self {
        self.reference_date = Some(date);
        self
    }
}

/// Named parameters accompanying a resolver request. All fields are
/// optional; resolution degrades gracefully when context is missing or
/// bogus.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct QueryContext {
    #[schemars(description = "Client or customer name for verification requests.")]
    pub client_name: Option<String>,

    #[schemars(description = "Period expression, e.g. '2023', 'Q1 2023', 'April 2023', 'this year'.")]
    pub period: Option<String>,

    #[serde(default)]
    #[schemars(description = "Ordered period expressions for comparative or trend requests.")]
    pub historical_periods: Vec<String>,

    pub service_level: Option<String>,
}

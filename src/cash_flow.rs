use crate::classify::{classify_cash_flow, FlowActivity};
use crate::error::{EngineError, Result};
use crate::schema::{EngineConfig, PeriodRange};
use crate::store::{EntryFilter, TransactionStore};
use crate::utils::format_money;
use chrono::NaiveDate;
use log::debug;
use serde::{Deserialize, Serialize};

const FLOW_BREAKDOWN_LIMIT: usize = 10;

/// One cash or bank movement. Amounts are reported as magnitudes; the
/// direction is carried by which list the item sits in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowItem {
    pub date: NaiveDate,
    pub voucher_type: String,
    pub ledger_name: String,
    pub amount: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowStatus {
    Positive,
    Negative,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashFlowStatement {
    pub company_name: String,
    pub period: PeriodRange,

    pub total_inflows: f64,
    pub total_inflows_formatted: String,
    pub total_outflows: f64,
    pub total_outflows_formatted: String,
    pub net_cash_flow: f64,
    pub net_cash_flow_formatted: String,
    pub status: FlowStatus,

    pub operating_inflows: Vec<FlowItem>,
    pub operating_outflows: Vec<FlowItem>,
    pub financing_flows: Vec<FlowItem>,
    /// No classification rule currently emits investing flows; the bucket
    /// is kept so the statement shape covers all three activities.
    pub investing_flows: Vec<FlowItem>,
    pub net_operating_flow: f64,

    pub inflow_transactions: usize,
    pub outflow_transactions: usize,
    pub total_transactions: usize,

    pub error: Option<String>,
}

impl CashFlowStatement {
    pub fn has_positive_flow(&self) -> bool {
        self.net_cash_flow > 0.0
    }

    pub fn unavailable(
        config: &EngineConfig,
        period: &PeriodRange,
        error: &EngineError,
    ) -> Self {
        let zero = format_money(&config.currency_symbol, 0.0);
        Self {
            company_name: config.company_name.clone(),
            period: period.clone(),
            total_inflows: 0.0,
            total_inflows_formatted: zero.clone(),
            total_outflows: 0.0,
            total_outflows_formatted: zero.clone(),
            net_cash_flow: 0.0,
            net_cash_flow_formatted: zero,
            status: FlowStatus::Negative,
            operating_inflows: Vec::new(),
            operating_outflows: Vec::new(),
            financing_flows: Vec::new(),
            investing_flows: Vec::new(),
            net_operating_flow: 0.0,
            inflow_transactions: 0,
            outflow_transactions: 0,
            total_transactions: 0,
            error: Some(error.to_string()),
        }
    }
}

fn cash_filter(period: &PeriodRange) -> EntryFilter {
    EntryFilter {
        period: Some(period.clone()),
        ledger_contains: vec!["CASH".to_string(), "BANK".to_string()],
        parent_contains: vec!["BANK".to_string()],
        ..EntryFilter::default()
    }
}

/// Cash-flow view over the period: entries touching cash/bank ledgers,
/// split by sign into inflows and outflows, sub-classified into operating
/// versus financing activity. Net flow is total inflows minus outflows.
pub fn build_cash_flow<S: TransactionStore + ?Sized>(
    store: &S,
    config: &EngineConfig,
    period: &PeriodRange,
) -> Result<CashFlowStatement> {
    let rows = store.entries(&cash_filter(period))?;
    debug!(
        "Building cash flow for {}: {} cash/bank entries",
        period.description,
        rows.len()
    );

    let mut total_inflows = 0.0;
    let mut total_outflows = 0.0;
    let mut inflow_transactions = 0;
    let mut outflow_transactions = 0;

    let mut operating_inflows = Vec::new();
    let mut operating_outflows = Vec::new();
    let mut financing_flows = Vec::new();
    let investing_flows = Vec::new();

    let mut operating_in_total = 0.0;
    let mut operating_out_total = 0.0;

    for row in &rows {
        let activity = classify_cash_flow(&row.voucher_type, &row.ledger_name);
        let item = FlowItem {
            date: row.date,
            voucher_type: row.voucher_type.clone(),
            ledger_name: row.ledger_name.clone(),
            amount: row.amount.abs(),
        };

        if row.amount > 0.0 {
            total_inflows += row.amount;
            inflow_transactions += 1;
            match activity {
                FlowActivity::Operating => {
                    operating_in_total += row.amount;
                    operating_inflows.push(item);
                }
                FlowActivity::Financing => financing_flows.push(item),
                FlowActivity::Other => {}
            }
        } else if row.amount < 0.0 {
            total_outflows += row.amount.abs();
            outflow_transactions += 1;
            if activity == FlowActivity::Operating {
                operating_out_total += row.amount.abs();
                operating_outflows.push(item);
            }
        }
    }

    operating_inflows.truncate(FLOW_BREAKDOWN_LIMIT);
    operating_outflows.truncate(FLOW_BREAKDOWN_LIMIT);
    financing_flows.truncate(FLOW_BREAKDOWN_LIMIT);

    let net_cash_flow = total_inflows - total_outflows;
    let symbol = &config.currency_symbol;

    Ok(CashFlowStatement {
        company_name: config.company_name.clone(),
        period: period.clone(),
        total_inflows,
        total_inflows_formatted: format_money(symbol, total_inflows),
        total_outflows,
        total_outflows_formatted: format_money(symbol, total_outflows),
        net_cash_flow,
        net_cash_flow_formatted: format_money(symbol, net_cash_flow),
        status: if net_cash_flow > 0.0 {
            FlowStatus::Positive
        } else {
            FlowStatus::Negative
        },
        operating_inflows,
        operating_outflows,
        financing_flows,
        investing_flows,
        net_operating_flow: operating_in_total - operating_out_total,
        inflow_transactions,
        outflow_transactions,
        total_transactions: rows.len(),
        error: None,
    })
}

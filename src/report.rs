use crate::cash_flow::{build_cash_flow, CashFlowStatement};
use crate::net_worth::{build_net_worth, NetWorthStatement, Solvency};
use crate::profit_loss::{build_profit_loss, ProfitLossStatement};
use crate::sales::{build_sales_analysis, SalesAnalysis};
use crate::schema::{EngineConfig, PeriodRange};
use crate::store::TransactionStore;
use log::{info, warn};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Profitability {
    Profitable,
    LossMaking,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Liquidity {
    PositiveCashFlow,
    NegativeCashFlow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OverallHealth {
    Good,
    NeedsAttention,
}

/// Qualitative health roll-up: overall health is Good only when the
/// business is profitable, solvent and cash-flow positive at once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthIndicators {
    pub profitability: Profitability,
    pub liquidity: Liquidity,
    pub solvency: Solvency,
    pub overall_health: OverallHealth,
}

impl HealthIndicators {
    fn derive(
        profit_loss: &ProfitLossStatement,
        net_worth: &NetWorthStatement,
        cash_flow: &CashFlowStatement,
    ) -> Self {
        let profitability = if profit_loss.is_profitable() {
            Profitability::Profitable
        } else {
            Profitability::LossMaking
        };
        let liquidity = if cash_flow.has_positive_flow() {
            Liquidity::PositiveCashFlow
        } else {
            Liquidity::NegativeCashFlow
        };
        let solvency = net_worth.solvency;

        let overall_health = if profitability == Profitability::Profitable
            && solvency == Solvency::Solvent
            && liquidity == Liquidity::PositiveCashFlow
        {
            OverallHealth::Good
        } else {
            OverallHealth::NeedsAttention
        };

        Self {
            profitability,
            liquidity,
            solvency,
            overall_health,
        }
    }
}

/// The combined report: all three statements plus the sales view for one
/// period, with a qualitative health roll-up. Individual statement
/// failures are absorbed into zero-valued summaries with their error
/// field set, so the report itself always materializes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComprehensiveReport {
    pub company_name: String,
    pub period: PeriodRange,
    pub profit_loss: ProfitLossStatement,
    pub net_worth: NetWorthStatement,
    pub cash_flow: CashFlowStatement,
    pub sales: SalesAnalysis,
    pub health: HealthIndicators,
}

pub fn build_comprehensive_report<S: TransactionStore + ?Sized>(
    store: &S,
    config: &EngineConfig,
    period: &PeriodRange,
) -> ComprehensiveReport {
    info!(
        "Building comprehensive report for {} ({})",
        config.company_name, period.description
    );

    let profit_loss = build_profit_loss(store, config, period).unwrap_or_else(|e| {
        warn!("P&L unavailable for {}: {}", period.description, e);
        ProfitLossStatement::unavailable(config, period, &e)
    });
    let net_worth = build_net_worth(store, config).unwrap_or_else(|e| {
        warn!("Net worth unavailable: {}", e);
        NetWorthStatement::unavailable(config, &e)
    });
    let cash_flow = build_cash_flow(store, config, period).unwrap_or_else(|e| {
        warn!("Cash flow unavailable for {}: {}", period.description, e);
        CashFlowStatement::unavailable(config, period, &e)
    });
    let sales = build_sales_analysis(store, config, period).unwrap_or_else(|e| {
        warn!("Sales analysis unavailable for {}: {}", period.description, e);
        SalesAnalysis::unavailable(config, period, &e)
    });

    let health = HealthIndicators::derive(&profit_loss, &net_worth, &cash_flow);

    ComprehensiveReport {
        company_name: config.company_name.clone(),
        period: period.clone(),
        profit_loss,
        net_worth,
        cash_flow,
        sales,
        health,
    }
}

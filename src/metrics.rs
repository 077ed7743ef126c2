use crate::report::ComprehensiveReport;
use crate::schema::EngineConfig;
use crate::utils::format_money;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UtilizationLevel {
    High,
    Moderate,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StabilityLevel {
    Stable,
    HighLeverage,
    VeryHighRisk,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfitabilityRatios {
    pub gross_margin: f64,
    pub net_margin: f64,
    pub return_on_assets: f64,
    pub return_on_equity: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeverageRatios {
    pub debt_to_equity: f64,
    pub asset_turnover: f64,
    pub equity_ratio: f64,
    pub stability: StabilityLevel,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EfficiencyMetrics {
    pub revenue_per_transaction: f64,
    pub revenue_per_transaction_formatted: String,
    /// Total expenses as a percentage of revenue.
    pub cost_ratio: f64,
    pub asset_utilization: UtilizationLevel,
}

/// Composite health score. The weighting favors capital efficiency
/// (40% turnover against 30% margin and 30% cost control); it is a
/// tunable policy, not a financial law.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthScore {
    pub overall: f64,
    pub profitability_component: f64,
    pub efficiency_component: f64,
    pub utilization_component: f64,
    pub grade: Grade,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinancialMetrics {
    pub company_name: String,
    pub period_description: String,
    pub profitability: ProfitabilityRatios,
    pub leverage: LeverageRatios,
    pub efficiency: EfficiencyMetrics,
    pub score: HealthScore,
}

fn clamp_score(value: f64) -> f64 {
    value.clamp(0.0, 100.0)
}

/// Derives ratios, efficiency metrics and the composite score from a
/// comprehensive report. Divisors are floored at 1 so empty or degenerate
/// periods yield zeros rather than NaN or infinity.
pub fn derive_metrics(report: &ComprehensiveReport, config: &EngineConfig) -> FinancialMetrics {
    let pl = &report.profit_loss;
    let nw = &report.net_worth;

    let revenue = pl.revenue.total;
    let net_profit = pl.net_profit;
    let total_assets = nw.assets.total;
    let total_liabilities = nw.liabilities.total;
    let net_worth = nw.net_worth;

    let margin_base = revenue.max(1.0);
    let asset_base = total_assets.abs().max(1.0);
    let equity_base = net_worth.abs().max(1.0);

    let profitability = ProfitabilityRatios {
        gross_margin: pl.gross_profit / margin_base * 100.0,
        net_margin: net_profit / margin_base * 100.0,
        return_on_assets: net_profit / asset_base * 100.0,
        return_on_equity: if net_worth != 0.0 {
            net_profit / equity_base * 100.0
        } else {
            0.0
        },
    };

    let debt_to_equity = total_liabilities.abs() / equity_base;
    let asset_turnover = revenue / asset_base;
    let leverage = LeverageRatios {
        debt_to_equity,
        asset_turnover,
        equity_ratio: net_worth.abs() / asset_base,
        stability: if debt_to_equity < 2.0 {
            StabilityLevel::Stable
        } else if debt_to_equity < 5.0 {
            StabilityLevel::HighLeverage
        } else {
            StabilityLevel::VeryHighRisk
        },
    };

    let transactions = report.sales.total_transactions.max(1) as f64;
    let revenue_per_transaction = revenue / transactions;
    let cost_ratio = pl.total_expenses() / margin_base * 100.0;
    let efficiency = EfficiencyMetrics {
        revenue_per_transaction,
        revenue_per_transaction_formatted: format_money(
            &config.currency_symbol,
            revenue_per_transaction,
        ),
        cost_ratio,
        asset_utilization: if asset_turnover > 1.0 {
            UtilizationLevel::High
        } else if asset_turnover > 0.5 {
            UtilizationLevel::Moderate
        } else {
            UtilizationLevel::Low
        },
    };

    let profitability_component = clamp_score(profitability.net_margin) * 0.3;
    let efficiency_component = clamp_score(100.0 - cost_ratio) * 0.3;
    let utilization_component = clamp_score(asset_turnover * 50.0) * 0.4;
    let overall = clamp_score(
        profitability_component + efficiency_component + utilization_component,
    );

    let grade = if profitability.net_margin > 15.0 {
        Grade::A
    } else if profitability.net_margin > 5.0 {
        Grade::B
    } else {
        Grade::C
    };

    FinancialMetrics {
        company_name: report.company_name.clone(),
        period_description: report.period.description.clone(),
        profitability,
        leverage,
        efficiency,
        score: HealthScore {
            overall,
            profitability_component,
            efficiency_component,
            utilization_component,
            grade,
        },
    }
}

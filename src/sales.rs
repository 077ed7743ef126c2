use crate::error::{EngineError, Result};
use crate::schema::{EngineConfig, PeriodRange};
use crate::store::{EntryFilter, TransactionStore};
use crate::utils::format_money;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SalesCategory {
    Mobile,
    Accessories,
    Other,
}

/// Categorizes a sales ledger by name keywords. Mobile handsets first,
/// then accessories, everything else is Other.
pub fn categorize_sales_ledger(ledger_name: &str) -> SalesCategory {
    let name = ledger_name.to_uppercase();
    if ["MOBILE", "PHONE", "GALAXY", "SAMSUNG"]
        .iter()
        .any(|k| name.contains(k))
    {
        return SalesCategory::Mobile;
    }
    if ["CASE", "COVER", "CHARGER", "ACCESSORY"]
        .iter()
        .any(|k| name.contains(k))
    {
        return SalesCategory::Accessories;
    }
    SalesCategory::Other
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalesLine {
    pub ledger_name: String,
    pub category: SalesCategory,
    pub amount: f64,
    pub transaction_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalesAnalysis {
    pub period: PeriodRange,
    pub mobile_sales: f64,
    pub accessories_sales: f64,
    pub other_sales: f64,
    pub total_sales: f64,
    pub total_sales_formatted: String,
    pub detailed_sales: Vec<SalesLine>,
    pub total_transactions: usize,
    pub error: Option<String>,
}

impl SalesAnalysis {
    pub fn unavailable(config: &EngineConfig, period: &PeriodRange, error: &EngineError) -> Self {
        Self {
            period: period.clone(),
            mobile_sales: 0.0,
            accessories_sales: 0.0,
            other_sales: 0.0,
            total_sales: 0.0,
            total_sales_formatted: format_money(&config.currency_symbol, 0.0),
            detailed_sales: Vec::new(),
            total_transactions: 0,
            error: Some(error.to_string()),
        }
    }
}

/// Positive entries in the period grouped per ledger and bucketed into
/// mobile / accessories / other sales by ledger keywords.
pub fn build_sales_analysis<S: TransactionStore + ?Sized>(
    store: &S,
    config: &EngineConfig,
    period: &PeriodRange,
) -> Result<SalesAnalysis> {
    let rows = store.entries(&EntryFilter::for_period(period))?;
    debug!(
        "Sales analysis for {}: {} entries",
        period.description,
        rows.len()
    );

    let mut per_ledger: BTreeMap<String, SalesLine> = BTreeMap::new();
    for row in rows.iter().filter(|r| r.amount > 0.0) {
        let line = per_ledger
            .entry(row.ledger_name.clone())
            .or_insert_with(|| SalesLine {
                ledger_name: row.ledger_name.clone(),
                category: categorize_sales_ledger(&row.ledger_name),
                amount: 0.0,
                transaction_count: 0,
            });
        line.amount += row.amount;
        line.transaction_count += 1;
    }

    let mut detailed_sales: Vec<SalesLine> = per_ledger.into_values().collect();
    detailed_sales.sort_by(|a, b| b.amount.total_cmp(&a.amount));

    let mut mobile_sales = 0.0;
    let mut accessories_sales = 0.0;
    let mut other_sales = 0.0;
    for line in &detailed_sales {
        match line.category {
            SalesCategory::Mobile => mobile_sales += line.amount,
            SalesCategory::Accessories => accessories_sales += line.amount,
            SalesCategory::Other => other_sales += line.amount,
        }
    }
    let total_sales = mobile_sales + accessories_sales + other_sales;
    let total_transactions = detailed_sales.iter().map(|l| l.transaction_count).sum();

    Ok(SalesAnalysis {
        period: period.clone(),
        mobile_sales,
        accessories_sales,
        other_sales,
        total_sales,
        total_sales_formatted: format_money(&config.currency_symbol, total_sales),
        detailed_sales,
        total_transactions,
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

    #[test]
    fn test_categorize_sales_ledger() {
        assert_eq!(categorize_sales_ledger("Galaxy S23 Sales"), SalesCategory::Mobile);
        assert_eq!(categorize_sales_ledger("Phone Covers"), SalesCategory::Mobile);
        assert_eq!(categorize_sales_ledger("Flip Cover Stock"), SalesCategory::Accessories);
        assert_eq!(categorize_sales_ledger("Service Income"), SalesCategory::Other);
    }

    #[test]
    fn test_sales_totals_by_category() {
        let store = MemoryStore::new(
            vec![
                Voucher {
                    id: "v1".to_string(),
                    date: day(2023, 5, 1),
                    voucher_type: "Sales".to_string(),
                },
                Voucher {
                    id: "v2".to_string(),
                    date: day(2023, 5, 2),
                    voucher_type: "Sales".to_string(),
                },
                Voucher {
                    id: "v3".to_string(),
                    date: day(2023, 5, 3),
                    voucher_type: "Sales".to_string(),
                },
            ],
            vec![
                AccountingEntry {
                    voucher_id: "v1".to_string(),
                    ledger_name: "Samsung Mobiles".to_string(),
                    amount: 70000.0,
                },
                AccountingEntry {
                    voucher_id: "v2".to_string(),
                    ledger_name: "Charger Counter".to_string(),
                    amount: 5000.0,
                },
                AccountingEntry {
                    voucher_id: "v3".to_string(),
                    ledger_name: "Repairs".to_string(),
                    amount: 2000.0,
                },
                // Negative entries never count as sales
                AccountingEntry {
                    voucher_id: "v1".to_string(),
                    ledger_name: "Samsung Mobiles".to_string(),
                    amount: -70000.0,
                },
            ],
            vec![],
            vec![],
        );
        let period = PeriodResolver::new(day(2024, 3, 31)).resolve("2023");
        let analysis = build_sales_analysis(&store, &EngineConfig::new("Test"), &period).unwrap();

        assert!((analysis.mobile_sales - 70000.0).abs() < 0.01);
        assert!((analysis.accessories_sales - 5000.0).abs() < 0.01);
        assert!((analysis.other_sales - 2000.0).abs() < 0.01);
        assert!((analysis.total_sales - 77000.0).abs() < 0.01);
        assert_eq!(analysis.detailed_sales[0].ledger_name, "Samsung Mobiles");
        assert_eq!(analysis.total_transactions, 3);
    }
}

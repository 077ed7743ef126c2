use crate::error::Result;
use crate::schema::EngineConfig;
use crate::store::TransactionStore;
use crate::utils::format_money;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const ITEM_LIMIT: usize = 50;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockLine {
    pub name: String,
    pub category: String,
    pub quantity: f64,
    pub rate: f64,
    pub value: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryValue {
    pub category: String,
    pub item_count: usize,
    pub total_value: f64,
}

/// Valuation of positive-quantity stock at quantity times rate, with the
/// most valuable items first and a per-category rollup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventorySummary {
    pub total_value: f64,
    pub total_value_formatted: String,
    pub item_count: usize,
    pub items: Vec<StockLine>,
    pub categories: Vec<CategoryValue>,
}

pub fn inventory_summary<S: TransactionStore + ?Sized>(
    store: &S,
    config: &EngineConfig,
) -> Result<InventorySummary> {
    let stock = store.stock_items()?;
    debug!("Inventory summary over {} stock items", stock.len());

    let total_value: f64 = stock.iter().map(|s| s.value()).sum();
    let item_count = stock.len();

    let mut per_category: BTreeMap<String, CategoryValue> = BTreeMap::new();
    for item in &stock {
        let slot = per_category
            .entry(item.category.clone())
            .or_insert_with(|| CategoryValue {
                category: item.category.clone(),
                item_count: 0,
                total_value: 0.0,
            });
        slot.item_count += 1;
        slot.total_value += item.value();
    }
    let mut categories: Vec<CategoryValue> = per_category.into_values().collect();
    categories.sort_by(|a, b| b.total_value.total_cmp(&a.total_value));

    let items = stock
        .into_iter()
        .take(ITEM_LIMIT)
        .map(|s| StockLine {
            value: s.value(),
            name: s.name,
            category: s.category,
            quantity: s.quantity,
            rate: s.rate,
        })
        .collect();

    Ok(InventorySummary {
        total_value,
        total_value_formatted: format_money(&config.currency_symbol, total_value),
        item_count,
        items,
        categories,
    })
}

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{category_lookup, Category, CategoryId, Cents, Transaction};

/// Label used for expenses whose category id matches no known category.
pub const UNKNOWN_CATEGORY: &str = "Unknown";

/// Summed expense amount per category id. Key order carries no meaning.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryTotals(HashMap<CategoryId, Cents>);

impl CategoryTotals {
    pub fn get(&self, category_id: CategoryId) -> Option<Cents> {
        self.0.get(&category_id).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn total(&self) -> Cents {
        self.0.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (CategoryId, Cents)> + '_ {
        self.0.iter().map(|(id, total)| (*id, *total))
    }
}

/// Sum expense amounts by category. Income transactions are ignored, and
/// category ids are kept even when no such category exists.
pub fn category_totals(transactions: &[Transaction]) -> CategoryTotals {
    let mut totals: HashMap<CategoryId, Cents> = HashMap::new();

    for transaction in transactions.iter().filter(|t| t.is_expense()) {
        *totals.entry(transaction.category_id).or_insert(0) += transaction.amount_cents;
    }

    CategoryTotals(totals)
}

/// One labelled entry of an expense breakdown, ready for a pie chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseSlice {
    pub category_id: CategoryId,
    pub label: String,
    pub total: Cents,
    pub percentage: f64,
}

/// Attach category names to the totals. Slices are ordered by total
/// (largest first), then by label, then by id.
pub fn expense_breakdown(totals: &CategoryTotals, categories: &[Category]) -> Vec<ExpenseSlice> {
    let names = category_lookup(categories);
    let grand_total = totals.total();

    let mut slices: Vec<ExpenseSlice> = totals
        .iter()
        .map(|(category_id, total)| ExpenseSlice {
            category_id,
            label: names
                .get(&category_id)
                .copied()
                .unwrap_or(UNKNOWN_CATEGORY)
                .to_string(),
            total,
            percentage: if grand_total > 0 {
                (total as f64 / grand_total as f64) * 100.0
            } else {
                0.0
            },
        })
        .collect();

    slices.sort_by(|a, b| {
        b.total
            .cmp(&a.total)
            .then_with(|| a.label.cmp(&b.label))
            .then_with(|| a.category_id.cmp(&b.category_id))
    });
    slices
}

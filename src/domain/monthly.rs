use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::{Cents, Transaction, TransactionType};

/// Number of months shown in the income/expense comparison.
pub const MONTHLY_WINDOW: usize = 6;

/// Calendar month key. Ordering is by year, then month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MonthKey {
    pub year: i32,
    pub month: u32,
}

impl MonthKey {
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Short label such as "Jan 2024".
    pub fn label(&self) -> String {
        match NaiveDate::from_ymd_opt(self.year, self.month, 1) {
            Some(first) => first.format("%b %Y").to_string(),
            None => format!("{:02}/{}", self.month, self.year),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyBucket {
    pub label: String,
    pub year: i32,
    pub month: u32,
    pub income: Cents,
    pub expenses: Cents,
}

impl MonthlyBucket {
    pub fn key(&self) -> MonthKey {
        MonthKey {
            year: self.year,
            month: self.month,
        }
    }
}

/// Income and expenses for the most recent [`MONTHLY_WINDOW`] months that
/// have any activity, oldest first.
pub fn monthly_buckets(transactions: &[Transaction]) -> Vec<MonthlyBucket> {
    recent_monthly_buckets(transactions, MONTHLY_WINDOW)
}

/// Like [`monthly_buckets`] with an explicit window size.
pub fn recent_monthly_buckets(transactions: &[Transaction], limit: usize) -> Vec<MonthlyBucket> {
    let mut months: BTreeMap<MonthKey, (Cents, Cents)> = BTreeMap::new();

    for transaction in transactions {
        let entry = months.entry(MonthKey::of(transaction.date)).or_insert((0, 0));
        match transaction.transaction_type {
            TransactionType::Income => entry.0 += transaction.amount_cents,
            TransactionType::Expense => entry.1 += transaction.amount_cents,
        }
    }

    let skip = months.len().saturating_sub(limit);
    months
        .into_iter()
        .skip(skip)
        .map(|(key, (income, expenses))| MonthlyBucket {
            label: key.label(),
            year: key.year,
            month: key.month,
            income,
            expenses,
        })
        .collect()
}

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use super::{Cents, Transaction, TransactionType};

/// Inclusive date filter. Either bound may be absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    /// No filtering at all.
    pub fn all() -> Self {
        Self::default()
    }

    /// First to last day of the month containing `today`.
    pub fn current_month(today: NaiveDate) -> Self {
        let start = today.with_day(1).unwrap_or(today);
        let end = start
            .checked_add_months(Months::new(1))
            .and_then(|next| next.pred_opt())
            .unwrap_or(today);
        Self::new(Some(start), Some(end))
    }

    /// From `months` months before `today` up to and including `today`.
    pub fn trailing_months(today: NaiveDate, months: u32) -> Self {
        let start = today
            .checked_sub_months(Months::new(months))
            .unwrap_or(NaiveDate::MIN);
        Self::new(Some(start), Some(today))
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.is_none_or(|start| date >= start) && self.end.is_none_or(|end| date <= end)
    }

    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }
}

/// Income, expenses and their difference over a set of transactions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryResult {
    pub income: Cents,
    pub expenses: Cents,
    pub balance: Cents,
}

impl SummaryResult {
    pub fn new(income: Cents, expenses: Cents) -> Self {
        Self {
            income,
            expenses,
            balance: income - expenses,
        }
    }
}

/// Sum income and expenses of the transactions dated within `range`.
pub fn summarize(transactions: &[Transaction], range: &DateRange) -> SummaryResult {
    let (income, expenses) = transactions
        .iter()
        .filter(|t| range.contains(t.date))
        .fold((0, 0), |(income, expenses), t| match t.transaction_type {
            TransactionType::Income => (income + t.amount_cents, expenses),
            TransactionType::Expense => (income, expenses + t.amount_cents),
        });

    SummaryResult::new(income, expenses)
}

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{
    category_totals, expense_breakdown, monthly_buckets, summarize, validate_transactions,
    Category, DateRange, ExpenseSlice, MonthlyBucket, OwnerId, SummaryResult, Transaction,
    TransactionRecord, ValidationError,
};

/// How many transactions the dashboard lists under "recent".
pub const RECENT_TRANSACTIONS: usize = 5;

/// Everything the dashboard shows, computed in one pass over the owner's data.
///
/// Only the summary honours the selected range; the charts always cover all
/// transactions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardReport {
    pub range: DateRange,
    pub summary: SummaryResult,
    pub expense_breakdown: Vec<ExpenseSlice>,
    pub monthly: Vec<MonthlyBucket>,
    pub recent_transactions: Vec<Transaction>,
}

pub fn build_dashboard(
    transactions: &[Transaction],
    categories: &[Category],
    range: DateRange,
) -> DashboardReport {
    DashboardReport {
        range,
        summary: summarize(transactions, &range),
        expense_breakdown: expense_breakdown(&category_totals(transactions), categories),
        monthly: monthly_buckets(transactions),
        recent_transactions: most_recent(transactions, RECENT_TRANSACTIONS),
    }
}

/// The `limit` latest transactions by date (ties broken by id), newest first.
pub fn most_recent(transactions: &[Transaction], limit: usize) -> Vec<Transaction> {
    let mut sorted: Vec<&Transaction> = transactions.iter().collect();
    sorted.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| b.id.cmp(&a.id)));
    sorted.into_iter().take(limit).cloned().collect()
}

/// Validate raw records and summarize them without touching the store.
/// An invalid record fails the whole call; no partial totals are returned.
pub fn summarize_records(
    records: Vec<TransactionRecord>,
    owner_id: OwnerId,
    range: &DateRange,
    today: NaiveDate,
) -> Result<SummaryResult, ValidationError> {
    let transactions = validate_transactions(records, owner_id, today)?;
    Ok(summarize(&transactions, range))
}

/// Validate raw records and bucket them by month without touching the store.
pub fn monthly_from_records(
    records: Vec<TransactionRecord>,
    owner_id: OwnerId,
    today: NaiveDate,
) -> Result<Vec<MonthlyBucket>, ValidationError> {
    let transactions = validate_transactions(records, owner_id, today)?;
    Ok(monthly_buckets(&transactions))
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use uuid::Uuid;

    use super::*;
    use crate::domain::{CategoryType, TransactionType, ValidationErrorKind};

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn records(value: serde_json::Value) -> Vec<TransactionRecord> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_summarize_records() {
        let summary = summarize_records(
            records(json!([
                {"amount": 1000, "type": "income", "categoryId": 1, "date": "2024-01-15"},
                {"amount": "300", "type": "expense", "categoryId": 2, "date": "2024-01-20"},
                {"amount": "200.00", "type": "expense", "categoryId": 2, "date": "2024-02-05"}
            ])),
            Uuid::nil(),
            &DateRange::all(),
            date("2024-06-01"),
        )
        .unwrap();

        assert_eq!(summary, SummaryResult::new(100000, 50000));
        assert_eq!(summary.balance, 50000);
    }

    #[test]
    fn test_summarize_records_rejects_non_numeric_amount() {
        let err = summarize_records(
            records(json!([
                {"amount": "10", "type": "income", "categoryId": 1},
                {"amount": "abc", "type": "expense", "categoryId": 2}
            ])),
            Uuid::nil(),
            &DateRange::all(),
            date("2024-06-01"),
        )
        .unwrap_err();

        assert_eq!(err.index, 1);
        assert_eq!(err.field, "amount");
        assert!(matches!(err.kind, ValidationErrorKind::InvalidAmount { .. }));
    }

    #[test]
    fn test_monthly_from_records_rejects_bad_date() {
        let err = monthly_from_records(
            records(json!([
                {"amount": "10", "type": "income", "categoryId": 1, "date": "yesterday"}
            ])),
            Uuid::nil(),
            date("2024-06-01"),
        )
        .unwrap_err();

        assert_eq!(err.field, "date");
    }

    #[test]
    fn test_build_dashboard() {
        let owner = Uuid::new_v4();
        let categories = vec![
            Category::new(owner, "Salary", CategoryType::Income).with_id(1),
            Category::new(owner, "Food", CategoryType::Expense).with_id(2),
        ];
        let transactions: Vec<Transaction> = [
            (1, TransactionType::Income, 300000, 1, "2024-03-01"),
            (2, TransactionType::Expense, 4000, 2, "2024-03-02"),
            (3, TransactionType::Expense, 6000, 2, "2024-04-02"),
            (4, TransactionType::Expense, 1000, 9, "2024-04-03"),
            (5, TransactionType::Income, 300000, 1, "2024-04-01"),
            (6, TransactionType::Expense, 500, 2, "2024-04-03"),
        ]
        .into_iter()
        .map(|(id, tt, amount, category, on)| {
            Transaction::new(owner, tt, amount, category, date(on)).with_id(id)
        })
        .collect();

        let report = build_dashboard(
            &transactions,
            &categories,
            DateRange::current_month(date("2024-04-15")),
        );

        assert_eq!(report.summary, SummaryResult::new(300000, 7500));
        assert_eq!(report.expense_breakdown.len(), 2);
        assert_eq!(report.expense_breakdown[0].label, "Food");
        assert_eq!(report.expense_breakdown[0].total, 10500);
        assert_eq!(report.expense_breakdown[1].label, "Unknown");
        assert_eq!(report.monthly.len(), 2);

        let recent: Vec<_> = report.recent_transactions.iter().map(|t| t.id).collect();
        assert_eq!(recent, vec![6, 4, 3, 5, 2]);
    }
}

mod common;

use anyhow::Result;
use budgetbook::domain::{DateRange, SummaryResult, TransactionType, UNKNOWN_CATEGORY};
use common::{draft, new_owner, parse_date, test_service, StandardCategories};

/// 1000 income on Jan 15, expenses of 300 on Jan 20 and 200 on Feb 5.
async fn seed_example(
    service: &budgetbook::application::BudgetService,
    owner: budgetbook::domain::OwnerId,
) -> Result<StandardCategories> {
    let cats = StandardCategories::create(service, owner).await?;
    service
        .record_transaction(
            owner,
            draft(TransactionType::Income, 100000, cats.salary, "2024-01-15"),
        )
        .await?;
    service
        .record_transaction(
            owner,
            draft(TransactionType::Expense, 30000, cats.rent, "2024-01-20"),
        )
        .await?;
    service
        .record_transaction(
            owner,
            draft(TransactionType::Expense, 20000, cats.groceries, "2024-02-05"),
        )
        .await?;
    Ok(cats)
}

#[tokio::test]
async fn test_summary_without_range() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let owner = new_owner();
    seed_example(&service, owner).await?;

    let summary = service.get_summary(owner, DateRange::all()).await?;

    assert_eq!(summary, SummaryResult::new(100000, 50000));
    assert_eq!(summary.balance, 50000);
    Ok(())
}

#[tokio::test]
async fn test_summary_with_range_is_inclusive() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let owner = new_owner();
    seed_example(&service, owner).await?;

    let january = DateRange::new(Some(parse_date("2024-01-01")), Some(parse_date("2024-01-31")));
    let summary = service.get_summary(owner, january).await?;
    assert_eq!(summary, SummaryResult::new(100000, 30000));
    assert_eq!(summary.balance, 70000);

    let single_day = DateRange::new(Some(parse_date("2024-02-05")), Some(parse_date("2024-02-05")));
    let summary = service.get_summary(owner, single_day).await?;
    assert_eq!(summary, SummaryResult::new(0, 20000));
    assert_eq!(summary.balance, -20000);

    Ok(())
}

#[tokio::test]
async fn test_summary_of_range_halves_adds_up() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let owner = new_owner();
    seed_example(&service, owner).await?;

    let before = DateRange::new(None, Some(parse_date("2024-01-31")));
    let after = DateRange::new(Some(parse_date("2024-02-01")), None);

    let all = service.get_summary(owner, DateRange::all()).await?;
    let first = service.get_summary(owner, before).await?;
    let second = service.get_summary(owner, after).await?;

    assert_eq!(first.income + second.income, all.income);
    assert_eq!(first.expenses + second.expenses, all.expenses);
    Ok(())
}

#[tokio::test]
async fn test_expense_breakdown() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let owner = new_owner();
    let cats = seed_example(&service, owner).await?;
    service
        .record_transaction(
            owner,
            draft(TransactionType::Expense, 5000, cats.groceries, "2024-02-10"),
        )
        .await?;
    service
        .record_transaction(owner, draft(TransactionType::Expense, 1000, 999, "2024-02-11"))
        .await?;

    let breakdown = service.get_expense_breakdown(owner).await?;

    let labels: Vec<_> = breakdown.iter().map(|s| s.label.as_str()).collect();
    assert_eq!(labels, vec!["Rent", "Groceries", UNKNOWN_CATEGORY]);
    assert_eq!(breakdown[0].total, 30000);
    assert_eq!(breakdown[1].total, 25000);
    assert_eq!(breakdown[1].category_id, cats.groceries);
    assert_eq!(breakdown[2].category_id, 999);

    let total: i64 = breakdown.iter().map(|s| s.total).sum();
    let summary = service.get_summary(owner, DateRange::all()).await?;
    assert_eq!(total, summary.expenses);

    let percent: f64 = breakdown.iter().map(|s| s.percentage).sum();
    assert!((percent - 100.0).abs() < 1e-9);

    Ok(())
}

#[tokio::test]
async fn test_breakdown_ignores_income() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let owner = new_owner();
    let cats = StandardCategories::create(&service, owner).await?;
    service
        .record_transaction(
            owner,
            draft(TransactionType::Income, 100000, cats.salary, "2024-01-15"),
        )
        .await?;

    assert!(service.get_expense_breakdown(owner).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_monthly_comparison() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let owner = new_owner();
    seed_example(&service, owner).await?;

    let months = service.get_monthly_comparison(owner).await?;

    assert_eq!(months.len(), 2);
    assert_eq!(months[0].label, "Jan 2024");
    assert_eq!(months[0].income, 100000);
    assert_eq!(months[0].expenses, 30000);
    assert_eq!(months[1].label, "Feb 2024");
    assert_eq!(months[1].income, 0);
    assert_eq!(months[1].expenses, 20000);
    Ok(())
}

#[tokio::test]
async fn test_monthly_comparison_keeps_latest_six_active_months() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let owner = new_owner();

    // Eight active months spread over two years, with gaps
    for on in [
        "2023-02-01",
        "2023-05-01",
        "2023-09-01",
        "2023-12-01",
        "2024-01-01",
        "2024-03-01",
        "2024-04-01",
        "2024-08-01",
    ] {
        service
            .record_transaction(owner, draft(TransactionType::Expense, 100, 1, on))
            .await?;
    }

    let months = service.get_monthly_comparison(owner).await?;

    let labels: Vec<_> = months.iter().map(|m| m.label.as_str()).collect();
    assert_eq!(
        labels,
        vec!["Sep 2023", "Dec 2023", "Jan 2024", "Mar 2024", "Apr 2024", "Aug 2024"]
    );
    Ok(())
}

#[tokio::test]
async fn test_dashboard() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let owner = new_owner();
    seed_example(&service, owner).await?;

    let range = DateRange::current_month(parse_date("2024-02-20"));
    let report = service.get_dashboard(owner, range).await?;

    assert_eq!(report.range, range);
    assert_eq!(report.summary, SummaryResult::new(0, 20000));
    // The charts are not narrowed by the range
    assert_eq!(report.expense_breakdown.len(), 2);
    assert_eq!(report.monthly.len(), 2);
    assert_eq!(report.recent_transactions.len(), 3);
    assert_eq!(report.recent_transactions[0].date, parse_date("2024-02-05"));
    Ok(())
}

#[tokio::test]
async fn test_reports_on_empty_database() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let owner = new_owner();

    let summary = service.get_summary(owner, DateRange::all()).await?;
    assert_eq!(summary, SummaryResult::new(0, 0));
    assert!(service.get_expense_breakdown(owner).await?.is_empty());
    assert!(service.get_monthly_comparison(owner).await?.is_empty());

    let report = service.get_dashboard(owner, DateRange::all()).await?;
    assert!(report.recent_transactions.is_empty());
    assert!(report.monthly.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_reports_are_repeatable() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let owner = new_owner();
    seed_example(&service, owner).await?;

    let first = service.get_summary(owner, DateRange::all()).await?;
    let second = service.get_summary(owner, DateRange::all()).await?;
    assert_eq!(first, second);

    let first = service.get_expense_breakdown(owner).await?;
    let second = service.get_expense_breakdown(owner).await?;
    assert_eq!(first, second);

    let first = service.get_monthly_comparison(owner).await?;
    let second = service.get_monthly_comparison(owner).await?;
    assert_eq!(first, second);
    Ok(())
}

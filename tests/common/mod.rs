// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use budgetbook::application::BudgetService;
use budgetbook::domain::{
    CategoryDraft, CategoryId, CategoryType, Cents, OwnerId, TransactionDraft, TransactionType,
};
use chrono::NaiveDate;
use tempfile::TempDir;
use uuid::Uuid;

/// Helper to create a test service with a temporary database
pub async fn test_service() -> Result<(BudgetService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let service = BudgetService::init(db_path.to_str().unwrap()).await?;
    Ok((service, temp_dir))
}

/// Helper to parse a date string into NaiveDate
pub fn parse_date(date_str: &str) -> NaiveDate {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d").unwrap()
}

pub fn new_owner() -> OwnerId {
    Uuid::new_v4()
}

pub fn draft(
    transaction_type: TransactionType,
    amount_cents: Cents,
    category_id: CategoryId,
    date: &str,
) -> TransactionDraft {
    TransactionDraft {
        transaction_type,
        amount_cents,
        category_id,
        description: None,
        date: parse_date(date),
    }
}

/// Test fixture: Standard category setup
pub struct StandardCategories {
    pub salary: CategoryId,
    pub groceries: CategoryId,
    pub rent: CategoryId,
}

impl StandardCategories {
    /// Create Salary (income), Groceries and Rent (expense)
    pub async fn create(service: &BudgetService, owner: OwnerId) -> Result<Self> {
        let salary = create_category(service, owner, "Salary", CategoryType::Income).await?;
        let groceries = create_category(service, owner, "Groceries", CategoryType::Expense).await?;
        let rent = create_category(service, owner, "Rent", CategoryType::Expense).await?;
        Ok(Self {
            salary,
            groceries,
            rent,
        })
    }
}

async fn create_category(
    service: &BudgetService,
    owner: OwnerId,
    name: &str,
    category_type: CategoryType,
) -> Result<CategoryId> {
    let category = service
        .create_category(
            owner,
            CategoryDraft {
                name: name.into(),
                category_type,
            },
        )
        .await?;
    Ok(category.id)
}

use chrono::NaiveDate;

use crate::domain::{
    category_totals, expense_breakdown, monthly_buckets, summarize, validate_transactions,
    Category, CategoryDraft, CategoryId, DateRange, ExpenseSlice, MonthlyBucket, OwnerId,
    SummaryResult, Transaction, TransactionDraft, TransactionId, TransactionRecord,
    MAX_AMOUNT_CENTS,
};
use crate::storage::Repository;

use super::{build_dashboard, most_recent, AppError, DashboardReport};

/// Budget use cases for one database. Every call takes the owner whose
/// records it reads or writes.
pub struct BudgetService {
    repo: Repository,
}

/// Filter for querying transactions
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub range: DateRange,
    pub limit: Option<usize>,
}

/// Result of a bulk import
#[derive(Debug, Clone)]
pub struct ImportResult {
    pub transactions: Vec<Transaction>,
    pub dry_run: bool,
}

impl BudgetService {
    /// Create a new budget service with the given repository.
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Open the database file, creating it and its tables when missing.
    pub async fn init(database_path: &str) -> Result<Self, AppError> {
        let repo = Repository::init(&format!("sqlite:{}?mode=rwc", database_path)).await?;
        Ok(Self::new(repo))
    }

    /// Open a database created earlier with `init`.
    pub async fn connect(database_path: &str) -> Result<Self, AppError> {
        let repo = Repository::connect(&format!("sqlite:{}", database_path)).await?;
        Ok(Self::new(repo))
    }

    // ========================
    // Category operations
    // ========================

    /// Create a new category.
    pub async fn create_category(
        &self,
        owner_id: OwnerId,
        draft: CategoryDraft,
    ) -> Result<Category, AppError> {
        if draft.name.trim().is_empty() {
            return Err(AppError::EmptyCategoryName);
        }

        let mut category = CategoryDraft {
            name: draft.name.trim().to_string(),
            ..draft
        }
        .into_category(owner_id);
        self.repo.save_category(&mut category).await?;

        tracing::info!(id = category.id, name = %category.name, "created category");
        Ok(category)
    }

    pub async fn get_category(
        &self,
        owner_id: OwnerId,
        id: CategoryId,
    ) -> Result<Category, AppError> {
        self.repo
            .get_category(owner_id, id)
            .await?
            .ok_or(AppError::CategoryNotFound(id))
    }

    pub async fn list_categories(&self, owner_id: OwnerId) -> Result<Vec<Category>, AppError> {
        Ok(self.repo.list_categories(owner_id).await?)
    }

    // ========================
    // Transaction operations
    // ========================

    /// Record a new transaction.
    pub async fn record_transaction(
        &self,
        owner_id: OwnerId,
        draft: TransactionDraft,
    ) -> Result<Transaction, AppError> {
        if !(0..=MAX_AMOUNT_CENTS).contains(&draft.amount_cents) {
            return Err(AppError::InvalidAmount(draft.amount_cents));
        }
        self.check_category(owner_id, &draft).await?;

        let mut transaction = draft.into_transaction(owner_id);
        self.repo.save_transaction(&mut transaction).await?;

        tracing::info!(
            id = transaction.id,
            kind = %transaction.transaction_type,
            amount_cents = transaction.amount_cents,
            "recorded transaction"
        );
        Ok(transaction)
    }

    /// Replace the editable fields of an existing transaction.
    pub async fn update_transaction(
        &self,
        owner_id: OwnerId,
        id: TransactionId,
        draft: TransactionDraft,
    ) -> Result<Transaction, AppError> {
        if !(0..=MAX_AMOUNT_CENTS).contains(&draft.amount_cents) {
            return Err(AppError::InvalidAmount(draft.amount_cents));
        }

        let mut transaction = self.get_transaction(owner_id, id).await?;
        self.check_category(owner_id, &draft).await?;
        transaction.apply(draft);

        if !self.repo.update_transaction(&transaction).await? {
            return Err(AppError::TransactionNotFound(id));
        }

        tracing::info!(id, "updated transaction");
        Ok(transaction)
    }

    pub async fn delete_transaction(
        &self,
        owner_id: OwnerId,
        id: TransactionId,
    ) -> Result<(), AppError> {
        if !self.repo.delete_transaction(owner_id, id).await? {
            return Err(AppError::TransactionNotFound(id));
        }
        tracing::info!(id, "deleted transaction");
        Ok(())
    }

    pub async fn get_transaction(
        &self,
        owner_id: OwnerId,
        id: TransactionId,
    ) -> Result<Transaction, AppError> {
        self.repo
            .get_transaction(owner_id, id)
            .await?
            .ok_or(AppError::TransactionNotFound(id))
    }

    /// All transactions of the owner, newest first.
    pub async fn list_transactions(&self, owner_id: OwnerId) -> Result<Vec<Transaction>, AppError> {
        Ok(self.repo.list_transactions(owner_id).await?)
    }

    pub async fn list_transactions_filtered(
        &self,
        owner_id: OwnerId,
        filter: TransactionFilter,
    ) -> Result<Vec<Transaction>, AppError> {
        Ok(self
            .repo
            .list_transactions_filtered(owner_id, &filter.range, filter.limit)
            .await?)
    }

    /// The `limit` most recent transactions by date.
    pub async fn recent_transactions(
        &self,
        owner_id: OwnerId,
        limit: usize,
    ) -> Result<Vec<Transaction>, AppError> {
        let transactions = self.repo.list_transactions(owner_id).await?;
        Ok(most_recent(&transactions, limit))
    }

    /// Validate every record, then store them all. Nothing is stored if any
    /// record is invalid.
    pub async fn import_records(
        &self,
        owner_id: OwnerId,
        records: Vec<TransactionRecord>,
        today: NaiveDate,
        dry_run: bool,
    ) -> Result<ImportResult, AppError> {
        let mut transactions = validate_transactions(records, owner_id, today)?;
        tracing::debug!(count = transactions.len(), dry_run, "validated import");

        if !dry_run {
            for transaction in &mut transactions {
                self.repo.save_transaction(transaction).await?;
            }
            tracing::info!(count = transactions.len(), "imported transactions");
        }

        Ok(ImportResult {
            transactions,
            dry_run,
        })
    }

    // ========================
    // Reports
    // ========================

    /// Income, expenses and balance within the range.
    pub async fn get_summary(
        &self,
        owner_id: OwnerId,
        range: DateRange,
    ) -> Result<SummaryResult, AppError> {
        let transactions = self.repo.list_transactions(owner_id).await?;
        let summary = summarize(&transactions, &range);
        tracing::debug!(?range, ?summary, "computed summary");
        Ok(summary)
    }

    /// Expenses grouped by category, labelled and largest first.
    pub async fn get_expense_breakdown(
        &self,
        owner_id: OwnerId,
    ) -> Result<Vec<ExpenseSlice>, AppError> {
        let transactions = self.repo.list_transactions(owner_id).await?;
        let categories = self.repo.list_categories(owner_id).await?;
        Ok(expense_breakdown(&category_totals(&transactions), &categories))
    }

    /// Income and expenses of the most recent active months, oldest first.
    pub async fn get_monthly_comparison(
        &self,
        owner_id: OwnerId,
    ) -> Result<Vec<MonthlyBucket>, AppError> {
        let transactions = self.repo.list_transactions(owner_id).await?;
        Ok(monthly_buckets(&transactions))
    }

    pub async fn get_dashboard(
        &self,
        owner_id: OwnerId,
        range: DateRange,
    ) -> Result<DashboardReport, AppError> {
        let transactions = self.repo.list_transactions(owner_id).await?;
        let categories = self.repo.list_categories(owner_id).await?;
        Ok(build_dashboard(&transactions, &categories, range))
    }

    /// Orphaned category ids and kind mismatches are accepted, but logged.
    async fn check_category(
        &self,
        owner_id: OwnerId,
        draft: &TransactionDraft,
    ) -> Result<(), AppError> {
        match self.repo.get_category(owner_id, draft.category_id).await? {
            None => tracing::warn!(
                category_id = draft.category_id,
                "transaction references an unknown category"
            ),
            Some(category) if category.category_type != draft.transaction_type => {
                tracing::warn!(
                    category = %category.name,
                    category_type = %category.category_type,
                    transaction_type = %draft.transaction_type,
                    "transaction type does not match its category"
                )
            }
            Some(_) => {}
        }
        Ok(())
    }
}

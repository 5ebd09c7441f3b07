use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::domain::{
    Category, CategoryId, CategoryType, DateRange, OwnerId, Transaction, TransactionId,
    TransactionType,
};

use super::MIGRATION_001_INITIAL;

const DATE_FORMAT: &str = "%Y-%m-%d";

const TRANSACTION_COLUMNS: &str =
    "id, owner_id, amount_cents, transaction_type, category_id, description, date, created_at";

/// Repository for persisting and querying categories and transactions.
///
/// Every read and write is scoped to a single owner.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database at the given path.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;
        Ok(())
    }

    /// Initialize a new database (connect + migrate).
    pub async fn init(database_url: &str) -> Result<Self> {
        let repo = Self::connect(database_url).await?;
        repo.migrate().await?;
        Ok(repo)
    }

    // ========================
    // Category operations
    // ========================

    /// Save a new category and assign its id.
    pub async fn save_category(&self, category: &mut Category) -> Result<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO categories (owner_id, name, category_type, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(category.owner_id.to_string())
        .bind(&category.name)
        .bind(category.category_type.as_str())
        .bind(category.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to save category")?;

        category.id = result.last_insert_rowid();
        tracing::debug!(id = category.id, name = %category.name, "saved category");
        Ok(())
    }

    /// Get a category by id.
    pub async fn get_category(&self, owner_id: OwnerId, id: CategoryId) -> Result<Option<Category>> {
        let row = sqlx::query(
            r#"
            SELECT id, owner_id, name, category_type, created_at
            FROM categories
            WHERE owner_id = ? AND id = ?
            "#,
        )
        .bind(owner_id.to_string())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch category")?;

        row.as_ref().map(Self::row_to_category).transpose()
    }

    /// List all categories of an owner, in creation order.
    pub async fn list_categories(&self, owner_id: OwnerId) -> Result<Vec<Category>> {
        let rows = sqlx::query(
            r#"
            SELECT id, owner_id, name, category_type, created_at
            FROM categories
            WHERE owner_id = ?
            ORDER BY id
            "#,
        )
        .bind(owner_id.to_string())
        .fetch_all(&self.pool)
        .await
        .context("Failed to list categories")?;

        rows.iter().map(Self::row_to_category).collect()
    }

    fn row_to_category(row: &sqlx::sqlite::SqliteRow) -> Result<Category> {
        let owner_str: String = row.get("owner_id");
        let type_str: String = row.get("category_type");
        let created_at_str: String = row.get("created_at");

        Ok(Category {
            id: row.get("id"),
            owner_id: Uuid::parse_str(&owner_str).context("Invalid owner ID")?,
            name: row.get("name"),
            category_type: CategoryType::from_str(&type_str)
                .ok_or_else(|| anyhow::anyhow!("Invalid category type: {}", type_str))?,
            created_at: DateTime::parse_from_rfc3339(&created_at_str)
                .context("Invalid created_at timestamp")?
                .with_timezone(&Utc),
        })
    }

    // ========================
    // Transaction operations
    // ========================

    /// Save a new transaction and assign its id.
    pub async fn save_transaction(&self, transaction: &mut Transaction) -> Result<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO transactions (owner_id, amount_cents, transaction_type, category_id, description, date, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(transaction.owner_id.to_string())
        .bind(transaction.amount_cents)
        .bind(transaction.transaction_type.as_str())
        .bind(transaction.category_id)
        .bind(&transaction.description)
        .bind(transaction.date.format(DATE_FORMAT).to_string())
        .bind(transaction.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to save transaction")?;

        transaction.id = result.last_insert_rowid();
        Ok(())
    }

    /// Get a transaction by id.
    pub async fn get_transaction(
        &self,
        owner_id: OwnerId,
        id: TransactionId,
    ) -> Result<Option<Transaction>> {
        let query = format!(
            "SELECT {} FROM transactions WHERE owner_id = ? AND id = ?",
            TRANSACTION_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(owner_id.to_string())
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch transaction")?;

        row.as_ref().map(Self::row_to_transaction).transpose()
    }

    /// List all transactions of an owner, newest first.
    pub async fn list_transactions(&self, owner_id: OwnerId) -> Result<Vec<Transaction>> {
        self.list_transactions_filtered(owner_id, &DateRange::all(), None)
            .await
    }

    /// List transactions within a date range, newest first.
    pub async fn list_transactions_filtered(
        &self,
        owner_id: OwnerId,
        range: &DateRange,
        limit: Option<usize>,
    ) -> Result<Vec<Transaction>> {
        let mut query = format!(
            "SELECT {} FROM transactions WHERE owner_id = ?",
            TRANSACTION_COLUMNS
        );

        // Collect all string bindings first so they live long enough
        let owner_str = owner_id.to_string();
        let start_str = range.start.map(|d| d.format(DATE_FORMAT).to_string());
        let end_str = range.end.map(|d| d.format(DATE_FORMAT).to_string());

        if start_str.is_some() {
            query.push_str(" AND date >= ?");
        }
        if end_str.is_some() {
            query.push_str(" AND date <= ?");
        }

        query.push_str(" ORDER BY date DESC, id DESC");

        if let Some(lim) = limit {
            query.push_str(&format!(" LIMIT {}", lim));
        }

        let mut sql_query = sqlx::query(&query).bind(&owner_str);
        if let Some(ref start) = start_str {
            sql_query = sql_query.bind(start);
        }
        if let Some(ref end) = end_str {
            sql_query = sql_query.bind(end);
        }

        let rows = sql_query
            .fetch_all(&self.pool)
            .await
            .context("Failed to list transactions")?;

        rows.iter().map(Self::row_to_transaction).collect()
    }

    /// Replace the editable fields of a stored transaction.
    /// Returns false when no transaction with that id belongs to the owner.
    pub async fn update_transaction(&self, transaction: &Transaction) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE transactions
            SET amount_cents = ?, transaction_type = ?, category_id = ?, description = ?, date = ?
            WHERE owner_id = ? AND id = ?
            "#,
        )
        .bind(transaction.amount_cents)
        .bind(transaction.transaction_type.as_str())
        .bind(transaction.category_id)
        .bind(&transaction.description)
        .bind(transaction.date.format(DATE_FORMAT).to_string())
        .bind(transaction.owner_id.to_string())
        .bind(transaction.id)
        .execute(&self.pool)
        .await
        .context("Failed to update transaction")?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete a transaction. Returns false when nothing matched.
    pub async fn delete_transaction(&self, owner_id: OwnerId, id: TransactionId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM transactions WHERE owner_id = ? AND id = ?")
            .bind(owner_id.to_string())
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete transaction")?;

        Ok(result.rows_affected() > 0)
    }

    fn row_to_transaction(row: &sqlx::sqlite::SqliteRow) -> Result<Transaction> {
        let owner_str: String = row.get("owner_id");
        let type_str: String = row.get("transaction_type");
        let date_str: String = row.get("date");
        let created_at_str: String = row.get("created_at");

        Ok(Transaction {
            id: row.get("id"),
            owner_id: Uuid::parse_str(&owner_str).context("Invalid owner ID")?,
            amount_cents: row.get("amount_cents"),
            transaction_type: TransactionType::from_str(&type_str)
                .ok_or_else(|| anyhow::anyhow!("Invalid transaction type: {}", type_str))?,
            category_id: row.get("category_id"),
            description: row.get("description"),
            date: NaiveDate::parse_from_str(&date_str, DATE_FORMAT)
                .with_context(|| format!("Invalid transaction date: {}", date_str))?,
            created_at: DateTime::parse_from_rfc3339(&created_at_str)
                .context("Invalid created_at timestamp")?
                .with_timezone(&Utc),
        })
    }
}

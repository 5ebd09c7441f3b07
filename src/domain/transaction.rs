use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Cents, CategoryId};

pub type TransactionId = i64;

/// Identifies the user owning a record. Every query is scoped to one owner.
pub type OwnerId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    Expense,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Income => "income",
            TransactionType::Expense => "expense",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "income" => Some(TransactionType::Income),
            "expense" => Some(TransactionType::Expense),
            _ => None,
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single income or expense entry.
///
/// Aggregation treats transactions as read-only; changes go through the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: TransactionId,
    pub owner_id: OwnerId,
    /// Amount in cents, never negative. Serialized as a decimal `amount`
    /// so a transaction reads back as a record.
    #[serde(rename = "amount", with = "super::money::decimal")]
    pub amount_cents: Cents,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    /// Not checked against the category list; orphans are reported as "Unknown"
    pub category_id: CategoryId,
    pub description: Option<String>,
    /// Calendar date the money moved
    pub date: NaiveDate,
    /// When the record was stored
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Create a new transaction. The id is assigned by the repository on save.
    ///
    /// The amount is taken as given; validation and the service reject
    /// negative or oversized amounts before a transaction is built.
    pub fn new(
        owner_id: OwnerId,
        transaction_type: TransactionType,
        amount_cents: Cents,
        category_id: CategoryId,
        date: NaiveDate,
    ) -> Self {
        Self {
            id: 0,
            owner_id,
            amount_cents,
            transaction_type,
            category_id,
            description: None,
            date,
            created_at: Utc::now(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_id(mut self, id: TransactionId) -> Self {
        self.id = id;
        self
    }

    pub fn is_income(&self) -> bool {
        self.transaction_type == TransactionType::Income
    }

    pub fn is_expense(&self) -> bool {
        self.transaction_type == TransactionType::Expense
    }

    /// Overwrite the editable fields with the contents of a draft.
    pub fn apply(&mut self, draft: TransactionDraft) {
        self.transaction_type = draft.transaction_type;
        self.amount_cents = draft.amount_cents;
        self.category_id = draft.category_id;
        self.description = draft.description;
        self.date = draft.date;
    }
}

/// The user-editable part of a transaction, used for both create and update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionDraft {
    pub transaction_type: TransactionType,
    pub amount_cents: Cents,
    pub category_id: CategoryId,
    pub description: Option<String>,
    pub date: NaiveDate,
}

impl TransactionDraft {
    pub fn into_transaction(self, owner_id: OwnerId) -> Transaction {
        let mut transaction = Transaction::new(
            owner_id,
            self.transaction_type,
            self.amount_cents,
            self.category_id,
            self.date,
        );
        transaction.description = self.description;
        transaction
    }
}

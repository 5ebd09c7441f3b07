//! Conversion of loosely-typed input records into strict domain values.
//!
//! Request bodies, JSON files and CSV rows arrive with amounts and ids as
//! either numbers or strings. Everything is checked here, once, so the
//! aggregators only ever see well-formed transactions. A bad record is
//! reported with its position and id instead of being coerced or skipped.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use super::{
    format_cents, parse_cents, CategoryDraft, CategoryType, Cents, OwnerId, ParseCentsError,
    Transaction, TransactionDraft, TransactionType, MAX_AMOUNT_CENTS,
};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error(
    "invalid record #{index}{}: `{field}` {kind}",
    .id.as_ref().map(|id| format!(" (id {id})")).unwrap_or_default()
)]
pub struct ValidationError {
    /// Zero-based position of the record in its input
    pub index: usize,
    /// Record id, when the input carried one
    pub id: Option<i64>,
    pub field: &'static str,
    pub kind: ValidationErrorKind,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    #[error("is required")]
    Missing,

    #[error("is not a valid amount ({value:?}): {source}")]
    InvalidAmount {
        value: String,
        source: ParseCentsError,
    },

    #[error("must not be negative")]
    Negative,

    #[error("exceeds the maximum of {}", format_cents(MAX_AMOUNT_CENTS))]
    TooLarge,

    #[error("is not a valid date: {0:?}")]
    InvalidDate(String),

    #[error("must be 'income' or 'expense', got {0:?}")]
    UnknownType(String),

    #[error("must not be empty")]
    EmptyName,

    #[error("is not a valid id: {0}")]
    InvalidId(String),
}

/// A transaction as it arrives from outside, before validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub id: Value,
    #[serde(default)]
    pub amount: Value,
    #[serde(default, rename = "type")]
    pub transaction_type: Option<String>,
    #[serde(default)]
    pub category_id: Value,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl TransactionRecord {
    /// Validate the editable fields. A missing date falls back to `today`.
    pub fn into_draft(
        self,
        index: usize,
        today: NaiveDate,
    ) -> Result<TransactionDraft, ValidationError> {
        let id = self.id.as_i64();
        let fail = |field: &'static str, kind: ValidationErrorKind| ValidationError {
            index,
            id,
            field,
            kind,
        };

        let amount_cents = parse_amount(&self.amount).map_err(|kind| fail("amount", kind))?;

        let transaction_type = match self.transaction_type.as_deref().map(str::trim) {
            None | Some("") => return Err(fail("type", ValidationErrorKind::Missing)),
            Some(raw) => TransactionType::from_str(raw)
                .ok_or_else(|| fail("type", ValidationErrorKind::UnknownType(raw.to_string())))?,
        };

        let category_id = parse_id(&self.category_id)
            .and_then(|id| id.ok_or(ValidationErrorKind::Missing))
            .map_err(|kind| fail("categoryId", kind))?;

        let date = match self.date.as_deref().map(str::trim) {
            None | Some("") => today,
            Some(raw) => parse_calendar_date(raw)
                .ok_or_else(|| fail("date", ValidationErrorKind::InvalidDate(raw.to_string())))?,
        };

        let description = self
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());

        Ok(TransactionDraft {
            transaction_type,
            amount_cents,
            category_id,
            description,
            date,
        })
    }

    /// Validate the whole record into a transaction owned by `owner_id`.
    pub fn into_transaction(
        self,
        index: usize,
        owner_id: OwnerId,
        today: NaiveDate,
    ) -> Result<Transaction, ValidationError> {
        let record_id = self.id.as_i64();
        let fail = |field: &'static str, kind: ValidationErrorKind| ValidationError {
            index,
            id: record_id,
            field,
            kind,
        };

        let id = parse_id(&self.id).map_err(|kind| fail("id", kind))?;
        let created_at = self
            .created_at
            .as_deref()
            .map(|raw| {
                DateTime::parse_from_rfc3339(raw)
                    .map(|dt| dt.with_timezone(&Utc))
                    .map_err(|_| fail("createdAt", ValidationErrorKind::InvalidDate(raw.to_string())))
            })
            .transpose()?;

        let mut transaction = self.into_draft(index, today)?.into_transaction(owner_id);
        if let Some(id) = id {
            transaction.id = id;
        }
        if let Some(created_at) = created_at {
            transaction.created_at = created_at;
        }
        Ok(transaction)
    }
}

impl From<&Transaction> for TransactionRecord {
    fn from(transaction: &Transaction) -> Self {
        Self {
            id: Value::from(transaction.id),
            amount: Value::String(format_cents(transaction.amount_cents)),
            transaction_type: Some(transaction.transaction_type.as_str().to_string()),
            category_id: Value::from(transaction.category_id),
            description: transaction.description.clone(),
            date: Some(transaction.date.format("%Y-%m-%d").to_string()),
            created_at: Some(transaction.created_at.to_rfc3339()),
        }
    }
}

/// Validate a batch of records. The first invalid record fails the whole batch.
pub fn validate_transactions(
    records: Vec<TransactionRecord>,
    owner_id: OwnerId,
    today: NaiveDate,
) -> Result<Vec<Transaction>, ValidationError> {
    records
        .into_iter()
        .enumerate()
        .map(|(index, record)| record.into_transaction(index, owner_id, today))
        .collect()
}

/// A category as it arrives from outside, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRecord {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "type")]
    pub category_type: Option<String>,
}

impl CategoryRecord {
    pub fn into_draft(self, index: usize) -> Result<CategoryDraft, ValidationError> {
        let fail = |field: &'static str, kind: ValidationErrorKind| ValidationError {
            index,
            id: None,
            field,
            kind,
        };

        let name = match self.name.as_deref().map(str::trim) {
            None => return Err(fail("name", ValidationErrorKind::Missing)),
            Some("") => return Err(fail("name", ValidationErrorKind::EmptyName)),
            Some(name) => name.to_string(),
        };

        let category_type = match self.category_type.as_deref().map(str::trim) {
            None | Some("") => return Err(fail("type", ValidationErrorKind::Missing)),
            Some(raw) => CategoryType::from_str(raw)
                .ok_or_else(|| fail("type", ValidationErrorKind::UnknownType(raw.to_string())))?,
        };

        Ok(CategoryDraft {
            name,
            category_type,
        })
    }
}

fn parse_amount(value: &Value) -> Result<Cents, ValidationErrorKind> {
    let text = match value {
        Value::Null => return Err(ValidationErrorKind::Missing),
        Value::String(s) if s.trim().is_empty() => return Err(ValidationErrorKind::Missing),
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        other => {
            return Err(ValidationErrorKind::InvalidAmount {
                value: other.to_string(),
                source: ParseCentsError::InvalidFormat,
            });
        }
    };

    let cents = parse_cents(&text).map_err(|source| ValidationErrorKind::InvalidAmount {
        value: text.clone(),
        source,
    })?;
    if cents < 0 {
        return Err(ValidationErrorKind::Negative);
    }
    if cents > MAX_AMOUNT_CENTS {
        return Err(ValidationErrorKind::TooLarge);
    }
    Ok(cents)
}

/// Ids may be JSON integers or numeric strings (HTML selects submit strings).
fn parse_id(value: &Value) -> Result<Option<i64>, ValidationErrorKind> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::String(s) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ValidationErrorKind::InvalidId(value.to_string())),
        Value::Number(n) => n
            .as_i64()
            .map(Some)
            .ok_or_else(|| ValidationErrorKind::InvalidId(value.to_string())),
        other => Err(ValidationErrorKind::InvalidId(other.to_string())),
    }
}

/// Accepts `YYYY-MM-DD` or an RFC 3339 timestamp. A timestamp keeps the
/// calendar date of its own offset; no conversion to UTC happens.
pub fn parse_calendar_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok().or_else(|| {
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|dt| dt.date_naive())
    })
}

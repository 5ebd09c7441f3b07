use std::collections::HashMap;
use std::io::Read;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;

use crate::application::{AppError, BudgetService, ImportResult};
use crate::domain::{
    validate_transactions, CategoryRecord, OwnerId, TransactionRecord, ValidationError,
};
use crate::io::export::BudgetSnapshot;

/// Options for import operations
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    /// Validate everything but store nothing
    pub dry_run: bool,
}

/// One row of a transactions CSV. Unknown columns are ignored, so files
/// written by the exporter can be read back.
#[derive(Debug, Clone, Default, Deserialize)]
struct CsvTransactionRow {
    #[serde(default)]
    date: Option<String>,
    #[serde(default, rename = "type")]
    transaction_type: Option<String>,
    #[serde(default)]
    amount: Option<String>,
    #[serde(default)]
    category_id: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

impl From<CsvTransactionRow> for TransactionRecord {
    fn from(row: CsvTransactionRow) -> Self {
        Self {
            id: Value::Null,
            amount: row.amount.map(Value::String).unwrap_or(Value::Null),
            transaction_type: row.transaction_type,
            category_id: row.category_id.map(Value::String).unwrap_or(Value::Null),
            description: row.description,
            date: row.date,
            created_at: None,
        }
    }
}

/// Importer for loading records into an owner's budget
pub struct Importer<'a> {
    service: &'a BudgetService,
    owner_id: OwnerId,
    today: NaiveDate,
}

impl<'a> Importer<'a> {
    pub fn new(service: &'a BudgetService, owner_id: OwnerId, today: NaiveDate) -> Self {
        Self {
            service,
            owner_id,
            today,
        }
    }

    /// Import transactions from a JSON array of records
    pub async fn import_transactions_json<R: Read>(
        &self,
        reader: R,
        options: ImportOptions,
    ) -> Result<ImportResult> {
        let records = read_records_json(reader)?;
        self.import_records(records, options).await
    }

    /// Import transactions from CSV with at least `date`, `type`, `amount`
    /// and `category_id` columns
    pub async fn import_transactions_csv<R: Read>(
        &self,
        reader: R,
        options: ImportOptions,
    ) -> Result<ImportResult> {
        let records = read_records_csv(reader)?;
        self.import_records(records, options).await
    }

    /// Import a full snapshot. Categories and transactions are all validated
    /// before anything is stored; then categories are created and transaction
    /// category ids are remapped to the newly assigned ids.
    pub async fn import_full_json<R: Read>(
        &self,
        reader: R,
        options: ImportOptions,
    ) -> Result<ImportResult> {
        let snapshot: BudgetSnapshot =
            serde_json::from_reader(reader).context("Invalid snapshot JSON")?;

        let categories = snapshot
            .categories
            .into_iter()
            .enumerate()
            .map(|(index, category)| -> Result<_, ValidationError> {
                let draft = CategoryRecord {
                    name: Some(category.name),
                    category_type: Some(category.category_type.as_str().to_string()),
                }
                .into_draft(index)?;
                Ok((category.id, draft))
            })
            .collect::<Result<Vec<_>, ValidationError>>()
            .map_err(AppError::from)?;
        validate_transactions(snapshot.transactions.clone(), self.owner_id, self.today)
            .map_err(AppError::from)?;

        let mut id_map = HashMap::new();
        if !options.dry_run {
            for (old_id, draft) in categories {
                let created = self.service.create_category(self.owner_id, draft).await?;
                id_map.insert(old_id, created.id);
            }
        }

        let records = snapshot
            .transactions
            .into_iter()
            .map(|record| remap_category(record, &id_map))
            .collect();
        self.import_records(records, options).await
    }

    async fn import_records(
        &self,
        records: Vec<TransactionRecord>,
        options: ImportOptions,
    ) -> Result<ImportResult> {
        // Ids belong to the source; the store assigns new ones
        let records = records
            .into_iter()
            .map(|record| TransactionRecord {
                id: Value::Null,
                ..record
            })
            .collect();

        Ok(self
            .service
            .import_records(self.owner_id, records, self.today, options.dry_run)
            .await?)
    }
}

/// Read a JSON array of transaction records.
pub fn read_records_json<R: Read>(reader: R) -> Result<Vec<TransactionRecord>> {
    serde_json::from_reader(reader).context("Expected a JSON array of transaction records")
}

/// Read transaction records from CSV. Malformed CSV is an error that names the line.
pub fn read_records_csv<R: Read>(reader: R) -> Result<Vec<TransactionRecord>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut records = Vec::new();

    for (line_num, row) in csv_reader.deserialize::<CsvTransactionRow>().enumerate() {
        let line = line_num + 2; // +2 for header and 0-indexing
        let row = row.with_context(|| format!("CSV parse error on line {}", line))?;
        records.push(TransactionRecord::from(row));
    }

    Ok(records)
}

fn remap_category(mut record: TransactionRecord, id_map: &HashMap<i64, i64>) -> TransactionRecord {
    let old_id = match &record.category_id {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    if let Some(new_id) = old_id.and_then(|id| id_map.get(&id)) {
        record.category_id = Value::from(*new_id);
    }
    record
}

use std::io::Write;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::application::BudgetService;
use crate::domain::{category_lookup, format_cents, Category, OwnerId, TransactionRecord};

/// Snapshot of one owner's data for full export/import
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetSnapshot {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub owner_id: OwnerId,
    pub categories: Vec<Category>,
    /// Stored in record form so a snapshot goes back through validation on import
    pub transactions: Vec<TransactionRecord>,
}

/// Exporter for converting an owner's budget data to CSV or JSON
pub struct Exporter<'a> {
    service: &'a BudgetService,
    owner_id: OwnerId,
}

impl<'a> Exporter<'a> {
    pub fn new(service: &'a BudgetService, owner_id: OwnerId) -> Self {
        Self { service, owner_id }
    }

    /// Export transactions to CSV, oldest first. Amounts are written as
    /// decimals so the file can be imported again.
    pub async fn export_transactions_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let mut transactions = self.service.list_transactions(self.owner_id).await?;
        transactions.reverse();
        let categories = self.service.list_categories(self.owner_id).await?;
        let names = category_lookup(&categories);

        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record([
            "id",
            "date",
            "type",
            "amount",
            "category_id",
            "category",
            "description",
        ])?;

        for transaction in &transactions {
            csv_writer.write_record([
                transaction.id.to_string(),
                transaction.date.format("%Y-%m-%d").to_string(),
                transaction.transaction_type.as_str().to_string(),
                format_cents(transaction.amount_cents),
                transaction.category_id.to_string(),
                names
                    .get(&transaction.category_id)
                    .map(|name| name.to_string())
                    .unwrap_or_default(),
                transaction.description.clone().unwrap_or_default(),
            ])?;
        }

        csv_writer.flush()?;
        tracing::debug!(count = transactions.len(), "exported transactions as CSV");
        Ok(transactions.len())
    }

    /// Export transactions as a JSON array of records.
    pub async fn export_transactions_json<W: Write>(&self, mut writer: W) -> Result<usize> {
        let transactions = self.service.list_transactions(self.owner_id).await?;
        let records: Vec<TransactionRecord> =
            transactions.iter().map(TransactionRecord::from).collect();

        serde_json::to_writer_pretty(&mut writer, &records)?;
        writeln!(writer)?;
        writer.flush()?;
        Ok(records.len())
    }

    /// Export categories and transactions as a JSON snapshot
    pub async fn export_full_json<W: Write>(&self, mut writer: W) -> Result<BudgetSnapshot> {
        let categories = self.service.list_categories(self.owner_id).await?;
        let transactions = self.service.list_transactions(self.owner_id).await?;

        let snapshot = BudgetSnapshot {
            version: env!("CARGO_PKG_VERSION").to_string(),
            exported_at: Utc::now(),
            owner_id: self.owner_id,
            categories,
            transactions: transactions.iter().map(TransactionRecord::from).collect(),
        };

        serde_json::to_writer_pretty(&mut writer, &snapshot)?;
        writeln!(writer)?;
        writer.flush()?;

        Ok(snapshot)
    }
}

use thiserror::Error;

use crate::domain::{CategoryId, Cents, TransactionId, ValidationError};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Transaction not found: {0}")]
    TransactionNotFound(TransactionId),

    #[error("Category not found: {0}")]
    CategoryNotFound(CategoryId),

    #[error("Invalid amount: {0}")]
    InvalidAmount(Cents),

    #[error("Category name must not be empty")]
    EmptyCategoryName,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Database error: {0}")]
    Database(#[from] anyhow::Error),
}

use crate::domain::customer::CustomerId;
use crate::domain::invoice::InvoiceId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BillingError {
    #[error("Invoice '{0}' was not found")]
    InvoiceNotFound(InvoiceId),
    #[error("Customer '{0}' was not found")]
    CustomerNotFound(CustomerId),
    #[error("Invoice '{0}' was already paid")]
    AlreadyPaid(InvoiceId),
    #[error("Unknown invoice status '{0}'")]
    UnknownStatus(String),
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[cfg(feature = "storage-rocksdb")]
    #[error("Storage error: {0}")]
    StorageError(#[from] rocksdb::Error),
    #[error("Internal error: {0}")]
    InternalError(Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T> = std::result::Result<T, BillingError>;

use super::customer::{Customer, CustomerId};
use super::invoice::{Invoice, InvoiceId, InvoiceNote, InvoiceStatus};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Persistence for invoices.
///
/// `mark_paid` and `mark_failed` return `Ok(None)` when the invoice no longer
/// exists, so callers can tell a missing record apart from a storage failure.
/// A failed write must leave the previously stored record untouched.
#[async_trait]
pub trait InvoiceStore: Send + Sync {
    async fn store(&self, invoice: Invoice) -> Result<()>;
    async fn get(&self, invoice_id: InvoiceId) -> Result<Option<Invoice>>;
    /// All invoices, ordered by id.
    async fn get_all(&self) -> Result<Vec<Invoice>>;
    /// Invoices with the given status, ordered by id.
    async fn get_by_status(&self, status: InvoiceStatus) -> Result<Vec<Invoice>>;
    async fn mark_paid(&self, invoice_id: InvoiceId) -> Result<Option<Invoice>>;
    async fn mark_failed(
        &self,
        invoice_id: InvoiceId,
        note: InvoiceNote,
    ) -> Result<Option<Invoice>>;
}

#[async_trait]
pub trait CustomerStore: Send + Sync {
    async fn store(&self, customer: Customer) -> Result<()>;
    async fn get(&self, customer_id: CustomerId) -> Result<Option<Customer>>;
    async fn get_all(&self) -> Result<Vec<Customer>>;
}

pub type InvoiceStoreBox = Box<dyn InvoiceStore>;
pub type CustomerStoreBox = Box<dyn CustomerStore>;

/// Failures a payment provider can signal instead of a yes/no answer.
///
/// Only `Network` is considered transient.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChargeError {
    #[error("network error: {0}")]
    Network(String),
    #[error("customer '{0}' is unknown to the provider")]
    CustomerNotFound(CustomerId),
    #[error("currency mismatch on invoice '{0}'")]
    CurrencyMismatch(InvoiceId),
    #[error("provider error: {0}")]
    Other(String),
}

/// The external payment provider.
///
/// `Ok(true)` means the customer was charged, `Ok(false)` means the account
/// balance did not cover the invoice.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    async fn charge(&self, invoice: &Invoice) -> std::result::Result<bool, ChargeError>;
}

pub type PaymentProviderRef = Arc<dyn PaymentProvider>;

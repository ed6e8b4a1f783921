use crate::domain::customer::{Customer, CustomerId};
use crate::domain::invoice::{Invoice, InvoiceId, InvoiceNote, InvoiceStatus};
use crate::domain::ports::{CustomerStore, InvoiceStore};
use crate::error::{BillingError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, IteratorMode, Options};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;

/// Column Family for storing invoices.
pub const CF_INVOICES: &str = "invoices";
/// Column Family for storing customers.
pub const CF_CUSTOMERS: &str = "customers";

/// A persistent store implementation using RocksDB.
///
/// Invoices and customers live in separate Column Families, keyed by their
/// big-endian id so iteration yields records in id order. Each update is a
/// single `put`, so a failed write never leaves a half-updated record.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at the specified path.
    ///
    /// Ensures that the required column families ("invoices" and "customers") exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_invoices = ColumnFamilyDescriptor::new(CF_INVOICES, Options::default());
        let cf_customers = ColumnFamilyDescriptor::new(CF_CUSTOMERS, Options::default());

        let db = DB::open_cf_descriptors(&opts, path, vec![cf_invoices, cf_customers])?;

        Ok(Self { db: Arc::new(db) })
    }

    fn put<T: Serialize>(&self, cf_name: &str, key: u32, value: &T) -> Result<()> {
        let cf = self.cf(cf_name)?;
        let bytes = serde_json::to_vec(value)
            .map_err(|e| internal(format!("Serialization error: {}", e)))?;
        self.db.put_cf(cf, key.to_be_bytes(), bytes)?;
        Ok(())
    }

    fn fetch<T: DeserializeOwned>(&self, cf_name: &str, key: u32) -> Result<Option<T>> {
        let cf = self.cf(cf_name)?;
        match self.db.get_pinned_cf(cf, key.to_be_bytes())? {
            Some(bytes) => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|e| internal(format!("Deserialization error: {}", e))),
            None => Ok(None),
        }
    }

    fn scan<T: DeserializeOwned>(&self, cf_name: &str) -> Result<Vec<T>> {
        let cf = self.cf(cf_name)?;
        let mut records = Vec::new();
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_key, value) = item?;
            let record = serde_json::from_slice(&value)
                .map_err(|e| internal(format!("Deserialization error: {}", e)))?;
            records.push(record);
        }
        Ok(records)
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| internal(format!("{} column family not found", name)))
    }
}

fn internal(message: String) -> BillingError {
    BillingError::InternalError(Box::new(std::io::Error::other(message)))
}

#[async_trait]
impl InvoiceStore for RocksDBStore {
    async fn store(&self, invoice: Invoice) -> Result<()> {
        self.put(CF_INVOICES, invoice.id, &invoice)
    }

    async fn get(&self, invoice_id: InvoiceId) -> Result<Option<Invoice>> {
        self.fetch(CF_INVOICES, invoice_id)
    }

    async fn get_all(&self) -> Result<Vec<Invoice>> {
        self.scan(CF_INVOICES)
    }

    async fn get_by_status(&self, status: InvoiceStatus) -> Result<Vec<Invoice>> {
        let invoices: Vec<Invoice> = self.scan(CF_INVOICES)?;
        Ok(invoices.into_iter().filter(|i| i.status == status).collect())
    }

    async fn mark_paid(&self, invoice_id: InvoiceId) -> Result<Option<Invoice>> {
        let Some(mut invoice) = self.fetch::<Invoice>(CF_INVOICES, invoice_id)? else {
            return Ok(None);
        };
        invoice.mark_paid();
        self.put(CF_INVOICES, invoice_id, &invoice)?;
        Ok(Some(invoice))
    }

    async fn mark_failed(
        &self,
        invoice_id: InvoiceId,
        note: InvoiceNote,
    ) -> Result<Option<Invoice>> {
        let Some(mut invoice) = self.fetch::<Invoice>(CF_INVOICES, invoice_id)? else {
            return Ok(None);
        };
        invoice.record_failure(note)?;
        self.put(CF_INVOICES, invoice_id, &invoice)?;
        Ok(Some(invoice))
    }
}

#[async_trait]
impl CustomerStore for RocksDBStore {
    async fn store(&self, customer: Customer) -> Result<()> {
        self.put(CF_CUSTOMERS, customer.id, &customer)
    }

    async fn get(&self, customer_id: CustomerId) -> Result<Option<Customer>> {
        self.fetch(CF_CUSTOMERS, customer_id)
    }

    async fn get_all(&self) -> Result<Vec<Customer>> {
        self.scan(CF_CUSTOMERS)
    }
}

use crate::domain::customer::{Customer, CustomerId};
use crate::domain::invoice::{Invoice, InvoiceId, InvoiceNote, InvoiceStatus};
use crate::domain::ports::{CustomerStore, InvoiceStore};
use crate::error::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A thread-safe in-memory store for invoices.
///
/// Backed by an ordered map so listings come back sorted by invoice id.
/// Status transitions happen under a single write guard, which makes each
/// update atomic with respect to concurrent readers.
#[derive(Default, Clone)]
pub struct InMemoryInvoiceStore {
    invoices: Arc<RwLock<BTreeMap<InvoiceId, Invoice>>>,
}

impl InMemoryInvoiceStore {
    /// Creates a new, empty in-memory invoice store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with `invoices`.
    pub fn with_invoices(invoices: impl IntoIterator<Item = Invoice>) -> Self {
        let map = invoices.into_iter().map(|i| (i.id, i)).collect();
        Self {
            invoices: Arc::new(RwLock::new(map)),
        }
    }
}

#[async_trait]
impl InvoiceStore for InMemoryInvoiceStore {
    async fn store(&self, invoice: Invoice) -> Result<()> {
        let mut invoices = self.invoices.write().await;
        invoices.insert(invoice.id, invoice);
        Ok(())
    }

    async fn get(&self, invoice_id: InvoiceId) -> Result<Option<Invoice>> {
        let invoices = self.invoices.read().await;
        Ok(invoices.get(&invoice_id).cloned())
    }

    async fn get_all(&self) -> Result<Vec<Invoice>> {
        let invoices = self.invoices.read().await;
        Ok(invoices.values().cloned().collect())
    }

    async fn get_by_status(&self, status: InvoiceStatus) -> Result<Vec<Invoice>> {
        let invoices = self.invoices.read().await;
        Ok(invoices
            .values()
            .filter(|invoice| invoice.status == status)
            .cloned()
            .collect())
    }

    async fn mark_paid(&self, invoice_id: InvoiceId) -> Result<Option<Invoice>> {
        let mut invoices = self.invoices.write().await;
        Ok(invoices.get_mut(&invoice_id).map(|invoice| {
            invoice.mark_paid();
            invoice.clone()
        }))
    }

    async fn mark_failed(
        &self,
        invoice_id: InvoiceId,
        note: InvoiceNote,
    ) -> Result<Option<Invoice>> {
        let mut invoices = self.invoices.write().await;
        match invoices.get_mut(&invoice_id) {
            Some(invoice) => {
                invoice.record_failure(note)?;
                Ok(Some(invoice.clone()))
            }
            None => Ok(None),
        }
    }
}

/// A thread-safe in-memory store for customers.
#[derive(Default, Clone)]
pub struct InMemoryCustomerStore {
    customers: Arc<RwLock<BTreeMap<CustomerId, Customer>>>,
}

impl InMemoryCustomerStore {
    /// Creates a new, empty in-memory customer store.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_customers(customers: impl IntoIterator<Item = Customer>) -> Self {
        let map = customers.into_iter().map(|c| (c.id, c)).collect();
        Self {
            customers: Arc::new(RwLock::new(map)),
        }
    }
}

#[async_trait]
impl CustomerStore for InMemoryCustomerStore {
    async fn store(&self, customer: Customer) -> Result<()> {
        let mut customers = self.customers.write().await;
        customers.insert(customer.id, customer);
        Ok(())
    }

    async fn get(&self, customer_id: CustomerId) -> Result<Option<Customer>> {
        let customers = self.customers.read().await;
        Ok(customers.get(&customer_id).copied())
    }

    async fn get_all(&self) -> Result<Vec<Customer>> {
        let customers = self.customers.read().await;
        Ok(customers.values().copied().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::money::{Currency, Money};
    use crate::error::BillingError;
    use rust_decimal_macros::dec;

    fn invoice(id: InvoiceId) -> Invoice {
        Invoice::new(id, 100, Money::new(dec!(40), Currency::Eur))
    }

    #[tokio::test]
    async fn test_in_memory_invoice_store() {
        let store = InMemoryInvoiceStore::new();
        store.store(invoice(1)).await.unwrap();

        let retrieved = store.get(1).await.unwrap().unwrap();
        assert_eq!(retrieved, invoice(1));
        assert!(store.get(2).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_get_all_is_ordered_by_id() {
        let store = InMemoryInvoiceStore::with_invoices([invoice(3), invoice(1), invoice(2)]);

        let ids: Vec<_> = store.get_all().await.unwrap().iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_get_by_status_filters() {
        let mut paid = invoice(2);
        paid.mark_paid();
        let store = InMemoryInvoiceStore::with_invoices([invoice(1), paid, invoice(3)]);

        let pending = store.get_by_status(InvoiceStatus::Pending).await.unwrap();
        assert_eq!(pending.iter().map(|i| i.id).collect::<Vec<_>>(), vec![1, 3]);

        let paid = store.get_by_status(InvoiceStatus::Paid).await.unwrap();
        assert_eq!(paid.len(), 1);
        assert_eq!(paid[0].id, 2);
    }

    #[tokio::test]
    async fn test_status_transitions() {
        let store = InMemoryInvoiceStore::with_invoices([invoice(1)]);

        let failed = store
            .mark_failed(1, InvoiceNote::NoFunds)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(failed.status, InvoiceStatus::Pending);
        assert_eq!(failed.note, InvoiceNote::NoFunds);

        let paid = store.mark_paid(1).await.unwrap().unwrap();
        assert_eq!(paid.status, InvoiceStatus::Paid);
        assert_eq!(paid.note, InvoiceNote::None);
        assert_eq!(store.get(1).await.unwrap().unwrap(), paid);
    }

    #[tokio::test]
    async fn test_transitions_on_missing_invoice_report_none() {
        let store = InMemoryInvoiceStore::new();
        assert!(store.mark_paid(9).await.unwrap().is_none());
        assert!(
            store
                .mark_failed(9, InvoiceNote::Other)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_failed_mark_on_paid_invoice_keeps_state() {
        let store = InMemoryInvoiceStore::with_invoices([invoice(1)]);
        store.mark_paid(1).await.unwrap();

        let result = store.mark_failed(1, InvoiceNote::NetworkError).await;
        assert!(matches!(result, Err(BillingError::AlreadyPaid(1))));

        let stored = store.get(1).await.unwrap().unwrap();
        assert!(stored.is_paid());
        assert_eq!(stored.note, InvoiceNote::None);
    }

    #[tokio::test]
    async fn test_in_memory_customer_store() {
        let store = InMemoryCustomerStore::new();
        let customer = Customer::new(100, Currency::Eur);
        store.store(customer).await.unwrap();

        assert_eq!(store.get(100).await.unwrap(), Some(customer));
        assert!(store.get(404).await.unwrap().is_none());
        assert_eq!(store.get_all().await.unwrap(), vec![customer]);
    }
}

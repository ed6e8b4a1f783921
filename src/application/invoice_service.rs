use crate::domain::invoice::{Invoice, InvoiceId, InvoiceNote, InvoiceStatus};
use crate::domain::ports::InvoiceStoreBox;
use crate::error::{BillingError, Result};
use tracing::{info, warn};

/// Owns every read and write of invoice state.
///
/// Translates a missing record into `BillingError::InvoiceNotFound` so that a
/// status transition on a vanished invoice never silently succeeds.
pub struct InvoiceService {
    store: InvoiceStoreBox,
}

impl InvoiceService {
    pub fn new(store: InvoiceStoreBox) -> Self {
        Self { store }
    }

    /// Returns every invoice, or only those in `status` when a non-blank
    /// filter is given. The filter must name a status exactly.
    pub async fn fetch_all(&self, status: Option<&str>) -> Result<Vec<Invoice>> {
        match status.filter(|s| !s.trim().is_empty()) {
            None => self.store.get_all().await,
            Some(filter) => self.fetch_by_status(filter.parse()?).await,
        }
    }

    pub async fn fetch_by_status(&self, status: InvoiceStatus) -> Result<Vec<Invoice>> {
        self.store.get_by_status(status).await
    }

    pub async fn fetch(&self, invoice_id: InvoiceId) -> Result<Invoice> {
        self.store
            .get(invoice_id)
            .await?
            .ok_or(BillingError::InvoiceNotFound(invoice_id))
    }

    /// Settles a successfully charged invoice.
    pub async fn mark_paid(&self, invoice: &Invoice) -> Result<Invoice> {
        let updated = self
            .store
            .mark_paid(invoice.id)
            .await?
            .ok_or(BillingError::InvoiceNotFound(invoice.id))?;
        info!(invoice_id = invoice.id, amount = %invoice.amount, "Invoice payment successful");
        Ok(updated)
    }

    /// Records why a charge attempt failed. The invoice stays pending.
    pub async fn mark_failed(&self, invoice: &Invoice, note: InvoiceNote) -> Result<Invoice> {
        let updated = self
            .store
            .mark_failed(invoice.id, note)
            .await?
            .ok_or(BillingError::InvoiceNotFound(invoice.id))?;
        warn!(
            invoice_id = invoice.id,
            note = %note,
            reason = note.description(),
            "Invoice payment failed"
        );
        Ok(updated)
    }

    /// Inserts or replaces an invoice record.
    pub async fn store(&self, invoice: Invoice) -> Result<()> {
        self.store.store(invoice).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::money::{Currency, Money};
    use crate::infrastructure::in_memory::InMemoryInvoiceStore;
    use rust_decimal_macros::dec;

    fn service() -> InvoiceService {
        let mut paid = Invoice::new(2, 100, Money::new(dec!(20), Currency::Eur));
        paid.mark_paid();
        let store = InMemoryInvoiceStore::with_invoices([
            Invoice::new(1, 100, Money::new(dec!(10), Currency::Eur)),
            paid,
            Invoice::new(3, 200, Money::new(dec!(30), Currency::Dkk)),
        ]);
        InvoiceService::new(Box::new(store))
    }

    #[tokio::test]
    async fn test_fetch_all_without_filter() {
        let service = service();
        assert_eq!(service.fetch_all(None).await.unwrap().len(), 3);
        assert_eq!(service.fetch_all(Some("  ")).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_fetch_all_with_status_filter() {
        let service = service();
        let pending = service.fetch_all(Some("PENDING")).await.unwrap();
        assert_eq!(pending.iter().map(|i| i.id).collect::<Vec<_>>(), vec![1, 3]);

        let paid = service.fetch_all(Some("PAID")).await.unwrap();
        assert_eq!(paid.len(), 1);
    }

    #[tokio::test]
    async fn test_fetch_all_unknown_status() {
        let result = service().fetch_all(Some("OVERDUE")).await;
        assert!(matches!(result, Err(BillingError::UnknownStatus(s)) if s == "OVERDUE"));
    }

    #[tokio::test]
    async fn test_fetch_all_filter_is_case_sensitive() {
        let service = service();
        for filter in ["pending", " PENDING ", "Paid"] {
            let result = service.fetch_all(Some(filter)).await;
            assert!(
                matches!(&result, Err(BillingError::UnknownStatus(s)) if s == filter),
                "{filter:?} was accepted"
            );
        }
    }

    #[tokio::test]
    async fn test_fetch_missing_invoice() {
        let result = service().fetch(404).await;
        assert!(matches!(result, Err(BillingError::InvoiceNotFound(404))));
    }

    #[tokio::test]
    async fn test_mark_paid_and_failed() {
        let service = service();
        let invoice = service.fetch(1).await.unwrap();

        let failed = service
            .mark_failed(&invoice, InvoiceNote::NoFunds)
            .await
            .unwrap();
        assert_eq!(failed.status, InvoiceStatus::Pending);
        assert_eq!(failed.note, InvoiceNote::NoFunds);

        let paid = service.mark_paid(&failed).await.unwrap();
        assert_eq!(paid.status, InvoiceStatus::Paid);
        assert_eq!(paid.note, InvoiceNote::None);
    }

    #[tokio::test]
    async fn test_transition_on_removed_invoice_fails() {
        let service = InvoiceService::new(Box::new(InMemoryInvoiceStore::new()));
        let ghost = Invoice::new(9, 1, Money::new(dec!(1), Currency::Eur));

        assert!(matches!(
            service.mark_paid(&ghost).await,
            Err(BillingError::InvoiceNotFound(9))
        ));
        assert!(matches!(
            service.mark_failed(&ghost, InvoiceNote::Other).await,
            Err(BillingError::InvoiceNotFound(9))
        ));
    }
}

use super::customer_service::CustomerService;
use super::invoice_service::InvoiceService;
use super::locks::InvoiceLocks;
use super::retry::{RetryRegistry, RetryToken};
use crate::config::BillingConfig;
use crate::domain::invoice::{Invoice, InvoiceId, InvoiceNote, InvoiceStatus};
use crate::domain::ports::{ChargeError, PaymentProviderRef};
use crate::error::{BillingError, Result};
use futures::FutureExt;
use futures::future::BoxFuture;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Classification of a single charge attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentOutcome {
    Charged,
    NoFunds,
    NetworkError,
    DifferentCurrency,
    NoCustomer,
    Other,
}

impl PaymentOutcome {
    pub fn note(&self) -> InvoiceNote {
        match self {
            PaymentOutcome::Charged => InvoiceNote::None,
            PaymentOutcome::NoFunds => InvoiceNote::NoFunds,
            PaymentOutcome::NetworkError => InvoiceNote::NetworkError,
            PaymentOutcome::DifferentCurrency => InvoiceNote::DifferentCurrency,
            PaymentOutcome::NoCustomer => InvoiceNote::NoCustomer,
            PaymentOutcome::Other => InvoiceNote::Other,
        }
    }

    /// Only transient provider failures are retried automatically.
    pub fn is_retryable(&self) -> bool {
        matches!(self, PaymentOutcome::NetworkError)
    }
}

impl From<ChargeError> for PaymentOutcome {
    fn from(err: ChargeError) -> Self {
        match err {
            ChargeError::Network(_) => PaymentOutcome::NetworkError,
            ChargeError::CustomerNotFound(_) => PaymentOutcome::NoCustomer,
            ChargeError::CurrencyMismatch(_) => PaymentOutcome::DifferentCurrency,
            ChargeError::Other(_) => PaymentOutcome::Other,
        }
    }
}

struct BillingInner {
    provider: PaymentProviderRef,
    invoices: Arc<InvoiceService>,
    customers: Arc<CustomerService>,
    config: BillingConfig,
    locks: InvoiceLocks,
    retries: RetryRegistry,
}

/// Charges pending invoices and records the outcome.
///
/// Cloning is cheap; clones share stores, locks and pending retries. Retry
/// tasks hold a clone, so call [`BillingService::shutdown`] to drop them
/// before discarding the service.
#[derive(Clone)]
pub struct BillingService {
    inner: Arc<BillingInner>,
}

impl BillingService {
    pub fn new(
        provider: PaymentProviderRef,
        invoices: Arc<InvoiceService>,
        customers: Arc<CustomerService>,
        config: BillingConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            inner: Arc::new(BillingInner {
                provider,
                invoices,
                customers,
                config,
                locks: InvoiceLocks::new(),
                retries: RetryRegistry::new(),
            }),
        })
    }

    pub fn invoices(&self) -> &InvoiceService {
        &self.inner.invoices
    }

    pub fn customers(&self) -> &CustomerService {
        &self.inner.customers
    }

    pub fn config(&self) -> &BillingConfig {
        &self.inner.config
    }

    /// Charges every pending invoice.
    ///
    /// Invoices are processed concurrently but the result list keeps the order
    /// in which they were fetched, one entry per invoice. A failure on one
    /// invoice never aborts the others: its pre-attempt snapshot is returned.
    pub async fn process_pending(&self) -> Result<Vec<Invoice>> {
        let pending = self.inner.invoices.fetch_by_status(InvoiceStatus::Pending).await?;
        info!(count = pending.len(), "Processing pending invoices");

        let results: Vec<Invoice> = stream::iter(pending)
            .map(|invoice| self.process_batch_entry(invoice))
            .buffered(self.inner.config.batch_concurrency)
            .collect()
            .await;

        let paid = results.iter().filter(|i| i.is_paid()).count();
        info!(
            processed = results.len(),
            paid,
            pending = results.len() - paid,
            "Finished processing pending invoices"
        );
        Ok(results)
    }

    /// Charges a single invoice on request.
    ///
    /// Fails with `AlreadyPaid` without contacting the provider if the invoice
    /// is settled.
    pub async fn process_invoice(&self, invoice_id: InvoiceId) -> Result<Invoice> {
        let _guard = self.inner.locks.acquire(invoice_id).await;
        let invoice = self.inner.invoices.fetch(invoice_id).await?;
        if invoice.is_paid() {
            return Err(BillingError::AlreadyPaid(invoice_id));
        }
        self.execute(invoice, 1).await
    }

    /// Whether a retry is waiting to run for `invoice_id`, and for which attempt.
    pub async fn scheduled_retry(&self, invoice_id: InvoiceId) -> Option<u32> {
        self.inner.retries.scheduled_attempt(invoice_id).await
    }

    pub async fn pending_retries(&self) -> usize {
        self.inner.retries.len().await
    }

    /// Aborts every pending retry. Returns how many were dropped.
    pub async fn shutdown(&self) -> usize {
        let dropped = self.inner.retries.cancel_all().await;
        if dropped > 0 {
            warn!(dropped, "Dropped pending payment retries on shutdown");
        }
        dropped
    }

    async fn process_batch_entry(&self, snapshot: Invoice) -> Invoice {
        let invoice_id = snapshot.id;
        let _guard = self.inner.locks.acquire(invoice_id).await;

        let current = match self.inner.invoices.fetch(invoice_id).await {
            Ok(current) => current,
            Err(e) => {
                error!(invoice_id, error = %e, "Failed to reload invoice");
                return snapshot;
            }
        };
        if current.is_paid() {
            debug!(invoice_id, "Invoice settled since it was fetched; skipping");
            return current;
        }

        match self.execute(current, 1).await {
            Ok(updated) => updated,
            Err(e) => {
                error!(invoice_id, error = %e, "Failed to record payment outcome");
                snapshot
            }
        }
    }

    /// Runs one attempt against `invoice` and persists the outcome.
    ///
    /// Must be called while holding the invoice's lock, with a freshly read
    /// pending invoice.
    async fn execute(&self, invoice: Invoice, attempt: u32) -> Result<Invoice> {
        let outcome = self.attempt_charge(&invoice).await;
        debug!(invoice_id = invoice.id, attempt, ?outcome, "Charge attempt classified");

        let updated = match outcome {
            PaymentOutcome::Charged => self.inner.invoices.mark_paid(&invoice).await?,
            failure => {
                self.inner
                    .invoices
                    .mark_failed(&invoice, failure.note())
                    .await?
            }
        };

        if outcome == PaymentOutcome::Charged {
            self.inner.retries.cancel(invoice.id).await;
        } else if outcome.is_retryable() {
            match self.inner.config.retry.next_attempt(attempt) {
                Some(next) => self.schedule_retry(invoice.id, next).await,
                None => warn!(
                    invoice_id = invoice.id,
                    attempts = attempt,
                    "Retry budget exhausted; invoice left pending"
                ),
            }
        }

        Ok(updated)
    }

    async fn attempt_charge(&self, invoice: &Invoice) -> PaymentOutcome {
        let customer = match self.inner.customers.fetch(invoice.customer_id).await {
            Ok(customer) => customer,
            Err(BillingError::CustomerNotFound(_)) => return PaymentOutcome::NoCustomer,
            Err(e) => {
                error!(invoice_id = invoice.id, error = %e, "Failed to load customer");
                return PaymentOutcome::Other;
            }
        };

        if !invoice.amount.is_in(customer.currency) {
            return PaymentOutcome::DifferentCurrency;
        }

        let charge = self.inner.provider.charge(invoice);
        match tokio::time::timeout(self.inner.config.charge_timeout, charge).await {
            Ok(Ok(true)) => PaymentOutcome::Charged,
            Ok(Ok(false)) => PaymentOutcome::NoFunds,
            Ok(Err(e)) => {
                debug!(invoice_id = invoice.id, error = %e, "Provider rejected charge");
                e.into()
            }
            Err(_) => {
                warn!(invoice_id = invoice.id, "Provider call timed out");
                PaymentOutcome::NetworkError
            }
        }
    }

    async fn schedule_retry(&self, invoice_id: InvoiceId, attempt: u32) {
        let delay = self.inner.config.retry.delay;
        let service = self.clone();
        self.inner
            .retries
            .schedule(invoice_id, attempt, move |token| {
                service.retry_task(invoice_id, attempt, token, delay)
            })
            .await;
        info!(invoice_id, attempt, delay_secs = delay.as_secs(), "Scheduled payment retry");
    }

    // Boxed with an explicit type: the retry re-enters `execute`, which schedules
    // the next retry.
    fn retry_task(
        self,
        invoice_id: InvoiceId,
        attempt: u32,
        token: RetryToken,
        delay: Duration,
    ) -> BoxFuture<'static, ()> {
        async move {
            tokio::time::sleep(delay).await;
            self.run_retry(invoice_id, attempt, token).await;
        }
        .boxed()
    }

    async fn run_retry(&self, invoice_id: InvoiceId, attempt: u32, token: RetryToken) {
        if !self.inner.retries.claim(invoice_id, token).await {
            return;
        }

        let _guard = self.inner.locks.acquire(invoice_id).await;
        let invoice = match self.inner.invoices.fetch(invoice_id).await {
            Ok(invoice) => invoice,
            Err(e) => {
                error!(invoice_id, attempt, error = %e, "Retry could not load invoice");
                return;
            }
        };
        if invoice.is_paid() {
            info!(invoice_id, attempt, "Invoice already paid; retry dropped");
            return;
        }

        info!(invoice_id, attempt, "Retrying payment");
        if let Err(e) = self.execute(invoice, attempt).await {
            error!(invoice_id, attempt, error = %e, "Retry failed to record outcome");
        }
    }
}

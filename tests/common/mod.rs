#![allow(dead_code)]

use async_trait::async_trait;
use invoice_billing::application::billing::BillingService;
use invoice_billing::application::customer_service::CustomerService;
use invoice_billing::application::invoice_service::InvoiceService;
use invoice_billing::config::BillingConfig;
use invoice_billing::domain::customer::{Customer, CustomerId};
use invoice_billing::domain::invoice::{Invoice, InvoiceId, InvoiceNote, InvoiceStatus};
use invoice_billing::domain::money::{Currency, Money};
use invoice_billing::domain::ports::{
    ChargeError, CustomerStore, CustomerStoreBox, InvoiceStore, InvoiceStoreBox, PaymentProvider,
};
use invoice_billing::error::{BillingError, Result as BillingResult};
use invoice_billing::infrastructure::in_memory::{InMemoryCustomerStore, InMemoryInvoiceStore};
use rust_decimal::Decimal;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

pub type ChargeResult = Result<bool, ChargeError>;

/// A provider whose answers are scripted per invoice.
///
/// Queued answers are consumed in order; once an invoice's queue is empty the
/// default answer is returned. Every call is recorded.
pub struct ScriptedProvider {
    default: ChargeResult,
    scripts: Mutex<HashMap<InvoiceId, VecDeque<ChargeResult>>>,
    calls: Mutex<Vec<InvoiceId>>,
}

impl ScriptedProvider {
    pub fn new(default: ChargeResult) -> Arc<Self> {
        Arc::new(Self {
            default,
            scripts: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn script(&self, invoice_id: InvoiceId, answers: impl IntoIterator<Item = ChargeResult>) {
        self.scripts
            .lock()
            .unwrap()
            .entry(invoice_id)
            .or_default()
            .extend(answers);
    }

    pub fn calls(&self) -> Vec<InvoiceId> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_for(&self, invoice_id: InvoiceId) -> usize {
        self.calls().iter().filter(|id| **id == invoice_id).count()
    }
}

#[async_trait]
impl PaymentProvider for ScriptedProvider {
    async fn charge(&self, invoice: &Invoice) -> ChargeResult {
        self.calls.lock().unwrap().push(invoice.id);
        self.scripts
            .lock()
            .unwrap()
            .get_mut(&invoice.id)
            .and_then(|queue| queue.pop_front())
            .unwrap_or_else(|| self.default.clone())
    }
}

pub fn network_error() -> ChargeResult {
    Err(ChargeError::Network("connection reset".to_string()))
}

pub fn invoice(id: InvoiceId, customer_id: u32, value: Decimal, currency: Currency) -> Invoice {
    Invoice::new(id, customer_id, Money::new(value, currency))
}

pub fn paid(mut invoice: Invoice) -> Invoice {
    invoice.mark_paid();
    assert_eq!(invoice.status, InvoiceStatus::Paid);
    invoice
}

pub fn customers() -> Vec<Customer> {
    vec![
        Customer::new(100, Currency::Eur),
        Customer::new(200, Currency::Dkk),
    ]
}

/// An invoice store whose status writes fail for one invoice.
pub struct FailingInvoiceStore {
    inner: InMemoryInvoiceStore,
    failing_id: InvoiceId,
}

impl FailingInvoiceStore {
    pub fn new(invoices: Vec<Invoice>, failing_id: InvoiceId) -> Self {
        Self {
            inner: InMemoryInvoiceStore::with_invoices(invoices),
            failing_id,
        }
    }

    fn check(&self, invoice_id: InvoiceId) -> BillingResult<()> {
        if invoice_id == self.failing_id {
            return Err(BillingError::InternalError("disk full".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl InvoiceStore for FailingInvoiceStore {
    async fn store(&self, invoice: Invoice) -> BillingResult<()> {
        self.inner.store(invoice).await
    }

    async fn get(&self, invoice_id: InvoiceId) -> BillingResult<Option<Invoice>> {
        self.inner.get(invoice_id).await
    }

    async fn get_all(&self) -> BillingResult<Vec<Invoice>> {
        self.inner.get_all().await
    }

    async fn get_by_status(&self, status: InvoiceStatus) -> BillingResult<Vec<Invoice>> {
        self.inner.get_by_status(status).await
    }

    async fn mark_paid(&self, invoice_id: InvoiceId) -> BillingResult<Option<Invoice>> {
        self.check(invoice_id)?;
        self.inner.mark_paid(invoice_id).await
    }

    async fn mark_failed(
        &self,
        invoice_id: InvoiceId,
        note: InvoiceNote,
    ) -> BillingResult<Option<Invoice>> {
        self.check(invoice_id)?;
        self.inner.mark_failed(invoice_id, note).await
    }
}

/// A customer store whose lookups fail for one customer.
pub struct FailingCustomerStore {
    inner: InMemoryCustomerStore,
    failing_id: CustomerId,
}

impl FailingCustomerStore {
    pub fn new(customers: Vec<Customer>, failing_id: CustomerId) -> Self {
        Self {
            inner: InMemoryCustomerStore::with_customers(customers),
            failing_id,
        }
    }
}

#[async_trait]
impl CustomerStore for FailingCustomerStore {
    async fn store(&self, customer: Customer) -> BillingResult<()> {
        self.inner.store(customer).await
    }

    async fn get(&self, customer_id: CustomerId) -> BillingResult<Option<Customer>> {
        if customer_id == self.failing_id {
            return Err(BillingError::InternalError("connection refused".into()));
        }
        self.inner.get(customer_id).await
    }

    async fn get_all(&self) -> BillingResult<Vec<Customer>> {
        self.inner.get_all().await
    }
}

pub fn billing_with_stores(
    provider: Arc<ScriptedProvider>,
    invoice_store: InvoiceStoreBox,
    customer_store: CustomerStoreBox,
    config: BillingConfig,
) -> BillingService {
    BillingService::new(
        provider,
        Arc::new(InvoiceService::new(invoice_store)),
        Arc::new(CustomerService::new(customer_store)),
        config,
    )
    .unwrap()
}

pub fn billing(
    provider: Arc<ScriptedProvider>,
    invoices: Vec<Invoice>,
    config: BillingConfig,
) -> BillingService {
    billing_with_stores(
        provider,
        Box::new(InMemoryInvoiceStore::with_invoices(invoices)),
        Box::new(InMemoryCustomerStore::with_customers(customers())),
        config,
    )
}

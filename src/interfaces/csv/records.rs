use crate::domain::customer::{Customer, CustomerId};
use crate::domain::invoice::{Invoice, InvoiceId, InvoiceNote, InvoiceStatus};
use crate::domain::money::{Currency, Money};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Flat CSV row for an invoice: `id,customer_id,value,currency,status,note`.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct InvoiceRecord {
    pub id: InvoiceId,
    pub customer_id: CustomerId,
    // Parsed from the raw field text; the csv deserializer would otherwise
    // hand numeric-looking fields over as f64.
    #[serde(with = "rust_decimal::serde::str")]
    pub value: Decimal,
    pub currency: Currency,
    #[serde(default)]
    pub status: InvoiceStatus,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub note: Option<InvoiceNote>,
}

impl From<InvoiceRecord> for Invoice {
    fn from(record: InvoiceRecord) -> Self {
        let mut invoice = Invoice::new(
            record.id,
            record.customer_id,
            Money::new(record.value, record.currency),
        );
        match record.status {
            InvoiceStatus::Paid => invoice.mark_paid(),
            InvoiceStatus::Pending => invoice.note = record.note.unwrap_or_default(),
        }
        invoice
    }
}

impl From<&Invoice> for InvoiceRecord {
    fn from(invoice: &Invoice) -> Self {
        Self {
            id: invoice.id,
            customer_id: invoice.customer_id,
            value: invoice.amount.value,
            currency: invoice.amount.currency,
            status: invoice.status,
            note: Some(invoice.note),
        }
    }
}

/// Flat CSV row for a customer: `id,currency`.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Copy)]
pub struct CustomerRecord {
    pub id: CustomerId,
    pub currency: Currency,
}

impl From<CustomerRecord> for Customer {
    fn from(record: CustomerRecord) -> Self {
        Customer::new(record.id, record.currency)
    }
}

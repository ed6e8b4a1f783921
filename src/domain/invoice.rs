use super::customer::CustomerId;
use super::money::Money;
use crate::error::{BillingError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub type InvoiceId = u32;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Clone, Copy, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum InvoiceStatus {
    #[default]
    Pending,
    Paid,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Pending => "PENDING",
            InvoiceStatus::Paid => "PAID",
        }
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InvoiceStatus {
    type Err = BillingError;

    fn from_str(s: &str) -> Result<Self> {
        [InvoiceStatus::Pending, InvoiceStatus::Paid]
            .into_iter()
            .find(|candidate| candidate.as_str() == s)
            .ok_or_else(|| BillingError::UnknownStatus(s.to_string()))
    }
}

/// The reason the most recent charge attempt did not settle an invoice.
///
/// A paid invoice always carries `None`; a pending invoice carries the note of
/// its last failed attempt, or `None` if it was never attempted.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Clone, Copy, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum InvoiceNote {
    #[default]
    None,
    NoFunds,
    NetworkError,
    DifferentCurrency,
    NoCustomer,
    Other,
}

impl InvoiceNote {
    pub fn code(&self) -> &'static str {
        match self {
            InvoiceNote::None => "NONE",
            InvoiceNote::NoFunds => "NOFUNDS",
            InvoiceNote::NetworkError => "NETWORKERROR",
            InvoiceNote::DifferentCurrency => "DIFFERENTCURRENCY",
            InvoiceNote::NoCustomer => "NOCUSTOMER",
            InvoiceNote::Other => "OTHER",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            InvoiceNote::None => "No issues",
            InvoiceNote::NoFunds => "Could not charge the necessary amount",
            InvoiceNote::NetworkError => "Communication error with provider",
            InvoiceNote::DifferentCurrency => {
                "Invoice currency does not match the customer currency"
            }
            InvoiceNote::NoCustomer => "Customer could not be found",
            InvoiceNote::Other => "An error has occurred",
        }
    }
}

impl fmt::Display for InvoiceNote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
pub struct Invoice {
    pub id: InvoiceId,
    pub customer_id: CustomerId,
    pub amount: Money,
    pub status: InvoiceStatus,
    #[serde(default)]
    pub note: InvoiceNote,
}

impl Invoice {
    /// Creates a pending invoice that has never been charged.
    pub fn new(id: InvoiceId, customer_id: CustomerId, amount: Money) -> Self {
        Self {
            id,
            customer_id,
            amount,
            status: InvoiceStatus::Pending,
            note: InvoiceNote::None,
        }
    }

    pub fn is_paid(&self) -> bool {
        self.status == InvoiceStatus::Paid
    }

    /// Settles the invoice. Paying twice is a no-op.
    pub fn mark_paid(&mut self) {
        self.status = InvoiceStatus::Paid;
        self.note = InvoiceNote::None;
    }

    /// Records a failed attempt; the invoice stays pending.
    pub fn record_failure(&mut self, note: InvoiceNote) -> Result<()> {
        if self.is_paid() {
            return Err(BillingError::AlreadyPaid(self.id));
        }
        self.note = note;
        Ok(())
    }
}

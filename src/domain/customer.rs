use super::money::Currency;
use serde::{Deserialize, Serialize};

pub type CustomerId = u32;

/// A billable customer. Every invoice owned by the customer must be issued in
/// the customer's currency before a charge is attempted.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
pub struct Customer {
    pub id: CustomerId,
    pub currency: Currency,
}

impl Customer {
    pub fn new(id: CustomerId, currency: Currency) -> Self {
        Self { id, currency }
    }
}

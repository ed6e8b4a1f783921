//! Domain layer: invoices, customers, money and the ports the billing core
//! depends on.

pub mod customer;
pub mod invoice;
pub mod money;
pub mod ports;
pub mod schedule;

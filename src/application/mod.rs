//! Application layer containing the billing orchestration.
//!
//! `BillingService` is the primary entry point: it selects pending invoices,
//! charges them through the payment provider, classifies the outcome and
//! schedules bounded retries for transient failures. `MonthlyTrigger` re-runs
//! the batch at the start of every calendar month.

pub mod billing;
pub mod customer_service;
pub mod invoice_service;
pub mod locks;
pub mod retry;
pub mod trigger;

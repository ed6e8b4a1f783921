use super::reader::{CustomerReader, InvoiceReader};
use crate::application::customer_service::CustomerService;
use crate::application::invoice_service::InvoiceService;
use crate::error::{BillingError, Result};
use std::io::Read;
use tracing::warn;

/// Counts of what an import did with each row.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub imported: usize,
    /// Rows whose id was already present; the stored record wins.
    pub skipped: usize,
    pub rejected: usize,
}

/// Loads invoices into the store without overwriting existing records, so a
/// persistent store keeps the outcome of earlier runs.
pub async fn import_invoices<R: Read>(
    service: &InvoiceService,
    source: R,
) -> Result<ImportSummary> {
    let mut summary = ImportSummary::default();
    for row in InvoiceReader::new(source).invoices() {
        let invoice = match row {
            Ok(invoice) => invoice,
            Err(e) => {
                warn!(error = %e, "Error reading invoice");
                summary.rejected += 1;
                continue;
            }
        };
        match service.fetch(invoice.id).await {
            Ok(_) => summary.skipped += 1,
            Err(BillingError::InvoiceNotFound(_)) => {
                service.store(invoice).await?;
                summary.imported += 1;
            }
            Err(e) => return Err(e),
        }
    }
    Ok(summary)
}

pub async fn import_customers<R: Read>(
    service: &CustomerService,
    source: R,
) -> Result<ImportSummary> {
    let mut summary = ImportSummary::default();
    for row in CustomerReader::new(source).customers() {
        let customer = match row {
            Ok(customer) => customer,
            Err(e) => {
                warn!(error = %e, "Error reading customer");
                summary.rejected += 1;
                continue;
            }
        };
        match service.fetch(customer.id).await {
            Ok(_) => summary.skipped += 1,
            Err(BillingError::CustomerNotFound(_)) => {
                service.store(customer).await?;
                summary.imported += 1;
            }
            Err(e) => return Err(e),
        }
    }
    Ok(summary)
}

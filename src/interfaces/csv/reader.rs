use super::records::{CustomerRecord, InvoiceRecord};
use crate::domain::customer::Customer;
use crate::domain::invoice::Invoice;
use crate::error::{BillingError, Result};
use std::io::Read;

fn csv_reader<R: Read>(source: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(source)
}

/// Reads invoices from a CSV source.
///
/// Rows are deserialized lazily; a malformed row yields an error for that row
/// only and reading continues with the next one.
pub struct InvoiceReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> InvoiceReader<R> {
    /// Creates a new `InvoiceReader` from any `Read` source (e.g., File, Stdin).
    pub fn new(source: R) -> Self {
        Self {
            reader: csv_reader(source),
        }
    }

    pub fn invoices(self) -> impl Iterator<Item = Result<Invoice>> {
        self.reader
            .into_deserialize::<InvoiceRecord>()
            .map(|result| result.map(Invoice::from).map_err(BillingError::from))
    }
}

/// Reads customers from a CSV source.
pub struct CustomerReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> CustomerReader<R> {
    pub fn new(source: R) -> Self {
        Self {
            reader: csv_reader(source),
        }
    }

    pub fn customers(self) -> impl Iterator<Item = Result<Customer>> {
        self.reader
            .into_deserialize::<CustomerRecord>()
            .map(|result| result.map(Customer::from).map_err(BillingError::from))
    }
}

use super::records::InvoiceRecord;
use crate::domain::invoice::Invoice;
use crate::error::Result;
use std::io::Write;

/// Writes invoices as CSV rows in the same layout `InvoiceReader` accepts.
pub struct InvoiceWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> InvoiceWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_invoices<'a>(
        &mut self,
        invoices: impl IntoIterator<Item = &'a Invoice>,
    ) -> Result<()> {
        for invoice in invoices {
            self.writer.serialize(InvoiceRecord::from(invoice))?;
        }
        self.writer.flush()?;
        Ok(())
    }
}

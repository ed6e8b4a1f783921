use clap::{Parser, ValueEnum};
use invoice_billing::application::billing::BillingService;
use invoice_billing::application::customer_service::CustomerService;
use invoice_billing::application::invoice_service::InvoiceService;
use invoice_billing::application::trigger::MonthlyTrigger;
use invoice_billing::config::{BillingConfig, RetryPolicy};
use invoice_billing::domain::invoice::{Invoice, InvoiceId};
use invoice_billing::domain::ports::{CustomerStoreBox, InvoiceStoreBox};
use invoice_billing::infrastructure::in_memory::{InMemoryCustomerStore, InMemoryInvoiceStore};
use invoice_billing::infrastructure::simulated_provider::SimulatedPaymentProvider;
use invoice_billing::interfaces::csv::import::{import_customers, import_invoices};
use invoice_billing::interfaces::csv::writer::InvoiceWriter;
use invoice_billing::telemetry;
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Csv,
    Json,
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Invoices CSV file (id,customer_id,value,currency,status,note)
    invoices: PathBuf,

    /// Customers CSV file (id,currency)
    #[arg(long)]
    customers: PathBuf,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Charge only this invoice instead of every pending one
    #[arg(long, conflicts_with = "schedule")]
    invoice: Option<InvoiceId>,

    /// Keep running and bill again at the start of every month
    #[arg(long)]
    schedule: bool,

    /// Total charge attempts per invoice when the provider is unreachable
    #[arg(long, default_value_t = 3)]
    max_attempts: u32,

    /// Seconds between attempts after a network error
    #[arg(long, default_value_t = 3600)]
    retry_delay_secs: u64,

    /// Invoices charged concurrently during a batch
    #[arg(long, default_value_t = 8)]
    concurrency: usize,

    /// Seconds before a provider call is treated as a network error
    #[arg(long, default_value_t = 30)]
    charge_timeout_secs: u64,

    /// Probability that the simulated provider accepts a charge
    #[arg(long, default_value_t = 0.5)]
    success_rate: f64,

    /// Probability that the simulated provider is unreachable
    #[arg(long, default_value_t = 0.0)]
    network_failure_rate: f64,

    #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
    output: OutputFormat,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,
}

impl Cli {
    fn billing_config(&self) -> BillingConfig {
        BillingConfig {
            retry: RetryPolicy {
                max_attempts: self.max_attempts,
                delay: Duration::from_secs(self.retry_delay_secs),
            },
            batch_concurrency: self.concurrency,
            charge_timeout: Duration::from_secs(self.charge_timeout_secs),
        }
    }
}

#[cfg(feature = "storage-rocksdb")]
fn open_stores(db_path: Option<PathBuf>) -> Result<(InvoiceStoreBox, CustomerStoreBox)> {
    use invoice_billing::infrastructure::rocksdb::RocksDBStore;

    if let Some(db_path) = db_path {
        let store = RocksDBStore::open(db_path).into_diagnostic()?;
        return Ok((Box::new(store.clone()), Box::new(store)));
    }
    Ok(in_memory_stores())
}

#[cfg(not(feature = "storage-rocksdb"))]
fn open_stores(db_path: Option<PathBuf>) -> Result<(InvoiceStoreBox, CustomerStoreBox)> {
    if db_path.is_some() {
        tracing::warn!(
            "Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to in-memory storage."
        );
    }
    Ok(in_memory_stores())
}

fn in_memory_stores() -> (InvoiceStoreBox, CustomerStoreBox) {
    (
        Box::new(InMemoryInvoiceStore::new()),
        Box::new(InMemoryCustomerStore::new()),
    )
}

fn write_report(invoices: &[Invoice], format: OutputFormat) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match format {
        OutputFormat::Csv => InvoiceWriter::new(out)
            .write_invoices(invoices)
            .into_diagnostic(),
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut out, invoices).into_diagnostic()?;
            writeln!(out).into_diagnostic()
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    telemetry::init_tracing(cli.log_json);

    let provider = SimulatedPaymentProvider::new(cli.success_rate, cli.network_failure_rate)
        .into_diagnostic()?;

    let (invoice_store, customer_store) = open_stores(cli.db_path.clone())?;
    let billing = BillingService::new(
        Arc::new(provider),
        Arc::new(InvoiceService::new(invoice_store)),
        Arc::new(CustomerService::new(customer_store)),
        cli.billing_config(),
    )
    .into_diagnostic()?;

    let summary = import_customers(
        billing.customers(),
        File::open(&cli.customers).into_diagnostic()?,
    )
    .await
    .into_diagnostic()?;
    info!(?summary, "Loaded customers");
    let summary = import_invoices(
        billing.invoices(),
        File::open(&cli.invoices).into_diagnostic()?,
    )
    .await
    .into_diagnostic()?;
    info!(?summary, "Loaded invoices");

    if cli.schedule {
        let handle = MonthlyTrigger::new(billing.clone()).spawn();
        tokio::signal::ctrl_c().await.into_diagnostic()?;
        info!("Shutting down");
        handle.stop();
    } else if let Some(invoice_id) = cli.invoice {
        billing.process_invoice(invoice_id).await.into_diagnostic()?;
    } else {
        billing.process_pending().await.into_diagnostic()?;
    }

    billing.shutdown().await;

    let all = billing.invoices().fetch_all(None).await.into_diagnostic()?;
    write_report(&all, cli.output)
}

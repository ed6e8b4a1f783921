use super::billing::BillingService;
use crate::domain::invoice::Invoice;
use crate::domain::schedule::{delay_until_next_run, next_billing_run};
use crate::error::Result;
use chrono::Local;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Runs batch billing at local midnight on the first day of every month.
pub struct MonthlyTrigger {
    billing: BillingService,
}

impl MonthlyTrigger {
    pub fn new(billing: BillingService) -> Self {
        Self { billing }
    }

    /// Charges all pending invoices once and returns the results together with
    /// the time left until the next monthly run.
    pub async fn run_once(&self) -> Result<(Vec<Invoice>, Duration)> {
        let results = self.billing.process_pending().await?;

        let now = Local::now();
        let delay = delay_until_next_run(&now)?;
        info!(
            next_run = %next_billing_run(&now)?,
            minutes_until_next_run = delay.as_secs() / 60,
            "Next billing run scheduled"
        );
        Ok((results, delay))
    }

    /// Starts the recurring loop: bill, sleep until next month, repeat.
    ///
    /// A failed run is logged and retried at the next month boundary.
    pub fn spawn(self) -> TriggerHandle {
        let handle = tokio::spawn(async move {
            loop {
                let delay = match self.run_once().await {
                    Ok((_, delay)) => delay,
                    Err(e) => {
                        error!(error = %e, "Monthly billing run failed");
                        match delay_until_next_run(&Local::now()) {
                            Ok(delay) => delay,
                            Err(e) => {
                                error!(error = %e, "Cannot compute next billing run; stopping");
                                return;
                            }
                        }
                    }
                };
                tokio::time::sleep(delay).await;
            }
        });
        TriggerHandle { handle }
    }
}

/// Owner of a running [`MonthlyTrigger`] loop.
pub struct TriggerHandle {
    handle: JoinHandle<()>,
}

impl TriggerHandle {
    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Stops the loop. A batch in progress is cancelled at its next await point.
    pub fn stop(self) {
        self.handle.abort();
    }
}

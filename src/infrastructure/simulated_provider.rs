use crate::domain::invoice::Invoice;
use crate::domain::ports::{ChargeError, PaymentProvider};
use crate::error::{BillingError, Result};
use async_trait::async_trait;
use rand::Rng;

/// A stand-in payment provider that settles invoices at random.
///
/// Each charge first rolls for a network failure, then for success. Useful
/// for driving the billing flow without a real provider behind it.
#[derive(Debug, Clone, Copy)]
pub struct SimulatedPaymentProvider {
    success_rate: f64,
    network_failure_rate: f64,
}

impl SimulatedPaymentProvider {
    pub fn new(success_rate: f64, network_failure_rate: f64) -> Result<Self> {
        for (name, rate) in [
            ("success rate", success_rate),
            ("network failure rate", network_failure_rate),
        ] {
            if !(0.0..=1.0).contains(&rate) {
                return Err(BillingError::ValidationError(format!(
                    "{} must be between 0 and 1, got {}",
                    name, rate
                )));
            }
        }
        Ok(Self {
            success_rate,
            network_failure_rate,
        })
    }
}

impl Default for SimulatedPaymentProvider {
    fn default() -> Self {
        Self {
            success_rate: 0.5,
            network_failure_rate: 0.0,
        }
    }
}

#[async_trait]
impl PaymentProvider for SimulatedPaymentProvider {
    async fn charge(&self, invoice: &Invoice) -> std::result::Result<bool, ChargeError> {
        let (network_failure, charged) = {
            let mut rng = rand::thread_rng();
            (
                rng.gen_bool(self.network_failure_rate),
                rng.gen_bool(self.success_rate),
            )
        };

        if network_failure {
            return Err(ChargeError::Network(format!(
                "provider unreachable while charging invoice {}",
                invoice.id
            )));
        }
        Ok(charged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::money::{Currency, Money};
    use rust_decimal_macros::dec;

    fn invoice() -> Invoice {
        Invoice::new(1, 1, Money::new(dec!(10), Currency::Usd))
    }

    #[test]
    fn test_rates_are_validated() {
        assert!(SimulatedPaymentProvider::new(1.0, 0.0).is_ok());
        assert!(matches!(
            SimulatedPaymentProvider::new(1.5, 0.0),
            Err(BillingError::ValidationError(_))
        ));
        assert!(SimulatedPaymentProvider::new(0.5, -0.1).is_err());
    }

    #[tokio::test]
    async fn test_certain_outcomes() {
        let always = SimulatedPaymentProvider::new(1.0, 0.0).unwrap();
        assert_eq!(always.charge(&invoice()).await, Ok(true));

        let never = SimulatedPaymentProvider::new(0.0, 0.0).unwrap();
        assert_eq!(never.charge(&invoice()).await, Ok(false));

        let offline = SimulatedPaymentProvider::new(1.0, 1.0).unwrap();
        assert!(matches!(
            offline.charge(&invoice()).await,
            Err(ChargeError::Network(_))
        ));
    }
}

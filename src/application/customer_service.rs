use crate::domain::customer::{Customer, CustomerId};
use crate::domain::ports::CustomerStoreBox;
use crate::error::{BillingError, Result};

pub struct CustomerService {
    store: CustomerStoreBox,
}

impl CustomerService {
    pub fn new(store: CustomerStoreBox) -> Self {
        Self { store }
    }

    pub async fn fetch(&self, customer_id: CustomerId) -> Result<Customer> {
        self.store
            .get(customer_id)
            .await?
            .ok_or(BillingError::CustomerNotFound(customer_id))
    }

    pub async fn fetch_all(&self) -> Result<Vec<Customer>> {
        self.store.get_all().await
    }

    pub async fn store(&self, customer: Customer) -> Result<()> {
        self.store.store(customer).await
    }
}

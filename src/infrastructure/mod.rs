//! Adapters for the domain ports: storage backends and the simulated payment
//! provider.

pub mod in_memory;
#[cfg(feature = "storage-rocksdb")]
pub mod rocksdb;
pub mod simulated_provider;

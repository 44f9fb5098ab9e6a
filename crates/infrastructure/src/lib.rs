//! Infrastructure layer - External integrations

pub mod config;
pub mod store;

pub use config::DashboardConfig;
pub use store::{InMemoryDeviceStore, RestDeviceStore};

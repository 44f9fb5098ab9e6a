pub mod memory;
pub mod rest;

pub use memory::InMemoryDeviceStore;
pub use rest::RestDeviceStore;

//! Domain layer - Pure business logic with no external dependencies
//!
//! This crate contains:
//! - The device record entity and its wire shape
//! - Status classification for display
//! - Status aggregation (latest per location, recent history)
//! - The device store port (trait)
//! - Configurable dashboard policies
//!
//! Principles:
//! - No dependencies on infrastructure
//! - Aggregation is synchronous and deterministic
//! - Testable in isolation

pub mod aggregate;
pub mod device;
pub mod error;
pub mod policy;
pub mod status;

// Re-export commonly used types
pub use aggregate::{
    DashboardSnapshot, HistoryConfig, HistoryMode, KindFilter, LatestByLocation, RecentHistory,
    StatusAggregator,
};
pub use device::{ActuatorAction, DeviceKind, DeviceRecord, DeviceStore, RecordPatch};
pub use error::DomainError;
pub use policy::{OverlapPolicy, WriteMode};
pub use status::{StatusBadge, StatusLevel, classify};

use super::{DeviceRecord, RecordPatch};
use crate::DomainError;
use async_trait::async_trait;

/// Port to the remote device collection
///
/// One implementation talks to the REST collection, another keeps the
/// records in memory. Every failure is reported as `DomainError::Remote`;
/// callers treat it as transient.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DeviceStore: Send + Sync {
    /// Create a record and return it with its store-assigned id
    async fn create(&self, record: &DeviceRecord) -> Result<DeviceRecord, DomainError>;

    /// Fetch the whole collection, in store order
    async fn list(&self) -> Result<Vec<DeviceRecord>, DomainError>;

    /// Overwrite the given fields of an existing record
    async fn update(&self, id: &str, patch: &RecordPatch) -> Result<DeviceRecord, DomainError>;

    async fn delete(&self, id: &str) -> Result<(), DomainError>;
}

use std::time::Duration;

use async_trait::async_trait;
use domain::DomainError;
use domain::device::{DeviceRecord, DeviceStore, RecordPatch};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::StoreConfig;

/// Error bodies longer than this are cut before they go into an error message
const MAX_ERROR_BODY_BYTES: usize = 512;

/// Device store backed by a REST collection resource
///
/// `GET <base>` lists, `POST <base>` creates, `PUT <base>/<id>` updates and
/// `DELETE <base>/<id>` deletes. Bodies are JSON.
#[derive(Clone)]
pub struct RestDeviceStore {
    client: Client,
    base_url: String,
}

impl std::fmt::Debug for RestDeviceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestDeviceStore")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl RestDeviceStore {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, DomainError> {
        let client = Client::builder().timeout(timeout).build().map_err(|e| {
            DomainError::InvalidConfiguration(format!("Failed to build HTTP client: {e}"))
        })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &StoreConfig) -> Result<Self, DomainError> {
        Self::new(&config.base_url, config.timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn item_url(&self, id: &str) -> String {
        format!("{}/{}", self.base_url, id)
    }

    async fn send(
        &self,
        request: RequestBuilder,
        operation: &str,
    ) -> Result<Response, DomainError> {
        let response = request
            .send()
            .await
            .map_err(|e| DomainError::remote(format!("{operation} request failed: {e}")))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = match response.bytes().await {
            Ok(bytes) => {
                let end = bytes.len().min(MAX_ERROR_BODY_BYTES);
                String::from_utf8_lossy(&bytes[..end]).to_string()
            }
            Err(_) => String::new(),
        };
        let reason = status.canonical_reason().unwrap_or("unexpected status");
        let message = if body.trim().is_empty() {
            format!("{operation} failed: {reason}")
        } else {
            format!("{operation} failed: {reason}: {}", body.trim())
        };

        Err(DomainError::remote_status(status.as_u16(), message))
    }

    async fn decode<T: DeserializeOwned>(
        response: Response,
        operation: &str,
    ) -> Result<T, DomainError> {
        response.json::<T>().await.map_err(|e| {
            DomainError::remote(format!("{operation} returned an invalid body: {e}"))
        })
    }
}

#[async_trait]
impl DeviceStore for RestDeviceStore {
    async fn create(&self, record: &DeviceRecord) -> Result<DeviceRecord, DomainError> {
        let response = self
            .send(self.client.post(&self.base_url).json(record), "create")
            .await?;
        let created: DeviceRecord = Self::decode(response, "create").await?;
        debug!(id = ?created.id, location = %created.location, "Record created");
        Ok(created)
    }

    async fn list(&self) -> Result<Vec<DeviceRecord>, DomainError> {
        let response = self.send(self.client.get(&self.base_url), "list").await?;
        let records: Vec<DeviceRecord> = Self::decode(response, "list").await?;
        debug!(records = records.len(), "Collection fetched");
        Ok(records)
    }

    async fn update(&self, id: &str, patch: &RecordPatch) -> Result<DeviceRecord, DomainError> {
        let response = self
            .send(self.client.put(self.item_url(id)).json(patch), "update")
            .await?;
        let updated: DeviceRecord = Self::decode(response, "update").await?;
        debug!(id = %id, "Record updated");
        Ok(updated)
    }

    async fn delete(&self, id: &str) -> Result<(), DomainError> {
        self.send(self.client.delete(self.item_url(id)), "delete").await?;
        debug!(id = %id, "Record deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let store =
            RestDeviceStore::new("http://localhost:8080/api/devices/", Duration::from_secs(1))
                .unwrap();
        assert_eq!(store.base_url(), "http://localhost:8080/api/devices");
        assert_eq!(store.item_url("42"), "http://localhost:8080/api/devices/42");
    }

    #[test]
    fn test_from_config() {
        let store = RestDeviceStore::from_config(&StoreConfig::default()).unwrap();
        assert_eq!(store.base_url(), crate::config::DEFAULT_BASE_URL);
    }
}

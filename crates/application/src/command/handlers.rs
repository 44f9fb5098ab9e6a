use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use domain::aggregate::latest_matching;
use domain::device::{
    ActuatorAction, DeviceKind, DeviceRecord, DeviceStore, RecordPatch, format_timestamp,
};
use domain::error::{DomainError, Result};
use domain::policy::WriteMode;

use crate::monitor::Monitor;
use crate::view::{DeviceListItem, device_list};

/// Fields of the create-device form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceForm {
    #[serde(alias = "tipo_dispositivo")]
    pub kind: DeviceKind,
    #[serde(alias = "ubicacion")]
    pub location: String,
    #[serde(default, alias = "nombre")]
    pub name: Option<String>,
}

/// The records written by one actuator toggle
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairWrite {
    pub actuator: DeviceRecord,
    pub door: DeviceRecord,
}

/// Operator commands: create, delete and actuator toggles.
///
/// Every successful mutation triggers a dashboard refresh when a monitor
/// is attached.
pub struct CommandHandlers {
    store: Arc<dyn DeviceStore>,
    write_mode: WriteMode,
    monitor: Option<Arc<Monitor>>,
}

impl CommandHandlers {
    pub fn new(store: Arc<dyn DeviceStore>, write_mode: WriteMode) -> Self {
        Self {
            store,
            write_mode,
            monitor: None,
        }
    }

    pub fn with_monitor(mut self, monitor: Arc<Monitor>) -> Self {
        self.monitor = Some(monitor);
        self
    }

    pub fn write_mode(&self) -> WriteMode {
        self.write_mode
    }

    pub async fn list_devices(&self) -> Result<Vec<DeviceListItem>> {
        let records = self.store.list().await?;
        Ok(device_list(&records))
    }

    pub async fn create_device(&self, form: DeviceForm) -> Result<DeviceRecord> {
        let location = form.location.trim();
        if location.is_empty() {
            return Err(DomainError::InvalidRecord(
                "Location cannot be empty".to_string(),
            ));
        }

        let mut record =
            DeviceRecord::new(form.kind, location, Utc::now()).with_ip(simulated_ip());
        if let Some(name) = form.name.filter(|n| !n.trim().is_empty()) {
            record = record.with_name(name.trim());
        }

        let created = self.store.create(&record).await?;
        info!(
            id = ?created.id,
            kind = %created.kind,
            location = %created.location,
            "➕ Device created"
        );
        self.refresh().await;
        Ok(created)
    }

    pub async fn delete_device(&self, id: &str) -> Result<()> {
        self.store.delete(id).await?;
        info!(id = %id, "🗑️ Device deleted");
        self.refresh().await;
        Ok(())
    }

    /// Set the actuator and its door sensor at `location` to the state `action` leads to.
    ///
    /// Both devices must exist; otherwise nothing is written. The two
    /// writes are not atomic: when the second one fails the store keeps
    /// only the actuator side and `DomainError::PartialWrite` is returned.
    pub async fn toggle_actuator(
        &self,
        location: &str,
        action: ActuatorAction,
    ) -> Result<PairWrite> {
        let records = self.store.list().await?;

        let actuator = latest_matching(&records, location, &DeviceKind::Actuator).cloned();
        let door = latest_matching(&records, location, &DeviceKind::Door).cloned();
        let (actuator, door) = match (actuator, door) {
            (Some(actuator), Some(door)) => (actuator, door),
            (actuator, door) => {
                warn!(
                    location = %location,
                    actuator = actuator.is_some(),
                    door = door.is_some(),
                    "Actuator toggle aborted, device pair incomplete"
                );
                return Err(DomainError::NotFound(format!(
                    "No actuator and door sensor pair found at '{location}'"
                )));
            }
        };

        // Overwrite needs both ids; check them before anything is written
        let ids = match self.write_mode {
            WriteMode::Append => None,
            WriteMode::Overwrite => Some((
                stored_id(&actuator)?.to_string(),
                stored_id(&door)?.to_string(),
            )),
        };

        let now = Utc::now();
        let timestamp = format_timestamp(now);
        let state = action.target_state();

        let written_actuator = match &ids {
            None => {
                let record = DeviceRecord::new(DeviceKind::Actuator, location, now)
                    .with_state(state)
                    .with_command(action.as_str())
                    .with_ip(simulated_ip());
                self.store.create(&with_name_of(record, &actuator)).await?
            }
            Some((actuator_id, _)) => {
                let patch = RecordPatch {
                    state: Some(state.to_string()),
                    command: Some(action.as_str().to_string()),
                    timestamp: Some(timestamp.clone()),
                    ip: Some(simulated_ip()),
                    ..Default::default()
                };
                self.store.update(actuator_id, &patch).await?
            }
        };

        let door_write = match &ids {
            None => {
                let record = DeviceRecord::new(DeviceKind::Door, location, now)
                    .with_state(state)
                    .with_ip(simulated_ip());
                self.store.create(&with_name_of(record, &door)).await
            }
            Some((_, door_id)) => {
                let patch = RecordPatch {
                    state: Some(state.to_string()),
                    timestamp: Some(timestamp),
                    ip: Some(simulated_ip()),
                    ..Default::default()
                };
                self.store.update(door_id, &patch).await
            }
        };

        let written_door = match door_write {
            Ok(record) => record,
            Err(e) => {
                error!(
                    location = %location,
                    error = %e,
                    "Actuator written but door sensor write failed; pair is inconsistent"
                );
                self.refresh().await;
                return Err(DomainError::PartialWrite {
                    location: location.to_string(),
                    written: DeviceKind::Actuator.to_string(),
                    message: e.to_string(),
                });
            }
        };

        info!(location = %location, action = %action, state = %state, "🔁 Actuator toggled");
        self.refresh().await;

        Ok(PairWrite {
            actuator: written_actuator,
            door: written_door,
        })
    }

    async fn refresh(&self) {
        if let Some(monitor) = &self.monitor {
            monitor.refresh().await;
        }
    }
}

fn with_name_of(record: DeviceRecord, previous: &DeviceRecord) -> DeviceRecord {
    match &previous.name {
        Some(name) => record.with_name(name.clone()),
        None => record,
    }
}

fn stored_id(record: &DeviceRecord) -> Result<&str> {
    record.id.as_deref().ok_or_else(|| {
        DomainError::InvalidRecord(format!(
            "{} record at '{}' has no store id",
            record.kind, record.location
        ))
    })
}

/// Simulated device address in 192.168.0.0/16
pub fn simulated_ip() -> String {
    let bytes = uuid::Uuid::new_v4().into_bytes();
    format!("192.168.{}.{}", bytes[0], bytes[1] % 254 + 1)
}

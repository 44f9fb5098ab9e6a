use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::DeviceKind;
use crate::error::{DomainError, Result};

/// State tokens understood by the dashboard (`estado` on the wire)
pub mod state {
    pub const DETECTED: &str = "detectada";
    pub const NOT_DETECTED: &str = "no_detectada";
    pub const OPEN: &str = "abierta";
    pub const CLOSED: &str = "cerrada";
}

/// One entry of the remote device collection.
///
/// Field names are English in Rust and Spanish on the wire. The raw
/// `timestamp` string is kept as received; it is parsed only for
/// ordering and display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceRecord {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "string_or_number_id"
    )]
    pub id: Option<String>,
    #[serde(rename = "nombre", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(
        rename = "tipo_dispositivo",
        default,
        deserialize_with = "null_as_default"
    )]
    pub kind: DeviceKind,
    #[serde(rename = "ubicacion", default, deserialize_with = "null_as_default")]
    pub location: String,
    #[serde(rename = "estado", default, deserialize_with = "null_as_default")]
    pub state: String,
    #[serde(rename = "comando", default, deserialize_with = "null_as_default")]
    pub command: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
}

impl DeviceRecord {
    /// Create an unsaved record with the defaults a freshly registered device gets.
    pub fn new(kind: DeviceKind, location: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: None,
            name: None,
            state: default_state_for(&kind).to_string(),
            command: default_command_for(&kind).to_string(),
            kind,
            location: location.into(),
            timestamp: format_timestamp(created_at),
            ip: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = state.into();
        self
    }

    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = command.into();
        self
    }

    pub fn with_ip(mut self, ip: impl Into<String>) -> Self {
        self.ip = Some(ip.into());
        self
    }

    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = timestamp.into();
        self
    }

    /// Label shown for the device: its name when set, else its location.
    pub fn display_name(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => &self.location,
        }
    }

    /// Parsed `timestamp`, `None` when it is missing or malformed.
    pub fn parsed_timestamp(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.timestamp)
    }

    pub fn identity(&self) -> RecordIdentity {
        match &self.id {
            Some(id) => RecordIdentity::Stored(id.clone()),
            None => RecordIdentity::Content {
                timestamp: self.timestamp.clone(),
                state: self.state.clone(),
                ip: self.ip.clone(),
            },
        }
    }
}

/// How a record is recognised when the same collection is fetched again
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RecordIdentity {
    /// Store-assigned id
    Stored(String),
    /// Unsaved records fall back to their content
    Content {
        timestamp: String,
        state: String,
        ip: Option<String>,
    },
}

/// Partial update sent with `PUT /<id>`; unset fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordPatch {
    #[serde(rename = "nombre", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "ubicacion", default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(rename = "estado", default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(rename = "comando", default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
}

impl RecordPatch {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    pub fn apply(&self, record: &mut DeviceRecord) {
        if let Some(name) = &self.name {
            record.name = Some(name.clone());
        }
        if let Some(location) = &self.location {
            record.location = location.clone();
        }
        if let Some(state) = &self.state {
            record.state = state.clone();
        }
        if let Some(command) = &self.command {
            record.command = command.clone();
        }
        if let Some(timestamp) = &self.timestamp {
            record.timestamp = timestamp.clone();
        }
        if let Some(ip) = &self.ip {
            record.ip = Some(ip.clone());
        }
    }
}

/// Operator command for an actuator (`comando` on the wire)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActuatorAction {
    #[serde(rename = "abrir")]
    Open,
    #[serde(rename = "cerrar")]
    Close,
}

impl ActuatorAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "abrir",
            Self::Close => "cerrar",
        }
    }

    /// State both devices of the pair end up in
    pub fn target_state(&self) -> &'static str {
        match self {
            Self::Close => state::CLOSED,
            Self::Open => state::OPEN,
        }
    }
}

impl std::str::FromStr for ActuatorAction {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "abrir" => Ok(Self::Open),
            "cerrar" => Ok(Self::Close),
            other => Err(DomainError::InvalidRecord(format!(
                "Unknown actuator action '{other}' (expected 'abrir' or 'cerrar')"
            ))),
        }
    }
}

impl std::fmt::Display for ActuatorAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

pub fn default_state_for(kind: &DeviceKind) -> &'static str {
    match kind {
        DeviceKind::Presence => state::NOT_DETECTED,
        _ => state::CLOSED,
    }
}

pub fn default_command_for(kind: &DeviceKind) -> &'static str {
    match kind {
        DeviceKind::Actuator => ActuatorAction::Close.as_str(),
        _ => "",
    }
}

/// ISO-8601 in UTC with millisecond precision, e.g. `2025-09-05T18:04:11.532Z`
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Lenient timestamp parsing.
///
/// Accepts RFC 3339, an offset-less date-time and a bare date (both read
/// as UTC). Anything else yields `None`.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Some(at.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn string_or_number_id<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(i64),
    }

    Ok(Option::<RawId>::deserialize(deserializer)?.map(|raw| match raw {
        RawId::Text(id) => id,
        RawId::Number(id) => id.to_string(),
    }))
}

use serde::{Deserialize, Serialize};

/// Kind of device a record describes (`tipo_dispositivo` on the wire)
///
/// Unknown kinds are kept verbatim so records written by other clients
/// survive a round trip.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DeviceKind {
    /// Door sensor (`puerta`)
    Door,
    /// Door actuator (`actuador`)
    Actuator,
    /// Presence sensor (`presencia`)
    Presence,
    Other(String),
}

impl DeviceKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Door => "puerta",
            Self::Actuator => "actuador",
            Self::Presence => "presencia",
            Self::Other(raw) => raw,
        }
    }

    pub fn is_door(&self) -> bool {
        matches!(self, Self::Door)
    }
}

impl Default for DeviceKind {
    fn default() -> Self {
        Self::Other(String::new())
    }
}

impl From<String> for DeviceKind {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "puerta" => Self::Door,
            "actuador" => Self::Actuator,
            "presencia" => Self::Presence,
            _ => Self::Other(raw),
        }
    }
}

impl From<&str> for DeviceKind {
    fn from(raw: &str) -> Self {
        Self::from(raw.to_string())
    }
}

impl From<DeviceKind> for String {
    fn from(kind: DeviceKind) -> Self {
        kind.as_str().to_string()
    }
}

impl std::fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

use serde::{Deserialize, Serialize};

use crate::device::{DeviceKind, state};

/// Severity of a device state as shown on the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusLevel {
    /// Door open or presence detected
    Alert,
    /// Door closed or no presence
    Normal,
    /// Unrecognised state token
    Unknown,
}

impl StatusLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Alert => "alert",
            Self::Normal => "normal",
            Self::Unknown => "unknown",
        }
    }

    /// Status dot colour
    pub fn dot_class(&self) -> &'static str {
        match self {
            Self::Alert => "bg-red-500 animate-pulse",
            Self::Normal => "bg-green-500",
            Self::Unknown => "bg-slate-400",
        }
    }

    /// Translucent badge background
    pub fn badge_class(&self) -> &'static str {
        match self {
            Self::Alert => "bg-red-500/20",
            Self::Normal => "bg-green-500/20",
            Self::Unknown => "bg-slate-400/20",
        }
    }

    pub fn text_class(&self) -> &'static str {
        match self {
            Self::Alert => "text-red-300",
            Self::Normal => "text-green-300",
            Self::Unknown => "text-slate-300",
        }
    }
}

impl Default for StatusLevel {
    fn default() -> Self {
        Self::Unknown
    }
}

/// Level plus the label printed on a card or table row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusBadge {
    pub level: StatusLevel,
    pub label: String,
}

/// Classify a state token for display.
///
/// Total over every token: unrecognised states fall to `Unknown`. Doors
/// read `ABIERTA`/`CERRADA` whatever token produced the level.
pub fn classify(estado: &str, kind: &DeviceKind) -> StatusBadge {
    let level = match estado {
        state::DETECTED | state::OPEN => StatusLevel::Alert,
        state::NOT_DETECTED | state::CLOSED => StatusLevel::Normal,
        _ => StatusLevel::Unknown,
    };

    let label = match (level, kind.is_door()) {
        (StatusLevel::Alert, true) => "ABIERTA".to_string(),
        (StatusLevel::Normal, true) => "CERRADA".to_string(),
        _ => estado.to_uppercase(),
    };

    StatusBadge { level, label }
}

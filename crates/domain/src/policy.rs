//! Dashboard policies chosen by configuration.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, Result};

/// What the poll loop does when a tick fires while the previous fetch is still running
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverlapPolicy {
    /// Skip the tick
    Skip,
    /// Start another fetch anyway
    Allow,
}

impl Default for OverlapPolicy {
    fn default() -> Self {
        Self::Skip
    }
}

impl std::str::FromStr for OverlapPolicy {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "skip" => Ok(Self::Skip),
            "allow" => Ok(Self::Allow),
            other => Err(DomainError::InvalidConfiguration(format!(
                "Unknown overlap policy '{other}' (expected 'skip' or 'allow')"
            ))),
        }
    }
}

/// How an actuator toggle is written to the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteMode {
    /// Two new records (actuator + door) appended to the log
    Append,
    /// The two existing records are updated in place
    Overwrite,
}

impl Default for WriteMode {
    fn default() -> Self {
        Self::Append
    }
}

impl std::str::FromStr for WriteMode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "append" => Ok(Self::Append),
            "overwrite" => Ok(Self::Overwrite),
            other => Err(DomainError::InvalidConfiguration(format!(
                "Unknown write mode '{other}' (expected 'append' or 'overwrite')"
            ))),
        }
    }
}

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use super::sort_newest_first;
use crate::device::{DeviceKind, DeviceRecord};
use crate::error::{DomainError, Result};

pub const DEFAULT_WINDOW_SIZE: usize = 10;

/// How the recent-history table is bounded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HistoryMode {
    /// At most `window_size` rows in total, recomputed every tick
    Global,
    /// At most `window_size` rows per (location, kind), kept across ticks
    PerKey,
}

impl Default for HistoryMode {
    fn default() -> Self {
        Self::Global
    }
}

impl std::str::FromStr for HistoryMode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "global" => Ok(Self::Global),
            "per-key" => Ok(Self::PerKey),
            other => Err(DomainError::InvalidConfiguration(format!(
                "Unknown history mode '{other}' (expected 'global' or 'per-key')"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryConfig {
    pub mode: HistoryMode,
    pub window_size: usize,
}

impl HistoryConfig {
    pub fn new(mode: HistoryMode, window_size: usize) -> Result<Self> {
        let config = Self { mode, window_size };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.window_size == 0 {
            return Err(DomainError::InvalidConfiguration(
                "History window size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            mode: HistoryMode::Global,
            window_size: DEFAULT_WINDOW_SIZE,
        }
    }
}

/// Per-key history grouping: one physical device
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HistoryKey {
    pub location: String,
    pub kind: DeviceKind,
}

impl HistoryKey {
    pub fn of(record: &DeviceRecord) -> Self {
        Self {
            location: record.location.clone(),
            kind: record.kind.clone(),
        }
    }
}

#[derive(Debug, Clone)]
struct HistoryGroup {
    key: HistoryKey,
    // Newest first, never longer than the window
    entries: VecDeque<DeviceRecord>,
}

/// Bounded recent-history view.
///
/// Global mode is stateless. Per-key mode accumulates across calls to
/// [`RecentHistory::update`]: every tick may hand in the whole cumulative
/// collection, records already held are recognised by identity and not
/// duplicated.
#[derive(Debug, Clone)]
pub struct RecentHistory {
    config: HistoryConfig,
    groups: Vec<HistoryGroup>,
}

impl RecentHistory {
    pub fn new(config: HistoryConfig) -> Self {
        Self {
            config,
            groups: Vec::new(),
        }
    }

    pub fn config(&self) -> &HistoryConfig {
        &self.config
    }

    /// Feed one fetch and return the rows to display.
    pub fn update(&mut self, records: &[DeviceRecord]) -> Vec<DeviceRecord> {
        match self.config.mode {
            HistoryMode::Global => global_window(records, self.config.window_size),
            HistoryMode::PerKey => {
                self.absorb(records);
                self.rows()
            }
        }
    }

    /// Rows held by per-key mode: groups in key-insertion order, each newest first
    pub fn rows(&self) -> Vec<DeviceRecord> {
        self.groups
            .iter()
            .flat_map(|g| g.entries.iter().cloned())
            .collect()
    }

    pub fn entries_for(&self, key: &HistoryKey) -> Option<&VecDeque<DeviceRecord>> {
        self.groups.iter().find(|g| &g.key == key).map(|g| &g.entries)
    }

    pub fn keys(&self) -> impl Iterator<Item = &HistoryKey> {
        self.groups.iter().map(|g| &g.key)
    }

    pub fn reset(&mut self) {
        self.groups.clear();
    }

    fn absorb(&mut self, records: &[DeviceRecord]) {
        let mut ordered: Vec<DeviceRecord> = records.to_vec();
        sort_newest_first(&mut ordered);
        // Oldest first, so keys are created in the order devices first reported
        for record in ordered.iter().rev() {
            self.insert(record);
        }
    }

    fn insert(&mut self, record: &DeviceRecord) {
        let key = HistoryKey::of(record);
        let index = match self.groups.iter().position(|g| g.key == key) {
            Some(index) => index,
            None => {
                self.groups.push(HistoryGroup {
                    key,
                    entries: VecDeque::with_capacity(self.config.window_size),
                });
                self.groups.len() - 1
            }
        };
        let window = self.config.window_size;
        let entries = &mut self.groups[index].entries;

        let identity = record.identity();
        if let Some(existing) = entries.iter().position(|e| e.identity() == identity) {
            if &entries[existing] == record {
                return;
            }
            // Overwritten in place by the store
            entries.remove(existing);
        }

        let at = record.parsed_timestamp();
        let position = entries
            .iter()
            .position(|e| e.parsed_timestamp() < at)
            .unwrap_or(entries.len());
        if position >= window {
            return;
        }
        entries.insert(position, record.clone());
        entries.truncate(window);
    }
}

/// Newest `window_size` records regardless of location or kind
pub fn global_window(records: &[DeviceRecord], window_size: usize) -> Vec<DeviceRecord> {
    let mut ordered = records.to_vec();
    sort_newest_first(&mut ordered);
    ordered.truncate(window_size);
    ordered
}

//! Status aggregation: turns the raw record log into the two dashboard views.

mod history;
mod latest;

pub use history::{
    DEFAULT_WINDOW_SIZE, HistoryConfig, HistoryKey, HistoryMode, RecentHistory, global_window,
};
pub use latest::{LatestByLocation, latest_by_location, latest_matching};

use std::cmp::Reverse;

use serde::{Deserialize, Serialize};

use crate::device::{DeviceKind, DeviceRecord};

/// Which kinds feed the dashboard views.
///
/// Mixing kinds under one location lets a sensor reading mask the
/// actuator state (and vice versa), so the choice is explicit.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum KindFilter {
    #[default]
    All,
    Only(DeviceKind),
}

impl KindFilter {
    pub fn matches(&self, kind: &DeviceKind) -> bool {
        match self {
            Self::All => true,
            Self::Only(only) => only == kind,
        }
    }
}

impl From<String> for KindFilter {
    fn from(raw: String) -> Self {
        match raw.trim() {
            "" | "all" => Self::All,
            kind => Self::Only(DeviceKind::from(kind)),
        }
    }
}

impl From<KindFilter> for String {
    fn from(filter: KindFilter) -> Self {
        match filter {
            KindFilter::All => "all".to_string(),
            KindFilter::Only(kind) => kind.as_str().to_string(),
        }
    }
}

/// Stable sort, newest first. Unparseable timestamps go last.
pub fn sort_newest_first(records: &mut [DeviceRecord]) {
    records.sort_by_cached_key(|r| Reverse(r.parsed_timestamp()));
}

/// Both views derived from one fetch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardSnapshot {
    pub latest: LatestByLocation,
    pub history: Vec<DeviceRecord>,
    /// Records in the fetch before filtering
    pub fetched: usize,
}

/// Owns the kind policy and the per-key history state of one dashboard
#[derive(Debug, Clone)]
pub struct StatusAggregator {
    filter: KindFilter,
    history: RecentHistory,
}

impl StatusAggregator {
    pub fn new(filter: KindFilter, history: HistoryConfig) -> Self {
        Self {
            filter,
            history: RecentHistory::new(history),
        }
    }

    pub fn filter(&self) -> &KindFilter {
        &self.filter
    }

    pub fn history(&self) -> &RecentHistory {
        &self.history
    }

    pub fn derive(&mut self, records: &[DeviceRecord]) -> DashboardSnapshot {
        let filtered: Vec<DeviceRecord> = records
            .iter()
            .filter(|r| self.filter.matches(&r.kind))
            .cloned()
            .collect();

        DashboardSnapshot {
            latest: latest_by_location(&filtered, &KindFilter::All),
            history: self.history.update(&filtered),
            fetched: records.len(),
        }
    }

    pub fn reset(&mut self) {
        self.history.reset();
    }
}

impl Default for StatusAggregator {
    fn default() -> Self {
        Self::new(KindFilter::All, HistoryConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::state;

    fn door(location: &str, ts: &str, estado: &str) -> DeviceRecord {
        DeviceRecord {
            id: None,
            name: None,
            kind: DeviceKind::Door,
            location: location.to_string(),
            state: estado.to_string(),
            command: String::new(),
            timestamp: ts.to_string(),
            ip: None,
        }
    }

    #[test]
    fn test_kind_filter_from_config_string() {
        assert_eq!(KindFilter::from("all".to_string()), KindFilter::All);
        assert_eq!(KindFilter::from(String::new()), KindFilter::All);
        assert_eq!(
            KindFilter::from("puerta".to_string()),
            KindFilter::Only(DeviceKind::Door)
        );
        assert_eq!(String::from(KindFilter::Only(DeviceKind::Presence)), "presencia");
    }

    #[test]
    fn test_sort_newest_first_is_stable_and_puts_invalid_last() {
        let mut records = vec![
            door("bad", "??", state::OPEN),
            door("old", "2025-01-01T00:00:00Z", state::OPEN),
            door("tie-1", "2025-06-01T00:00:00Z", state::OPEN),
            door("tie-2", "2025-06-01T00:00:00Z", state::OPEN),
            door("new", "2025-12-01T00:00:00Z", state::OPEN),
        ];
        sort_newest_first(&mut records);

        let order: Vec<_> = records.iter().map(|r| r.location.as_str()).collect();
        assert_eq!(order, vec!["new", "tie-1", "tie-2", "old", "bad"]);
    }

    #[test]
    fn test_derive_applies_filter_to_both_views() {
        let mut aggregator =
            StatusAggregator::new(KindFilter::Only(DeviceKind::Door), HistoryConfig::default());
        let mut actuator = door("A", "2025-09-05T12:00:00Z", state::CLOSED);
        actuator.kind = DeviceKind::Actuator;
        let records = vec![door("A", "2025-09-05T10:00:00Z", state::OPEN), actuator];

        let snapshot = aggregator.derive(&records);

        assert_eq!(snapshot.fetched, 2);
        assert_eq!(snapshot.latest.len(), 1);
        assert_eq!(snapshot.latest.get("A").unwrap().state, state::OPEN);
        assert_eq!(snapshot.history.len(), 1);
        assert_eq!(snapshot.history[0].kind, DeviceKind::Door);
    }

    #[test]
    fn test_derive_empty_fetch() {
        let mut aggregator = StatusAggregator::default();
        let snapshot = aggregator.derive(&[]);
        assert!(snapshot.latest.is_empty());
        assert!(snapshot.history.is_empty());
    }
}

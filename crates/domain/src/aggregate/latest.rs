use std::collections::HashMap;

use super::{KindFilter, sort_newest_first};
use crate::device::{DeviceKind, DeviceRecord};

/// Most recent record per location, iterated most recently updated first
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LatestByLocation {
    entries: Vec<DeviceRecord>,
    index: HashMap<String, usize>,
}

impl LatestByLocation {
    pub fn get(&self, location: &str) -> Option<&DeviceRecord> {
        self.index.get(location).map(|&i| &self.entries[i])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DeviceRecord> {
        self.entries.iter()
    }

    pub fn locations(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|r| r.location.as_str())
    }

    pub fn into_records(self) -> Vec<DeviceRecord> {
        self.entries
    }

    /// Keeps the first record offered per location
    fn offer(&mut self, record: &DeviceRecord) {
        if self.index.contains_key(&record.location) {
            return;
        }
        self.index.insert(record.location.clone(), self.entries.len());
        self.entries.push(record.clone());
    }
}

/// Latest record per `ubicacion`.
///
/// Records are ordered newest first (stable, malformed timestamps last)
/// and the first one seen per location wins.
pub fn latest_by_location(records: &[DeviceRecord], filter: &KindFilter) -> LatestByLocation {
    let mut ordered: Vec<DeviceRecord> = records
        .iter()
        .filter(|r| filter.matches(&r.kind))
        .cloned()
        .collect();
    sort_newest_first(&mut ordered);

    let mut latest = LatestByLocation::default();
    for record in &ordered {
        latest.offer(record);
    }
    latest
}

/// Newest record of one kind at one location
pub fn latest_matching<'a>(
    records: &'a [DeviceRecord],
    location: &str,
    kind: &DeviceKind,
) -> Option<&'a DeviceRecord> {
    records
        .iter()
        .enumerate()
        .filter(|(_, r)| r.location == location && &r.kind == kind)
        // Earlier store position wins a timestamp tie, as in the stable sort
        .max_by(|(ia, a), (ib, b)| {
            a.parsed_timestamp()
                .cmp(&b.parsed_timestamp())
                .then(ib.cmp(ia))
        })
        .map(|(_, r)| r)
}

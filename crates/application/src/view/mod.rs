//! View rendering: turns aggregator output into display-ready view models.
//!
//! No business logic lives here; every decision about what a state means
//! comes from `domain::classify`.

use chrono::{DateTime, Local, Utc};
use serde::Serialize;

use domain::aggregate::{DashboardSnapshot, LatestByLocation};
use domain::device::{DeviceRecord, parse_timestamp};
use domain::status::{StatusLevel, classify};

pub const INVALID_DATE: &str = "Invalid Date";
pub const MISSING_IP: &str = "N/A";

/// One card of the status grid
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusCard {
    pub location: String,
    pub title: String,
    pub kind: String,
    pub level: StatusLevel,
    pub label: String,
    pub dot_class: &'static str,
    pub badge_class: &'static str,
    pub updated_at: String,
}

/// One row of the recent-history table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryRow {
    pub location: String,
    pub kind: String,
    pub level: StatusLevel,
    pub label: String,
    pub text_class: &'static str,
    pub badge_class: &'static str,
    pub time: String,
    pub ip: String,
    /// The newest row is highlighted
    pub highlighted: bool,
}

/// Entry of the administration list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceListItem {
    pub id: Option<String>,
    pub title: String,
    pub subtitle: String,
}

/// Everything one tick puts on screen
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub seq: u64,
    pub generated_at: DateTime<Utc>,
    pub records: usize,
    pub cards: Vec<StatusCard>,
    pub history: Vec<HistoryRow>,
}

impl DashboardView {
    /// View shown before the first successful fetch
    pub fn empty() -> Self {
        Self {
            seq: 0,
            generated_at: Utc::now(),
            records: 0,
            cards: Vec::new(),
            history: Vec::new(),
        }
    }
}

pub fn status_cards(latest: &LatestByLocation) -> Vec<StatusCard> {
    latest
        .iter()
        .map(|record| {
            let badge = classify(&record.state, &record.kind);
            StatusCard {
                location: record.location.clone(),
                title: record.display_name().to_string(),
                kind: record.kind.to_string(),
                level: badge.level,
                label: badge.label,
                dot_class: badge.level.dot_class(),
                badge_class: badge.level.badge_class(),
                updated_at: display_time(&record.timestamp),
            }
        })
        .collect()
}

pub fn history_rows(history: &[DeviceRecord]) -> Vec<HistoryRow> {
    history
        .iter()
        .enumerate()
        .map(|(index, record)| {
            let badge = classify(&record.state, &record.kind);
            HistoryRow {
                location: record.location.clone(),
                kind: record.kind.to_string(),
                level: badge.level,
                label: badge.label,
                text_class: badge.level.text_class(),
                badge_class: badge.level.badge_class(),
                time: display_time(&record.timestamp),
                ip: record
                    .ip
                    .clone()
                    .filter(|ip| !ip.is_empty())
                    .unwrap_or_else(|| MISSING_IP.to_string()),
                highlighted: index == 0,
            }
        })
        .collect()
}

pub fn device_list(records: &[DeviceRecord]) -> Vec<DeviceListItem> {
    records
        .iter()
        .map(|record| DeviceListItem {
            id: record.id.clone(),
            title: record.display_name().to_string(),
            subtitle: format!("{} en {}", record.kind, record.location),
        })
        .collect()
}

pub fn dashboard_view(snapshot: &DashboardSnapshot, seq: u64) -> DashboardView {
    DashboardView {
        seq,
        generated_at: Utc::now(),
        records: snapshot.fetched,
        cards: status_cards(&snapshot.latest),
        history: history_rows(&snapshot.history),
    }
}

/// Local wall-clock rendering of a raw record timestamp
pub fn display_time(raw: &str) -> String {
    match parse_timestamp(raw) {
        Some(at) => at
            .with_timezone(&Local)
            .format("%d/%m/%Y, %H:%M:%S")
            .to_string(),
        None => INVALID_DATE.to_string(),
    }
}

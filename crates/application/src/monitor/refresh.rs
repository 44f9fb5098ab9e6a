use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, warn};

use domain::DomainError;
use domain::aggregate::StatusAggregator;
use domain::device::DeviceStore;

use crate::view::{DashboardView, dashboard_view};

/// Rendering surface that displays the dashboard view models
pub trait ViewSink: Send + Sync {
    fn present(&self, view: &DashboardView);
}

/// Result of one fetch → derive → render tick
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    /// The view was replaced
    Applied { seq: u64, records: usize },
    /// A newer fetch was applied first; this result was dropped
    Stale { seq: u64, applied: u64 },
    /// The fetch failed; the previous view stays on screen
    Failed(DomainError),
}

impl RefreshOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}

struct MonitorState {
    aggregator: StatusAggregator,
    last_applied: u64,
}

/// Runs dashboard ticks against one store and presents them to one sink.
///
/// Each fetch takes a sequence number when it starts. A result is applied
/// only if no later fetch has been applied yet, so overlapping ticks can
/// never put an older collection back on screen.
pub struct Monitor {
    store: Arc<dyn DeviceStore>,
    sink: Arc<dyn ViewSink>,
    state: Mutex<MonitorState>,
    issued: AtomicU64,
}

impl Monitor {
    pub fn new(
        store: Arc<dyn DeviceStore>,
        aggregator: StatusAggregator,
        sink: Arc<dyn ViewSink>,
    ) -> Self {
        Self {
            store,
            sink,
            state: Mutex::new(MonitorState {
                aggregator,
                last_applied: 0,
            }),
            issued: AtomicU64::new(0),
        }
    }

    pub fn store(&self) -> &Arc<dyn DeviceStore> {
        &self.store
    }

    pub fn last_applied(&self) -> u64 {
        self.lock_state().last_applied
    }

    /// Drop accumulated per-key history
    pub fn reset(&self) {
        self.lock_state().aggregator.reset();
    }

    pub async fn refresh(&self) -> RefreshOutcome {
        let seq = self.issued.fetch_add(1, Ordering::SeqCst) + 1;

        let records = match self.store.list().await {
            Ok(records) => records,
            Err(e) => {
                warn!(seq, error = %e, "Failed to fetch devices, keeping previous view");
                return RefreshOutcome::Failed(e);
            }
        };

        let mut state = self.lock_state();
        if seq <= state.last_applied {
            debug!(seq, applied = state.last_applied, "Dropping stale fetch result");
            return RefreshOutcome::Stale {
                seq,
                applied: state.last_applied,
            };
        }
        state.last_applied = seq;

        let snapshot = state.aggregator.derive(&records);
        let view = dashboard_view(&snapshot, seq);
        debug!(
            seq,
            records = records.len(),
            locations = view.cards.len(),
            rows = view.history.len(),
            "Dashboard refreshed"
        );
        // Presented under the lock so the sink sees views in sequence order
        self.sink.present(&view);

        RefreshOutcome::Applied {
            seq,
            records: records.len(),
        }
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, MonitorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

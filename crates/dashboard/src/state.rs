use std::sync::{PoisonError, RwLock};

use application::monitor::ViewSink;
use application::view::DashboardView;
use application::CommandHandlers;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::debug;

/// Capacity of the SSE fan-out; slow clients skip views beyond this
const EVENT_BUFFER: usize = 16;

/// Last applied dashboard view, plus a broadcast of every new one
pub struct LiveView {
    current: RwLock<DashboardView>,
    tx: broadcast::Sender<DashboardView>,
}

impl LiveView {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_BUFFER);
        Self {
            current: RwLock::new(DashboardView::empty()),
            tx,
        }
    }

    pub fn current(&self) -> DashboardView {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DashboardView> {
        self.tx.subscribe()
    }
}

impl Default for LiveView {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewSink for LiveView {
    fn present(&self, view: &DashboardView) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = view.clone();
        // No subscribers is fine
        let receivers = self.tx.send(view.clone()).unwrap_or(0);
        debug!(seq = view.seq, receivers, "View published");
    }
}

pub struct AppState {
    pub commands: CommandHandlers,
    pub live: Arc<LiveView>,
}

impl AppState {
    pub fn new(commands: CommandHandlers, live: Arc<LiveView>) -> Self {
        Self { commands, live }
    }
}

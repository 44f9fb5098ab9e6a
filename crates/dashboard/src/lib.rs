pub mod api;
pub mod state;
pub mod terminal;

use std::future::Future;
use std::sync::Arc;

use application::monitor::{Monitor, ViewSink};
use application::CommandHandlers;
use domain::aggregate::StatusAggregator;
use domain::device::DeviceStore;
use domain::DomainError;
use infrastructure::{DashboardConfig, InMemoryDeviceStore, RestDeviceStore};
use state::{AppState, LiveView};
use tracing::{info, warn};

/// Pick the store the dashboard talks to
pub fn build_store(
    config: &DashboardConfig,
    simulate: bool,
) -> Result<Arc<dyn DeviceStore>, DomainError> {
    if simulate {
        return Ok(Arc::new(InMemoryDeviceStore::with_demo_fleet()));
    }
    Ok(Arc::new(RestDeviceStore::from_config(&config.store)?))
}

pub fn build_monitor(
    store: Arc<dyn DeviceStore>,
    config: &DashboardConfig,
    sink: Arc<dyn ViewSink>,
) -> Result<Arc<Monitor>, DomainError> {
    let aggregator = StatusAggregator::new(config.view.kind_filter.clone(), config.view.history()?);
    Ok(Arc::new(Monitor::new(store, aggregator, sink)))
}

/// Wire the HTTP surface: live view, monitor and command handlers share one store
pub fn setup_app_state(
    store: Arc<dyn DeviceStore>,
    config: &DashboardConfig,
) -> Result<(Arc<AppState>, Arc<Monitor>), DomainError> {
    let live = Arc::new(LiveView::new());
    let monitor = build_monitor(store.clone(), config, live.clone())?;
    let commands =
        CommandHandlers::new(store, config.commands.write_mode).with_monitor(monitor.clone());

    Ok((Arc::new(AppState::new(commands, live)), monitor))
}

/// Resolve once `signal` fires. A signal that cannot be installed never resolves,
/// so long-running commands keep going until the process is killed.
pub async fn shutdown_on<F>(signal: F)
where
    F: Future<Output = std::io::Result<()>>,
{
    match signal.await {
        Ok(()) => info!("🛑 Shutting down..."),
        Err(err) => {
            warn!(error = %err, "Unable to listen for shutdown signal, running until killed");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_shutdown_resolves_on_signal() {
        let result =
            tokio::time::timeout(Duration::from_secs(1), shutdown_on(async { Ok(()) })).await;
        assert!(result.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_waits_forever_when_signal_unavailable() {
        let failing = async { Err(std::io::Error::other("no signal handler")) };
        let result = tokio::time::timeout(Duration::from_secs(3600), shutdown_on(failing)).await;
        assert!(result.is_err());
    }
}

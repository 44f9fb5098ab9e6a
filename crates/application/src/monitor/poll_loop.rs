use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use domain::{DomainError, OverlapPolicy};

use super::Monitor;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2000);

/// Lifecycle of the poll loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PollState {
    /// Constructed, not yet started
    Idle,
    /// Timer armed, ticking every interval
    Running,
    /// Torn down; cannot be restarted
    Stopped,
}

impl PollState {
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }

    pub fn to_running(&self) -> Result<Self, DomainError> {
        match self {
            Self::Idle => Ok(Self::Running),
            other => Err(DomainError::InvalidTransition(format!(
                "Poll loop can only start from Idle (currently {other:?})"
            ))),
        }
    }

    pub fn to_stopped(&self) -> Self {
        Self::Stopped
    }
}

impl Default for PollState {
    fn default() -> Self {
        Self::Idle
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    pub interval: Duration,
    pub overlap: OverlapPolicy,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            overlap: OverlapPolicy::Skip,
        }
    }
}

/// Re-fetches and re-renders the dashboard on a fixed period.
///
/// Starting performs an immediate tick. Stopping cancels the timer and
/// waits for it to exit; fetches already in flight are left to finish.
pub struct PollLoop {
    monitor: Arc<Monitor>,
    config: PollConfig,
    state: Mutex<PollState>,
    cancel_token: CancellationToken,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl PollLoop {
    pub fn new(monitor: Arc<Monitor>, config: PollConfig) -> Self {
        Self {
            monitor,
            config,
            state: Mutex::new(PollState::Idle),
            cancel_token: CancellationToken::new(),
            handle: Mutex::new(None),
        }
    }

    pub fn state(&self) -> PollState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn monitor(&self) -> &Arc<Monitor> {
        &self.monitor
    }

    /// Arm the timer. Must be called from within a Tokio runtime.
    pub fn start(&self) -> Result<(), DomainError> {
        {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            *state = state.to_running()?;
        }

        info!(
            interval_ms = self.config.interval.as_millis() as u64,
            overlap = ?self.config.overlap,
            "▶️ Starting poll loop"
        );

        let handle = tokio::spawn(run(
            self.monitor.clone(),
            self.config,
            self.cancel_token.clone(),
        ));
        *self.handle.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);
        Ok(())
    }

    pub async fn stop(&self) {
        {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            if *state == PollState::Stopped {
                return;
            }
            *state = state.to_stopped();
        }

        self.cancel_token.cancel();
        let handle = self
            .handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
        info!("⏹️ Poll loop stopped");
    }
}

impl Drop for PollLoop {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}

async fn run(monitor: Arc<Monitor>, config: PollConfig, cancel_token: CancellationToken) {
    let mut timer = tokio::time::interval(config.interval);
    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let in_flight = Arc::new(AtomicBool::new(false));

    loop {
        tokio::select! {
            biased;
            _ = cancel_token.cancelled() => {
                debug!("Poll loop cancellation received");
                break;
            }
            _ = timer.tick() => {
                if config.overlap == OverlapPolicy::Skip && in_flight.swap(true, Ordering::AcqRel) {
                    debug!("Previous fetch still in flight, skipping tick");
                    continue;
                }

                let monitor = monitor.clone();
                let in_flight = in_flight.clone();
                tokio::spawn(async move {
                    monitor.refresh().await;
                    in_flight.store(false, Ordering::Release);
                });
            }
        }
    }
}

//! Application layer - Use cases and dashboard workflows

pub mod command;
pub mod monitor;
pub mod view;

pub use command::{CommandHandlers, DeviceForm, WriteMode};
pub use monitor::{Monitor, PollConfig, PollLoop, RefreshOutcome, ViewSink};
pub use view::DashboardView;

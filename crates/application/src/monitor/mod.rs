mod poll_loop;
mod refresh;

pub use domain::OverlapPolicy;
pub use poll_loop::{DEFAULT_POLL_INTERVAL, PollConfig, PollLoop, PollState};
pub use refresh::{Monitor, RefreshOutcome, ViewSink};

mod handlers;

pub use domain::WriteMode;
pub use handlers::{CommandHandlers, DeviceForm, PairWrite, simulated_ip};

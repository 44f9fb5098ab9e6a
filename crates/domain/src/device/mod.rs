mod kind;
mod record;
mod store;

pub use kind::DeviceKind;
pub use record::{
    ActuatorAction, DeviceRecord, RecordIdentity, RecordPatch, default_command_for,
    default_state_for, format_timestamp, parse_timestamp, state,
};
pub use store::DeviceStore;

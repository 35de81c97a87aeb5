mod sms_drain;

pub use sms_drain::SmsDrainTask;

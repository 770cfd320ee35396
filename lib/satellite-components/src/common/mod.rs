pub mod kafka;
pub mod telemetry;

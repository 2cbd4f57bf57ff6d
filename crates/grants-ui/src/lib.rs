pub mod config;
pub mod error;
pub mod tasklist;
pub mod telemetry;

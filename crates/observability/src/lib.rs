//! Process logging for the calendar binaries.
//!
//! Call [`init`] once at startup; everything else logs through `tracing`.

pub mod tracing;

pub use self::tracing::{init, LogFormat};

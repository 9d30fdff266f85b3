//! Logging utilities.
//!
//! The core only talks to the `log` facade. This module owns backend
//! initialization and the routing of driver and platform messages into it.

mod driver;
mod init;

pub use driver::{
    DriverMessage, DriverSeverity, DriverSource, PlatformCode, PlatformLevel, PlatformMessage,
};
pub use init::{init_logging, LoggingConfig};

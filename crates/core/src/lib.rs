//! avd-runner core - shared types
//!
//! Configuration, the error type for configuration handling, and the event
//! bus the emulator crates report progress through.

pub mod config;
pub mod events;
pub mod error;

pub use config::{AppConfig, AndroidConfig, EmulatorConfig};
pub use events::{Event, EventBus, EventSubscription, LogLevel};
pub use error::{CoreError, Result};

/// avd-runner version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "avd-runner";

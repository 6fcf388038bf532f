//! avd-runner - boot Android emulators from the command line
//!
//! Lists the Android Virtual Devices `avdmanager` knows about, picks the one
//! closest to an app's target API level, starts it on a free console port
//! and waits until it has booted.
//!
//! ## Architecture
//!
//! - `avd-runner-core`: configuration, errors and the event bus
//! - `avd-runner-android-toolchain`: SDK tool lookup and the platform version table
//! - `avd-runner-emulator-bridge`: `avdmanager` parsing, `adb`, launching and boot polling

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod commands;

// Re-export main components for library usage
pub use avd_runner_core as core;
pub use avd_runner_android_toolchain as toolchain;
pub use avd_runner_emulator_bridge as emulator;

/// Prelude module for convenient imports
pub mod prelude {
    pub use avd_runner_core::{AppConfig, EventBus};
    pub use avd_runner_android_toolchain::{SdkTool, ToolLocator};
    pub use avd_runner_emulator_bridge::{AdbClient, BootWait, EmulatorLauncher};
}

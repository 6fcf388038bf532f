//! Android Emulator Bridge
//!
//! Lists Android Virtual Devices, picks one for a target API level, boots it
//! on a free console port and waits until Android reports boot completion.

pub mod avd;
pub mod emulator;
pub mod adb;
pub mod device;
pub mod process;

#[cfg(test)]
mod testing;

pub use avd::{AvdInfo, best_avd, normalize_target, parse_avd_list};
pub use emulator::{BootWait, EmulatorError, EmulatorLauncher, CHECK_BOOTED_INTERVAL};
pub use adb::{AdbClient, AdbError, DeviceBridge};
pub use device::{Device, DeviceState, DeviceType};
pub use process::{ProcessRunner, SystemProcessRunner};

/// Serial prefix `adb` gives emulator instances
pub const EMULATOR_SERIAL_PREFIX: &str = "emulator-";

/// Lowest emulator console port
pub const FIRST_CONSOLE_PORT: u16 = 5554;

/// Highest emulator console port
pub const LAST_CONSOLE_PORT: u16 = 5584;

/// `adb` serial of the emulator listening on `port`
pub fn emulator_serial(port: u16) -> String {
    format!("{}{}", EMULATOR_SERIAL_PREFIX, port)
}

/// Highest console port whose serial is not among `started`
///
/// Ports are scanned from 5584 down to 5554 in steps of two, the odd port
/// above each one being taken by the emulator's adb connection.
pub fn next_emulator_port<S: AsRef<str>>(started: &[S]) -> Option<u16> {
    (FIRST_CONSOLE_PORT..=LAST_CONSOLE_PORT)
        .rev()
        .step_by(2)
        .find(|port| {
            let serial = emulator_serial(*port);
            !started.iter().any(|s| s.as_ref() == serial)
        })
}

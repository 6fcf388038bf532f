//! Emulator Launcher
//!
//! Boots Android Virtual Devices and waits for them to come up.
//!
//! Starting an emulator is a fixed sequence: pick a free console port, spawn
//! `emulator -avd <name> -port <port>` detached, wait until `adb` can talk to
//! `emulator-<port>`, then poll `sys.boot_completed` until Android is up or
//! the boot budget runs out.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, debug};

use avd_runner_android_toolchain::{SdkTool, ToolLocator};
use avd_runner_core::{Event, EventBus, LogLevel};

use crate::adb::{filter_emulators, AdbError, DeviceBridge};
use crate::avd::{best_avd, normalize_target, parse_avd_list, AvdInfo};
use crate::process::ProcessRunner;
use crate::{emulator_serial, next_emulator_port};

/// Pause between two `sys.boot_completed` checks
pub const CHECK_BOOTED_INTERVAL: Duration = Duration::from_millis(3000);

/// Property set once the emulator's device object answers
const DEVICE_READY_PROP: &str = "dev.bootcomplete";

/// Property set once Android finished booting
const BOOT_COMPLETED_PROP: &str = "sys.boot_completed";

/// Wakes the screen and dismisses the keyguard
const UNLOCK_COMMAND: &str = "input keyevent 82";

/// Emulator errors
#[derive(Debug, thiserror::Error)]
pub enum EmulatorError {
    #[error("Could not find {tool} in your PATH. {hint}")]
    ToolNotFound { tool: SdkTool, hint: &'static str },
    #[error("Expected the name of an emulator image to start")]
    MissingAvdName,
    #[error("Could not find an available emulator port")]
    NoAvailablePort,
    #[error("Failed to start emulator: {0}")]
    StartFailed(String),
    #[error("`{command}` failed: {message}")]
    CommandFailed { command: String, message: String },
    #[error(transparent)]
    Adb(#[from] AdbError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl EmulatorError {
    fn tool_not_found(tool: SdkTool) -> Self {
        EmulatorError::ToolNotFound {
            tool,
            hint: tool.install_hint(),
        }
    }
}

/// How long to keep waiting for boot completion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootWait {
    /// Poll until the emulator boots
    Forever,
    /// Give up once this much time has been spent sleeping between checks
    Within(Duration),
}

impl BootWait {
    /// Milliseconds with the negative-means-forever convention
    pub fn from_millis(ms: i64) -> Self {
        match u64::try_from(ms) {
            Ok(ms) => BootWait::Within(Duration::from_millis(ms)),
            Err(_) => BootWait::Forever,
        }
    }

    /// Budget left after sleeping for `waited`
    fn after(self, waited: Duration) -> Self {
        match self {
            BootWait::Forever => BootWait::Forever,
            BootWait::Within(left) => BootWait::Within(left.saturating_sub(waited)),
        }
    }
}

impl From<Option<Duration>> for BootWait {
    fn from(timeout: Option<Duration>) -> Self {
        timeout.map_or(BootWait::Forever, BootWait::Within)
    }
}

/// Emulator launcher
///
/// Holds no state of its own: every call asks `adb` and `avdmanager` afresh.
pub struct EmulatorLauncher {
    bridge: Arc<dyn DeviceBridge>,
    runner: Arc<dyn ProcessRunner>,
    tools: ToolLocator,
    events: Arc<EventBus>,
}

impl EmulatorLauncher {
    /// Create a new emulator launcher
    pub fn new(
        bridge: Arc<dyn DeviceBridge>,
        runner: Arc<dyn ProcessRunner>,
        tools: ToolLocator,
        events: Arc<EventBus>,
    ) -> Self {
        Self {
            bridge,
            runner,
            tools,
            events,
        }
    }

    fn locate(&self, tool: SdkTool) -> Result<PathBuf, EmulatorError> {
        self.tools
            .find(tool)
            .ok_or_else(|| EmulatorError::tool_not_found(tool))
    }

    fn verbose(&self, message: String) {
        debug!("{}", message);
        self.events.log(LogLevel::Debug, message);
    }

    fn log(&self, message: String) {
        info!("{}", message);
        self.events.log(LogLevel::Info, message);
    }

    /// List all virtual device images known to `avdmanager`
    ///
    /// Targets reported only as "Android API N" are expanded to the full
    /// "Android <version> (API level N)" form when N is a known release.
    pub async fn list_images(&self) -> Result<Vec<AvdInfo>, EmulatorError> {
        let avdmanager = self.locate(SdkTool::AvdManager)?;
        let output = self.runner.output(&avdmanager, &["list", "avd"]).await?;

        let mut images = parse_avd_list(&output);
        for image in &mut images {
            if let Some(target) = image.target.as_deref().and_then(normalize_target) {
                image.target = Some(target);
            }
        }

        debug!("avdmanager listed {} images", images.len());
        Ok(images)
    }

    /// Best image for an app targeting `target_api`, `None` when there are no images
    pub async fn best_image(&self, target_api: u32) -> Result<Option<AvdInfo>, EmulatorError> {
        let images = self.list_images().await?;
        Ok(best_avd(&images, target_api).cloned())
    }

    /// Serials of running emulators
    pub async fn list_started(&self) -> Result<Vec<String>, EmulatorError> {
        let serials = self.bridge.devices().await?;
        Ok(filter_emulators(serials))
    }

    /// Highest console port no running emulator uses
    pub async fn get_available_port(&self) -> Result<u16, EmulatorError> {
        let started = self.list_started().await?;
        let port = next_emulator_port(&started).ok_or(EmulatorError::NoAvailablePort)?;

        self.verbose(format!("Found available port: {}", port));
        Ok(port)
    }

    /// Boot `avd_name` and wait for it
    ///
    /// Returns the emulator's serial once it has booted and been unlocked,
    /// or `None` if it did not finish booting within `boot_wait`. The
    /// emulator process is left running either way.
    pub async fn start(&self, avd_name: &str, boot_wait: BootWait) -> Result<Option<String>, EmulatorError> {
        if avd_name.is_empty() {
            return Err(EmulatorError::MissingAvdName);
        }

        let port = self.get_available_port().await?;

        // The emulator resolves some of its files relative to the working
        // directory, so run it from the directory it is installed in.
        let emulator = self.locate(SdkTool::Emulator)?;
        let emulator_dir = self
            .tools
            .find_dir(SdkTool::Emulator)
            .ok_or_else(|| EmulatorError::tool_not_found(SdkTool::Emulator))?;

        let args = vec![
            "-avd".to_string(),
            avd_name.to_string(),
            "-port".to_string(),
            port.to_string(),
        ];
        self.runner.spawn_detached(&emulator, &args, &emulator_dir).await?;
        self.events.emit(Event::EmulatorStarting {
            avd_name: avd_name.to_string(),
            port,
        });

        self.log("Waiting for emulator to start...".to_string());
        let serial = self.wait_for_emulator(port).await?;

        print!("Waiting for emulator to boot (this may take a while)...");
        let _ = std::io::stdout().flush();

        if !self.wait_for_boot(&serial, boot_wait).await? {
            info!("Emulator {} did not finish booting in time", serial);
            self.events.emit(Event::EmulatorBootTimedOut { serial });
            return Ok(None);
        }

        self.log("BOOT COMPLETE".to_string());
        self.events.emit(Event::EmulatorBooted { serial: serial.clone() });

        self.bridge.shell(&serial, UNLOCK_COMMAND).await?;
        Ok(Some(serial))
    }

    /// Wait until the emulator on `port` answers `adb`
    ///
    /// Errors `adb` prints while the emulator is still coming up are
    /// retried; there is no time limit.
    pub async fn wait_for_emulator(&self, port: u16) -> Result<String, EmulatorError> {
        let serial = emulator_serial(port);
        let command = format!("getprop {}", DEVICE_READY_PROP);

        loop {
            match self.bridge.shell(&serial, &command).await {
                Ok(output) if output.contains('1') => return Ok(serial),
                Ok(_) => {}
                Err(e) if e.is_transient() => debug!("{} not ready: {}", serial, e),
                Err(e) => return Err(e.into()),
            }
            tokio::task::yield_now().await;
        }
    }

    /// Poll `sys.boot_completed` until it is set or `remaining` runs out
    ///
    /// Returns `false` on timeout. A dot is printed to stdout for every
    /// check that comes back negative.
    pub async fn wait_for_boot(&self, serial: &str, mut remaining: BootWait) -> Result<bool, EmulatorError> {
        let command = format!("getprop {}", BOOT_COMPLETED_PROP);

        loop {
            let output = self.bridge.shell(serial, &command).await?;
            if output.contains('1') {
                return Ok(true);
            }

            let delay = match remaining {
                BootWait::Within(left) if left.is_zero() => return Ok(false),
                BootWait::Within(left) => left.min(CHECK_BOOTED_INTERVAL),
                BootWait::Forever => CHECK_BOOTED_INTERVAL,
            };

            print!(".");
            let _ = std::io::stdout().flush();

            tokio::time::sleep(delay).await;
            remaining = remaining.after(delay);
        }
    }
}

//! CLI commands for avd-runner
//!
//! One struct per subcommand, each printing its result to stdout.

use std::path::PathBuf;
use std::sync::Arc;
use anyhow::{anyhow, Result};
use tracing::{info, warn};

use avd_runner_android_toolchain::{SdkTool, ToolLocator};
use avd_runner_core::{AppConfig, Event, EventBus, EventSubscription};
use avd_runner_emulator_bridge::{AdbClient, AvdInfo, BootWait, EmulatorLauncher, SystemProcessRunner};

/// Launcher wired to the real SDK tools
pub struct Session {
    /// Launcher used by every command
    pub launcher: EmulatorLauncher,
    /// Effective configuration
    pub config: AppConfig,
    events: EventSubscription,
}

impl Session {
    /// Build a session, `sdk_override` taking precedence over the configured SDK
    pub fn new(mut config: AppConfig, sdk_override: Option<PathBuf>) -> Self {
        if sdk_override.is_some() {
            config.android.sdk_path = sdk_override;
        }

        let tools = ToolLocator::from_config(&config);
        if let Some(root) = tools.sdk_root() {
            info!("Using Android SDK at {:?}", root);
        }

        // A missing adb only matters to commands that talk to devices; they
        // report it when they first run it.
        let adb_path = tools
            .find(SdkTool::Adb)
            .unwrap_or_else(|| PathBuf::from(SdkTool::Adb.command()));

        let bus = Arc::new(EventBus::new());
        let events = bus.subscribe();
        let launcher = EmulatorLauncher::new(
            Arc::new(AdbClient::new(adb_path)),
            Arc::new(SystemProcessRunner),
            tools,
            bus,
        );

        Self { launcher, config, events }
    }

    fn boot_wait(&self, timeout_ms: Option<i64>) -> BootWait {
        BootWait::from_millis(timeout_ms.unwrap_or_else(|| self.config.boot_timeout_ms()))
    }
}

fn print_images(images: &[AvdInfo]) {
    for image in images {
        println!(
            "{:<32} {:<32} {}",
            image.name,
            image.target.as_deref().unwrap_or("-"),
            image.abi.as_deref().unwrap_or("-"),
        );
    }
}

/// `list`: every image avdmanager knows about
pub struct ListCommand {
    /// Print JSON instead of a table
    pub json: bool,
}

impl ListCommand {
    /// Execute the list command
    pub async fn execute(&self, session: &Session) -> Result<()> {
        let images = session.launcher.list_images().await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&images)?);
        } else if images.is_empty() {
            println!("No emulator images found");
        } else {
            print_images(&images);
        }
        Ok(())
    }
}

/// `best`: image closest to an API level
pub struct BestCommand {
    /// Target API level, the configured default when absent
    pub api: Option<u32>,
    /// Print JSON instead of a table
    pub json: bool,
}

impl BestCommand {
    /// Execute the best command
    pub async fn execute(&self, session: &Session) -> Result<()> {
        let api = self.api.unwrap_or(session.config.emulator.default_target_api);
        let best = session.launcher.best_image(api).await?;

        match (best, self.json) {
            (Some(image), true) => println!("{}", serde_json::to_string_pretty(&image)?),
            (Some(image), false) => print_images(std::slice::from_ref(&image)),
            (None, _) => return Err(anyhow!("No emulator images available")),
        }
        Ok(())
    }
}

/// `started`: serials of running emulators
pub struct StartedCommand;

impl StartedCommand {
    /// Execute the started command
    pub async fn execute(&self, session: &Session) -> Result<()> {
        for serial in session.launcher.list_started().await? {
            println!("{}", serial);
        }
        Ok(())
    }
}

/// `port`: next free console port
pub struct PortCommand;

impl PortCommand {
    /// Execute the port command
    pub async fn execute(&self, session: &Session) -> Result<()> {
        println!("{}", session.launcher.get_available_port().await?);
        Ok(())
    }
}

/// `start`: boot an image
pub struct StartCommand {
    /// Image to boot, the best image for `api` when absent
    pub avd: Option<String>,
    /// Target API level used to pick an image
    pub api: Option<u32>,
    /// Boot timeout in milliseconds, negative waits forever
    pub timeout_ms: Option<i64>,
}

impl StartCommand {
    /// Execute the start command
    pub async fn execute(&self, session: &Session) -> Result<()> {
        let avd = match &self.avd {
            Some(name) => name.clone(),
            None => {
                let api = self.api.unwrap_or(session.config.emulator.default_target_api);
                session
                    .launcher
                    .best_image(api)
                    .await?
                    .map(|image| image.name)
                    .ok_or_else(|| anyhow!("No emulator images available to start"))?
            }
        };

        let result = session.launcher.start(&avd, session.boot_wait(self.timeout_ms)).await?;
        println!();

        for event in session.events.drain() {
            if let Event::EmulatorStarting { avd_name, port } = event {
                info!("Started {} on port {}", avd_name, port);
            }
        }

        match result {
            Some(serial) => {
                println!("{}", serial);
                Ok(())
            }
            None => {
                warn!("Emulator {} is still booting", avd);
                Err(anyhow!("Timed out waiting for {} to boot", avd))
            }
        }
    }
}

/// `wait`: wait for an emulator started elsewhere
pub struct WaitCommand {
    /// Console port of the emulator
    pub port: u16,
    /// Boot timeout in milliseconds, negative waits forever
    pub timeout_ms: Option<i64>,
}

impl WaitCommand {
    /// Execute the wait command
    pub async fn execute(&self, session: &Session) -> Result<()> {
        let serial = session.launcher.wait_for_emulator(self.port).await?;
        let booted = session
            .launcher
            .wait_for_boot(&serial, session.boot_wait(self.timeout_ms))
            .await?;
        println!();

        if booted {
            println!("{}", serial);
            Ok(())
        } else {
            Err(anyhow!("Timed out waiting for {} to boot", serial))
        }
    }
}

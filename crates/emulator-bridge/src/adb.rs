//! ADB (Android Debug Bridge) Client
//!
//! Communicates with devices via ADB.

use std::path::PathBuf;
use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use avd_runner_android_toolchain::{SdkTool, ToolLocator};

use crate::device::{parse_device_list, Device};
use crate::EMULATOR_SERIAL_PREFIX;

/// `adb` failure messages printed while an emulator is still coming up
const TRANSIENT_MESSAGES: &[&str] = &[
    "not found",
    "device offline",
    "device still connecting",
    "device still authorizing",
];

/// ADB errors
#[derive(Debug, thiserror::Error)]
pub enum AdbError {
    #[error("ADB not found. {}", SdkTool::Adb.install_hint())]
    NotFound,
    #[error("ADB command failed: {0}")]
    CommandFailed(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AdbError {
    /// Whether the failure only means the device is not reachable yet
    pub fn is_transient(&self) -> bool {
        match self {
            AdbError::CommandFailed(message) => {
                TRANSIENT_MESSAGES.iter().any(|pattern| message.contains(pattern))
            }
            _ => false,
        }
    }
}

/// Connected-device operations the emulator launcher relies on
#[async_trait]
pub trait DeviceBridge: Send + Sync {
    /// Serials of every device `adb` knows about
    async fn devices(&self) -> Result<Vec<String>, AdbError>;

    /// Run a shell command on a device and return its output
    async fn shell(&self, serial: &str, command: &str) -> Result<String, AdbError>;
}

/// ADB Client
#[derive(Debug, Clone)]
pub struct AdbClient {
    adb_path: PathBuf,
}

impl AdbClient {
    /// Create a client for the `adb` executable at `adb_path`
    pub fn new(adb_path: PathBuf) -> Self {
        Self { adb_path }
    }

    /// Create a client for the `adb` the locator finds
    pub fn locate(tools: &ToolLocator) -> Result<Self, AdbError> {
        tools
            .find(SdkTool::Adb)
            .map(Self::new)
            .ok_or(AdbError::NotFound)
    }

    /// Run an ADB command
    async fn run(&self, args: &[&str]) -> Result<String, AdbError> {
        debug!("adb {:?}", args);

        let output = match Command::new(&self.adb_path).args(args).output().await {
            Ok(output) => output,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(AdbError::NotFound),
            Err(e) => return Err(e.into()),
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AdbError::CommandFailed(stderr.trim().to_string()));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    /// Run an ADB command for a specific device
    async fn run_for_device(&self, serial: &str, args: &[&str]) -> Result<String, AdbError> {
        let mut full_args = vec!["-s", serial];
        full_args.extend(args);
        self.run(&full_args).await
    }

    /// List connected devices
    pub async fn list_devices(&self) -> Result<Vec<Device>, AdbError> {
        let output = self.run(&["devices", "-l"]).await?;
        Ok(parse_device_list(&output))
    }

    /// Serials of running emulators
    pub async fn emulators(&self) -> Result<Vec<String>, AdbError> {
        let devices = self.list_devices().await?;
        Ok(devices
            .into_iter()
            .filter(|d| d.is_emulator())
            .map(|d| d.serial)
            .collect())
    }

    /// Get device property
    pub async fn get_prop(&self, serial: &str, prop: &str) -> Result<String, AdbError> {
        let output = self.shell(serial, &format!("getprop {}", prop)).await?;
        Ok(output.trim().to_string())
    }
}

#[async_trait]
impl DeviceBridge for AdbClient {
    async fn devices(&self) -> Result<Vec<String>, AdbError> {
        let devices = self.list_devices().await?;
        Ok(devices.into_iter().map(|d| d.serial).collect())
    }

    async fn shell(&self, serial: &str, command: &str) -> Result<String, AdbError> {
        self.run_for_device(serial, &["shell", command]).await
    }
}

/// Keep only emulator serials
pub fn filter_emulators(serials: Vec<String>) -> Vec<String> {
    serials
        .into_iter()
        .filter(|s| s.starts_with(EMULATOR_SERIAL_PREFIX))
        .collect()
}

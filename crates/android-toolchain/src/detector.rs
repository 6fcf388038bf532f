//! Tool Detection
//!
//! Finds the SDK command line tools: an explicit override first, then the
//! executable search path, then the usual layout of an SDK root.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;
use which::which;

use avd_runner_core::AppConfig;

/// SDK executables driven by avd-runner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SdkTool {
    /// `avdmanager`, lists virtual devices
    AvdManager,
    /// `emulator`, boots a virtual device
    Emulator,
    /// `adb`, the device bridge
    Adb,
}

impl SdkTool {
    /// Executable name as looked up on `$PATH`
    pub fn command(&self) -> &'static str {
        match self {
            SdkTool::AvdManager => "avdmanager",
            SdkTool::Emulator => "emulator",
            SdkTool::Adb => "adb",
        }
    }

    /// File name inside the SDK
    fn file_name(&self) -> String {
        if cfg!(windows) {
            match self {
                SdkTool::AvdManager => "avdmanager.bat".to_string(),
                other => format!("{}.exe", other.command()),
            }
        } else {
            self.command().to_string()
        }
    }

    /// Directories relative to the SDK root that may hold the tool
    fn sdk_dirs(&self) -> &'static [&'static [&'static str]] {
        match self {
            SdkTool::AvdManager => &[
                &["cmdline-tools", "latest", "bin"],
                &["tools", "bin"],
            ],
            SdkTool::Emulator => &[&["emulator"], &["tools"]],
            SdkTool::Adb => &[&["platform-tools"]],
        }
    }

    /// What to install when the tool is missing
    pub fn install_hint(&self) -> &'static str {
        match self {
            SdkTool::AvdManager => {
                "Ensure the Android SDK command line tools are installed and their `bin` directory is in your PATH"
            }
            SdkTool::Emulator => {
                "Install the `emulator` SDK package and add `$ANDROID_HOME/emulator` to your PATH"
            }
            SdkTool::Adb => {
                "Install the `platform-tools` SDK package and add `$ANDROID_HOME/platform-tools` to your PATH"
            }
        }
    }
}

impl fmt::Display for SdkTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.command())
    }
}

/// Resolves SDK tools to executable paths
#[derive(Debug, Clone)]
pub struct ToolLocator {
    sdk_root: Option<PathBuf>,
    overrides: HashMap<SdkTool, PathBuf>,
    path_lookup: bool,
}

impl Default for ToolLocator {
    fn default() -> Self {
        Self::new(None)
    }
}

impl ToolLocator {
    /// Create a locator, optionally falling back to an SDK root
    pub fn new(sdk_root: Option<PathBuf>) -> Self {
        Self {
            sdk_root,
            overrides: HashMap::new(),
            path_lookup: true,
        }
    }

    /// Create a locator from the application config
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.get_sdk_path())
    }

    /// Pin a tool to a fixed path, skipping every other lookup
    pub fn with_tool(mut self, tool: SdkTool, path: impl Into<PathBuf>) -> Self {
        self.overrides.insert(tool, path.into());
        self
    }

    /// Enable or disable the `$PATH` lookup
    pub fn with_path_lookup(mut self, enabled: bool) -> Self {
        self.path_lookup = enabled;
        self
    }

    /// SDK root used as fallback
    pub fn sdk_root(&self) -> Option<&Path> {
        self.sdk_root.as_deref()
    }

    /// Find a tool, `None` when it is nowhere to be found
    pub fn find(&self, tool: SdkTool) -> Option<PathBuf> {
        if let Some(path) = self.overrides.get(&tool) {
            return Some(path.clone());
        }

        if self.path_lookup {
            if let Ok(path) = which(tool.command()) {
                debug!("Found {} on PATH: {:?}", tool, path);
                return Some(path);
            }
        }

        let root = self.sdk_root.as_ref()?;
        let file_name = tool.file_name();
        let found = tool
            .sdk_dirs()
            .iter()
            .map(|parts| parts.iter().fold(root.clone(), |dir, part| dir.join(part)).join(&file_name))
            .find(|candidate| candidate.is_file());

        if let Some(ref path) = found {
            debug!("Found {} in SDK: {:?}", tool, path);
        }
        found
    }

    /// Directory holding a tool, with symlinks resolved
    pub fn find_dir(&self, tool: SdkTool) -> Option<PathBuf> {
        let path = self.find(tool)?;
        let resolved = std::fs::canonicalize(&path).unwrap_or(path);
        resolved.parent().map(Path::to_path_buf)
    }
}

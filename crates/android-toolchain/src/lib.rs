//! Android Toolchain
//!
//! Locates the SDK command line tools an emulator session needs and maps
//! Android platform versions to API levels.

pub mod detector;
pub mod versions;

pub use detector::{SdkTool, ToolLocator};
pub use versions::{AndroidVersion, api_level_for_version_string, ANDROID_VERSIONS};

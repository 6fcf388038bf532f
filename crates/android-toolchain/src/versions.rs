//! Android platform versions
//!
//! Static table of released platforms. `avdmanager` describes images by the
//! platform version it was built from ("Android 10.0"), `adb` and build files
//! speak in API levels; this table converts between the two.

use serde::Serialize;

/// One Android platform release
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AndroidVersion {
    /// API level, e.g. 29
    pub api_level: u32,
    /// Marketing version, e.g. "10"
    pub semver: &'static str,
    /// Version string as printed by `avdmanager list avd`, e.g. "10.0"
    pub platform_version: &'static str,
    /// Platform codename
    pub codename: &'static str,
}

macro_rules! version {
    ($api:expr, $semver:expr, $platform:expr, $codename:expr) => {
        AndroidVersion {
            api_level: $api,
            semver: $semver,
            platform_version: $platform,
            codename: $codename,
        }
    };
}

/// Known platform releases, ordered by API level
pub const ANDROID_VERSIONS: &[AndroidVersion] = &[
    version!(14, "4.0", "4.0", "IceCreamSandwich"),
    version!(15, "4.0.3", "4.0.3", "IceCreamSandwich"),
    version!(16, "4.1", "4.1", "JellyBean"),
    version!(17, "4.2", "4.2", "JellyBean"),
    version!(18, "4.3", "4.3", "JellyBean"),
    version!(19, "4.4", "4.4", "KitKat"),
    version!(20, "4.4W", "4.4W", "KitKatWatch"),
    version!(21, "5.0", "5.0", "Lollipop"),
    version!(22, "5.1", "5.1", "Lollipop"),
    version!(23, "6.0", "6.0", "Marshmallow"),
    version!(24, "7.0", "7.0", "Nougat"),
    version!(25, "7.1", "7.1.1", "Nougat"),
    version!(26, "8.0", "8.0", "Oreo"),
    version!(27, "8.1", "8.1", "Oreo"),
    version!(28, "9", "9.0", "Pie"),
    version!(29, "10", "10.0", "Q"),
    version!(30, "11", "11.0", "R"),
    version!(31, "12", "12.0", "S"),
    version!(32, "12L", "12L", "Sv2"),
    version!(33, "13", "13.0", "Tiramisu"),
    version!(34, "14", "14.0", "UpsideDownCake"),
    version!(35, "15", "15.0", "VanillaIceCream"),
];

impl AndroidVersion {
    /// Look up a release by API level
    pub fn by_api_level(api_level: u32) -> Option<&'static AndroidVersion> {
        ANDROID_VERSIONS.iter().find(|v| v.api_level == api_level)
    }

    /// Human readable description, e.g. "Android 10 (API level 29)"
    pub fn describe(&self) -> String {
        format!("Android {} (API level {})", self.semver, self.api_level)
    }
}

/// API level for a platform version string exactly as `avdmanager` prints it
pub fn api_level_for_version_string(version: &str) -> Option<u32> {
    ANDROID_VERSIONS
        .iter()
        .find(|v| v.platform_version == version)
        .map(|v| v.api_level)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_is_sorted_and_unique() {
        for pair in ANDROID_VERSIONS.windows(2) {
            assert!(pair[0].api_level < pair[1].api_level);
        }
    }

    #[test]
    fn test_by_api_level() {
        let q = AndroidVersion::by_api_level(29).unwrap();
        assert_eq!(q.semver, "10");
        assert_eq!(q.describe(), "Android 10 (API level 29)");
        assert!(AndroidVersion::by_api_level(9).is_none());
        assert!(AndroidVersion::by_api_level(99).is_none());
    }

    #[test]
    fn test_version_string_lookup() {
        assert_eq!(api_level_for_version_string("10.0"), Some(29));
        assert_eq!(api_level_for_version_string("7.1.1"), Some(25));
        assert_eq!(api_level_for_version_string("4.4W"), Some(20));
        assert_eq!(api_level_for_version_string("9.0"), Some(28));
        // lookup is exact
        assert_eq!(api_level_for_version_string("10"), None);
        assert_eq!(api_level_for_version_string("API 30"), None);
    }
}

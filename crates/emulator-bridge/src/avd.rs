//! AVD (Android Virtual Device) listing
//!
//! Parses `avdmanager list avd` and picks the image that best fits an API
//! level.
//!
//! `avdmanager` prints one block per image:
//!
//! ```text
//!     Name: Pixel_3a_API_29
//!   Device: pixel_3a (Google)
//!     Path: /home/dev/.android/avd/Pixel_3a_API_29.avd
//!   Target: Google APIs (Google Inc.)
//!           Based on: Android 10.0 (Q) Tag/ABI: google_apis/x86
//!     Skin: pixel_3a
//!   Sdcard: 512M
//! ---------
//! ```
//!
//! Every field but `Name` may be missing, and the older `android list avd`
//! layout puts `Tag/ABI` on its own line with the API level already in the
//! target.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use avd_runner_android_toolchain::{api_level_for_version_string, AndroidVersion};

/// `Label: value` lines
static FIELD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(Name|Device|Path|Target|Tag/ABI|ABI|Skin):\s(.*)$").expect("valid regex")
});

/// `Based on: Android 10.0 (Q) Tag/ABI: google_apis/x86`
static BASED_ON: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*Based on:\s*(.*?)\s*(?:Tag/ABI:\s*(\S*))?\s*$").expect("valid regex")
});

static API_LEVEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(API level (\d+)\)").expect("valid regex"));

static NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").expect("valid regex"));

/// One virtual device image
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AvdInfo {
    pub name: String,
    pub device: Option<String>,
    pub path: Option<String>,
    pub target: Option<String>,
    pub abi: Option<String>,
    pub skin: Option<String>,
}

impl AvdInfo {
    fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// API level from a "(API level N)" annotation on the target
    pub fn api_level(&self) -> Option<u32> {
        let target = self.target.as_deref()?;
        API_LEVEL.captures(target)?.get(1)?.as_str().parse().ok()
    }
}

/// Which line of an image block the parser expects next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    AwaitName,
    AwaitDevice,
    AwaitPath,
    AwaitTarget,
    /// Continuation of `Target`: a `Based on` or `Tag/ABI` line
    AwaitTargetDetail,
    AwaitSkin,
}

#[derive(Debug)]
enum Line<'a> {
    Field(&'a str, &'a str),
    BasedOn { platform: &'a str, abi: Option<&'a str> },
    Other,
}

impl<'a> Line<'a> {
    fn classify(line: &'a str) -> Self {
        if let Some(caps) = BASED_ON.captures(line) {
            let platform = caps.get(1).map_or("", |m| m.as_str());
            let abi = caps.get(2).map(|m| m.as_str()).filter(|s| !s.is_empty());
            return Line::BasedOn { platform, abi };
        }
        match FIELD.captures(line) {
            Some(caps) => match (caps.get(1), caps.get(2)) {
                (Some(label), Some(value)) => Line::Field(label.as_str(), value.as_str().trim()),
                _ => Line::Other,
            },
            None => Line::Other,
        }
    }
}

/// Line cursor over `avdmanager list avd` output
///
/// Fields after `Name` are taken only in order and only when the line
/// carries the expected label; any other line is handed on to the next
/// state, so absent fields are skipped and a stray `Name` starts a new
/// image.
#[derive(Debug)]
pub struct AvdListParser {
    state: ParseState,
    current: Option<AvdInfo>,
    images: Vec<AvdInfo>,
}

impl Default for AvdListParser {
    fn default() -> Self {
        Self::new()
    }
}

impl AvdListParser {
    pub fn new() -> Self {
        Self {
            state: ParseState::AwaitName,
            current: None,
            images: Vec::new(),
        }
    }

    /// Consume one line of output
    pub fn feed(&mut self, line: &str) {
        let line = Line::classify(line.trim_end_matches('\r'));

        loop {
            match (self.state, &line) {
                (ParseState::AwaitName, Line::Field("Name", name)) => {
                    self.current = Some(AvdInfo::named(name));
                    self.state = ParseState::AwaitDevice;
                    return;
                }
                (ParseState::AwaitName, _) => return,

                (ParseState::AwaitDevice, Line::Field("Device", value)) => {
                    self.set(|avd| avd.device = Some(value.to_string()));
                    self.state = ParseState::AwaitPath;
                    return;
                }
                (ParseState::AwaitDevice, _) => self.state = ParseState::AwaitPath,

                (ParseState::AwaitPath, Line::Field("Path", value)) => {
                    self.set(|avd| avd.path = Some(value.to_string()));
                    self.state = ParseState::AwaitTarget;
                    return;
                }
                (ParseState::AwaitPath, _) => self.state = ParseState::AwaitTarget,

                (ParseState::AwaitTarget, Line::Field("Target", value)) => {
                    self.set(|avd| avd.target = Some(value.to_string()));
                    self.state = ParseState::AwaitTargetDetail;
                    return;
                }
                (ParseState::AwaitTarget, _) => self.state = ParseState::AwaitSkin,

                (ParseState::AwaitTargetDetail, Line::BasedOn { platform, abi }) => {
                    let target = based_on_target(platform);
                    self.set(|avd| {
                        avd.target = Some(target);
                        if let Some(abi) = abi {
                            avd.abi = Some(abi.to_string());
                        }
                    });
                    self.state = ParseState::AwaitSkin;
                    return;
                }
                (ParseState::AwaitTargetDetail, Line::Field("Tag/ABI" | "ABI", value)) => {
                    self.set(|avd| avd.abi = Some(value.to_string()));
                    self.state = ParseState::AwaitSkin;
                    return;
                }
                (ParseState::AwaitTargetDetail, _) => self.state = ParseState::AwaitSkin,

                (ParseState::AwaitSkin, Line::Field("Skin", value)) => {
                    self.set(|avd| avd.skin = Some(value.to_string()));
                    self.flush();
                    return;
                }
                (ParseState::AwaitSkin, _) => self.flush(),
            }
        }
    }

    /// Finish parsing and return the images in output order
    pub fn finish(mut self) -> Vec<AvdInfo> {
        self.flush();
        self.images
    }

    fn set(&mut self, update: impl FnOnce(&mut AvdInfo)) {
        if let Some(avd) = self.current.as_mut() {
            update(avd);
        }
    }

    fn flush(&mut self) {
        if let Some(avd) = self.current.take() {
            self.images.push(avd);
        }
        self.state = ParseState::AwaitName;
    }
}

/// Parse the full output of `avdmanager list avd`
pub fn parse_avd_list(output: &str) -> Vec<AvdInfo> {
    let mut parser = AvdListParser::new();
    for line in output.lines() {
        parser.feed(line);
    }
    parser.finish()
}

/// Target text from a `Based on:` platform description
///
/// "Android 10.0 (Q)" becomes "Android 10.0 (API level 29)"; platforms the
/// version table does not know keep the text without the codename.
fn based_on_target(platform: &str) -> String {
    let platform = match platform.find('(') {
        Some(idx) => platform[..idx].trim(),
        None => platform.trim(),
    };

    let version = platform.trim_start_matches("Android").trim();
    match api_level_for_version_string(version) {
        Some(level) => format!("{} (API level {})", platform, level),
        None => platform.to_string(),
    }
}

/// Rewrite "Android API N" targets to "Android <version> (API level N)"
///
/// Returns `None` when the target needs no rewrite or N is not a known
/// release.
pub fn normalize_target(target: &str) -> Option<String> {
    if !target.contains("Android API") || target.contains("API level") {
        return None;
    }

    let api_level: u32 = NUMBER.find(target)?.as_str().parse().ok()?;
    AndroidVersion::by_api_level(api_level).map(|v| v.describe())
}

/// Image to boot for an app targeting `target_api`
///
/// An exact API level match wins. Otherwise the closest level below the
/// target is used, and when every annotated image is newer the first image
/// listed is returned. Images without an "(API level N)" target only count
/// as that first-image fallback.
pub fn best_avd(images: &[AvdInfo], target_api: u32) -> Option<&AvdInfo> {
    let mut best = images.first()?;
    let mut closest = u32::MAX;

    for image in images {
        let Some(level) = image.api_level() else {
            continue;
        };

        if level == target_api {
            return Some(image);
        }
        if level < target_api && target_api - level < closest {
            closest = target_api - level;
            best = image;
        }
    }

    Some(best)
}

#[cfg(test)]
mod tests {
    use super::*;

    const AVDMANAGER_OUTPUT: &str = "\
Available Android Virtual Devices:
    Name: Pixel_3a_API_29
  Device: pixel_3a (Google)
    Path: /home/dev/.android/avd/Pixel_3a_API_29.avd
  Target: Google APIs (Google Inc.)
          Based on: Android 10.0 (Q) Tag/ABI: google_apis/x86
    Skin: pixel_3a
  Sdcard: 512M
---------
    Name: Nexus_5X_API_28
  Device: Nexus 5X (Google)
    Path: /home/dev/.android/avd/Nexus_5X_API_28.avd
  Target: Google Play (Google Inc.)
          Based on: Android 9.0 (Pie) Tag/ABI: google_apis_playstore/x86
---------
    Name: Preview
    Path: /home/dev/.android/avd/Preview.avd
  Target: Google APIs (Google Inc.)
          Based on: Android API 30 Tag/ABI: google_apis/x86_64
";

    fn image(name: &str, target: Option<&str>) -> AvdInfo {
        AvdInfo {
            name: name.into(),
            target: target.map(Into::into),
            ..Default::default()
        }
    }

    #[test]
    fn test_parse_avdmanager_output() {
        let images = parse_avd_list(AVDMANAGER_OUTPUT);
        assert_eq!(images.len(), 3);

        assert_eq!(
            images[0],
            AvdInfo {
                name: "Pixel_3a_API_29".into(),
                device: Some("pixel_3a (Google)".into()),
                path: Some("/home/dev/.android/avd/Pixel_3a_API_29.avd".into()),
                target: Some("Android 10.0 (API level 29)".into()),
                abi: Some("google_apis/x86".into()),
                skin: Some("pixel_3a".into()),
            }
        );

        assert_eq!(images[1].name, "Nexus_5X_API_28");
        assert_eq!(images[1].target.as_deref(), Some("Android 9.0 (API level 28)"));
        assert_eq!(images[1].skin, None);

        assert_eq!(images[2].device, None);
        assert_eq!(images[2].target.as_deref(), Some("Android API 30"));
        assert_eq!(images[2].abi.as_deref(), Some("google_apis/x86_64"));
    }

    #[test]
    fn test_parse_is_repeatable() {
        assert_eq!(parse_avd_list(AVDMANAGER_OUTPUT), parse_avd_list(AVDMANAGER_OUTPUT));
    }

    #[test]
    fn test_crlf_line_endings() {
        let output = AVDMANAGER_OUTPUT.replace('\n', "\r\n");
        assert_eq!(parse_avd_list(&output), parse_avd_list(AVDMANAGER_OUTPUT));
    }

    #[test]
    fn test_legacy_android_list_layout() {
        let output = "\
Available Android Virtual Devices:
    Name: KitKat
    Path: /home/dev/.android/avd/KitKat.avd
  Target: Android 4.4.2 (API level 19)
 Tag/ABI: default/armeabi-v7a
    Skin: WVGA800
";
        let images = parse_avd_list(output);
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].target.as_deref(), Some("Android 4.4.2 (API level 19)"));
        assert_eq!(images[0].abi.as_deref(), Some("default/armeabi-v7a"));
        assert_eq!(images[0].skin.as_deref(), Some("WVGA800"));
        assert_eq!(images[0].api_level(), Some(19));
    }

    #[test]
    fn test_name_only_records() {
        let output = "    Name: first\n    Name: second\n    Skin: small\n";
        let images = parse_avd_list(output);
        assert_eq!(images.len(), 2);
        assert_eq!(images[0], image("first", None));
        assert_eq!(images[1].name, "second");
        assert_eq!(images[1].skin.as_deref(), Some("small"));
    }

    #[test]
    fn test_fields_out_of_order_are_not_taken() {
        // Path after Target belongs to nobody
        let output = "    Name: odd\n  Target: Android 11.0\n    Path: /tmp/odd.avd\n";
        let images = parse_avd_list(output);
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].target.as_deref(), Some("Android 11.0"));
        assert_eq!(images[0].path, None);
    }

    #[test]
    fn test_no_images() {
        assert!(parse_avd_list("Available Android Virtual Devices:\n").is_empty());
        assert!(parse_avd_list("").is_empty());
    }

    #[test]
    fn test_based_on_unknown_version() {
        assert_eq!(based_on_target("Android 99.0 (Future)"), "Android 99.0");
        assert_eq!(based_on_target("Android 7.1.1 (Nougat)"), "Android 7.1.1 (API level 25)");
    }

    #[test]
    fn test_normalize_target() {
        assert_eq!(
            normalize_target("Android API 29").as_deref(),
            Some("Android 10 (API level 29)")
        );
        assert_eq!(normalize_target("Android API 999"), None);
        assert_eq!(normalize_target("Android 10.0 (API level 29)"), None);
        assert_eq!(normalize_target("Google APIs (Google Inc.)"), None);
    }

    #[test]
    fn test_best_avd_prefers_nearest_below() {
        let images = vec![
            image("api21", Some("Android 5.0 (API level 21)")),
            image("api23", Some("Android 6.0 (API level 23)")),
            image("api28", Some("Android 9.0 (API level 28)")),
        ];

        assert_eq!(best_avd(&images, 25).unwrap().name, "api23");
        assert_eq!(best_avd(&images, 23).unwrap().name, "api23");
        assert_eq!(best_avd(&images, 10).unwrap().name, "api21");
        assert_eq!(best_avd(&images, 34).unwrap().name, "api28");
    }

    #[test]
    fn test_best_avd_fallback_is_first_listed() {
        let images = vec![
            image("untagged", Some("Google APIs (Google Inc.)")),
            image("api30", Some("Android 11 (API level 30)")),
        ];
        assert_eq!(best_avd(&images, 29).unwrap().name, "untagged");
        assert_eq!(best_avd(&images, 31).unwrap().name, "api30");
    }

    #[test]
    fn test_best_avd_empty() {
        assert!(best_avd(&[], 29).is_none());
    }
}

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static CHROME_VERSION_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Chrome/(\d+)").expect("Invalid regex pattern"));

/// Browser family as far as the user-agent string tells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BrowserFamily {
    Chrome,
    Edge,
    Firefox,
    Safari,
    Unknown,
}

impl BrowserFamily {
    /// Classify a user-agent string.
    ///
    /// Edge and Chrome both advertise `Chrome/`, Chrome and Safari both
    /// advertise `Safari/`, so the checks run from most to least specific.
    pub fn detect(user_agent: &str) -> Self {
        if user_agent.contains("Edg") {
            BrowserFamily::Edge
        } else if user_agent.contains("Chrome") {
            BrowserFamily::Chrome
        } else if user_agent.contains("Firefox") {
            BrowserFamily::Firefox
        } else if user_agent.contains("Safari") {
            BrowserFamily::Safari
        } else {
            BrowserFamily::Unknown
        }
    }

    /// Only Chrome ships the built-in AI capability provider
    pub fn is_supported(&self) -> bool {
        matches!(self, BrowserFamily::Chrome)
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            BrowserFamily::Chrome => "Chrome",
            BrowserFamily::Edge => "Microsoft Edge",
            BrowserFamily::Firefox => "Mozilla Firefox",
            BrowserFamily::Safari => "Safari",
            BrowserFamily::Unknown => "Unknown",
        }
    }
}

/// Major version from the `Chrome/<n>` token, if any
pub fn chrome_version(user_agent: &str) -> Option<u32> {
    CHROME_VERSION_REGEX
        .captures(user_agent)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<u32>().ok())
}

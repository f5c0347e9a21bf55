/// User-tunable settings and fixed extension constants
use serde::{Deserialize, Serialize};

/// `chrome.storage.local` key holding the tab log snapshot
pub const LOGS_STORAGE_KEY: &str = "tabLogs";

/// `chrome.storage.local` key holding [`Settings`]
pub const SETTINGS_STORAGE_KEY: &str = "settings";

/// Name of the long-lived dashboard connection
pub const DASHBOARD_PORT_NAME: &str = "options";

/// Column headers cut URLs down to this many characters
pub const URL_DISPLAY_LIMIT: usize = 80;

/// Chat sites the dashboard broadcasts into
pub const DEFAULT_CHAT_PATTERNS: [&str; 5] = [
    "*://chatgpt.com/*",
    "*://claude.ai/*",
    "*://grok.com/*",
    "*://gemini.google.com/*",
    "*://chat.deepseek.com/*",
];

/// Settings stored under [`SETTINGS_STORAGE_KEY`]
///
/// Every field falls back to its default, so partial or older records still load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Delay before a content script sends its pending batch
    pub flush_delay_ms: u32,
    /// Dashboard auto-refresh interval while no push port is open
    pub poll_interval_ms: u32,
    /// Dashboard polling interval after the push port drops
    pub fallback_poll_interval_ms: u32,
    pub scroll_edge_tolerance_px: f64,
    pub flash_duration_ms: u32,
    /// Minimum spacing between live broadcasts of typed text
    pub input_throttle_ms: u32,
    pub auto_refresh: bool,
    pub chat_patterns: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            flush_delay_ms: 1000,
            poll_interval_ms: 1500,
            fallback_poll_interval_ms: 2000,
            scroll_edge_tolerance_px: 24.0,
            flash_duration_ms: 900,
            input_throttle_ms: 120,
            auto_refresh: true,
            chat_patterns: DEFAULT_CHAT_PATTERNS.iter().map(|p| p.to_string()).collect(),
        }
    }
}

impl Settings {
    /// Decode a stored settings record, returning defaults if it is missing or malformed.
    pub fn from_stored(value: Option<serde_json::Value>) -> Settings {
        value
            .and_then(|v| match serde_json::from_value(v) {
                Ok(settings) => Some(settings),
                Err(e) => {
                    log::warn!("Ignoring malformed settings record: {}", e);
                    None
                }
            })
            .unwrap_or_default()
    }
}

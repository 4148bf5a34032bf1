/// Runtime configuration for Link Monetizer
use serde::{Deserialize, Serialize};

/// chrome.storage.local key holding the serialized `StorageData`
pub const STORAGE_KEY: &str = "link_monetizer_data";

/// Oldest conversions are dropped past this many entries
pub const HISTORY_LIMIT: usize = 500;

/// Used when a history request does not name a limit
pub const DEFAULT_RECENT_LIMIT: usize = 10;

/// Rows in each leaderboard returned with the conversion stats
pub const TOP_STATS_LIMIT: usize = 5;

/// Timings for the in-page scanner, overridable from the content script loader
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScannerConfig {
    /// Wait after a paste so the browser finishes inserting the text
    pub paste_delay_ms: i32,
    /// Quiet period before an edited element is rescanned
    pub input_debounce_ms: i32,
    pub notification_ms: i32,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        ScannerConfig {
            paste_delay_ms: 100,
            input_debounce_ms: 500,
            notification_ms: 2000,
        }
    }
}

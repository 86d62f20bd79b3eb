/// The extension's settings record in chrome.storage.local
use serde::{Deserialize, Serialize};

use crate::pipeline::DEFAULT_BATCH_SIZE;

/// Storage key of the settings record
pub const SETTINGS_KEY: &str = "extension_settings";

pub const SETTINGS_VERSION: &str = "1.0.0";

/// User settings, written with defaults on first install
///
/// Fields missing from a stored record read as their defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ExtensionSettings {
    /// List sites as soon as the popup opens
    pub auto_refresh: bool,
    /// Notify after a context-menu deletion
    pub show_notifications: bool,
    pub batch_size: usize,
    pub version: String,
}

impl ExtensionSettings {
    pub fn new() -> Self {
        ExtensionSettings {
            auto_refresh: true,
            show_notifications: true,
            batch_size: DEFAULT_BATCH_SIZE,
            version: SETTINGS_VERSION.to_string(),
        }
    }

    /// Batch size to run the pipeline with; zero means the default
    pub fn effective_batch_size(&self) -> usize {
        if self.batch_size == 0 {
            DEFAULT_BATCH_SIZE
        } else {
            self.batch_size
        }
    }

    /// Parse a stored record, falling back to defaults when absent or unreadable
    pub fn from_stored(stored: Option<serde_json::Value>) -> Self {
        match stored {
            Some(value) if !value.is_null() => serde_json::from_value(value).unwrap_or_else(|e| {
                log::warn!("Ignoring unreadable settings: {}", e);
                Self::new()
            }),
            _ => Self::new(),
        }
    }
}

impl Default for ExtensionSettings {
    fn default() -> Self {
        Self::new()
    }
}

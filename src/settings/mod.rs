//! Durable user settings.
//!
//! Settings are primitive key-value pairs stored as an XML property list at
//! `~/.eyebreak/settings.plist`:
//!
//! | key             | type    |
//! |-----------------|---------|
//! | `workInterval`  | seconds |
//! | `breakInterval` | seconds |
//! | `totalBreaks`   | integer |
//! | `mediaBookmark` | data    |

mod error;

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::bookmark::BookmarkToken;
use crate::types::BreakConfig;

pub use error::SettingsError;

/// Settings directory name under the home directory.
pub const SETTINGS_DIR: &str = ".eyebreak";

/// Settings file name.
pub const SETTINGS_FILE: &str = "settings.plist";

/// Persisted settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Work interval in seconds
    pub work_interval: u32,
    /// Break interval in seconds
    pub break_interval: u32,
    /// Completed (non-skipped) breaks
    pub total_breaks: u64,
    /// Persisted media bookmark
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_bookmark: Option<plist::Data>,
}

impl Default for Settings {
    fn default() -> Self {
        let config = BreakConfig::default();
        Self {
            work_interval: config.work_seconds,
            break_interval: config.break_seconds,
            total_breaks: 0,
            media_bookmark: None,
        }
    }
}

impl Settings {
    /// Returns the interval configuration, clamped to the valid ranges.
    #[must_use]
    pub fn config(&self) -> BreakConfig {
        BreakConfig::default()
            .with_work_seconds(self.work_interval)
            .with_break_seconds(self.break_interval)
            .clamped()
    }

    /// Stores the interval configuration.
    pub fn set_config(&mut self, config: &BreakConfig) {
        self.work_interval = config.work_seconds;
        self.break_interval = config.break_seconds;
    }

    /// Returns the persisted bookmark token, if any.
    #[must_use]
    pub fn bookmark(&self) -> Option<BookmarkToken> {
        self.media_bookmark
            .clone()
            .map(|data| BookmarkToken::new(data.into()))
    }

    /// Replaces or clears the persisted bookmark token.
    pub fn set_bookmark(&mut self, token: Option<&BookmarkToken>) {
        self.media_bookmark = token.map(|t| plist::Data::new(t.as_bytes().to_vec()));
    }

    /// Clamps out-of-range intervals, logging each correction.
    #[must_use]
    pub fn clamped(mut self) -> Self {
        let config = self.config();
        if config.work_seconds != self.work_interval {
            warn!(
                "workInterval {}s out of range, using {}s",
                self.work_interval, config.work_seconds
            );
        }
        if config.break_seconds != self.break_interval {
            warn!(
                "breakInterval {}s out of range, using {}s",
                self.break_interval, config.break_seconds
            );
        }
        self.set_config(&config);
        self
    }
}

/// Trait for settings persistence implementations.
pub trait SettingsStore: Send + Sync {
    /// Loads the settings. A missing store yields defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if stored settings exist but cannot be read.
    fn load(&self) -> Result<Settings, SettingsError>;

    /// Saves the settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings cannot be written.
    fn save(&self, settings: &Settings) -> Result<(), SettingsError>;
}

// ============================================================================
// PlistSettingsStore
// ============================================================================

/// Settings stored as an XML property list.
#[derive(Debug, Clone)]
pub struct PlistSettingsStore {
    path: PathBuf,
}

impl PlistSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the default settings path, `~/.eyebreak/settings.plist`.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError::HomeDirectoryNotFound` if there is no home directory.
    pub fn default_path() -> Result<PathBuf, SettingsError> {
        let home_dir = dirs::home_dir().ok_or(SettingsError::HomeDirectoryNotFound)?;
        Ok(home_dir.join(SETTINGS_DIR).join(SETTINGS_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for PlistSettingsStore {
    fn load(&self) -> Result<Settings, SettingsError> {
        if !self.path.exists() {
            debug!("No settings file at {}, using defaults", self.path.display());
            return Ok(Settings::default());
        }
        let settings: Settings = plist::from_file(&self.path).map_err(SettingsError::Read)?;
        Ok(settings.clamped())
    }

    fn save(&self, settings: &Settings) -> Result<(), SettingsError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(SettingsError::DirectoryCreation)?;
        }
        plist::to_file_xml(&self.path, settings).map_err(|e| SettingsError::Write(e.to_string()))
    }
}

// ============================================================================
// MemorySettingsStore
// ============================================================================

/// In-memory settings store for testing.
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    settings: Mutex<Settings>,
    save_calls: AtomicUsize,
    fail_save: AtomicBool,
}

impl MemorySettingsStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_settings(settings: Settings) -> Self {
        Self {
            settings: Mutex::new(settings),
            ..Self::default()
        }
    }

    /// Returns a copy of the last saved settings.
    #[must_use]
    pub fn current(&self) -> Settings {
        self.settings.lock().unwrap().clone()
    }

    #[must_use]
    pub fn save_count(&self) -> usize {
        self.save_calls.load(Ordering::SeqCst)
    }

    pub fn set_fail_save(&self, fail: bool) {
        self.fail_save.store(fail, Ordering::SeqCst);
    }
}

impl SettingsStore for MemorySettingsStore {
    fn load(&self) -> Result<Settings, SettingsError> {
        Ok(self.current().clamped())
    }

    fn save(&self, settings: &Settings) -> Result<(), SettingsError> {
        if self.fail_save.load(Ordering::SeqCst) {
            return Err(SettingsError::Write("Mock failure".to_string()));
        }
        self.save_calls.fetch_add(1, Ordering::SeqCst);
        *self.settings.lock().unwrap() = settings.clone();
        Ok(())
    }
}

//! EyeBreak Library
//!
//! This library provides the core functionality for the EyeBreak CLI.
//! It includes:
//! - Timer engine alternating work periods and breaks, robust to system sleep
//! - Playlist resolution from a selected location, a bookmark, or defaults
//! - Access grants and persistent bookmarks for user-chosen media
//! - Suppression of competing media playback during breaks
//! - Settings persistence as a property list
//! - IPC server/client for daemon-CLI communication
//! - CLI command parsing and display utilities

pub mod access;
pub mod bookmark;
pub mod cli;
pub mod daemon;
pub mod media;
pub mod playlist;
pub mod settings;
pub mod types;

// Re-export commonly used types for convenience
pub use types::{
    BreakConfig, IpcRequest, IpcResponse, ResponseData, StatusSnapshot, SystemSignal, TimerState,
};

pub use access::{AccessError, AccessGrant, AccessProvider, GrantLedger};
pub use bookmark::{BookmarkError, BookmarkStore, BookmarkToken};
pub use daemon::{EngineHandle, EngineRequest, TimerEngine, TimerEvent};
pub use media::{MediaError, MediaSuppressor};
pub use playlist::{BreakMedia, MediaKind, Playlist, PlaylistError, PlaylistResolver};
pub use settings::{Settings, SettingsError, SettingsStore};

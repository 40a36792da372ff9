//! Playlist resolution error types.
//!
//! These errors describe a single candidate location. They are logged and
//! the resolver moves on; none of them aborts resolution as a whole.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while collecting media from one location.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlaylistError {
    /// A directory could not be listed.
    #[error("フォルダの読み込みに失敗しました: {}: {reason}", .path.display())]
    ListFailed {
        /// The directory
        path: PathBuf,
        /// Underlying cause
        reason: String,
    },

    /// A file could neither be granted nor read.
    #[error("ファイルを開けませんでした: {}: {reason}", .path.display())]
    Unreachable {
        /// The file
        path: PathBuf,
        /// Underlying cause
        reason: String,
    },
}

impl PlaylistError {
    /// Returns the location the error refers to.
    #[must_use]
    pub fn path(&self) -> &PathBuf {
        match self {
            Self::ListFailed { path, .. } | Self::Unreachable { path, .. } => path,
        }
    }
}

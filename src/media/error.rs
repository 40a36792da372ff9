//! Media suppression error types.

use thiserror::Error;

/// Errors that can occur while controlling other applications' playback.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MediaError {
    /// The play/pause toggle could not be delivered.
    #[error("再生/一時停止の切り替えに失敗しました: {0}")]
    ToggleFailed(String),

    /// Playback state could not be queried.
    #[error("再生状態を取得できませんでした: {0}")]
    QueryFailed(String),
}

impl MediaError {
    /// Returns true if the toggle itself failed.
    #[must_use]
    pub fn is_toggle_error(&self) -> bool {
        matches!(self, Self::ToggleFailed(_))
    }

    /// Returns a user-friendly suggestion for resolving this error.
    #[must_use]
    pub fn suggestion(&self) -> &'static str {
        match self {
            Self::ToggleFailed(_) => "アクセシビリティの権限を確認してください",
            Self::QueryFailed(_) => "メディアアプリを手動で一時停止してください",
        }
    }
}

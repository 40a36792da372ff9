//! Access grant error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur when acquiring an access grant.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AccessError {
    /// The location is not currently grantable (sandbox refused, or unreadable).
    #[error("アクセスが許可されていません: {}", .0.display())]
    Denied(PathBuf),

    /// The location does not exist on disk.
    #[error("場所が見つかりません: {}", .0.display())]
    NotFound(PathBuf),
}

impl AccessError {
    /// Returns the location the error refers to.
    #[must_use]
    pub fn path(&self) -> &PathBuf {
        match self {
            Self::Denied(path) | Self::NotFound(path) => path,
        }
    }

    /// Returns true if the location was refused rather than missing.
    #[must_use]
    pub fn is_denied(&self) -> bool {
        matches!(self, Self::Denied(_))
    }

    /// Returns a user-friendly suggestion for resolving this error.
    #[must_use]
    pub fn suggestion(&self) -> &'static str {
        match self {
            Self::Denied(_) => "メディアをもう一度選択してアクセスを許可してください",
            Self::NotFound(_) => "ファイルが移動または削除されていないか確認してください",
        }
    }
}

//! Bookmark error types.

use thiserror::Error;

/// Errors that can occur when persisting or resolving a bookmark.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BookmarkError {
    /// The bookmark could not be created or saved.
    #[error("ブックマークの保存に失敗しました: {0}")]
    Persist(String),

    /// The bookmark token is invalid or unreadable.
    #[error("ブックマークの解決に失敗しました: {0}")]
    Resolve(String),
}

impl BookmarkError {
    #[must_use]
    pub fn is_persist(&self) -> bool {
        matches!(self, Self::Persist(_))
    }

    #[must_use]
    pub fn is_resolve(&self) -> bool {
        matches!(self, Self::Resolve(_))
    }

    /// Returns a user-friendly suggestion for resolving this error.
    #[must_use]
    pub fn suggestion(&self) -> &'static str {
        match self {
            Self::Persist(_) => "選択は今回のセッションのみ有効です。再起動後にもう一度選択してください",
            Self::Resolve(_) => "保存されたメディアを読み込めません。メディアを再選択してください",
        }
    }
}

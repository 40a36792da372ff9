//! Settings persistence error types.

use std::io;

use thiserror::Error;

/// Errors that can occur while loading or saving settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// Home directory not found.
    #[error("ホームディレクトリを取得できませんでした")]
    HomeDirectoryNotFound,

    /// Failed to create the settings directory.
    #[error("設定ディレクトリの作成に失敗しました: {0}")]
    DirectoryCreation(#[source] io::Error),

    /// Failed to read or parse the settings file.
    #[error("設定ファイルの読み込みに失敗しました: {0}")]
    Read(#[source] plist::Error),

    /// Failed to write the settings file.
    #[error("設定ファイルの書き込みに失敗しました: {0}")]
    Write(String),
}

impl SettingsError {
    /// Returns true if the settings file exists but could not be read.
    #[must_use]
    pub fn is_read_error(&self) -> bool {
        matches!(self, Self::Read(_))
    }

    /// Returns a user-friendly suggestion for resolving this error.
    #[must_use]
    pub fn suggestion(&self) -> &'static str {
        match self {
            Self::HomeDirectoryNotFound => "HOME環境変数を確認してください",
            Self::DirectoryCreation(_) => "~/.eyebreak の権限を確認してください",
            Self::Read(_) => "設定ファイルを削除すると初期設定に戻ります",
            Self::Write(_) => "ディスクの空き容量と権限を確認してください",
        }
    }
}

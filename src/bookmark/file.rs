//! Portable bookmarks backed by file identity.
//!
//! The token is a small JSON record holding the canonical path and, on unix,
//! the device and inode of the target. Resolving a token whose path now holds
//! a different file, or no file at all, reports the bookmark as stale.

use std::fs::Metadata;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::BookmarkError;
use super::{BookmarkStore, BookmarkToken, ResolvedBookmark};

/// Current token format version.
const TOKEN_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct FileIdentity {
    device: u64,
    inode: u64,
}

impl FileIdentity {
    #[cfg(unix)]
    fn of(metadata: &Metadata) -> Option<Self> {
        use std::os::unix::fs::MetadataExt;
        Some(Self {
            device: metadata.dev(),
            inode: metadata.ino(),
        })
    }

    #[cfg(not(unix))]
    fn of(_metadata: &Metadata) -> Option<Self> {
        None
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct TokenRecord {
    version: u32,
    path: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    identity: Option<FileIdentity>,
}

/// Bookmark store for platforms without sandboxed bookmarks.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileBookmarks;

impl FileBookmarks {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl BookmarkStore for FileBookmarks {
    fn persist(&self, path: &Path) -> Result<BookmarkToken, BookmarkError> {
        let canonical = path
            .canonicalize()
            .map_err(|e| BookmarkError::Persist(format!("{}: {}", path.display(), e)))?;
        let metadata = std::fs::metadata(&canonical)
            .map_err(|e| BookmarkError::Persist(format!("{}: {}", canonical.display(), e)))?;

        let record = TokenRecord {
            version: TOKEN_VERSION,
            identity: FileIdentity::of(&metadata),
            path: canonical,
        };

        let bytes =
            serde_json::to_vec(&record).map_err(|e| BookmarkError::Persist(e.to_string()))?;
        Ok(BookmarkToken::new(bytes))
    }

    fn resolve(&self, token: &BookmarkToken) -> Result<ResolvedBookmark, BookmarkError> {
        let record: TokenRecord = serde_json::from_slice(token.as_bytes())
            .map_err(|e| BookmarkError::Resolve(e.to_string()))?;

        if record.version != TOKEN_VERSION {
            return Err(BookmarkError::Resolve(format!(
                "unsupported token version {}",
                record.version
            )));
        }

        let stale = match std::fs::metadata(&record.path) {
            Ok(metadata) => match (record.identity, FileIdentity::of(&metadata)) {
                (Some(saved), Some(current)) => saved != current,
                _ => false,
            },
            Err(e) => {
                debug!("Bookmark target unavailable: {}: {}", record.path.display(), e);
                true
            }
        };

        Ok(ResolvedBookmark {
            path: record.path,
            stale,
        })
    }
}

//! Persistent references to user-chosen media locations.
//!
//! A bookmark is an opaque token that survives process restarts and can be
//! resolved back into a location. Resolution reports staleness: the token
//! still resolved, but the location may have moved and should be re-selected.
//!
//! - [`FileBookmarks`]: portable tokens based on path and file identity
//! - `SecurityScopedBookmarks` (macOS): `NSURL` security-scoped bookmarks
//! - [`MockBookmarkStore`]: test double

mod error;
mod file;
#[cfg(target_os = "macos")]
pub mod macos;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

pub use error::BookmarkError;
pub use file::FileBookmarks;

#[cfg(target_os = "macos")]
pub use macos::SecurityScopedBookmarks;

/// Opaque, revalidatable reference to a location.
#[derive(Clone, PartialEq, Eq)]
pub struct BookmarkToken(Vec<u8>);

impl BookmarkToken {
    #[must_use]
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

impl fmt::Debug for BookmarkToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BookmarkToken({} bytes)", self.0.len())
    }
}

/// A bookmark resolved back into a location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedBookmark {
    /// The location the bookmark points to. It may no longer exist.
    pub path: PathBuf,
    /// True if the bookmark should be refreshed by re-selecting.
    pub stale: bool,
}

/// Trait for bookmark persistence implementations.
pub trait BookmarkStore: Send + Sync {
    /// Creates a token for `path`.
    ///
    /// # Errors
    ///
    /// Returns `BookmarkError::Persist` if no token can be created.
    fn persist(&self, path: &Path) -> Result<BookmarkToken, BookmarkError>;

    /// Resolves a token. Attempted once; never retried.
    ///
    /// # Errors
    ///
    /// Returns `BookmarkError::Resolve` if the token is invalid or unreadable.
    fn resolve(&self, token: &BookmarkToken) -> Result<ResolvedBookmark, BookmarkError>;
}

/// Mock bookmark store for testing.
///
/// Tokens are the raw path bytes.
#[derive(Debug, Default)]
pub struct MockBookmarkStore {
    fail_persist: AtomicBool,
    fail_resolve: AtomicBool,
    report_stale: AtomicBool,
}

impl MockBookmarkStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_persist(&self, fail: bool) {
        self.fail_persist.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_resolve(&self, fail: bool) {
        self.fail_resolve.store(fail, Ordering::SeqCst);
    }

    pub fn set_report_stale(&self, stale: bool) {
        self.report_stale.store(stale, Ordering::SeqCst);
    }
}

impl BookmarkStore for MockBookmarkStore {
    fn persist(&self, path: &Path) -> Result<BookmarkToken, BookmarkError> {
        if self.fail_persist.load(Ordering::SeqCst) {
            return Err(BookmarkError::Persist("Mock failure".to_string()));
        }
        Ok(BookmarkToken::new(
            path.to_string_lossy().into_owned().into_bytes(),
        ))
    }

    fn resolve(&self, token: &BookmarkToken) -> Result<ResolvedBookmark, BookmarkError> {
        if self.fail_resolve.load(Ordering::SeqCst) {
            return Err(BookmarkError::Resolve("Mock failure".to_string()));
        }
        let path = String::from_utf8(token.as_bytes().to_vec())
            .map_err(|e| BookmarkError::Resolve(e.to_string()))?;
        Ok(ResolvedBookmark {
            path: PathBuf::from(path),
            stale: self.report_stale.load(Ordering::SeqCst),
        })
    }
}

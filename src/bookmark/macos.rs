//! Security-scoped bookmarks for sandboxed macOS builds.

use std::path::Path;
use std::sync::Arc;

use objc2::runtime::Bool;
use objc2_foundation::{
    NSData, NSURLBookmarkCreationOptions, NSURLBookmarkResolutionOptions, NSURL,
};

use crate::access::macos::ScopedUrl;
use crate::access::ScopeRegistry;

use super::error::BookmarkError;
use super::{BookmarkStore, BookmarkToken, ResolvedBookmark};

/// Bookmark store that creates and resolves `NSURL` security-scoped bookmarks.
///
/// Resolved URLs are recorded in the shared [`ScopeRegistry`] so the access
/// provider starts the scope on the URL instance that carries it.
#[derive(Debug)]
pub struct SecurityScopedBookmarks {
    registry: Arc<ScopeRegistry>,
}

impl SecurityScopedBookmarks {
    #[must_use]
    pub fn new(registry: Arc<ScopeRegistry>) -> Self {
        Self { registry }
    }
}

impl BookmarkStore for SecurityScopedBookmarks {
    fn persist(&self, path: &Path) -> Result<BookmarkToken, BookmarkError> {
        let url = ScopedUrl::from_path(path);
        let started = url.start();

        let result = unsafe {
            url.as_url()
                .bookmarkDataWithOptions_includingResourceValuesForKeys_relativeToURL_error(
                    NSURLBookmarkCreationOptions::WithSecurityScope,
                    None,
                    None,
                )
        };

        if started {
            url.stop();
        }

        let data = result
            .map_err(|e| BookmarkError::Persist(e.localizedDescription().to_string()))?;
        Ok(BookmarkToken::new(data.to_vec()))
    }

    fn resolve(&self, token: &BookmarkToken) -> Result<ResolvedBookmark, BookmarkError> {
        let data = NSData::with_bytes(token.as_bytes());
        let mut is_stale = Bool::NO;

        let url = unsafe {
            NSURL::URLByResolvingBookmarkData_options_relativeToURL_bookmarkDataIsStale_error(
                &data,
                NSURLBookmarkResolutionOptions::WithSecurityScope,
                None,
                &mut is_stale,
            )
        }
        .map_err(|e| BookmarkError::Resolve(e.localizedDescription().to_string()))?;

        let url = ScopedUrl::new(url);
        let path = url
            .path()
            .ok_or_else(|| BookmarkError::Resolve("bookmark has no file path".to_string()))?;
        self.registry.remember(path.clone(), url);

        Ok(ResolvedBookmark {
            path,
            stale: is_stale.as_bool(),
        })
    }
}

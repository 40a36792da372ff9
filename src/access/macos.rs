//! Security-scoped resource access for sandboxed macOS builds.
//!
//! A URL resolved from a security-scoped bookmark carries the sandbox
//! extension for its location; `startAccessingSecurityScopedResource` must be
//! called on that same URL instance. [`ScopeRegistry`] keeps those URLs so the
//! bookmark store and the access provider can share them.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use objc2::rc::Retained;
use objc2_foundation::{NSString, NSURL};
use tracing::debug;

use super::{AccessError, AccessGrant, AccessProvider, GrantLedger};

/// An `NSURL` that may be moved across threads.
#[derive(Clone)]
pub(crate) struct ScopedUrl(Retained<NSURL>);

// SAFETY: NSURL is immutable and documented as thread-safe.
unsafe impl Send for ScopedUrl {}
unsafe impl Sync for ScopedUrl {}

impl ScopedUrl {
    pub(crate) fn new(url: Retained<NSURL>) -> Self {
        Self(url)
    }

    pub(crate) fn from_path(path: &Path) -> Self {
        let ns_path = NSString::from_str(&path.to_string_lossy());
        Self(NSURL::fileURLWithPath(&ns_path))
    }

    pub(crate) fn as_url(&self) -> &NSURL {
        &self.0
    }

    pub(crate) fn path(&self) -> Option<PathBuf> {
        self.0.path().map(|p| PathBuf::from(p.to_string()))
    }

    pub(crate) fn start(&self) -> bool {
        unsafe { self.0.startAccessingSecurityScopedResource() }
    }

    pub(crate) fn stop(&self) {
        unsafe { self.0.stopAccessingSecurityScopedResource() }
    }
}

/// URLs resolved from bookmarks, and the scopes currently started.
#[derive(Default)]
pub struct ScopeRegistry {
    resolved: Mutex<HashMap<PathBuf, ScopedUrl>>,
    active: Arc<Mutex<HashMap<PathBuf, usize>>>,
}

impl ScopeRegistry {
    /// Remembers the URL a bookmark resolved to.
    pub(crate) fn remember(&self, path: PathBuf, url: ScopedUrl) {
        self.resolved.lock().unwrap_or_else(PoisonError::into_inner).insert(path, url);
    }

    fn url_for(&self, path: &Path) -> ScopedUrl {
        self.resolved
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(path)
            .cloned()
            .unwrap_or_else(|| ScopedUrl::from_path(path))
    }

    /// Returns true if an ancestor of `path` has a started scope.
    fn is_covered(&self, path: &Path) -> bool {
        let active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        path.ancestors()
            .skip(1)
            .any(|ancestor| active.contains_key(ancestor))
    }
}

impl fmt::Debug for ScopeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopeRegistry")
            .field("resolved", &self.resolved.lock().unwrap_or_else(PoisonError::into_inner).len())
            .field("active", &self.active.lock().unwrap_or_else(PoisonError::into_inner).len())
            .finish()
    }
}

/// Access provider backed by security-scoped resources.
///
/// Files inside a directory whose scope is started are covered by that scope
/// and receive their own (no-op) grant so they are still accounted for.
#[derive(Debug)]
pub struct SecurityScopedAccess {
    registry: Arc<ScopeRegistry>,
    ledger: GrantLedger,
}

impl SecurityScopedAccess {
    #[must_use]
    pub fn new(registry: Arc<ScopeRegistry>) -> Self {
        Self {
            registry,
            ledger: GrantLedger::new(),
        }
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<ScopeRegistry> {
        &self.registry
    }
}

impl AccessProvider for SecurityScopedAccess {
    fn acquire(&self, path: &Path) -> Result<AccessGrant, AccessError> {
        if !path.exists() {
            return Err(AccessError::NotFound(path.to_path_buf()));
        }

        let url = self.registry.url_for(path);
        if url.start() {
            let key = path.to_path_buf();
            *self
                .registry
                .active
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .entry(key.clone())
                .or_insert(0) += 1;

            let active = Arc::clone(&self.registry.active);
            return Ok(AccessGrant::new(
                path,
                &self.ledger,
                Box::new(move || {
                    url.stop();
                    let mut active = active.lock().unwrap_or_else(PoisonError::into_inner);
                    if let Some(count) = active.get_mut(&key) {
                        *count -= 1;
                        if *count == 0 {
                            active.remove(&key);
                        }
                    }
                }),
            ));
        }

        if self.registry.is_covered(path) {
            debug!("Covered by parent scope: {}", path.display());
            return Ok(AccessGrant::ambient(path, &self.ledger));
        }

        Err(AccessError::Denied(path.to_path_buf()))
    }

    fn ledger(&self) -> &GrantLedger {
        &self.ledger
    }
}

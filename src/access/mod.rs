//! Scoped filesystem access grants.
//!
//! A sandboxed process cannot read user-chosen locations by default; each
//! location must be explicitly granted before use and released afterwards.
//! This module models that lifecycle:
//!
//! - [`AccessProvider`] hands out grants for a location
//! - [`AccessGrant`] is a guard that releases its grant exactly once,
//!   either through [`AccessGrant::release`] or on drop
//! - [`GrantLedger`] counts live grants, so leaks are observable
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐  acquire()  ┌──────────────────┐
//! │ PlaylistResolver │────────────▶│  AccessProvider  │
//! └────────┬─────────┘             └────────┬─────────┘
//!          │ owns                           │ counts
//!          ▼                                ▼
//! ┌──────────────────┐   drop      ┌──────────────────┐
//! │   AccessGrant    │────────────▶│   GrantLedger    │
//! └──────────────────┘             └──────────────────┘
//! ```
//!
//! On macOS the grant is a security-scoped resource (see `macos`); elsewhere
//! [`AmbientAccess`] grants any location whose metadata is readable.

mod error;
#[cfg(target_os = "macos")]
pub mod macos;

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub use error::AccessError;

#[cfg(target_os = "macos")]
pub use macos::{ScopeRegistry, SecurityScopedAccess};

// ============================================================================
// GrantLedger
// ============================================================================

/// Shared counter of grants that have been acquired but not yet released.
#[derive(Debug, Clone, Default)]
pub struct GrantLedger {
    live: Arc<AtomicUsize>,
}

impl GrantLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of grants currently held.
    #[must_use]
    pub fn live(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    fn opened(&self) {
        self.live.fetch_add(1, Ordering::SeqCst);
    }

    fn closed(&self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}

// ============================================================================
// AccessGrant
// ============================================================================

type Releaser = Box<dyn FnOnce() + Send>;

/// An acquired access grant for one location.
///
/// Released exactly once: calling [`release`](Self::release) more than once is
/// a no-op, and dropping an unreleased grant releases it.
pub struct AccessGrant {
    path: PathBuf,
    releaser: Option<Releaser>,
    ledger: GrantLedger,
}

impl AccessGrant {
    /// Records a new live grant in `ledger`; `releaser` runs on release.
    pub fn new(path: impl Into<PathBuf>, ledger: &GrantLedger, releaser: Releaser) -> Self {
        ledger.opened();
        Self {
            path: path.into(),
            releaser: Some(releaser),
            ledger: ledger.clone(),
        }
    }

    /// Creates a grant whose release has no OS side effect.
    pub fn ambient(path: impl Into<PathBuf>, ledger: &GrantLedger) -> Self {
        Self::new(path, ledger, Box::new(|| {}))
    }

    /// The granted location.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn is_released(&self) -> bool {
        self.releaser.is_none()
    }

    /// Releases the grant. Idempotent.
    pub fn release(&mut self) {
        if let Some(releaser) = self.releaser.take() {
            releaser();
            self.ledger.closed();
            tracing::trace!("Released access grant: {}", self.path.display());
        }
    }
}

impl Drop for AccessGrant {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for AccessGrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessGrant")
            .field("path", &self.path)
            .field("released", &self.is_released())
            .finish()
    }
}

// ============================================================================
// AccessProvider
// ============================================================================

/// Trait for access grant implementations.
///
/// Every successful [`acquire`](Self::acquire) must be matched by exactly one
/// release; [`AccessGrant`] guarantees that through its `Drop`.
pub trait AccessProvider: Send + Sync {
    /// Acquires a grant for `path`.
    ///
    /// # Errors
    ///
    /// Returns `AccessError::Denied` if the location is not grantable, or
    /// `AccessError::NotFound` if it does not exist.
    fn acquire(&self, path: &Path) -> Result<AccessGrant, AccessError>;

    /// The ledger counting this provider's live grants.
    fn ledger(&self) -> &GrantLedger;
}

/// Grants any location whose metadata can be read.
///
/// Used where the OS does not sandbox file access.
#[derive(Debug, Default)]
pub struct AmbientAccess {
    ledger: GrantLedger,
}

impl AmbientAccess {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl AccessProvider for AmbientAccess {
    fn acquire(&self, path: &Path) -> Result<AccessGrant, AccessError> {
        match std::fs::metadata(path) {
            Ok(_) => Ok(AccessGrant::ambient(path, &self.ledger)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(AccessError::NotFound(path.to_path_buf()))
            }
            Err(_) => Err(AccessError::Denied(path.to_path_buf())),
        }
    }

    fn ledger(&self) -> &GrantLedger {
        &self.ledger
    }
}

// ============================================================================
// MockAccessProvider
// ============================================================================

/// Mock access provider for testing.
///
/// Grants every existing location except those on the deny list, and counts
/// calls. Missing locations fail with `NotFound` like the real providers.
#[derive(Debug, Default)]
pub struct MockAccessProvider {
    ledger: GrantLedger,
    denied: Mutex<HashSet<PathBuf>>,
    deny_all: std::sync::atomic::AtomicBool,
    acquire_calls: Arc<AtomicUsize>,
    release_calls: Arc<AtomicUsize>,
}

impl MockAccessProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deny(&self, path: impl Into<PathBuf>) {
        self.denied.lock().unwrap().insert(path.into());
    }

    pub fn set_deny_all(&self, deny_all: bool) {
        self.deny_all.store(deny_all, Ordering::SeqCst);
    }

    /// Number of successful acquisitions so far.
    #[must_use]
    pub fn acquire_count(&self) -> usize {
        self.acquire_calls.load(Ordering::SeqCst)
    }

    /// Number of releases so far.
    #[must_use]
    pub fn release_count(&self) -> usize {
        self.release_calls.load(Ordering::SeqCst)
    }
}

impl AccessProvider for MockAccessProvider {
    fn acquire(&self, path: &Path) -> Result<AccessGrant, AccessError> {
        if self.deny_all.load(Ordering::SeqCst) || self.denied.lock().unwrap().contains(path) {
            return Err(AccessError::Denied(path.to_path_buf()));
        }
        if !path.exists() {
            return Err(AccessError::NotFound(path.to_path_buf()));
        }
        self.acquire_calls.fetch_add(1, Ordering::SeqCst);
        let releases = Arc::clone(&self.release_calls);
        Ok(AccessGrant::new(
            path,
            &self.ledger,
            Box::new(move || {
                releases.fetch_add(1, Ordering::SeqCst);
            }),
        ))
    }

    fn ledger(&self) -> &GrantLedger {
        &self.ledger
    }
}

//! Playlist entries and break media selection.

use std::path::{Path, PathBuf};

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::access::AccessGrant;
use crate::bookmark::BookmarkError;

/// Container extensions collected from a media folder.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["mp4", "mov", "m4v", "mkv"];

/// Extensions the playback collaborator can decode.
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "m4v"];

/// Still image extensions shown as a static break background.
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "heic", "tiff"];

fn lowercase_extension(path: &Path) -> Option<String> {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
}

/// Returns true if a folder entry with this path should be collected.
#[must_use]
pub fn has_supported_extension(path: &Path) -> bool {
    lowercase_extension(path).is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext.as_str()))
}

// ============================================================================
// MediaKind
// ============================================================================

/// What the playback collaborator can do with an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    /// A decodable video container
    Video,
    /// A still image
    Image,
    /// Present, but cannot be played (e.g. mkv)
    Unsupported,
}

impl MediaKind {
    /// Infers the kind from the file extension.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match lowercase_extension(path) {
            Some(ext) if VIDEO_EXTENSIONS.contains(&ext.as_str()) => Self::Video,
            Some(ext) if IMAGE_EXTENSIONS.contains(&ext.as_str()) => Self::Image,
            _ => Self::Unsupported,
        }
    }

    #[must_use]
    pub fn is_playable(&self) -> bool {
        !matches!(self, Self::Unsupported)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Image => "image",
            Self::Unsupported => "unsupported",
        }
    }
}

// ============================================================================
// PlaylistEntry
// ============================================================================

/// A resolved, currently accessible media location.
#[derive(Debug)]
pub struct PlaylistEntry {
    path: PathBuf,
    kind: MediaKind,
    grant: Option<AccessGrant>,
}

impl PlaylistEntry {
    /// Creates an entry, inferring its kind. `grant` is held for the entry's lifetime.
    pub fn new(path: impl Into<PathBuf>, grant: Option<AccessGrant>) -> Self {
        let path = path.into();
        Self {
            kind: MediaKind::from_path(&path),
            path,
            grant,
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    /// Returns true if this entry holds its own access grant.
    #[must_use]
    pub fn is_granted(&self) -> bool {
        self.grant.is_some()
    }
}

// ============================================================================
// BreakMedia
// ============================================================================

/// The media chosen for a break.
///
/// `NoMedia` and `Unsupported` are distinct degraded states: the first means
/// nothing was found, the second means something was found but cannot play.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BreakMedia {
    /// An entry to play
    Playing {
        /// Location of the media
        path: PathBuf,
        /// Kind of the media
        kind: MediaKind,
    },
    /// Only unplayable entries were found
    Unsupported {
        /// The entry that cannot be played
        path: PathBuf,
    },
    /// The playlist is empty; the renderer shows its default scene
    #[default]
    NoMedia,
}

impl BreakMedia {
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Playing { path, .. } | Self::Unsupported { path } => Some(path),
            Self::NoMedia => None,
        }
    }

    #[must_use]
    pub fn is_playing(&self) -> bool {
        matches!(self, Self::Playing { .. })
    }
}

// ============================================================================
// Playlist
// ============================================================================

/// Which candidate source produced the playlist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaylistSource {
    /// The in-session selection
    Selection,
    /// The persisted bookmark
    Bookmark,
    /// Bundled or home-directory fallback clips
    Defaults,
}

/// What happened to the persisted bookmark during resolution.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum BookmarkOutcome {
    /// No bookmark was consulted
    #[default]
    NotUsed,
    /// Resolved to an existing location
    Fresh(PathBuf),
    /// Resolved to an existing location, but should be re-selected
    Stale(PathBuf),
    /// Resolved, but the location no longer exists
    Missing(PathBuf),
    /// The token could not be resolved
    Failed(BookmarkError),
}

/// The media set for one break, with the grants keeping it accessible.
///
/// Dropping the playlist releases every grant it holds.
#[derive(Debug, Default)]
pub struct Playlist {
    pub(crate) entries: Vec<PlaylistEntry>,
    pub(crate) scopes: Vec<AccessGrant>,
    pub(crate) source: Option<PlaylistSource>,
    pub(crate) bookmark: BookmarkOutcome,
}

impl Playlist {
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn entries(&self) -> &[PlaylistEntry] {
        &self.entries
    }

    #[must_use]
    pub fn source(&self) -> Option<PlaylistSource> {
        self.source
    }

    #[must_use]
    pub fn bookmark(&self) -> &BookmarkOutcome {
        &self.bookmark
    }

    /// True if the persisted bookmark resolved but should be re-selected.
    #[must_use]
    pub fn stale_bookmark(&self) -> bool {
        matches!(self.bookmark, BookmarkOutcome::Stale(_))
    }

    /// Number of entries that are listed but cannot be played.
    #[must_use]
    pub fn unsupported_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| !e.kind().is_playable())
            .count()
    }

    /// Number of grants this playlist holds, folder scopes included.
    #[must_use]
    pub fn grant_count(&self) -> usize {
        self.scopes.len() + self.entries.iter().filter(|e| e.is_granted()).count()
    }

    pub(crate) fn absorb(&mut self, other: Playlist) {
        self.entries.extend(other.entries);
        self.scopes.extend(other.scopes);
    }

    /// Picks the break media uniformly at random among playable entries.
    ///
    /// Unplayable entries are never chosen; if they are all there is, the
    /// first one is reported as `Unsupported`.
    pub fn select<R: Rng + ?Sized>(&self, rng: &mut R) -> BreakMedia {
        let playable: Vec<&PlaylistEntry> = self
            .entries
            .iter()
            .filter(|e| e.kind().is_playable())
            .collect();

        if !playable.is_empty() {
            let entry = playable[rng.random_range(0..playable.len())];
            return BreakMedia::Playing {
                path: entry.path().to_path_buf(),
                kind: entry.kind(),
            };
        }

        match self.entries.first() {
            Some(entry) => BreakMedia::Unsupported {
                path: entry.path().to_path_buf(),
            },
            None => BreakMedia::NoMedia,
        }
    }
}

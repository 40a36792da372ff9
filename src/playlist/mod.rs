//! Break media playlist.
//!
//! The playlist is recomputed at the start of every break from the first
//! candidate source that yields anything:
//!
//! - the in-session selection
//! - the persisted bookmark
//! - bundled and home-directory fallback clips
//!
//! Entries hold their access grants, so dropping a playlist releases them.

mod entry;
mod error;
mod resolver;

pub use entry::{
    has_supported_extension, BookmarkOutcome, BreakMedia, MediaKind, Playlist, PlaylistEntry,
    PlaylistSource, SUPPORTED_EXTENSIONS,
};
pub use error::PlaylistError;
pub use resolver::{default_candidates, PlaylistResolver, DEFAULT_MAX_SCAN_ENTRIES};

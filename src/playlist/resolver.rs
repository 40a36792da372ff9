//! Playlist resolution from candidate media sources.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::access::AccessProvider;
use crate::bookmark::{BookmarkStore, BookmarkToken};

use super::entry::{has_supported_extension, BookmarkOutcome, Playlist, PlaylistEntry, PlaylistSource};
use super::error::PlaylistError;

/// Default cap on directory entries examined per folder.
pub const DEFAULT_MAX_SCAN_ENTRIES: usize = 4096;

/// Clip shipped alongside the binary.
const BUNDLED_CLIP: &str = "clip1_final.mp4";

/// Clips looked up in the home directory when nothing else is configured.
const HOME_CLIPS: &[&str] = &[
    "clip1_final.mp4",
    "clip1.mkv",
    "clip2.mkv",
    "clip3.mkv",
    "clip1.mp4",
    "clip2.mp4",
    "clip3.mp4",
];

/// Builds the fallback candidate list, in priority order.
#[must_use]
pub fn default_candidates(bundle_dir: Option<&Path>, home_dir: Option<&Path>) -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    if let Some(bundle) = bundle_dir {
        candidates.push(bundle.join(BUNDLED_CLIP));
    }
    if let Some(home) = home_dir {
        candidates.extend(HOME_CLIPS.iter().map(|name| home.join(name)));
    }
    candidates
}

/// Resolves the break playlist from the configured media sources.
///
/// Sources are tried in order and the first non-empty one wins:
/// 1. the in-session selection
/// 2. the persisted bookmark
/// 3. the fallback candidates that exist
pub struct PlaylistResolver {
    access: Arc<dyn AccessProvider>,
    bookmarks: Arc<dyn BookmarkStore>,
    max_scan_entries: usize,
}

impl PlaylistResolver {
    pub fn new(access: Arc<dyn AccessProvider>, bookmarks: Arc<dyn BookmarkStore>) -> Self {
        Self {
            access,
            bookmarks,
            max_scan_entries: DEFAULT_MAX_SCAN_ENTRIES,
        }
    }

    /// Caps the number of directory entries examined per folder.
    pub fn with_max_scan_entries(mut self, max: usize) -> Self {
        self.max_scan_entries = max;
        self
    }

    pub fn access(&self) -> &Arc<dyn AccessProvider> {
        &self.access
    }

    pub fn bookmarks(&self) -> &Arc<dyn BookmarkStore> {
        &self.bookmarks
    }

    /// Computes a fresh playlist. Never fails; an empty playlist is a valid result.
    pub fn resolve(
        &self,
        selection: Option<&Path>,
        bookmark: Option<&BookmarkToken>,
        defaults: &[PathBuf],
    ) -> Playlist {
        let mut bookmark_outcome = BookmarkOutcome::NotUsed;

        if let Some(location) = selection {
            let playlist = self.collect(location, "session media selection");
            if !playlist.is_empty() {
                return Self::finish(playlist, PlaylistSource::Selection, bookmark_outcome);
            }
        }

        if let Some(token) = bookmark {
            let (playlist, outcome) = self.collect_bookmark(token);
            bookmark_outcome = outcome;
            if !playlist.is_empty() {
                return Self::finish(playlist, PlaylistSource::Bookmark, bookmark_outcome);
            }
        }

        let mut playlist = Playlist::empty();
        for candidate in defaults.iter().filter(|c| c.exists()) {
            playlist.absorb(self.collect(candidate, "default fallback"));
        }

        if playlist.is_empty() {
            info!("No videos found in playlist");
            playlist.bookmark = bookmark_outcome;
            return playlist;
        }
        Self::finish(playlist, PlaylistSource::Defaults, bookmark_outcome)
    }

    fn finish(mut playlist: Playlist, source: PlaylistSource, outcome: BookmarkOutcome) -> Playlist {
        info!(
            "Loaded {} video(s) into playlist from {:?}",
            playlist.len(),
            source
        );
        playlist.source = Some(source);
        playlist.bookmark = outcome;
        playlist
    }

    fn collect_bookmark(&self, token: &BookmarkToken) -> (Playlist, BookmarkOutcome) {
        let resolved = match self.bookmarks.resolve(token) {
            Ok(resolved) => resolved,
            Err(e) => {
                warn!("Failed to resolve bookmark: {}", e);
                return (Playlist::empty(), BookmarkOutcome::Failed(e));
            }
        };

        if !resolved.path.exists() {
            warn!("Bookmark target missing: {}", resolved.path.display());
            return (Playlist::empty(), BookmarkOutcome::Missing(resolved.path));
        }

        let playlist = self.collect(&resolved.path, "saved bookmark");
        let outcome = if resolved.stale {
            warn!("Bookmark is stale; will refresh when user re-selects media");
            BookmarkOutcome::Stale(resolved.path)
        } else {
            BookmarkOutcome::Fresh(resolved.path)
        };
        (playlist, outcome)
    }

    /// Collects media from one location. Failures are logged, not returned.
    fn collect(&self, location: &Path, source: &str) -> Playlist {
        let mut playlist = Playlist::empty();
        let result = if location.is_dir() {
            self.collect_directory(location, &mut playlist)
        } else {
            self.collect_file(location, &mut playlist)
        };

        if let Err(e) = result {
            warn!("{} [source: {}]", e, source);
        }
        playlist
    }

    fn collect_directory(&self, dir: &Path, playlist: &mut Playlist) -> Result<(), PlaylistError> {
        let dir_grant = match self.access.acquire(dir) {
            Ok(grant) => Some(grant),
            Err(e) => {
                debug!("No scope for folder, listing directly: {}", e);
                None
            }
        };

        let read_dir = std::fs::read_dir(dir).map_err(|e| PlaylistError::ListFailed {
            path: dir.to_path_buf(),
            reason: e.to_string(),
        })?;

        let mut files: Vec<PathBuf> = read_dir
            .take(self.max_scan_entries)
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    debug!("Skipping unreadable folder entry: {}", e);
                    None
                }
            })
            .filter(|entry| !entry.file_name().to_string_lossy().starts_with('.'))
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && has_supported_extension(path))
            .collect();
        files.sort();

        if files.is_empty() {
            info!("Selected folder is empty: {}", dir.display());
        }

        for path in files {
            let grant = if dir_grant.is_some() {
                match self.access.acquire(&path) {
                    Ok(grant) => Some(grant),
                    Err(e) => {
                        warn!("Skipping folder entry: {}", e);
                        continue;
                    }
                }
            } else {
                None
            };
            playlist.entries.push(PlaylistEntry::new(path, grant));
        }

        if let Some(grant) = dir_grant {
            playlist.scopes.push(grant);
        }
        Ok(())
    }

    fn collect_file(&self, file: &Path, playlist: &mut Playlist) -> Result<(), PlaylistError> {
        if !file.exists() {
            return Err(PlaylistError::Unreachable {
                path: file.to_path_buf(),
                reason: "not found".to_string(),
            });
        }
        match self.access.acquire(file) {
            Ok(grant) => {
                playlist.entries.push(PlaylistEntry::new(file, Some(grant)));
                Ok(())
            }
            Err(access_error) => match File::open(file) {
                Ok(_) => {
                    debug!("Readable without grant: {}", file.display());
                    playlist.entries.push(PlaylistEntry::new(file, None));
                    Ok(())
                }
                Err(e) => Err(PlaylistError::Unreachable {
                    path: file.to_path_buf(),
                    reason: format!("{}; {}", access_error, e),
                }),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::MockAccessProvider;
    use crate::bookmark::{FileBookmarks, MockBookmarkStore};

    struct Fixture {
        access: Arc<MockAccessProvider>,
        bookmarks: Arc<MockBookmarkStore>,
        resolver: PlaylistResolver,
    }

    fn fixture() -> Fixture {
        let access = Arc::new(MockAccessProvider::new());
        let bookmarks = Arc::new(MockBookmarkStore::new());
        let resolver = PlaylistResolver::new(access.clone(), bookmarks.clone());
        Fixture {
            access,
            bookmarks,
            resolver,
        }
    }

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, b"media").unwrap();
        path
    }

    mod directory_tests {
        use super::*;

        #[test]
        fn test_empty_directory_yields_empty_playlist() {
            let f = fixture();
            let dir = tempfile::tempdir().unwrap();

            let playlist = f.resolver.resolve(Some(dir.path()), None, &[]);

            assert!(playlist.is_empty());
            assert_eq!(playlist.source(), None);
            assert_eq!(f.access.ledger().live(), 0);
        }

        #[test]
        fn test_directory_filters_extensions_and_hidden_files() {
            let f = fixture();
            let dir = tempfile::tempdir().unwrap();
            touch(dir.path(), "a.mp4");
            touch(dir.path(), "b.MOV");
            touch(dir.path(), "c.mkv");
            touch(dir.path(), "notes.txt");
            touch(dir.path(), "photo.png");
            touch(dir.path(), ".hidden.mp4");
            std::fs::create_dir(dir.path().join("nested.mp4")).unwrap();

            let playlist = f.resolver.resolve(Some(dir.path()), None, &[]);

            let names: Vec<_> = playlist
                .entries()
                .iter()
                .map(|e| e.path().file_name().unwrap().to_string_lossy().into_owned())
                .collect();
            assert_eq!(names, vec!["a.mp4", "b.MOV", "c.mkv"]);
            assert_eq!(playlist.unsupported_count(), 1);
            assert_eq!(playlist.source(), Some(PlaylistSource::Selection));
        }

        #[test]
        fn test_directory_entries_get_their_own_grants() {
            let f = fixture();
            let dir = tempfile::tempdir().unwrap();
            touch(dir.path(), "a.mp4");
            touch(dir.path(), "b.mp4");

            let playlist = f.resolver.resolve(Some(dir.path()), None, &[]);

            assert!(playlist.entries().iter().all(|e| e.is_granted()));
            assert_eq!(playlist.grant_count(), 3);
            assert_eq!(f.access.ledger().live(), 3);

            drop(playlist);
            assert_eq!(f.access.ledger().live(), 0);
            assert_eq!(f.access.acquire_count(), f.access.release_count());
        }

        #[test]
        fn test_ungranted_directory_is_still_listed() {
            let f = fixture();
            let dir = tempfile::tempdir().unwrap();
            touch(dir.path(), "a.mp4");
            f.access.deny(dir.path());

            let playlist = f.resolver.resolve(Some(dir.path()), None, &[]);

            assert_eq!(playlist.len(), 1);
            assert!(!playlist.entries()[0].is_granted());
            assert_eq!(f.access.ledger().live(), 0);
        }

        #[test]
        fn test_denied_entry_in_granted_directory_is_skipped() {
            let f = fixture();
            let dir = tempfile::tempdir().unwrap();
            touch(dir.path(), "a.mp4");
            let blocked = touch(dir.path(), "b.mp4");
            f.access.deny(&blocked);

            let playlist = f.resolver.resolve(Some(dir.path()), None, &[]);

            assert_eq!(playlist.len(), 1);
            assert!(playlist.entries()[0].path().ends_with("a.mp4"));
        }

        #[test]
        fn test_scan_cap_bounds_listing() {
            let f = fixture();
            let resolver = PlaylistResolver::new(f.access.clone(), f.bookmarks.clone())
                .with_max_scan_entries(2);
            let dir = tempfile::tempdir().unwrap();
            for i in 0..5 {
                touch(dir.path(), &format!("clip{}.mp4", i));
            }

            let playlist = resolver.resolve(Some(dir.path()), None, &[]);
            assert!(playlist.len() <= 2);
        }
    }

    mod file_tests {
        use super::*;

        #[test]
        fn test_single_file_bypasses_extension_filter() {
            let f = fixture();
            let dir = tempfile::tempdir().unwrap();
            let image = touch(dir.path(), "sky.png");

            let playlist = f.resolver.resolve(Some(&image), None, &[]);

            assert_eq!(playlist.len(), 1);
            assert!(playlist.entries()[0].is_granted());
        }

        #[test]
        fn test_denied_file_falls_back_to_readability() {
            let f = fixture();
            let dir = tempfile::tempdir().unwrap();
            let clip = touch(dir.path(), "clip.mp4");
            f.access.deny(&clip);

            let playlist = f.resolver.resolve(Some(&clip), None, &[]);

            assert_eq!(playlist.len(), 1);
            assert!(!playlist.entries()[0].is_granted());
        }

        #[test]
        fn test_unreachable_file_moves_to_next_source() {
            let f = fixture();
            let dir = tempfile::tempdir().unwrap();
            let missing = dir.path().join("missing.mp4");
            let fallback = touch(dir.path(), "clip1.mp4");

            let playlist = f.resolver.resolve(Some(&missing), None, &[fallback.clone()]);

            assert_eq!(playlist.len(), 1);
            assert_eq!(playlist.entries()[0].path(), fallback.as_path());
            assert_eq!(playlist.source(), Some(PlaylistSource::Defaults));
        }
    }

    mod source_order_tests {
        use super::*;

        #[test]
        fn test_selection_wins_over_bookmark_and_defaults() {
            let f = fixture();
            let dir = tempfile::tempdir().unwrap();
            let selected = touch(dir.path(), "selected.mp4");
            let bookmarked = touch(dir.path(), "bookmarked.mp4");
            let fallback = touch(dir.path(), "fallback.mp4");
            let token = f.bookmarks.persist(&bookmarked).unwrap();

            let playlist = f.resolver.resolve(Some(&selected), Some(&token), &[fallback]);

            assert_eq!(playlist.len(), 1);
            assert_eq!(playlist.entries()[0].path(), selected.as_path());
            assert_eq!(playlist.bookmark(), &BookmarkOutcome::NotUsed);
        }

        #[test]
        fn test_bookmark_used_when_selection_empty() {
            let f = fixture();
            let empty = tempfile::tempdir().unwrap();
            let dir = tempfile::tempdir().unwrap();
            let bookmarked = touch(dir.path(), "bookmarked.mp4");
            let token = f.bookmarks.persist(&bookmarked).unwrap();

            let playlist = f.resolver.resolve(Some(empty.path()), Some(&token), &[]);

            assert_eq!(playlist.source(), Some(PlaylistSource::Bookmark));
            assert_eq!(playlist.bookmark(), &BookmarkOutcome::Fresh(bookmarked));
            // The empty selection's folder grant is not kept around.
            assert_eq!(f.access.ledger().live(), playlist.grant_count());
        }

        #[test]
        fn test_stale_bookmark_still_used() {
            let f = fixture();
            let dir = tempfile::tempdir().unwrap();
            let bookmarked = touch(dir.path(), "bookmarked.mp4");
            let token = f.bookmarks.persist(&bookmarked).unwrap();
            f.bookmarks.set_report_stale(true);

            let playlist = f.resolver.resolve(None, Some(&token), &[]);

            assert_eq!(playlist.len(), 1);
            assert_eq!(playlist.bookmark(), &BookmarkOutcome::Stale(bookmarked));
        }

        #[test]
        fn test_missing_bookmark_target_falls_through() {
            let f = fixture();
            let dir = tempfile::tempdir().unwrap();
            let gone = dir.path().join("gone");
            let token = f.bookmarks.persist(&gone).unwrap();
            let fallback = touch(dir.path(), "clip1.mp4");

            let playlist = f.resolver.resolve(None, Some(&token), &[fallback]);

            assert_eq!(playlist.source(), Some(PlaylistSource::Defaults));
            assert_eq!(playlist.bookmark(), &BookmarkOutcome::Missing(gone));
        }

        #[test]
        fn test_failed_bookmark_reported() {
            let f = fixture();
            f.bookmarks.set_fail_resolve(true);
            let token = BookmarkToken::new(b"whatever".to_vec());

            let playlist = f.resolver.resolve(None, Some(&token), &[]);

            assert!(playlist.is_empty());
            assert!(matches!(playlist.bookmark(), BookmarkOutcome::Failed(_)));
        }

        #[test]
        fn test_defaults_merge_existing_candidates_only() {
            let f = fixture();
            let dir = tempfile::tempdir().unwrap();
            let a = touch(dir.path(), "clip1.mp4");
            let b = touch(dir.path(), "clip2.mkv");
            let missing = dir.path().join("clip3.mp4");

            let playlist = f.resolver.resolve(None, None, &[a, missing, b]);

            assert_eq!(playlist.len(), 2);
            assert_eq!(playlist.unsupported_count(), 1);
        }

        #[test]
        fn test_real_file_bookmarks_round_trip() {
            let access = Arc::new(MockAccessProvider::new());
            let resolver = PlaylistResolver::new(access.clone(), Arc::new(FileBookmarks::new()));
            let dir = tempfile::tempdir().unwrap();
            touch(dir.path(), "a.mp4");
            let token = resolver.bookmarks().persist(dir.path()).unwrap();

            let playlist = resolver.resolve(None, Some(&token), &[]);

            assert_eq!(playlist.len(), 1);
            assert!(matches!(playlist.bookmark(), BookmarkOutcome::Fresh(_)));
        }
    }

    mod grant_leak_tests {
        use super::*;

        #[test]
        fn test_no_leak_across_repeated_resolution() {
            let f = fixture();
            let dir = tempfile::tempdir().unwrap();
            touch(dir.path(), "a.mp4");
            touch(dir.path(), "b.mkv");

            for _ in 0..25 {
                let playlist = f.resolver.resolve(Some(dir.path()), None, &[]);
                assert_eq!(playlist.len(), 2);
            }

            assert_eq!(f.access.ledger().live(), 0);
            assert_eq!(f.access.acquire_count(), f.access.release_count());
        }

        #[test]
        fn test_no_leak_when_every_source_fails() {
            let f = fixture();
            let dir = tempfile::tempdir().unwrap();
            f.bookmarks.set_fail_resolve(true);
            let token = BookmarkToken::new(b"x".to_vec());

            let playlist = f.resolver.resolve(
                Some(&dir.path().join("missing.mp4")),
                Some(&token),
                &[dir.path().join("nothing.mp4")],
            );

            assert!(playlist.is_empty());
            drop(playlist);
            assert_eq!(f.access.ledger().live(), 0);
        }

        #[test]
        fn test_folder_grant_released_when_listing_fails() {
            let f = fixture();
            let dir = tempfile::tempdir().unwrap();
            let not_a_folder = touch(dir.path(), "clip.mp4");
            let mut playlist = Playlist::default();

            let result = f.resolver.collect_directory(&not_a_folder, &mut playlist);

            assert!(matches!(result, Err(PlaylistError::ListFailed { .. })));
            assert!(playlist.is_empty());
            assert_eq!(f.access.acquire_count(), 1);
            assert_eq!(f.access.release_count(), 1);
            assert_eq!(f.access.ledger().live(), 0);
        }

        #[test]
        fn test_missing_file_never_acquires() {
            let f = fixture();
            let dir = tempfile::tempdir().unwrap();

            let playlist = f.resolver.resolve(Some(&dir.path().join("gone.mp4")), None, &[]);

            assert!(playlist.is_empty());
            assert_eq!(f.access.acquire_count(), 0);
        }
    }

    #[test]
    fn test_default_candidates_order() {
        let candidates =
            default_candidates(Some(Path::new("/opt/eyebreak")), Some(Path::new("/home/me")));
        assert_eq!(candidates[0], PathBuf::from("/opt/eyebreak/clip1_final.mp4"));
        assert_eq!(candidates[1], PathBuf::from("/home/me/clip1_final.mp4"));
        assert_eq!(candidates.len(), 1 + HOME_CLIPS.len());

        assert!(default_candidates(None, None).is_empty());
    }
}

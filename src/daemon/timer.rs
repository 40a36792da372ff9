//! Timer engine for EyeBreak.
//!
//! This module provides the core work/break state machine:
//! - State transitions (Working → OnBreak → Working, Working → Paused → Working)
//! - A wall-clock work deadline that survives system sleep
//! - A one-second countdown during breaks
//! - Playlist resolution and media selection at every break start
//! - Event firing for observers
//!
//! All transitions run on one task. Control requests, system signals and
//! timer wakeups are multiplexed in [`TimerEngine::run`], so no two
//! transitions are ever evaluated concurrently.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

use anyhow::{bail, Context, Result};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};

use crate::bookmark::BookmarkToken;
use crate::media::{default_suppressor, MediaSuppressor};
use crate::playlist::{BookmarkOutcome, BreakMedia, Playlist, PlaylistResolver};
use crate::settings::{Settings, SettingsStore};
use crate::types::{BreakConfig, StatusSnapshot, SystemSignal, TimerState};

// ============================================================================
// Constants
// ============================================================================

/// Break countdown granularity.
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Longest the driver sleeps before re-reading the wall clock during work.
pub const DEADLINE_RECHECK_INTERVAL: Duration = Duration::from_secs(15);

/// Capacity of the command channel.
const COMMAND_BUFFER: usize = 32;

// ============================================================================
// Clock
// ============================================================================

/// Source of wall-clock time.
pub trait Clock: Send + Sync {
    fn now(&self) -> SystemTime;
}

/// The system wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// Manually driven clock for testing. Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<SystemTime>>,
}

impl ManualClock {
    pub fn new(start: SystemTime) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock().unwrap() += by;
    }

    pub fn set(&self, at: SystemTime) {
        *self.now.lock().unwrap() = at;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000))
    }
}

impl Clock for ManualClock {
    fn now(&self) -> SystemTime {
        *self.now.lock().unwrap()
    }
}

// ============================================================================
// TimerEvent
// ============================================================================

/// Timer events for observers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerEvent {
    /// A fresh work period started
    WorkStarted {
        /// Seconds until the next break
        remaining_seconds: u64,
    },
    /// A break started
    BreakStarted {
        /// Media chosen for the break
        media: BreakMedia,
    },
    /// A break ran to the end
    BreakCompleted {
        /// Completed breaks so far
        total_breaks: u64,
    },
    /// A break ended early
    BreakSkipped,
    /// Work time frozen for system sleep
    Paused {
        /// Frozen seconds
        remaining_seconds: u64,
    },
    /// Work time re-armed after system wake
    Resumed {
        /// Seconds until the next break
        remaining_seconds: u64,
    },
    /// One second of break elapsed
    Tick {
        /// Seconds until the break ends
        remaining_seconds: u64,
    },
    /// Media was found but cannot be played. Sent once per process.
    MediaUnsupported {
        /// The unplayable entry
        path: PathBuf,
    },
    /// The media selection holds for this session only
    SelectionNotPersisted {
        /// Why the bookmark could not be saved
        reason: String,
    },
}

// ============================================================================
// Schedule
// ============================================================================

/// The single pending timer callback.
///
/// Replacing the value cancels whatever was pending before.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    /// Nothing pending
    Idle,
    /// Work ends at this wall-clock time
    Deadline(SystemTime),
    /// Next break countdown tick
    Tick(Instant),
}

// ============================================================================
// Engine commands
// ============================================================================

/// Control requests accepted by a running engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineRequest {
    Status,
    StartBreak,
    SkipBreak,
    SelectMedia(PathBuf),
    ClearMedia,
    SetWorkInterval(u32),
    SetBreakInterval(u32),
    Signal(SystemSignal),
}

/// A request paired with its reply channel.
#[derive(Debug)]
pub struct EngineCommand {
    pub request: EngineRequest,
    pub reply: oneshot::Sender<Result<StatusSnapshot>>,
}

/// Cloneable handle to a running engine.
#[derive(Debug, Clone)]
pub struct EngineHandle {
    commands: mpsc::Sender<EngineCommand>,
    signals: mpsc::UnboundedSender<SystemSignal>,
    status: watch::Receiver<StatusSnapshot>,
}

impl EngineHandle {
    /// Sends a request and waits for the applied result.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine rejected the request or has stopped.
    pub async fn request(&self, request: EngineRequest) -> Result<StatusSnapshot> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(EngineCommand { request, reply })
            .await
            .map_err(|_| anyhow::anyhow!("タイマーエンジンは停止しています"))?;
        response
            .await
            .context("タイマーエンジンから応答がありませんでした")?
    }

    /// Delivers a system signal without waiting for it to be applied.
    pub fn signal(&self, signal: SystemSignal) {
        if self.signals.send(signal).is_err() {
            warn!("Timer engine stopped; dropping {:?}", signal);
        }
    }

    /// Returns the last published snapshot.
    pub fn latest(&self) -> StatusSnapshot {
        self.status.borrow().clone()
    }

    /// Returns a receiver notified after every applied transition.
    pub fn subscribe(&self) -> watch::Receiver<StatusSnapshot> {
        self.status.clone()
    }
}

// ============================================================================
// TimerEngine
// ============================================================================

/// Timer engine that owns the work/break state and everything a break needs.
pub struct TimerEngine {
    state: TimerState,
    /// Frozen remaining time while Paused, countdown while OnBreak
    time_remaining: Duration,
    /// Present only while Working
    work_end_at: Option<SystemTime>,
    schedule: Schedule,
    config: BreakConfig,
    total_breaks: u64,
    current_media: BreakMedia,
    playlist: Playlist,
    selection: Option<PathBuf>,
    bookmark: Option<BookmarkToken>,
    stale_bookmark: bool,
    unsupported_notified: bool,
    default_media: Vec<PathBuf>,
    resolver: PlaylistResolver,
    suppressor: Box<dyn MediaSuppressor>,
    settings_store: Arc<dyn SettingsStore>,
    settings: Settings,
    clock: Arc<dyn Clock>,
    rng: Box<dyn RngCore + Send>,
    event_tx: mpsc::UnboundedSender<TimerEvent>,
    status_tx: watch::Sender<StatusSnapshot>,
}

impl TimerEngine {
    /// Creates a new engine from persisted settings.
    ///
    /// Unreadable settings are logged and replaced by defaults. The engine
    /// starts in `Working` with nothing scheduled; call [`start_work`] to arm it.
    ///
    /// [`start_work`]: TimerEngine::start_work
    pub fn new(
        resolver: PlaylistResolver,
        settings_store: Arc<dyn SettingsStore>,
        event_tx: mpsc::UnboundedSender<TimerEvent>,
    ) -> Self {
        let settings = settings_store.load().unwrap_or_else(|e| {
            warn!("{} ({})", e, e.suggestion());
            Settings::default()
        });
        let config = settings.config();
        let (status_tx, _) = watch::channel(StatusSnapshot::default());

        let engine = Self {
            state: TimerState::Working,
            time_remaining: config.work_interval(),
            work_end_at: None,
            schedule: Schedule::Idle,
            config,
            total_breaks: settings.total_breaks,
            current_media: BreakMedia::NoMedia,
            playlist: Playlist::empty(),
            selection: None,
            bookmark: settings.bookmark(),
            stale_bookmark: false,
            unsupported_notified: false,
            default_media: Vec::new(),
            resolver,
            suppressor: default_suppressor(),
            settings_store,
            settings,
            clock: Arc::new(SystemClock),
            rng: Box::new(StdRng::from_os_rng()),
            event_tx,
            status_tx,
        };
        engine.publish();
        engine
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_suppressor(mut self, suppressor: Box<dyn MediaSuppressor>) -> Self {
        self.suppressor = suppressor;
        self
    }

    pub fn with_rng(mut self, rng: Box<dyn RngCore + Send>) -> Self {
        self.rng = rng;
        self
    }

    /// Sets the fallback candidates used when nothing else yields media.
    pub fn with_default_media(mut self, candidates: Vec<PathBuf>) -> Self {
        self.default_media = candidates;
        self
    }

    // ------------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------------

    /// Starts (or re-arms) the work period.
    ///
    /// With `reset` the countdown restarts from the work interval; otherwise
    /// the current remaining time carries over. Any pending callback is
    /// cancelled first.
    ///
    /// # Errors
    ///
    /// Returns an error if the event channel is closed.
    pub fn start_work(&mut self, reset: bool) -> Result<()> {
        self.schedule = Schedule::Idle;
        if reset {
            self.time_remaining = self.config.work_interval();
        }
        if self.time_remaining.is_zero() {
            debug!("No work time left; break starts on the next evaluation");
        }

        let work_end_at = self.clock.now() + self.time_remaining;
        self.state = TimerState::Working;
        self.work_end_at = Some(work_end_at);
        self.schedule = Schedule::Deadline(work_end_at);

        if reset {
            self.emit(TimerEvent::WorkStarted {
                remaining_seconds: whole_seconds(self.time_remaining),
            })?;
        }
        self.publish();
        Ok(())
    }

    /// Starts a break immediately.
    ///
    /// # Errors
    ///
    /// Returns an error if the timer is not in the work state.
    pub fn start_break_now(&mut self) -> Result<()> {
        match self.state {
            TimerState::Working => self.begin_break(),
            TimerState::OnBreak => bail!("既に休憩中です"),
            TimerState::Paused => bail!("スリープからの復帰前は休憩を開始できません"),
        }
    }

    /// Ends the current break without counting it.
    ///
    /// # Errors
    ///
    /// Returns an error if no break is in progress.
    pub fn skip_break(&mut self) -> Result<()> {
        if self.state != TimerState::OnBreak {
            bail!("休憩中ではありません");
        }
        self.end_break(false)
    }

    /// Advances the break countdown by one tick.
    ///
    /// Completes the break when the countdown reaches zero. Outside a break
    /// this does nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if the event channel is closed.
    pub fn tick(&mut self) -> Result<()> {
        if self.state != TimerState::OnBreak {
            debug!("Ignoring tick in {} state", self.state.as_str());
            return Ok(());
        }

        self.time_remaining = self.time_remaining.saturating_sub(TICK_INTERVAL);
        if self.time_remaining.is_zero() {
            return self.end_break(true);
        }

        let now = Instant::now();
        let next = match self.schedule {
            Schedule::Tick(at) if at + TICK_INTERVAL > now => at + TICK_INTERVAL,
            _ => now + TICK_INTERVAL,
        };
        self.schedule = Schedule::Tick(next);

        self.emit(TimerEvent::Tick {
            remaining_seconds: whole_seconds(self.time_remaining),
        })?;
        self.publish();
        Ok(())
    }

    /// Starts the break if the work deadline has passed.
    ///
    /// Returns true if a break was started.
    ///
    /// # Errors
    ///
    /// Returns an error if the event channel is closed.
    pub fn check_deadline(&mut self) -> Result<bool> {
        match (self.state, self.work_end_at) {
            (TimerState::Working, Some(end)) if self.clock.now() >= end => {
                self.begin_break()?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Applies a system sleep or wake notification.
    ///
    /// # Errors
    ///
    /// Returns an error if the event channel is closed.
    pub fn handle_signal(&mut self, signal: SystemSignal) -> Result<()> {
        match (signal, self.state) {
            (SystemSignal::WillSleep, TimerState::Working) => {
                self.time_remaining = self.remaining_work();
                self.pause()
            }
            (SystemSignal::WillSleep, TimerState::OnBreak) => {
                info!("System sleeping during break; abandoning the break");
                self.abandon_break()?;
                self.time_remaining = self.config.work_interval();
                self.pause()
            }
            (SystemSignal::DidWake, TimerState::Paused) => {
                self.start_work(false)?;
                self.emit(TimerEvent::Resumed {
                    remaining_seconds: whole_seconds(self.time_remaining),
                })
            }
            (SystemSignal::DidWake, TimerState::Working) => {
                self.time_remaining = self.remaining_work();
                self.start_work(false)
            }
            (signal, state) => {
                debug!("Ignoring {:?} in {} state", signal, state.as_str());
                Ok(())
            }
        }
    }

    fn pause(&mut self) -> Result<()> {
        self.schedule = Schedule::Idle;
        self.work_end_at = None;
        self.state = TimerState::Paused;
        self.emit(TimerEvent::Paused {
            remaining_seconds: whole_seconds(self.time_remaining),
        })?;
        self.publish();
        Ok(())
    }

    fn begin_break(&mut self) -> Result<()> {
        self.work_end_at = None;
        self.suppressor.pause_if_playing();

        let notice = self.choose_media();
        self.state = TimerState::OnBreak;
        self.time_remaining = self.config.break_interval();
        self.schedule = Schedule::Tick(Instant::now() + TICK_INTERVAL);
        self.publish();

        info!("Break started ({}s)", self.config.break_seconds);
        if let Some(path) = notice {
            self.emit(TimerEvent::MediaUnsupported { path })?;
        }
        self.emit(TimerEvent::BreakStarted {
            media: self.current_media.clone(),
        })
    }

    /// Re-resolves the playlist and picks the break media.
    ///
    /// Returns the unsupported path when the once-per-process notice is due.
    fn choose_media(&mut self) -> Option<PathBuf> {
        self.refresh_playlist();
        self.current_media = self.playlist.select(&mut *self.rng);
        match &self.current_media {
            BreakMedia::Unsupported { path } if !self.unsupported_notified => {
                self.unsupported_notified = true;
                Some(path.clone())
            }
            _ => None,
        }
    }

    fn end_break(&mut self, completed: bool) -> Result<()> {
        self.release_break();
        if completed {
            self.total_breaks += 1;
            self.settings.total_breaks = self.total_breaks;
            self.save_settings();
            self.emit(TimerEvent::BreakCompleted {
                total_breaks: self.total_breaks,
            })?;
        } else {
            self.emit(TimerEvent::BreakSkipped)?;
        }
        self.start_work(true)
    }

    fn abandon_break(&mut self) -> Result<()> {
        self.release_break();
        self.emit(TimerEvent::BreakSkipped)
    }

    /// Resumes suppressed playback and drops the playlist with its grants.
    fn release_break(&mut self) {
        self.schedule = Schedule::Idle;
        self.suppressor.resume_if_needed();
        self.current_media = BreakMedia::NoMedia;
        self.playlist = Playlist::empty();
    }

    // ------------------------------------------------------------------------
    // Media selection
    // ------------------------------------------------------------------------

    /// Selects a media file or folder for this session and persists a bookmark.
    ///
    /// Returns whether the selection will survive a restart. A bookmark that
    /// cannot be saved keeps the selection for the session only and clears
    /// any previously persisted one.
    ///
    /// # Errors
    ///
    /// Returns an error if the location does not exist.
    pub fn update_media_selection(&mut self, path: &Path) -> Result<bool> {
        if !path.exists() {
            bail!("メディアが見つかりません: {}", path.display());
        }
        self.selection = Some(path.to_path_buf());

        let persisted = match self.resolver.bookmarks().persist(path) {
            Ok(token) => {
                self.store_bookmark(Some(token));
                true
            }
            Err(e) => {
                warn!("{} ({})", e, e.suggestion());
                // The previous bookmark no longer matches the selection.
                self.store_bookmark(None);
                self.emit(TimerEvent::SelectionNotPersisted {
                    reason: e.to_string(),
                })?;
                false
            }
        };

        let notice = if self.state == TimerState::OnBreak {
            self.choose_media()
        } else {
            None
        };
        self.publish();
        if let Some(path) = notice {
            self.emit(TimerEvent::MediaUnsupported { path })?;
        }
        Ok(persisted)
    }

    /// Forgets the media selection and its persisted bookmark.
    pub fn clear_media_selection(&mut self) {
        self.selection = None;
        self.store_bookmark(None);
        self.publish();
    }

    fn store_bookmark(&mut self, token: Option<BookmarkToken>) {
        self.settings.set_bookmark(token.as_ref());
        self.bookmark = token;
        self.stale_bookmark = false;
        self.save_settings();
    }

    /// Recomputes the playlist, releasing the previous one first.
    fn refresh_playlist(&mut self) {
        self.playlist = Playlist::empty();
        let playlist = self.resolver.resolve(
            self.selection.as_deref(),
            self.bookmark.as_ref(),
            &self.default_media,
        );

        match playlist.bookmark() {
            BookmarkOutcome::Stale(path) => {
                self.stale_bookmark = true;
                match self.resolver.bookmarks().persist(path) {
                    Ok(token) => {
                        info!("Refreshed stale bookmark for {}", path.display());
                        self.store_bookmark(Some(token));
                    }
                    Err(e) => warn!("Could not refresh stale bookmark: {}", e),
                }
            }
            BookmarkOutcome::Failed(_) => {
                info!("Clearing unresolvable bookmark");
                self.store_bookmark(None);
            }
            BookmarkOutcome::Fresh(_) => self.stale_bookmark = false,
            BookmarkOutcome::Missing(_) | BookmarkOutcome::NotUsed => {}
        }

        self.playlist = playlist;
    }

    // ------------------------------------------------------------------------
    // Configuration
    // ------------------------------------------------------------------------

    /// Changes the work interval. Takes effect from the next work period.
    ///
    /// # Errors
    ///
    /// Returns an error if the interval is out of range.
    pub fn set_work_interval(&mut self, seconds: u32) -> Result<()> {
        let config = self.config.with_work_seconds(seconds);
        config.validate().map_err(anyhow::Error::msg)?;
        self.apply_config(config);
        Ok(())
    }

    /// Changes the break interval. Takes effect from the next break.
    ///
    /// # Errors
    ///
    /// Returns an error if the interval is out of range.
    pub fn set_break_interval(&mut self, seconds: u32) -> Result<()> {
        let config = self.config.with_break_seconds(seconds);
        config.validate().map_err(anyhow::Error::msg)?;
        self.apply_config(config);
        Ok(())
    }

    fn apply_config(&mut self, config: BreakConfig) {
        self.config = config;
        self.settings.set_config(&config);
        self.save_settings();
        self.publish();
    }

    fn save_settings(&self) {
        if let Err(e) = self.settings_store.save(&self.settings) {
            warn!("{} ({})", e, e.suggestion());
        }
    }

    // ------------------------------------------------------------------------
    // Observation
    // ------------------------------------------------------------------------

    pub fn state(&self) -> TimerState {
        self.state
    }

    /// Remaining time for the current state. Live while Working.
    pub fn time_remaining(&self) -> Duration {
        match self.state {
            TimerState::Working => self.remaining_work(),
            TimerState::OnBreak | TimerState::Paused => self.time_remaining,
        }
    }

    pub fn work_end_at(&self) -> Option<SystemTime> {
        self.work_end_at
    }

    pub fn schedule(&self) -> Schedule {
        self.schedule
    }

    pub fn config(&self) -> BreakConfig {
        self.config
    }

    pub fn total_breaks(&self) -> u64 {
        self.total_breaks
    }

    pub fn current_media(&self) -> &BreakMedia {
        &self.current_media
    }

    pub fn playlist(&self) -> &Playlist {
        &self.playlist
    }

    pub fn media_selection(&self) -> Option<&Path> {
        self.selection.as_deref()
    }

    pub fn is_bookmark_stale(&self) -> bool {
        self.stale_bookmark
    }

    /// Returns a fully applied view of the engine.
    pub fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            state: self.state,
            remaining_seconds: whole_seconds(self.time_remaining()),
            total_breaks: self.total_breaks,
            current_media: self.current_media.clone(),
            media_selection: self.selection.clone(),
            bookmarked: self.bookmark.is_some(),
            stale_bookmark: self.stale_bookmark,
            config: self.config,
        }
    }

    /// Returns a receiver for snapshots published after each transition.
    pub fn subscribe(&self) -> watch::Receiver<StatusSnapshot> {
        self.status_tx.subscribe()
    }

    fn remaining_work(&self) -> Duration {
        self.work_end_at
            .map(|end| end.duration_since(self.clock.now()).unwrap_or(Duration::ZERO))
            .unwrap_or(self.time_remaining)
    }

    fn publish(&self) {
        self.status_tx.send_replace(self.snapshot());
    }

    fn emit(&self, event: TimerEvent) -> Result<()> {
        self.event_tx
            .send(event)
            .context("Failed to send timer event")
    }

    // ------------------------------------------------------------------------
    // Driver
    // ------------------------------------------------------------------------

    /// Spawns the driver loop on the current runtime.
    pub fn spawn(self) -> (EngineHandle, tokio::task::JoinHandle<Result<()>>) {
        let (commands_tx, commands_rx) = mpsc::channel(COMMAND_BUFFER);
        let (signals_tx, signals_rx) = mpsc::unbounded_channel();
        let handle = EngineHandle {
            commands: commands_tx,
            signals: signals_tx,
            status: self.subscribe(),
        };
        let task = tokio::spawn(self.run(commands_rx, signals_rx));
        (handle, task)
    }

    /// Runs the driver loop until every command sender is dropped.
    ///
    /// Dropping the engine on return releases any held access grants.
    ///
    /// # Errors
    ///
    /// Returns an error if the event channel is closed.
    pub async fn run(
        mut self,
        mut commands: mpsc::Receiver<EngineCommand>,
        mut signals: mpsc::UnboundedReceiver<SystemSignal>,
    ) -> Result<()> {
        let mut signals_open = true;

        loop {
            let wake = self.next_wake();

            tokio::select! {
                biased;

                command = commands.recv() => {
                    let Some(EngineCommand { request, reply }) = command else {
                        info!("Timer engine stopping");
                        break;
                    };
                    let result = self.apply(request);
                    if reply.send(result).is_err() {
                        debug!("Requester went away before the reply");
                    }
                }
                signal = signals.recv(), if signals_open => match signal {
                    Some(signal) => self.handle_signal(signal)?,
                    None => signals_open = false,
                },
                () = sleep_until(wake) => self.on_wake()?,
            }
        }

        Ok(())
    }

    /// Applies one control request and returns the resulting snapshot.
    fn apply(&mut self, request: EngineRequest) -> Result<StatusSnapshot> {
        match request {
            EngineRequest::Status => {}
            EngineRequest::StartBreak => self.start_break_now()?,
            EngineRequest::SkipBreak => self.skip_break()?,
            EngineRequest::SelectMedia(path) => {
                self.update_media_selection(&path)?;
            }
            EngineRequest::ClearMedia => self.clear_media_selection(),
            EngineRequest::SetWorkInterval(seconds) => self.set_work_interval(seconds)?,
            EngineRequest::SetBreakInterval(seconds) => self.set_break_interval(seconds)?,
            EngineRequest::Signal(signal) => self.handle_signal(signal)?,
        }
        Ok(self.snapshot())
    }

    fn next_wake(&self) -> Instant {
        let now = Instant::now();
        match self.schedule {
            Schedule::Idle => now + DEADLINE_RECHECK_INTERVAL,
            Schedule::Deadline(end) => {
                let until = end
                    .duration_since(self.clock.now())
                    .unwrap_or(Duration::ZERO);
                now + until.min(DEADLINE_RECHECK_INTERVAL)
            }
            Schedule::Tick(at) => at,
        }
    }

    fn on_wake(&mut self) -> Result<()> {
        match self.schedule {
            Schedule::Deadline(_) => {
                if !self.check_deadline()? {
                    self.publish();
                }
            }
            Schedule::Tick(at) if Instant::now() >= at => self.tick()?,
            Schedule::Tick(_) | Schedule::Idle => {}
        }
        Ok(())
    }
}

/// Rounds up to whole seconds so a fresh period reports its full length.
fn whole_seconds(duration: Duration) -> u64 {
    duration.as_secs() + u64::from(duration.subsec_nanos() > 0)
}

// ============================================================================
// Tests
// ============================================================================

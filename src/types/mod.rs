//! Core data types for EyeBreak.
//!
//! This module defines the data structures used for:
//! - Timer state
//! - Interval configuration with validation
//! - Status snapshots published by the engine
//! - IPC request/response serialization

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::playlist::BreakMedia;

// ============================================================================
// TimerState
// ============================================================================

/// The current state of the timer. Exactly one is current at any instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerState {
    /// Counting down to the next break
    #[default]
    Working,
    /// A break is in progress
    OnBreak,
    /// The system is asleep; remaining work time is frozen
    Paused,
}

impl TimerState {
    /// Returns the string representation of the state.
    pub fn as_str(&self) -> &'static str {
        match self {
            TimerState::Working => "working",
            TimerState::OnBreak => "on_break",
            TimerState::Paused => "paused",
        }
    }
}

// ============================================================================
// SystemSignal
// ============================================================================

/// Payload-free power notifications from the operating system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SystemSignal {
    /// The system is about to sleep
    WillSleep,
    /// The system has woken up
    DidWake,
}

// ============================================================================
// BreakConfig
// ============================================================================

/// Interval configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakConfig {
    /// Work interval in seconds (300-3600)
    pub work_seconds: u32,
    /// Break interval in seconds (20-300)
    pub break_seconds: u32,
}

impl BreakConfig {
    pub const MIN_WORK_SECONDS: u32 = 5 * 60;
    pub const MAX_WORK_SECONDS: u32 = 60 * 60;
    pub const MIN_BREAK_SECONDS: u32 = 20;
    pub const MAX_BREAK_SECONDS: u32 = 300;
}

impl Default for BreakConfig {
    fn default() -> Self {
        Self {
            work_seconds: 20 * 60,
            break_seconds: 60,
        }
    }
}

impl BreakConfig {
    /// Creates a new configuration with the specified work interval.
    pub fn with_work_seconds(mut self, seconds: u32) -> Self {
        self.work_seconds = seconds;
        self
    }

    /// Creates a new configuration with the specified break interval.
    pub fn with_break_seconds(mut self, seconds: u32) -> Self {
        self.break_seconds = seconds;
        self
    }

    pub fn work_interval(&self) -> Duration {
        Duration::from_secs(u64::from(self.work_seconds))
    }

    pub fn break_interval(&self) -> Duration {
        Duration::from_secs(u64::from(self.break_seconds))
    }

    /// Validates the configuration.
    ///
    /// Returns an error message if validation fails.
    pub fn validate(&self) -> Result<(), String> {
        if !(Self::MIN_WORK_SECONDS..=Self::MAX_WORK_SECONDS).contains(&self.work_seconds) {
            return Err("作業時間は5-60分の範囲で指定してください".to_string());
        }
        if !(Self::MIN_BREAK_SECONDS..=Self::MAX_BREAK_SECONDS).contains(&self.break_seconds) {
            return Err("休憩時間は20-300秒の範囲で指定してください".to_string());
        }
        Ok(())
    }

    /// Returns a copy with both intervals clamped into their valid ranges.
    #[must_use]
    pub fn clamped(self) -> Self {
        Self {
            work_seconds: self
                .work_seconds
                .clamp(Self::MIN_WORK_SECONDS, Self::MAX_WORK_SECONDS),
            break_seconds: self
                .break_seconds
                .clamp(Self::MIN_BREAK_SECONDS, Self::MAX_BREAK_SECONDS),
        }
    }
}

// ============================================================================
// StatusSnapshot
// ============================================================================

/// A fully applied view of the engine, published after every transition.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatusSnapshot {
    /// Current state
    pub state: TimerState,
    /// Seconds until the break (Working), until the break ends (OnBreak),
    /// or frozen (Paused)
    pub remaining_seconds: u64,
    /// Completed (non-skipped) breaks
    pub total_breaks: u64,
    /// Media for the break in progress
    pub current_media: BreakMedia,
    /// In-session media selection
    pub media_selection: Option<PathBuf>,
    /// True if a bookmark is persisted for the selection
    pub bookmarked: bool,
    /// True if the persisted bookmark should be re-selected
    pub stale_bookmark: bool,
    /// Interval configuration
    pub config: BreakConfig,
}

// ============================================================================
// IPC Types
// ============================================================================

/// IPC request from client to daemon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum IpcRequest {
    /// Query the current status
    Status,
    /// Start a break now
    StartBreak,
    /// End the current break without counting it
    SkipBreak,
    /// Select a media file or folder
    SelectMedia {
        /// File or folder path
        path: PathBuf,
    },
    /// Forget the media selection and its bookmark
    ClearMedia,
    /// Change the work interval
    SetWorkInterval {
        /// Interval in seconds
        seconds: u32,
    },
    /// Change the break interval
    SetBreakInterval {
        /// Interval in seconds
        seconds: u32,
    },
    /// Deliver a system sleep notification
    Sleep,
    /// Deliver a system wake notification
    Wake,
}

/// Response data for IPC responses.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResponseData {
    /// Current state
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// Remaining seconds
    #[serde(rename = "remainingSeconds", skip_serializing_if = "Option::is_none")]
    pub remaining_seconds: Option<u64>,
    /// Completed break count
    #[serde(rename = "totalBreaks", skip_serializing_if = "Option::is_none")]
    pub total_breaks: Option<u64>,
    /// Media for the break in progress
    #[serde(rename = "currentMedia", skip_serializing_if = "Option::is_none")]
    pub current_media: Option<BreakMedia>,
    /// In-session media selection
    #[serde(rename = "mediaSelection", skip_serializing_if = "Option::is_none")]
    pub media_selection: Option<PathBuf>,
    /// Whether a bookmark is persisted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bookmarked: Option<bool>,
    /// Stale bookmark flag
    #[serde(rename = "staleBookmark", skip_serializing_if = "Option::is_none")]
    pub stale_bookmark: Option<bool>,
    /// Work interval in seconds
    #[serde(rename = "workInterval", skip_serializing_if = "Option::is_none")]
    pub work_interval: Option<u32>,
    /// Break interval in seconds
    #[serde(rename = "breakInterval", skip_serializing_if = "Option::is_none")]
    pub break_interval: Option<u32>,
}

impl ResponseData {
    /// Creates response data from a status snapshot.
    pub fn from_snapshot(snapshot: &StatusSnapshot) -> Self {
        Self {
            state: Some(snapshot.state.as_str().to_string()),
            remaining_seconds: Some(snapshot.remaining_seconds),
            total_breaks: Some(snapshot.total_breaks),
            current_media: Some(snapshot.current_media.clone()),
            media_selection: snapshot.media_selection.clone(),
            bookmarked: Some(snapshot.bookmarked),
            stale_bookmark: Some(snapshot.stale_bookmark),
            work_interval: Some(snapshot.config.work_seconds),
            break_interval: Some(snapshot.config.break_seconds),
        }
    }
}

/// IPC response from daemon to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpcResponse {
    /// Response status ("success" or "error")
    pub status: String,
    /// Human-readable message
    pub message: String,
    /// Optional response data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ResponseData>,
}

impl IpcResponse {
    /// Creates a success response.
    pub fn success(message: impl Into<String>, data: Option<ResponseData>) -> Self {
        Self {
            status: "success".to_string(),
            message: message.into(),
            data,
        }
    }

    /// Creates an error response.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
            data: None,
        }
    }

    /// Returns true if this is a success response.
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // ------------------------------------------------------------------------
    // TimerState Tests
    // ------------------------------------------------------------------------

    mod timer_state_tests {
        use super::*;

        #[test]
        fn test_default_is_working() {
            assert_eq!(TimerState::default(), TimerState::Working);
        }

        #[test]
        fn test_as_str() {
            assert_eq!(TimerState::Working.as_str(), "working");
            assert_eq!(TimerState::OnBreak.as_str(), "on_break");
            assert_eq!(TimerState::Paused.as_str(), "paused");
        }

        #[test]
        fn test_serialize_matches_as_str() {
            for state in [TimerState::Working, TimerState::OnBreak, TimerState::Paused] {
                let json = serde_json::to_string(&state).unwrap();
                assert_eq!(json, format!("\"{}\"", state.as_str()));
            }
        }
    }

    // ------------------------------------------------------------------------
    // BreakConfig Tests
    // ------------------------------------------------------------------------

    mod break_config_tests {
        use super::*;

        #[test]
        fn test_default_values() {
            let config = BreakConfig::default();
            assert_eq!(config.work_seconds, 1200);
            assert_eq!(config.break_seconds, 60);
            assert_eq!(config.work_interval(), Duration::from_secs(1200));
            assert_eq!(config.break_interval(), Duration::from_secs(60));
        }

        #[test]
        fn test_builder_pattern() {
            let config = BreakConfig::default()
                .with_work_seconds(1500)
                .with_break_seconds(30);

            assert_eq!(config.work_seconds, 1500);
            assert_eq!(config.break_seconds, 30);
        }

        #[test]
        fn test_validate_boundary_values() {
            let config = BreakConfig::default()
                .with_work_seconds(300)
                .with_break_seconds(20);
            assert!(config.validate().is_ok());

            let config = BreakConfig::default()
                .with_work_seconds(3600)
                .with_break_seconds(300);
            assert!(config.validate().is_ok());
        }

        #[test]
        fn test_validate_work_out_of_range() {
            assert!(BreakConfig::default().with_work_seconds(299).validate().is_err());
            assert!(BreakConfig::default().with_work_seconds(3601).validate().is_err());
        }

        #[test]
        fn test_validate_break_out_of_range() {
            let err = BreakConfig::default()
                .with_break_seconds(19)
                .validate()
                .unwrap_err();
            assert!(err.contains("休憩時間"));
            assert!(BreakConfig::default().with_break_seconds(301).validate().is_err());
        }

        #[test]
        fn test_clamped() {
            let config = BreakConfig::default()
                .with_work_seconds(0)
                .with_break_seconds(9999)
                .clamped();
            assert_eq!(config.work_seconds, BreakConfig::MIN_WORK_SECONDS);
            assert_eq!(config.break_seconds, BreakConfig::MAX_BREAK_SECONDS);

            let valid = BreakConfig::default();
            assert_eq!(valid.clamped(), valid);
        }
    }

    // ------------------------------------------------------------------------
    // IPC Types Tests
    // ------------------------------------------------------------------------

    mod ipc_types_tests {
        use super::*;

        #[test]
        fn test_request_tags() {
            let json = serde_json::to_string(&IpcRequest::StartBreak).unwrap();
            assert_eq!(json, r#"{"command":"start_break"}"#);

            let json = serde_json::to_string(&IpcRequest::SetWorkInterval { seconds: 600 }).unwrap();
            assert_eq!(json, r#"{"command":"set_work_interval","seconds":600}"#);
        }

        #[test]
        fn test_request_deserialize_select_media() {
            let request: IpcRequest =
                serde_json::from_str(r#"{"command":"select_media","path":"/Movies"}"#).unwrap();
            assert_eq!(
                request,
                IpcRequest::SelectMedia {
                    path: PathBuf::from("/Movies")
                }
            );
        }

        #[test]
        fn test_request_unknown_command_fails() {
            assert!(serde_json::from_str::<IpcRequest>(r#"{"command":"explode"}"#).is_err());
        }

        #[test]
        fn test_response_data_from_snapshot() {
            let snapshot = StatusSnapshot {
                state: TimerState::OnBreak,
                remaining_seconds: 42,
                total_breaks: 3,
                current_media: BreakMedia::NoMedia,
                media_selection: Some(PathBuf::from("/Movies")),
                bookmarked: true,
                stale_bookmark: true,
                config: BreakConfig::default(),
            };

            let data = ResponseData::from_snapshot(&snapshot);
            assert_eq!(data.state.as_deref(), Some("on_break"));
            assert_eq!(data.remaining_seconds, Some(42));
            assert_eq!(data.total_breaks, Some(3));
            assert_eq!(data.media_selection, Some(PathBuf::from("/Movies")));
            assert_eq!(data.stale_bookmark, Some(true));
            assert_eq!(data.work_interval, Some(1200));

            let json = serde_json::to_string(&data).unwrap();
            assert!(json.contains("\"remainingSeconds\":42"));
            assert!(json.contains("\"currentMedia\":{\"status\":\"no_media\"}"));
        }

        #[test]
        fn test_response_constructors() {
            let ok = IpcResponse::success("ok", None);
            assert!(ok.is_success());
            assert!(ok.data.is_none());

            let err = IpcResponse::error("failed");
            assert!(!err.is_success());
            assert_eq!(err.message, "failed");
        }
    }
}

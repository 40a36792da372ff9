//! Display utilities for the EyeBreak CLI.
//!
//! This module provides formatted output for:
//! - Success messages
//! - Error messages
//! - Status display

use crate::playlist::BreakMedia;
use crate::types::{IpcResponse, ResponseData};

// ============================================================================
// Display
// ============================================================================

/// Display utilities for CLI output.
pub struct Display;

impl Display {
    /// Shows the daemon's message followed by the remaining time.
    pub fn show_success(response: &IpcResponse) {
        if !response.message.is_empty() {
            println!("* {}", response.message);
        }

        if let Some(remaining) = response.data.as_ref().and_then(|d| d.remaining_seconds) {
            println!("  残り時間: {}", Self::format_time(remaining));
        }
    }

    /// Shows the current timer status.
    pub fn show_status(response: &IpcResponse) {
        println!("EyeBreak ステータス");
        println!("─────────────────────────────");

        match &response.data {
            Some(data) => {
                for line in Self::status_lines(data) {
                    println!("{}", line);
                }
            }
            None => println!("タイマーは起動していません"),
        }
    }

    /// Shows an error message.
    pub fn show_error(message: &str) {
        eprintln!("エラー: {}", message);
    }

    /// Builds the status report lines.
    fn status_lines(data: &ResponseData) -> Vec<String> {
        let mut lines = Vec::new();

        let state = data.state.as_deref().unwrap_or("unknown");
        let state_display = match state {
            "working" => "作業中",
            "on_break" => "休憩中",
            "paused" => "一時停止中（スリープ）",
            _ => state,
        };
        lines.push(format!("状態: {}", state_display));

        if let Some(remaining) = data.remaining_seconds {
            let label = if state == "on_break" {
                "休憩終了まで"
            } else {
                "次の休憩まで"
            };
            lines.push(format!("{}: {}", label, Self::format_time(remaining)));
        }
        if let Some(total) = data.total_breaks {
            lines.push(format!("完了した休憩: {}回", total));
        }
        if let (Some(work), Some(brk)) = (data.work_interval, data.break_interval) {
            lines.push(format!("設定: 作業{}分 / 休憩{}秒", work / 60, brk));
        }

        match &data.media_selection {
            Some(path) => lines.push(format!("メディア: {}", path.display())),
            None if data.bookmarked == Some(true) => {
                lines.push("メディア: 保存済みの選択".to_string())
            }
            None => lines.push("メディア: 既定".to_string()),
        }
        if data.stale_bookmark == Some(true) {
            lines.push("  保存された選択が古くなっています。選択し直してください".to_string());
        }

        if state == "on_break" {
            let media = match &data.current_media {
                Some(BreakMedia::Playing { path, kind }) => {
                    format!("再生中: {} ({})", path.display(), kind.as_str())
                }
                Some(BreakMedia::Unsupported { path }) => {
                    format!("再生できない形式です: {}", path.display())
                }
                Some(BreakMedia::NoMedia) | None => "再生中: 既定の画面".to_string(),
            };
            lines.push(media);
        }

        lines
    }

    /// Formats remaining seconds as `m:ss`.
    fn format_time(total_seconds: u64) -> String {
        format!("{}:{:02}", total_seconds / 60, total_seconds % 60)
    }
}

// ============================================================================
// Tests
// ============================================================================

//! Integration tests for Daemon-CLI IPC communication.
//!
//! These tests verify end-to-end communication between the CLI client and
//! the Daemon IPC server, with a running timer engine behind it:
//! - Status query via IPC
//! - Break start and skip via IPC
//! - Media selection via IPC
//! - Interval changes via IPC
//! - Sleep/wake notifications via IPC
//! - Connection error handling

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{timeout, Duration};

use eyebreak::access::MockAccessProvider;
use eyebreak::bookmark::MockBookmarkStore;
use eyebreak::cli::client::IpcClient;
use eyebreak::daemon::ipc::{IpcServer, RequestHandler};
use eyebreak::daemon::timer::{TimerEngine, TimerEvent};
use eyebreak::media::MockMediaSuppressor;
use eyebreak::playlist::{BreakMedia, PlaylistResolver};
use eyebreak::settings::{MemorySettingsStore, Settings};

// ============================================================================
// Test Helpers
// ============================================================================

/// Creates a temporary socket path for testing.
fn create_temp_socket_path() -> PathBuf {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("integration_test.sock");
    // Keep the directory so it's not deleted
    std::mem::forget(dir);
    path
}

struct Daemon {
    client: IpcClient,
    settings: Arc<MemorySettingsStore>,
    events: mpsc::UnboundedReceiver<TimerEvent>,
    server_handle: JoinHandle<()>,
}

impl Drop for Daemon {
    fn drop(&mut self) {
        self.server_handle.abort();
    }
}

/// Starts an engine and an IPC server answering on a temporary socket.
async fn start_daemon(settings: Settings) -> Daemon {
    let socket_path = create_temp_socket_path();
    let settings = Arc::new(MemorySettingsStore::with_settings(settings));
    let (tx, events) = mpsc::unbounded_channel();
    let resolver = PlaylistResolver::new(
        Arc::new(MockAccessProvider::new()),
        Arc::new(MockBookmarkStore::new()),
    );

    let mut engine = TimerEngine::new(resolver, settings.clone(), tx)
        .with_suppressor(Box::new(MockMediaSuppressor::new()));
    engine.start_work(true).unwrap();
    let (handle, _engine_task) = engine.spawn();

    let server = IpcServer::new(&socket_path).unwrap();
    let handler = RequestHandler::new(handle);
    let server_handle = tokio::spawn(async move {
        let _ = server.serve(&handler).await;
    });

    Daemon {
        client: IpcClient::with_socket_path(socket_path),
        settings,
        events,
        server_handle,
    }
}

// ============================================================================
// Status Query
// ============================================================================

/// ステータス照会（IPC経由）
///
/// 前提条件: Daemon起動中
/// テスト手順: CLIから `status` コマンド送信
/// 期待結果: 作業中の状態と設定値が返る
#[tokio::test]
async fn status_via_ipc() {
    let daemon = start_daemon(Settings::default()).await;

    let response = daemon.client.status().await.unwrap();

    assert!(response.is_success());
    let data = response.data.expect("Response should contain data");
    assert_eq!(data.state, Some("working".to_string()));
    assert_eq!(data.remaining_seconds, Some(20 * 60));
    assert_eq!(data.total_breaks, Some(0));
    assert_eq!(data.current_media, Some(BreakMedia::NoMedia));
    assert_eq!(data.work_interval, Some(20 * 60));
    assert_eq!(data.break_interval, Some(60));
}

/// ステータスは保存済みの累計休憩回数を返す
#[tokio::test]
async fn status_reports_persisted_total() {
    let settings = Settings {
        total_breaks: 17,
        ..Settings::default()
    };
    let daemon = start_daemon(settings).await;

    let data = daemon.client.status().await.unwrap().data.unwrap();
    assert_eq!(data.total_breaks, Some(17));
}

// ============================================================================
// Break Control
// ============================================================================

/// 休憩の開始とスキップ（IPC経由）
///
/// 前提条件: Daemon起動中、作業中
/// テスト手順:
/// 1. `break` コマンド送信
/// 2. `skip` コマンド送信
/// 期待結果: 休憩が開始され、スキップ後は作業に戻り、回数は増えない
#[tokio::test]
async fn break_and_skip_via_ipc() {
    let mut daemon = start_daemon(Settings::default()).await;

    let response = daemon.client.start_break().await.unwrap();
    assert_eq!(response.message, "休憩を開始しました");
    assert_eq!(
        response.data.unwrap().state,
        Some("on_break".to_string())
    );

    let response = daemon.client.skip_break().await.unwrap();
    let data = response.data.unwrap();
    assert_eq!(data.state, Some("working".to_string()));
    assert_eq!(data.total_breaks, Some(0));

    let mut saw_skip = false;
    while let Ok(Some(event)) = timeout(Duration::from_millis(100), daemon.events.recv()).await {
        if event == TimerEvent::BreakSkipped {
            saw_skip = true;
        }
    }
    assert!(saw_skip);
}

/// 休憩中でないときのスキップはエラー
#[tokio::test]
async fn skip_without_break_is_error() {
    let daemon = start_daemon(Settings::default()).await;

    let err = daemon.client.skip_break().await.unwrap_err();

    assert!(err.to_string().contains("休憩中ではありません"));
    let data = daemon.client.status().await.unwrap().data.unwrap();
    assert_eq!(data.state, Some("working".to_string()));
}

// ============================================================================
// Media Selection
// ============================================================================

/// メディア選択（IPC経由）
///
/// 前提条件: Daemon起動中
/// テスト手順:
/// 1. 動画を含むフォルダを選択
/// 2. `break` コマンド送信
/// 期待結果: 休憩で選択フォルダ内の動画が再生され、選択が保存される
#[tokio::test]
async fn select_media_via_ipc() {
    let dir = tempfile::tempdir().unwrap();
    let clip = dir.path().join("calm.mp4");
    std::fs::write(&clip, b"media").unwrap();
    std::fs::write(dir.path().join(".hidden.mp4"), b"media").unwrap();
    let daemon = start_daemon(Settings::default()).await;

    let response = daemon.client.select_media(dir.path()).await.unwrap();
    assert_eq!(response.message, "メディアを選択しました");
    assert!(daemon.settings.current().bookmark().is_some());

    let data = daemon.client.start_break().await.unwrap().data.unwrap();
    match data.current_media {
        Some(BreakMedia::Playing { path, .. }) => assert_eq!(path, clip),
        other => panic!("Expected playing media, got {:?}", other),
    }
}

/// 存在しないメディアの選択はエラー
#[tokio::test]
async fn select_missing_media_is_error() {
    let daemon = start_daemon(Settings::default()).await;

    let err = daemon
        .client
        .select_media(&PathBuf::from("/nonexistent/eyebreak/media"))
        .await
        .unwrap_err();

    assert!(err.to_string().contains("見つかりません"));
}

/// メディア選択の解除
#[tokio::test]
async fn clear_media_via_ipc() {
    let dir = tempfile::tempdir().unwrap();
    let daemon = start_daemon(Settings::default()).await;
    daemon.client.select_media(dir.path()).await.unwrap();

    let data = daemon.client.clear_media().await.unwrap().data.unwrap();

    assert_eq!(data.media_selection, None);
    assert_eq!(data.bookmarked, Some(false));
    assert!(daemon.settings.current().bookmark().is_none());
}

// ============================================================================
// Interval Settings
// ============================================================================

/// 作業時間・休憩時間の変更（IPC経由）
///
/// 期待結果: 設定が保存され、範囲外の値は拒否される
#[tokio::test]
async fn set_intervals_via_ipc() {
    let daemon = start_daemon(Settings::default()).await;

    let response = daemon.client.set_work_minutes(30).await.unwrap();
    assert_eq!(response.message, "作業時間を30分に設定しました");
    let response = daemon.client.set_break_seconds(90).await.unwrap();
    assert_eq!(response.message, "休憩時間を90秒に設定しました");

    let saved = daemon.settings.current();
    assert_eq!(saved.work_interval, 30 * 60);
    assert_eq!(saved.break_interval, 90);

    let err = daemon.client.set_work_minutes(90).await.unwrap_err();
    assert!(err.to_string().contains("5-60分"));
    assert_eq!(daemon.settings.current().work_interval, 30 * 60);
}

// ============================================================================
// Sleep / Wake
// ============================================================================

/// スリープ・復帰通知（IPC経由）
///
/// 期待結果: スリープで一時停止し、復帰で残り時間を保ったまま再開する
#[tokio::test]
async fn sleep_and_wake_via_ipc() {
    let daemon = start_daemon(Settings::default()).await;

    let data = daemon.client.sleep().await.unwrap().data.unwrap();
    assert_eq!(data.state, Some("paused".to_string()));
    let frozen = data.remaining_seconds.unwrap();

    tokio::time::sleep(Duration::from_millis(1100)).await;
    let data = daemon.client.status().await.unwrap().data.unwrap();
    assert_eq!(data.remaining_seconds, Some(frozen));

    let data = daemon.client.wake().await.unwrap().data.unwrap();
    assert_eq!(data.state, Some("working".to_string()));
    assert!(data.remaining_seconds.unwrap() >= frozen - 1);
}

// ============================================================================
// Connection Errors
// ============================================================================

/// 接続エラー処理
///
/// 前提条件: Daemon未起動
/// 期待結果: Daemonの起動を促すエラーになる
#[tokio::test]
async fn connection_error_without_daemon() {
    let socket_path = create_temp_socket_path();
    let client = IpcClient::with_socket_path(socket_path).with_retries(1);

    let err = client.status().await.unwrap_err();

    assert!(err.to_string().contains("eyebreak daemon"));
}

/// 接続エラー時はリトライしてから失敗する
#[tokio::test]
async fn connection_error_retries_before_failing() {
    let socket_path = create_temp_socket_path();
    let client = IpcClient::with_socket_path(socket_path).with_retries(2);

    let started = std::time::Instant::now();
    let result = client.status().await;

    assert!(result.is_err());
    assert!(started.elapsed() >= Duration::from_millis(500));
}

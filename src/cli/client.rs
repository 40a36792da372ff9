//! IPC Client for communicating with the EyeBreak daemon.
//!
//! This module provides:
//! - Unix Domain Socket client
//! - Request/response handling
//! - Connection retry logic
//! - Timeout handling

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;
use tokio::time::timeout;

use crate::types::{IpcRequest, IpcResponse};

// ============================================================================
// Constants
// ============================================================================

/// Default socket path, relative to the home directory
const DEFAULT_SOCKET_PATH: &str = ".eyebreak/eyebreak.sock";

/// Connection timeout in seconds
const CONNECTION_TIMEOUT_SECS: u64 = 5;

/// Read/write timeout in seconds
const IO_TIMEOUT_SECS: u64 = 5;

/// Maximum response size in bytes (64KB)
const MAX_RESPONSE_SIZE: u64 = 65536;

/// Maximum retry attempts
const MAX_RETRIES: u32 = 3;

/// Retry delay in milliseconds (base delay, multiplied by attempt number)
const RETRY_DELAY_MS: u64 = 500;

// ============================================================================
// IpcClient
// ============================================================================

/// IPC client for daemon communication.
pub struct IpcClient {
    /// Socket path
    socket_path: PathBuf,
    /// Connection timeout
    timeout: Duration,
    /// Attempts per request
    retries: u32,
}

impl IpcClient {
    /// Creates a new IPC client with the default socket path.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn new() -> Result<Self> {
        Ok(Self::with_socket_path(Self::default_socket_path()?))
    }

    /// Creates a new IPC client with a custom socket path.
    pub fn with_socket_path(socket_path: PathBuf) -> Self {
        Self {
            socket_path,
            timeout: Duration::from_secs(CONNECTION_TIMEOUT_SECS),
            retries: MAX_RETRIES,
        }
    }

    /// Sets the number of attempts per request (at least one).
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries.max(1);
        self
    }

    /// Returns the default socket path, `~/.eyebreak/eyebreak.sock`.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn default_socket_path() -> Result<PathBuf> {
        let home = dirs::home_dir().context("ホームディレクトリを取得できませんでした")?;
        Ok(home.join(DEFAULT_SOCKET_PATH))
    }

    /// Returns the socket path.
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Sends a status query to the daemon.
    pub async fn status(&self) -> Result<IpcResponse> {
        self.send_request_with_retry(&IpcRequest::Status).await
    }

    /// Asks the daemon to start a break now.
    pub async fn start_break(&self) -> Result<IpcResponse> {
        self.send_request_with_retry(&IpcRequest::StartBreak).await
    }

    /// Asks the daemon to skip the current break.
    pub async fn skip_break(&self) -> Result<IpcResponse> {
        self.send_request_with_retry(&IpcRequest::SkipBreak).await
    }

    /// Sends a media selection to the daemon.
    pub async fn select_media(&self, path: &Path) -> Result<IpcResponse> {
        let request = IpcRequest::SelectMedia {
            path: path.to_path_buf(),
        };
        self.send_request_with_retry(&request).await
    }

    /// Asks the daemon to forget the media selection.
    pub async fn clear_media(&self) -> Result<IpcResponse> {
        self.send_request_with_retry(&IpcRequest::ClearMedia).await
    }

    /// Sends a new work interval in minutes.
    pub async fn set_work_minutes(&self, minutes: u32) -> Result<IpcResponse> {
        let request = IpcRequest::SetWorkInterval {
            seconds: minutes * 60,
        };
        self.send_request_with_retry(&request).await
    }

    /// Sends a new break interval in seconds.
    pub async fn set_break_seconds(&self, seconds: u32) -> Result<IpcResponse> {
        self.send_request_with_retry(&IpcRequest::SetBreakInterval { seconds })
            .await
    }

    /// Notifies the daemon that the system is going to sleep.
    pub async fn sleep(&self) -> Result<IpcResponse> {
        self.send_request_with_retry(&IpcRequest::Sleep).await
    }

    /// Notifies the daemon that the system woke up.
    pub async fn wake(&self) -> Result<IpcResponse> {
        self.send_request_with_retry(&IpcRequest::Wake).await
    }

    /// Sends a request to the daemon with retry logic.
    ///
    /// Error responses from the daemon are returned without retrying.
    async fn send_request_with_retry(&self, request: &IpcRequest) -> Result<IpcResponse> {
        let mut last_error = None;

        for attempt in 1..=self.retries {
            match self.send_request(request).await {
                Ok(response) if response.is_success() => return Ok(response),
                Ok(response) => anyhow::bail!("{}", response.message),
                Err(e) => {
                    tracing::warn!("リクエスト失敗 (試行 {}/{}): {}", attempt, self.retries, e);
                    last_error = Some(e);

                    if attempt < self.retries {
                        let delay = Duration::from_millis(RETRY_DELAY_MS * u64::from(attempt));
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| anyhow!("Daemonに接続できませんでした")))
    }

    /// Sends a single request to the daemon.
    async fn send_request(&self, request: &IpcRequest) -> Result<IpcResponse> {
        let mut stream = timeout(self.timeout, UnixStream::connect(&self.socket_path))
            .await
            .context("接続がタイムアウトしました")?
            .context("Daemonに接続できません。'eyebreak daemon' を起動してください")?;

        let request_json =
            serde_json::to_string(request).context("リクエストのシリアライズに失敗しました")?;

        timeout(
            Duration::from_secs(IO_TIMEOUT_SECS),
            stream.write_all(request_json.as_bytes()),
        )
        .await
        .context("書き込みがタイムアウトしました")?
        .context("リクエストの送信に失敗しました")?;

        // Shutdown write side to signal end of request
        stream
            .shutdown()
            .await
            .context("シャットダウンに失敗しました")?;

        let mut buffer = Vec::new();
        timeout(
            Duration::from_secs(IO_TIMEOUT_SECS),
            (&mut stream).take(MAX_RESPONSE_SIZE).read_to_end(&mut buffer),
        )
        .await
        .context("読み込みがタイムアウトしました")?
        .context("レスポンスの受信に失敗しました")?;

        if buffer.is_empty() {
            anyhow::bail!("Daemonからの応答がありませんでした");
        }

        serde_json::from_slice(&buffer).context("レスポンスのパースに失敗しました")
    }
}

// ============================================================================
// Tests
// ============================================================================

//! IPC Server for the EyeBreak daemon.
//!
//! This module provides Unix Domain Socket IPC functionality:
//! - Server that listens on a Unix socket
//! - Request/response handling for control commands
//! - Forwarding of each request to the running [`TimerEngine`] task
//!
//! [`TimerEngine`]: super::timer::TimerEngine

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};
use tokio::time::{timeout, Duration};
use tracing::{debug, warn};

use crate::types::{
    IpcRequest, IpcResponse, ResponseData, StatusSnapshot, SystemSignal, TimerState,
};

use super::timer::{EngineHandle, EngineRequest};

// ============================================================================
// Constants
// ============================================================================

/// Maximum request size in bytes (4KB)
const MAX_REQUEST_SIZE: usize = 4096;

/// Read timeout in seconds
const READ_TIMEOUT_SECS: u64 = 5;

// ============================================================================
// IpcError
// ============================================================================

/// IPC-specific error types.
#[derive(Debug, thiserror::Error)]
pub enum IpcError {
    /// Read error
    #[error("Failed to read request: {0}")]
    ReadError(String),

    /// Timeout error
    #[error("Operation timed out")]
    Timeout,

    /// Request too large
    #[error("Request too large (max {MAX_REQUEST_SIZE} bytes)")]
    RequestTooLarge,
}

// ============================================================================
// IpcServer
// ============================================================================

/// Unix Domain Socket IPC server.
pub struct IpcServer {
    /// Unix socket listener
    listener: UnixListener,
    /// Socket path (for cleanup)
    socket_path: PathBuf,
}

impl IpcServer {
    /// Creates a new IPC server bound to the specified socket path.
    ///
    /// If the socket file already exists, it will be removed before binding.
    ///
    /// # Errors
    ///
    /// Returns an error if the socket cannot be bound.
    pub fn new(socket_path: &Path) -> Result<Self> {
        if socket_path.exists() {
            std::fs::remove_file(socket_path)
                .with_context(|| format!("Failed to remove existing socket: {:?}", socket_path))?;
        }

        if let Some(parent) = socket_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create socket directory: {:?}", parent))?;
        }

        let listener = UnixListener::bind(socket_path)
            .with_context(|| format!("Failed to bind Unix socket: {:?}", socket_path))?;

        Ok(Self {
            listener,
            socket_path: socket_path.to_path_buf(),
        })
    }

    /// Accepts an incoming client connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be accepted.
    pub async fn accept(&self) -> Result<UnixStream> {
        let (stream, _addr) = self
            .listener
            .accept()
            .await
            .context("Failed to accept connection")?;
        Ok(stream)
    }

    /// Receives and deserializes an IPC request from the stream.
    ///
    /// The client writes one JSON document and shuts down its write half, so
    /// the request is read to EOF under a timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if reading times out, the request is too large, or
    /// deserialization fails.
    pub async fn receive_request(stream: &mut UnixStream) -> Result<IpcRequest> {
        let mut buffer = Vec::with_capacity(512);
        let mut limited = (&mut *stream).take(MAX_REQUEST_SIZE as u64 + 1);

        let read_result = timeout(
            Duration::from_secs(READ_TIMEOUT_SECS),
            limited.read_to_end(&mut buffer),
        )
        .await;

        match read_result {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => return Err(IpcError::ReadError(e.to_string()).into()),
            Err(_) => return Err(IpcError::Timeout.into()),
        }

        if buffer.is_empty() {
            anyhow::bail!("Connection closed by client");
        }
        if buffer.len() > MAX_REQUEST_SIZE {
            return Err(IpcError::RequestTooLarge.into());
        }

        let request: IpcRequest = serde_json::from_slice(&buffer)
            .with_context(|| "Failed to deserialize IPC request")?;

        Ok(request)
    }

    /// Serializes and sends an IPC response to the stream.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub async fn send_response(stream: &mut UnixStream, response: &IpcResponse) -> Result<()> {
        let json = serde_json::to_vec(response).context("Failed to serialize IPC response")?;

        stream
            .write_all(&json)
            .await
            .context("Failed to write response")?;
        stream.flush().await.context("Failed to flush response")?;

        Ok(())
    }

    /// Returns the socket path.
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Serves connections one at a time until accepting fails.
    ///
    /// Errors on a single connection are logged and do not stop the loop.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener can no longer accept connections.
    pub async fn serve(&self, handler: &RequestHandler) -> Result<()> {
        loop {
            let mut stream = self.accept().await?;
            if let Err(e) = Self::handle_connection(&mut stream, handler).await {
                warn!("IPC connection error: {:#}", e);
            }
        }
    }

    async fn handle_connection(stream: &mut UnixStream, handler: &RequestHandler) -> Result<()> {
        let response = match Self::receive_request(stream).await {
            Ok(request) => {
                debug!("IPC request: {:?}", request);
                handler.handle(request).await
            }
            Err(e) => IpcResponse::error(format!("不正なリクエストです: {}", e)),
        };
        Self::send_response(stream, &response).await
    }
}

impl Drop for IpcServer {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.socket_path);
    }
}

// ============================================================================
// RequestHandler
// ============================================================================

/// Handles IPC requests by forwarding them to the engine task.
pub struct RequestHandler {
    engine: EngineHandle,
}

impl RequestHandler {
    /// Creates a new request handler for the given engine.
    pub fn new(engine: EngineHandle) -> Self {
        Self { engine }
    }

    /// Handles an IPC request and returns the appropriate response.
    pub async fn handle(&self, request: IpcRequest) -> IpcResponse {
        match request {
            IpcRequest::Status => self.forward(EngineRequest::Status, "").await,
            IpcRequest::StartBreak => {
                self.forward(EngineRequest::StartBreak, "休憩を開始しました")
                    .await
            }
            IpcRequest::SkipBreak => {
                self.forward(EngineRequest::SkipBreak, "休憩をスキップしました")
                    .await
            }
            IpcRequest::SelectMedia { path } => self.handle_select_media(path).await,
            IpcRequest::ClearMedia => {
                self.forward(EngineRequest::ClearMedia, "メディアの選択を解除しました")
                    .await
            }
            IpcRequest::SetWorkInterval { seconds } => {
                let message = format!("作業時間を{}分に設定しました", seconds / 60);
                self.forward(EngineRequest::SetWorkInterval(seconds), &message)
                    .await
            }
            IpcRequest::SetBreakInterval { seconds } => {
                let message = format!("休憩時間を{}秒に設定しました", seconds);
                self.forward(EngineRequest::SetBreakInterval(seconds), &message)
                    .await
            }
            IpcRequest::Sleep => self.handle_signal(SystemSignal::WillSleep).await,
            IpcRequest::Wake => self.handle_signal(SystemSignal::DidWake).await,
        }
    }

    async fn handle_select_media(&self, path: PathBuf) -> IpcResponse {
        match self.engine.request(EngineRequest::SelectMedia(path)).await {
            Ok(snapshot) => {
                let message = if snapshot.bookmarked {
                    "メディアを選択しました"
                } else {
                    "メディアを選択しました（保存できなかったため、再起動後は元に戻ります）"
                };
                success(message, &snapshot)
            }
            Err(e) => IpcResponse::error(e.to_string()),
        }
    }

    async fn handle_signal(&self, signal: SystemSignal) -> IpcResponse {
        match self.engine.request(EngineRequest::Signal(signal)).await {
            Ok(snapshot) => {
                let message = match snapshot.state {
                    TimerState::Paused => "スリープのためタイマーを一時停止しました",
                    TimerState::Working => "タイマーを再開しました",
                    TimerState::OnBreak => "",
                };
                success(message, &snapshot)
            }
            Err(e) => IpcResponse::error(e.to_string()),
        }
    }

    async fn forward(&self, request: EngineRequest, message: &str) -> IpcResponse {
        match self.engine.request(request).await {
            Ok(snapshot) => success(message, &snapshot),
            Err(e) => IpcResponse::error(e.to_string()),
        }
    }
}

fn success(message: &str, snapshot: &StatusSnapshot) -> IpcResponse {
    IpcResponse::success(message, Some(ResponseData::from_snapshot(snapshot)))
}

// ============================================================================
// Tests
// ============================================================================

//! Daemon module for EyeBreak.
//!
//! This module contains the core daemon functionality:
//! - `timer`: Timer engine with state transitions, deadline and countdown logic
//! - `ipc`: Unix socket server forwarding control requests to the engine

pub mod ipc;
pub mod timer;

pub use ipc::{IpcServer, RequestHandler};
pub use timer::{
    Clock, EngineHandle, EngineRequest, ManualClock, Schedule, SystemClock, TimerEngine,
    TimerEvent,
};

//! Chartman Exec - external command execution
//!
//! This crate provides:
//! - `Invocation`: a single external process invocation (program, ordered
//!   arguments, env mapping, optional stdin payload, optional timeout)
//! - `CommandRunner`: the async seam the driver executes through
//! - `ProcessRunner`: production implementation on `tokio::process`
//! - `RecordingRunner`: test double that records invocations and replies
//!   with queued output

pub mod error;
pub mod runner;

pub use error::{ExecError, Result};
pub use runner::{CommandRunner, Invocation, ProcessRunner, RecordingRunner};

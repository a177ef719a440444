//! Error types for external command execution

use thiserror::Error;

/// Result type for runner operations
pub type Result<T> = std::result::Result<T, ExecError>;

/// Errors from running an external process
#[derive(Debug, Error)]
pub enum ExecError {
    /// The process could not be started
    #[error("failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The process ran but exited unsuccessfully. `code` is -1 when the
    /// process was terminated by a signal.
    #[error("'{program}' exited with code {code}: {stderr}")]
    NonZeroExit {
        program: String,
        code: i32,
        stderr: String,
    },

    /// The runner-enforced timeout elapsed before the process finished
    #[error("'{program}' timed out after {seconds}s")]
    Timeout { program: String, seconds: u64 },

    /// I/O failure while feeding stdin or collecting output
    #[error("I/O error running '{program}': {source}")]
    Io {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

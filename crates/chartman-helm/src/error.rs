//! Error types for the helm driver

use chartman_exec::ExecError;
use thiserror::Error;

/// Result type for driver operations
pub type Result<T> = std::result::Result<T, HelmError>;

/// Errors from chart lifecycle operations
#[derive(Debug, Error)]
pub enum HelmError {
    /// The values payload could not be serialized to YAML. Local failure;
    /// the external tool is never invoked.
    #[error("failed to serialize chart values: {0}")]
    Serialization(#[from] serde_yaml::Error),

    /// The external tool failed or could not be run. Passed through
    /// verbatim for every operation except delete.
    #[error(transparent)]
    Exec(#[from] ExecError),

    /// Delete failed; wraps the underlying cause with the release name.
    #[error("deleting helm release '{release}': {source}")]
    Deletion {
        release: String,
        #[source]
        source: ExecError,
    },
}

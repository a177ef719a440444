//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("invalid mirror endpoint '{endpoint}': expected host[:port]")]
    InvalidMirrorEndpoint { endpoint: String },
}

pub type Result<T> = std::result::Result<T, CoreError>;

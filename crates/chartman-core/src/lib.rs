//! Chartman Core - shared types for the chart lifecycle driver
//!
//! This crate provides the types the driver crates build on:
//! - `RegistryMirror`: rewrite rule redirecting chart pulls to a mirror
//! - `CoreError`: shared error type

pub mod error;
pub mod mirror;

pub use error::{CoreError, Result};
pub use mirror::RegistryMirror;

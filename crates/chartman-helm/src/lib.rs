//! Chartman Helm - the chart lifecycle driver
//!
//! Translates chart lifecycle intents (template, pull, push, install,
//! upgrade, list, delete, registry login) into invocations of the external
//! `helm` binary, consistently applying registry mirror rewriting,
//! insecure-mode flags, and environment variables. Execution happens
//! through the `chartman-exec` runner seam, so everything here is testable
//! without a helm binary or a cluster.

pub mod driver;
pub mod error;

pub use driver::{HelmConfig, HelmDriver, HelmOpt, InstallSpec};
pub use error::{HelmError, Result};

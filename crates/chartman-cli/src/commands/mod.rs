//! CLI commands

pub mod delete;
pub mod install;
pub mod list;
pub mod login;
pub mod pull;
pub mod push;
pub mod show;
pub mod template;
pub mod upgrade;

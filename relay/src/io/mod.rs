//! I/O helpers for relay commands.

pub mod config;
pub mod executor;
pub mod human;
pub mod init;
pub mod message;
pub mod process;
pub mod prompt;
pub mod session_store;

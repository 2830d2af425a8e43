//! Shared configuration and logging for the Desk-Bot daemon.

pub mod config;
pub mod logging;

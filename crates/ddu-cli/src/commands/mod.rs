//! CLI command implementations.

pub mod config;
pub mod defaults;
pub mod pick;

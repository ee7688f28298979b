//! # ddu-core
//!
//! Core types and abstractions for ddu, a streaming item-selection engine
//! embedded in a host text editor.
//!
//! This crate provides:
//! - Option objects and the merge rules used to layer them
//! - Item types shared by sources, filters, kinds and UIs
//! - Session events and action result flags
//! - The host editor contract
//! - Configuration system
//! - Common error types

pub mod config;
pub mod error;
pub mod event;
pub mod host;
pub mod item;
pub mod options;

pub use config::Config;
pub use error::{Error, Result};
pub use event::{ActionFlags, DduEvent, ExtType};
pub use host::{Host, NullHost};
pub use item::{DduItem, Item};
pub use options::{
    Context, DduOptions, KindOptions, Params, SourceOptions, UiOptions, UserOptions, UserSource,
};

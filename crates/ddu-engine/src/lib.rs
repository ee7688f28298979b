//! # ddu-engine
//!
//! Session engine for ddu.
//!
//! This crate provides:
//! - [`ContextBuilder`]: global and per-name option layers
//! - [`Ddu`]: one picker session, gathering and filtering items
//! - [`SessionStacks`]: push/pop of nested sessions per instance name
//! - [`Dispatcher`]: the host-facing entry point
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use ddu_core::NullHost;
//! use ddu_engine::Dispatcher;
//! use ddu_ext::ExtensionRegistry;
//! use serde_json::json;
//!
//! let dispatcher = Dispatcher::new(Arc::new(NullHost), ExtensionRegistry::with_builtins());
//! dispatcher
//!     .dispatch("start", vec![json!({
//!         "ui": "std",
//!         "sources": [{"name": "lines", "params": {"path": "Cargo.toml"}}],
//!     })])
//!     .await?;
//! ```

pub mod context;
pub mod ddu;
pub mod dispatch;
pub mod pipeline;
pub mod stack;

pub use context::ContextBuilder;
pub use ddu::{Ddu, SessionStatus};
pub use dispatch::{Dispatcher, RedrawOptions};
pub use stack::{Popped, SessionStacks};

//! # ddu-ext
//!
//! Extension layer for ddu.
//!
//! This crate provides:
//! - The [`Source`], [`Filter`], [`Kind`] and [`Ui`] contracts
//! - [`AliasTable`] for caller-defined alternate names
//! - [`ExtensionRegistry`] mapping resolved names to implementations
//! - A handful of built-in extensions (`std` UI, `lines` source,
//!   `matcher_substring`, `sorter_alpha`, `word` kind)
//!
//! ## Example
//!
//! ```ignore
//! use ddu_core::ExtType;
//! use ddu_ext::{AliasTable, ExtensionRegistry};
//!
//! let registry = ExtensionRegistry::with_builtins();
//! let aliases = AliasTable::new();
//! aliases.register(ExtType::Filter, "fuzzy", "matcher_substring");
//!
//! let matcher = registry.load_filter(&aliases, "fuzzy")?;
//! ```

pub mod alias;
pub mod builtin;
pub mod filter;
pub mod kind;
pub mod registry;
pub mod source;
pub mod ui;

pub use alias::AliasTable;
pub use filter::{Filter, FilterArgs};
pub use kind::{ActionArgs, Kind};
pub use registry::ExtensionRegistry;
pub use source::{GatherArgs, ItemStream, Source, SourceEventArgs, SourceInitArgs};
pub use ui::{Ui, UiActionArgs, UiRedrawArgs};

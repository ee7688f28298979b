//! Built-in extensions.
//!
//! Enough to pick lines of a file from a plain buffer. Richer sources,
//! matchers and UIs live in their own crates and register themselves with
//! [`crate::ExtensionRegistry`].

pub mod lines;
pub mod matcher_substring;
pub mod sorter_alpha;
pub mod std_ui;
pub mod word;

pub use lines::LinesSource;
pub use matcher_substring::SubstringMatcher;
pub use sorter_alpha::AlphaSorter;
pub use std_ui::StdUi;
pub use word::WordKind;

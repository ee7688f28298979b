//! Option layer merger.
//!
//! Effective options for a call are built from four layers, lowest first:
//! built-in defaults, the global layer, the local layer of the resolved
//! instance name, and the caller's own options.

use std::collections::HashMap;
use std::path::PathBuf;

use ddu_core::options::{default_options, fold_merge, merge_options};
use ddu_core::{Config, Context, DduOptions, Result, UserOptions};
use serde_json::Value;
use tracing::debug;

/// Holds the global layer and the per-name local layers.
#[derive(Debug, Clone)]
pub struct ContextBuilder {
    defaults: UserOptions,
    global: UserOptions,
    local: HashMap<String, UserOptions>,
}

impl ContextBuilder {
    pub fn new() -> Self {
        Self {
            defaults: default_options(),
            global: UserOptions::new(),
            local: HashMap::new(),
        }
    }

    /// Builder seeded from process configuration: `general.default_name`
    /// replaces the built-in instance name and `options` becomes the
    /// global layer.
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut builder = Self::new();
        builder
            .defaults
            .insert("name".into(), Value::String(config.general.default_name.clone()));
        builder.set_global(config.options.clone())?;
        Ok(builder)
    }

    /// Replace the global layer.
    pub fn set_global(&mut self, options: UserOptions) -> Result<()> {
        self.validate(&options)?;
        self.global = options;
        Ok(())
    }

    /// Replace the local layer of `name`.
    pub fn set_local(&mut self, name: &str, options: UserOptions) -> Result<()> {
        self.validate(&options)?;
        debug!(name, "Setting local options");
        self.local.insert(name.to_string(), options);
        Ok(())
    }

    /// Merge `options` into the global layer.
    pub fn patch_global(&mut self, options: &UserOptions) -> Result<()> {
        let mut candidate = self.global.clone();
        merge_options(&mut candidate, options);
        self.validate(&candidate)?;
        self.global = candidate;
        Ok(())
    }

    /// Merge `options` into the local layer of `name`.
    pub fn patch_local(&mut self, name: &str, options: &UserOptions) -> Result<()> {
        let mut candidate = self.local.get(name).cloned().unwrap_or_default();
        merge_options(&mut candidate, options);
        self.validate(&candidate)?;
        self.local.insert(name.to_string(), candidate);
        Ok(())
    }

    pub fn global(&self) -> UserOptions {
        self.global.clone()
    }

    /// Local layer of `name`; empty when none was set.
    pub fn local(&self, name: &str) -> UserOptions {
        self.local.get(name).cloned().unwrap_or_default()
    }

    pub fn default_options(&self) -> UserOptions {
        self.defaults.clone()
    }

    /// Effective context and options for a call with `user` options.
    ///
    /// The instance name is resolved from defaults, global and user layers
    /// first; that name picks the local layer. A local layer cannot rename
    /// the instance it belongs to.
    pub fn get(&self, user: &UserOptions) -> Result<(Context, DduOptions)> {
        let name = {
            let named = fold_merge(self.defaults.clone(), [&self.global, user]);
            named
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or("default")
                .to_string()
        };

        let layers = [Some(&self.global), self.local.get(&name), Some(user)];
        let merged = fold_merge(self.defaults.clone(), layers.into_iter().flatten());

        let mut options = DduOptions::from_object(merged)?;
        options.name = name;

        let path = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        let context = Context::new(options.input.clone(), path);
        Ok((context, options))
    }

    /// A layer is accepted only if it still yields valid options on top of
    /// the defaults.
    fn validate(&self, layer: &UserOptions) -> Result<()> {
        DduOptions::from_object(fold_merge(self.defaults.clone(), [layer])).map(|_| ())
    }
}

impl Default for ContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}

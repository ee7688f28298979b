//! Process-wide alias table.

use std::collections::HashMap;

use ddu_core::ExtType;
use parking_lot::RwLock;
use tracing::debug;

/// Maps `(extension type, alias)` to the base implementation name.
///
/// Reads take a shared lock and writes are a single map insert, so a reader
/// never sees a half-applied registration.
#[derive(Debug, Default)]
pub struct AliasTable {
    aliases: RwLock<HashMap<ExtType, HashMap<String, String>>>,
}

impl AliasTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `alias` as another name for `base`.
    pub fn register(&self, ext_type: ExtType, alias: impl Into<String>, base: impl Into<String>) {
        let alias = alias.into();
        let base = base.into();
        debug!(%ext_type, %alias, %base, "Registering alias");
        self.aliases
            .write()
            .entry(ext_type)
            .or_default()
            .insert(alias, base);
    }

    /// Base name registered for `alias`, if any.
    pub fn get(&self, ext_type: ExtType, alias: &str) -> Option<String> {
        self.aliases
            .read()
            .get(&ext_type)
            .and_then(|table| table.get(alias))
            .cloned()
    }

    /// Resolve a name: the aliased base if one is registered, else the name.
    pub fn resolve(&self, ext_type: ExtType, name: &str) -> String {
        self.get(ext_type, name).unwrap_or_else(|| name.to_string())
    }
}

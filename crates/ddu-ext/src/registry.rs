//! Extension registry for looking up implementations by name.

use std::collections::HashMap;
use std::sync::Arc;

use ddu_core::{Config, Error, ExtType, Result};

use crate::alias::AliasTable;
use crate::builtin::{AlphaSorter, LinesSource, StdUi, SubstringMatcher, WordKind};
use crate::{Filter, Kind, Source, Ui};

type Factory<T> = Arc<dyn Fn() -> Arc<T> + Send + Sync>;

/// Registry of available extensions.
///
/// Each entry is a factory, so every session gets its own instances and
/// per-instance state (initialization, UI marks) never leaks between
/// sessions.
pub struct ExtensionRegistry {
    uis: HashMap<String, Factory<dyn Ui>>,
    sources: HashMap<String, Factory<dyn Source>>,
    filters: HashMap<String, Factory<dyn Filter>>,
    kinds: HashMap<String, Factory<dyn Kind>>,
}

impl ExtensionRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            uis: HashMap::new(),
            sources: HashMap::new(),
            filters: HashMap::new(),
            kinds: HashMap::new(),
        }
    }

    /// Create a registry with all built-in extensions registered.
    pub fn with_builtins() -> Self {
        Self::from_config(&Config::default())
    }

    /// Create a registry with built-ins tuned by configuration.
    pub fn from_config(config: &Config) -> Self {
        let mut registry = Self::new();

        let max_items = config.ui.max_display_items;
        registry.register_ui("std", move || Arc::new(StdUi::new(max_items)));
        registry.register_source("lines", || Arc::new(LinesSource));
        registry.register_filter("matcher_substring", || Arc::new(SubstringMatcher));
        registry.register_filter("sorter_alpha", || Arc::new(AlphaSorter));
        registry.register_kind("word", || Arc::new(WordKind));

        registry
    }

    pub fn register_ui<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn() -> Arc<dyn Ui> + Send + Sync + 'static,
    {
        self.uis.insert(name.into(), Arc::new(factory));
    }

    pub fn register_source<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn() -> Arc<dyn Source> + Send + Sync + 'static,
    {
        self.sources.insert(name.into(), Arc::new(factory));
    }

    pub fn register_filter<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn() -> Arc<dyn Filter> + Send + Sync + 'static,
    {
        self.filters.insert(name.into(), Arc::new(factory));
    }

    pub fn register_kind<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn() -> Arc<dyn Kind> + Send + Sync + 'static,
    {
        self.kinds.insert(name.into(), Arc::new(factory));
    }

    /// Check if an implementation is registered under `name`.
    pub fn contains(&self, ext_type: ExtType, name: &str) -> bool {
        match ext_type {
            ExtType::Ui => self.uis.contains_key(name),
            ExtType::Source => self.sources.contains_key(name),
            ExtType::Filter => self.filters.contains_key(name),
            ExtType::Kind => self.kinds.contains_key(name),
        }
    }

    /// List registered names of one type, sorted.
    pub fn list(&self, ext_type: ExtType) -> Vec<&str> {
        let mut names: Vec<&str> = match ext_type {
            ExtType::Ui => self.uis.keys().map(String::as_str).collect(),
            ExtType::Source => self.sources.keys().map(String::as_str).collect(),
            ExtType::Filter => self.filters.keys().map(String::as_str).collect(),
            ExtType::Kind => self.kinds.keys().map(String::as_str).collect(),
        };
        names.sort_unstable();
        names
    }

    /// Instantiate a UI, resolving `name` through the alias table first.
    pub fn load_ui(&self, aliases: &AliasTable, name: &str) -> Result<Arc<dyn Ui>> {
        load(&self.uis, aliases, ExtType::Ui, name)
    }

    pub fn load_source(&self, aliases: &AliasTable, name: &str) -> Result<Arc<dyn Source>> {
        load(&self.sources, aliases, ExtType::Source, name)
    }

    pub fn load_filter(&self, aliases: &AliasTable, name: &str) -> Result<Arc<dyn Filter>> {
        load(&self.filters, aliases, ExtType::Filter, name)
    }

    pub fn load_kind(&self, aliases: &AliasTable, name: &str) -> Result<Arc<dyn Kind>> {
        load(&self.kinds, aliases, ExtType::Kind, name)
    }
}

impl Default for ExtensionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn load<T: ?Sized>(
    factories: &HashMap<String, Factory<T>>,
    aliases: &AliasTable,
    ext_type: ExtType,
    name: &str,
) -> Result<Arc<T>> {
    let base = aliases.resolve(ext_type, name);
    factories
        .get(&base)
        .map(|factory| factory())
        .ok_or_else(|| Error::unknown(ext_type, name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FilterArgs;
    use ddu_core::{DduItem, Params};

    struct Reverse;

    impl Filter for Reverse {
        fn name(&self) -> &str {
            "converter_reverse"
        }

        fn filter(&self, args: FilterArgs<'_>) -> anyhow::Result<Vec<DduItem>> {
            Ok(args.items.into_iter().rev().collect())
        }

        fn params(&self) -> Params {
            Params::new()
        }
    }

    #[test]
    fn test_builtins_registered() {
        let registry = ExtensionRegistry::with_builtins();
        assert_eq!(registry.list(ExtType::Ui), vec!["std"]);
        assert_eq!(registry.list(ExtType::Filter), vec!["matcher_substring", "sorter_alpha"]);
        assert!(registry.contains(ExtType::Source, "lines"));
        assert!(registry.contains(ExtType::Kind, "word"));
    }

    #[test]
    fn test_load_through_alias() {
        let mut registry = ExtensionRegistry::new();
        registry.register_filter("converter_reverse", || Arc::new(Reverse));

        let aliases = AliasTable::new();
        assert!(matches!(
            registry.load_filter(&aliases, "rev"),
            Err(Error::UnknownExtension { ext_type: ExtType::Filter, .. })
        ));

        aliases.register(ExtType::Filter, "rev", "converter_reverse");
        let filter = registry.load_filter(&aliases, "rev").unwrap();
        assert_eq!(filter.name(), "converter_reverse");
    }

    #[test]
    fn test_each_load_is_a_new_instance() {
        let registry = ExtensionRegistry::with_builtins();
        let aliases = AliasTable::new();
        let a = registry.load_ui(&aliases, "std").unwrap();
        let b = registry.load_ui(&aliases, "std").unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
    }
}

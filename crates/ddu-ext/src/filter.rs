//! Pipeline stage contract shared by converters, matchers and sorters.

use ddu_core::{Context, DduItem, DduOptions, Params, SourceOptions};

/// Arguments for one stage invocation over one source's items.
pub struct FilterArgs<'a> {
    pub context: &'a Context,
    pub options: &'a DduOptions,
    pub source_options: &'a SourceOptions,
    pub filter_options: &'a Params,
    pub filter_params: &'a Params,
    /// Query string; matchers narrow by it, other stages may ignore it
    pub input: &'a str,
    pub items: Vec<DduItem>,
}

/// A synchronous transformation over an item collection.
///
/// Stages may reorder, drop or annotate items. Fields a stage does not
/// touch must pass through unchanged.
pub trait Filter: Send + Sync {
    fn name(&self) -> &str;

    fn filter(&self, args: FilterArgs<'_>) -> anyhow::Result<Vec<DduItem>>;

    fn params(&self) -> Params {
        Params::new()
    }
}

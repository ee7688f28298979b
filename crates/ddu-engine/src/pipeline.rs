//! Per-source filter pipeline.
//!
//! Every source's raw items run through its converters, then matchers, then
//! sorters, and are truncated to the source's `maxItems`. The per-source
//! results are concatenated in source declaration order and indexed.

use std::collections::HashMap;
use std::sync::Arc;

use ddu_core::{Context, DduItem, DduOptions, SourceOptions};
use ddu_ext::{Filter, FilterArgs};
use tracing::{trace, warn};

/// Loaded filters keyed by the name the options use for them.
pub type FilterSet = HashMap<String, Arc<dyn Filter>>;

/// One source's slice of the session, as the pipeline sees it.
pub struct SourceBatch<'a> {
    pub source_options: &'a SourceOptions,
    pub items: &'a [DduItem],
}

/// Run the stages configured for one source over its items.
///
/// Names missing from `filters` were reported when loading and are skipped
/// here. A stage that fails is skipped; the items it was given carry on to
/// the next stage.
pub fn filter_source_items(
    filters: &FilterSet,
    context: &Context,
    options: &DduOptions,
    source_options: &SourceOptions,
    items: Vec<DduItem>,
) -> Vec<DduItem> {
    let stages = source_options
        .converters
        .iter()
        .chain(&source_options.matchers)
        .chain(&source_options.sorters);

    let mut items = items;
    for name in stages {
        let Some(filter) = filters.get(name) else {
            trace!(filter = %name, "Skipping unloaded filter");
            continue;
        };

        let filter_options = options.filter_options(name);
        let filter_params = options.filter_params(name, filter.params());
        let args = FilterArgs {
            context,
            options,
            source_options,
            filter_options: &filter_options,
            filter_params: &filter_params,
            input: &options.input,
            items: items.clone(),
        };

        match filter.filter(args) {
            Ok(filtered) => items = filtered,
            Err(e) => warn!(filter = %name, error = %format!("{:#}", e), "Filter failed, skipping"),
        }
    }

    items.truncate(source_options.max_items);
    items
}

/// Filter every source and build the indexed collection handed to the UI.
pub fn build_collection(
    filters: &FilterSet,
    context: &Context,
    options: &DduOptions,
    sources: &[SourceBatch<'_>],
) -> Vec<DduItem> {
    let mut collection = Vec::new();
    for source in sources {
        collection.extend(filter_source_items(
            filters,
            context,
            options,
            source.source_options,
            source.items.to_vec(),
        ));
    }

    for (index, item) in collection.iter_mut().enumerate() {
        item.index = index;
        item.selected = false;
    }
    collection
}

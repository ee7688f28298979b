//! `sorter_alpha`: order items by word.

use ddu_core::DduItem;

use crate::filter::{Filter, FilterArgs};

pub struct AlphaSorter;

impl Filter for AlphaSorter {
    fn name(&self) -> &str {
        "sorter_alpha"
    }

    fn filter(&self, args: FilterArgs<'_>) -> anyhow::Result<Vec<DduItem>> {
        let mut items = args.items;
        items.sort_by(|a, b| a.word.cmp(&b.word));
        Ok(items)
    }
}

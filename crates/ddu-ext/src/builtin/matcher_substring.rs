//! `matcher_substring`: keep items whose matcher key contains every term.

use ddu_core::DduItem;

use crate::filter::{Filter, FilterArgs};

/// Splits the input on whitespace; an item matches when its matcher key
/// contains all terms. Honors `ignoreCase` of the source.
pub struct SubstringMatcher;

impl Filter for SubstringMatcher {
    fn name(&self) -> &str {
        "matcher_substring"
    }

    fn filter(&self, args: FilterArgs<'_>) -> anyhow::Result<Vec<DduItem>> {
        let ignore_case = args.source_options.ignore_case;
        let fold = |s: &str| if ignore_case { s.to_lowercase() } else { s.to_string() };

        let terms: Vec<String> = args.input.split_whitespace().map(fold).collect();
        if terms.is_empty() {
            return Ok(args.items);
        }

        Ok(args
            .items
            .into_iter()
            .filter(|item| {
                let key = fold(&item.matcher_key);
                terms.iter().all(|term| key.contains(term.as_str()))
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ddu_core::{Context, DduOptions, Params, SourceOptions};

    fn item(word: &str) -> DduItem {
        DduItem {
            word: word.to_string(),
            matcher_key: word.to_string(),
            ..Default::default()
        }
    }

    fn run(input: &str, ignore_case: bool, words: &[&str]) -> Vec<String> {
        let source_options = SourceOptions {
            ignore_case,
            ..Default::default()
        };
        let empty = Params::new();
        SubstringMatcher
            .filter(FilterArgs {
                context: &Context::default(),
                options: &DduOptions::default(),
                source_options: &source_options,
                filter_options: &empty,
                filter_params: &empty,
                input,
                items: words.iter().map(|w| item(w)).collect(),
            })
            .unwrap()
            .into_iter()
            .map(|i| i.word)
            .collect()
    }

    #[test]
    fn test_empty_input_keeps_all() {
        assert_eq!(run("  ", false, &["a", "b"]), vec!["a", "b"]);
    }

    #[test]
    fn test_all_terms_must_match() {
        let words = ["src/main.rs", "src/lib.rs", "tests/main_test.rs"];
        assert_eq!(run("main src", false, &words), vec!["src/main.rs"]);
    }

    #[test]
    fn test_ignore_case() {
        let words = ["README.md", "readme.txt"];
        assert_eq!(run("readme", false, &words), vec!["readme.txt"]);
        assert_eq!(run("readme", true, &words), vec!["README.md", "readme.txt"]);
    }
}

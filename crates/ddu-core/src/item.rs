//! Candidate items.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A raw item as produced by a source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    /// Text the item is known by
    pub word: String,
    /// Text shown instead of `word`, if different
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
    /// Opaque payload owned by the source
    #[serde(default)]
    pub action: Value,
    /// Kind override; the source's kind is used when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl Item {
    pub fn new(word: impl Into<String>) -> Self {
        Self {
            word: word.into(),
            ..Default::default()
        }
    }

    pub fn with_display(mut self, display: impl Into<String>) -> Self {
        self.display = Some(display.into());
        self
    }

    pub fn with_action(mut self, action: Value) -> Self {
        self.action = action;
        self
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }
}

/// An item after it entered a session.
///
/// `index` is the position in the most recent collection handed to the UI;
/// it is what UI and item actions refer to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DduItem {
    pub word: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
    #[serde(default)]
    pub action: Value,
    #[serde(default)]
    pub kind: String,
    /// String the matchers compare against
    #[serde(default)]
    pub matcher_key: String,
    /// Name the source was declared under
    #[serde(default)]
    pub source_name: String,
    /// Position of the source in the session's source list
    #[serde(default)]
    pub source_index: usize,
    #[serde(default)]
    pub index: usize,
    #[serde(default)]
    pub selected: bool,
}

impl DduItem {
    /// Stamp a raw item with its origin.
    ///
    /// `matcher_key_field` picks the field matchers look at: `word`,
    /// `display`, or a string field of the action payload. Anything that
    /// does not resolve falls back to `word`.
    pub fn from_item(
        item: Item,
        source_name: &str,
        source_index: usize,
        default_kind: &str,
        matcher_key_field: &str,
    ) -> Self {
        let matcher_key = match matcher_key_field {
            "word" => item.word.clone(),
            "display" => item.display.clone().unwrap_or_else(|| item.word.clone()),
            key => item
                .action
                .get(key)
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| item.word.clone()),
        };

        Self {
            kind: item.kind.unwrap_or_else(|| default_kind.to_string()),
            word: item.word,
            display: item.display,
            action: item.action,
            matcher_key,
            source_name: source_name.to_string(),
            source_index,
            index: 0,
            selected: false,
        }
    }

    /// Text a UI should render.
    pub fn label(&self) -> &str {
        self.display.as_deref().unwrap_or(&self.word)
    }
}

//! Option objects and the rules for layering them.
//!
//! Options travel as JSON objects so callers can carry keys the engine does
//! not know about. [`DduOptions`] is the typed view of a fully merged layer
//! stack; unknown keys survive in [`DduOptions::extra`].

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Free-form extension parameters.
pub type Params = Map<String, Value>;

/// A partial option object as supplied by a caller or stored in a layer.
pub type UserOptions = Map<String, Value>;

/// Per-name key whose entries apply to every extension of a type.
pub const WILDCARD: &str = "_";

/// Keys holding `{ extension name -> object }` maps. These merge one level
/// deeper than the rest of the options.
pub const PER_NAME_KEYS: [&str; 8] = [
    "uiOptions",
    "uiParams",
    "sourceOptions",
    "sourceParams",
    "filterOptions",
    "filterParams",
    "kindOptions",
    "kindParams",
];

/// A source entry in `sources`: either a bare name or a name with inline
/// options and params.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserSource {
    Name(String),
    Spec {
        name: String,
        #[serde(default)]
        options: Params,
        #[serde(default)]
        params: Params,
    },
}

impl UserSource {
    pub fn name(&self) -> &str {
        match self {
            UserSource::Name(name) => name,
            UserSource::Spec { name, .. } => name,
        }
    }

    fn inline_options(&self) -> Option<&Params> {
        match self {
            UserSource::Name(_) => None,
            UserSource::Spec { options, .. } => Some(options),
        }
    }

    fn inline_params(&self) -> Option<&Params> {
        match self {
            UserSource::Name(_) => None,
            UserSource::Spec { params, .. } => Some(params),
        }
    }
}

impl From<&str> for UserSource {
    fn from(name: &str) -> Self {
        UserSource::Name(name.to_string())
    }
}

/// Effective options of one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DduOptions {
    /// Instance name; sessions and local option layers are keyed by it
    pub name: String,
    /// Query string handed to sources and matchers
    pub input: String,
    /// Open a nested session on top of the current one
    pub push: bool,
    /// Re-gather when resuming
    pub refresh: bool,
    /// Reuse the existing session state instead of starting over
    pub resume: bool,
    /// Re-gather on every redraw request
    pub volatile: bool,
    pub sources: Vec<UserSource>,
    pub ui: String,
    pub ui_options: Map<String, Value>,
    pub ui_params: Map<String, Value>,
    pub source_options: Map<String, Value>,
    pub source_params: Map<String, Value>,
    pub filter_options: Map<String, Value>,
    pub filter_params: Map<String, Value>,
    pub kind_options: Map<String, Value>,
    pub kind_params: Map<String, Value>,
    /// Keys the engine does not interpret
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for DduOptions {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            input: String::new(),
            push: false,
            refresh: false,
            resume: false,
            volatile: false,
            sources: Vec::new(),
            ui: String::new(),
            ui_options: Map::new(),
            ui_params: Map::new(),
            source_options: Map::new(),
            source_params: Map::new(),
            filter_options: Map::new(),
            filter_params: Map::new(),
            kind_options: Map::new(),
            kind_params: Map::new(),
            extra: Map::new(),
        }
    }
}

/// Built-in defaults as a plain option object.
pub fn default_options() -> UserOptions {
    to_object(&DduOptions::default()).unwrap_or_default()
}

impl DduOptions {
    /// Build typed options from a merged option object.
    pub fn from_object(object: UserOptions) -> Result<Self> {
        serde_json::from_value(Value::Object(object))
            .map_err(|e| Error::InvalidOptions(e.to_string()))
    }

    /// Convert back into an option object.
    pub fn to_object(&self) -> Result<UserOptions> {
        to_object(self)
    }

    /// Apply a partial option object on top of these options.
    pub fn patch(&mut self, patch: &UserOptions) -> Result<()> {
        let mut object = self.to_object()?;
        merge_options(&mut object, patch);
        *self = Self::from_object(object)?;
        Ok(())
    }

    pub fn source_options(&self, source: &UserSource) -> Result<SourceOptions> {
        resolve_ext(&self.source_options, source.name(), source.inline_options())
    }

    pub fn source_params(&self, source: &UserSource, defaults: Params) -> Params {
        resolve_params(&self.source_params, source.name(), defaults, source.inline_params())
    }

    pub fn ui_options(&self, name: &str) -> Result<UiOptions> {
        resolve_ext(&self.ui_options, name, None)
    }

    pub fn ui_params(&self, name: &str, defaults: Params) -> Params {
        resolve_params(&self.ui_params, name, defaults, None)
    }

    pub fn filter_options(&self, name: &str) -> Params {
        resolve_params(&self.filter_options, name, Params::new(), None)
    }

    pub fn filter_params(&self, name: &str, defaults: Params) -> Params {
        resolve_params(&self.filter_params, name, defaults, None)
    }

    pub fn kind_options(&self, name: &str) -> Result<KindOptions> {
        resolve_ext(&self.kind_options, name, None)
    }

    pub fn kind_params(&self, name: &str, defaults: Params) -> Params {
        resolve_params(&self.kind_params, name, defaults, None)
    }
}

/// Options of one source, resolved for one gather pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SourceOptions {
    /// Action aliases: requested name -> action name
    pub actions: BTreeMap<String, String>,
    pub converters: Vec<String>,
    pub default_action: String,
    pub ignore_case: bool,
    /// Item field matchers compare against
    pub matcher_key: String,
    pub matchers: Vec<String>,
    pub max_items: usize,
    pub path: String,
    pub sorters: Vec<String>,
}

impl Default for SourceOptions {
    fn default() -> Self {
        Self {
            actions: BTreeMap::new(),
            converters: Vec::new(),
            default_action: String::new(),
            ignore_case: false,
            matcher_key: "word".to_string(),
            matchers: Vec::new(),
            max_items: 10000,
            path: String::new(),
            sorters: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UiOptions {
    pub default_action: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KindOptions {
    pub actions: BTreeMap<String, String>,
    pub default_action: String,
}

/// Per-call state threaded through a gather pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Context {
    pub input: String,
    pub path: PathBuf,
    /// Every source finished its current pass
    pub done: bool,
    /// Items gathered so far across all sources
    pub max_items: usize,
}

impl Context {
    pub fn new(input: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            path: path.into(),
            done: false,
            max_items: 0,
        }
    }
}

/// Shallow-merge `patch` into `base`: keys in `patch` replace keys in `base`.
pub fn overlay(base: &mut Map<String, Value>, patch: &Map<String, Value>) {
    for (key, value) in patch {
        base.insert(key.clone(), value.clone());
    }
}

/// Merge one option layer into another.
///
/// Top-level keys are replaced. For the per-extension maps listed in
/// [`PER_NAME_KEYS`] each named entry is itself overlaid, so patching one
/// field of one source's options keeps its other fields.
pub fn merge_options(base: &mut UserOptions, patch: &UserOptions) {
    for (key, value) in patch {
        let nested = PER_NAME_KEYS.contains(&key.as_str());
        match (nested, base.get_mut(key), value) {
            (true, Some(Value::Object(current)), Value::Object(incoming)) => {
                for (name, entry) in incoming {
                    match (current.get_mut(name), entry) {
                        (Some(Value::Object(existing)), Value::Object(fields)) => {
                            overlay(existing, fields)
                        }
                        _ => {
                            current.insert(name.clone(), entry.clone());
                        }
                    }
                }
            }
            _ => {
                base.insert(key.clone(), value.clone());
            }
        }
    }
}

/// Fold layers left to right onto `base`.
pub fn fold_merge<'a>(
    base: UserOptions,
    layers: impl IntoIterator<Item = &'a UserOptions>,
) -> UserOptions {
    layers.into_iter().fold(base, |mut acc, layer| {
        merge_options(&mut acc, layer);
        acc
    })
}

/// Require a JSON value to be an object.
pub fn ensure_object(value: Value, what: &str) -> Result<UserOptions> {
    match value {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        other => Err(Error::InvalidOptions(format!(
            "{} must be a dictionary, got {}",
            what,
            type_name(&other)
        ))),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "dictionary",
    }
}

fn to_object<T: Serialize>(value: &T) -> Result<UserOptions> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        _ => Err(Error::Internal("options did not serialize to an object".into())),
    }
}

fn named_layers<'a>(map: &'a Map<String, Value>, name: &str) -> impl Iterator<Item = &'a Params> {
    [map.get(WILDCARD), map.get(name)]
        .into_iter()
        .flatten()
        .filter_map(Value::as_object)
}

fn resolve_ext<T>(map: &Map<String, Value>, name: &str, inline: Option<&Params>) -> Result<T>
where
    T: Default + Serialize + DeserializeOwned,
{
    let mut object = to_object(&T::default())?;
    for layer in named_layers(map, name).chain(inline) {
        overlay(&mut object, layer);
    }
    serde_json::from_value(Value::Object(object))
        .map_err(|e| Error::InvalidOptions(format!("options for '{}': {}", name, e)))
}

fn resolve_params(
    map: &Map<String, Value>,
    name: &str,
    defaults: Params,
    inline: Option<&Params>,
) -> Params {
    let mut params = defaults;
    for layer in named_layers(map, name).chain(inline) {
        overlay(&mut params, layer);
    }
    params
}

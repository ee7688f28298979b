//! Extension types, session events and action result flags.

use std::fmt;
use std::str::FromStr;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// The four kinds of pluggable extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtType {
    Ui,
    Source,
    Filter,
    Kind,
}

impl ExtType {
    /// All extension types, in alias-table order.
    pub const ALL: [ExtType; 4] = [ExtType::Ui, ExtType::Source, ExtType::Filter, ExtType::Kind];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExtType::Ui => "ui",
            ExtType::Source => "source",
            ExtType::Filter => "filter",
            ExtType::Kind => "kind",
        }
    }
}

impl fmt::Display for ExtType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExtType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ui" => Ok(ExtType::Ui),
            "source" => Ok(ExtType::Source),
            "filter" => Ok(ExtType::Filter),
            "kind" => Ok(ExtType::Kind),
            other => Err(format!("unknown extension type '{}'", other)),
        }
    }
}

/// Session lifecycle notification forwarded to sources and the UI.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DduEvent {
    Close,
    Cancel,
    /// Any other host-defined event, passed through untouched
    Other(String),
}

impl DduEvent {
    /// Whether this event ends the session.
    pub fn is_terminal(&self) -> bool {
        matches!(self, DduEvent::Close | DduEvent::Cancel)
    }

    pub fn as_str(&self) -> &str {
        match self {
            DduEvent::Close => "close",
            DduEvent::Cancel => "cancel",
            DduEvent::Other(name) => name,
        }
    }
}

impl From<String> for DduEvent {
    fn from(name: String) -> Self {
        match name.as_str() {
            "close" => DduEvent::Close,
            "cancel" => DduEvent::Cancel,
            _ => DduEvent::Other(name),
        }
    }
}

impl From<&str> for DduEvent {
    fn from(name: &str) -> Self {
        DduEvent::from(name.to_string())
    }
}

impl From<DduEvent> for String {
    fn from(event: DduEvent) -> Self {
        event.as_str().to_string()
    }
}

impl fmt::Display for DduEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

bitflags! {
    /// What the engine must do after an action handler returns.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ActionFlags: u8 {
        /// Discard the item collection and gather again
        const REFRESH_ITEMS = 0b0001;
        /// Render the current collection again
        const REDRAW = 0b0010;
        /// Keep the UI open after an item action
        const PERSIST = 0b0100;
    }
}

impl ActionFlags {
    pub const NONE: ActionFlags = ActionFlags::empty();
}

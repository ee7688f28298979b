//! Error types for ddu.
//!
//! Every fallible engine operation returns [`Error`]. Failures raised by
//! extension implementations arrive as `anyhow::Error` and are folded into
//! [`Error::Extension`] at the point where the engine calls them.

use thiserror::Error;

use crate::event::ExtType;

/// Result type alias using ddu's [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for ddu.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file or environment could not be loaded
    #[error("Configuration error: {0}")]
    Config(String),

    /// Caller passed a structurally invalid option object or argument
    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    /// An extension name did not resolve to a registered implementation
    #[error("Unknown {ext_type} '{name}'")]
    UnknownExtension { ext_type: ExtType, name: String },

    /// Action name is not defined by the UI, source or kind
    #[error("No such action: {name}")]
    NoSuchAction { name: String },

    /// `default` was requested but neither source nor kind names one
    #[error("No default action is configured")]
    NoDefaultAction,

    /// Operation on a session that was closed or cancelled
    #[error("Session '{0}' is terminated")]
    SessionTerminated(String),

    /// An extension implementation failed
    #[error("{ext_type} '{name}' failed: {message}")]
    Extension {
        ext_type: ExtType,
        name: String,
        message: String,
    },

    /// Host round trip failed
    #[error("Host error: {0}")]
    Host(String),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Internal invariant violation
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Get a recovery suggestion for this error.
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            Error::Config(_) => Some("Check your config file at ~/.config/ddu/config.toml"),
            Error::InvalidOptions(_) => Some("Options must be passed as a dictionary"),
            Error::UnknownExtension { .. } => {
                Some("Register the extension or define an alias with ddu#custom#alias()")
            }
            Error::NoSuchAction { .. } => Some("Use getItemActions to list the available actions"),
            Error::NoDefaultAction => Some("Set defaultAction in sourceOptions or kindOptions"),
            Error::SessionTerminated(_) => Some("Start the picker again"),
            _ => None,
        }
    }

    /// Wrap an extension failure.
    pub fn extension(ext_type: ExtType, name: impl Into<String>, err: anyhow::Error) -> Self {
        Error::Extension {
            ext_type,
            name: name.into(),
            message: format!("{:#}", err),
        }
    }

    /// Create an unknown-extension error.
    pub fn unknown(ext_type: ExtType, name: impl Into<String>) -> Self {
        Error::UnknownExtension {
            ext_type,
            name: name.into(),
        }
    }

    /// Create a no-such-action error.
    pub fn no_such_action(name: impl Into<String>) -> Self {
        Error::NoSuchAction { name: name.into() }
    }
}

/// Format an error with its recovery suggestion.
pub fn format_error_with_suggestion(error: &Error) -> String {
    let mut output = error.to_string();
    if let Some(suggestion) = error.recovery_suggestion() {
        output.push_str(&format!("\n  Suggestion: {}", suggestion));
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_extension() {
        let err = Error::unknown(ExtType::Source, "file_rec");
        assert_eq!(err.to_string(), "Unknown source 'file_rec'");
        assert!(err.recovery_suggestion().is_some());
    }

    #[test]
    fn test_extension_failure_keeps_context() {
        let cause = anyhow::anyhow!("permission denied").context("reading /etc");
        let err = Error::extension(ExtType::Filter, "matcher_fzf", cause);
        let text = err.to_string();
        assert!(text.contains("filter 'matcher_fzf'"));
        assert!(text.contains("permission denied"));
    }

    #[test]
    fn test_format_with_suggestion() {
        let text = format_error_with_suggestion(&Error::NoDefaultAction);
        assert!(text.contains("Suggestion"));
        let text = format_error_with_suggestion(&Error::Host("timeout".into()));
        assert!(!text.contains("Suggestion"));
    }
}

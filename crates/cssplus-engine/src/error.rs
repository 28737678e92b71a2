//! Engine error tiers.
//!
//! Every failure carries the CSS location it originates from when one is
//! known. Errors are `Clone` because a shared node task hands the same
//! result to every task awaiting it.

use cssplus_common::{Diagnostic, Severity, SourceLocation};
use strum_macros::Display;
use thiserror::Error;

/// Failures raised while applying a stylesheet.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// An engine invariant was violated, or a plugin broke its contract.
    #[error("internal error: {message}")]
    Bug {
        /// What went wrong.
        message: String,
        /// The declaration or selector being processed.
        css: Option<SourceLocation>,
    },

    /// The stylesheet is invalid, or a lookup that must be unique was not.
    #[error("{message}")]
    User {
        /// What went wrong.
        message: String,
        /// Where in the stylesheet.
        css: Option<SourceLocation>,
        /// The document node involved.
        html: Option<SourceLocation>,
    },

    /// A value called a function the engine does not evaluate, such as
    /// `url()` or `calc()`. The cascade turns this into a residual rule.
    #[error("unsupported function {name}()")]
    UnsupportedFunction {
        /// Function name.
        name: String,
        /// The declaration containing the call.
        css: Option<SourceLocation>,
    },

    /// The author asked for the run to stop (`x-throw`). Never recovered.
    #[error("x-throw: {message}")]
    ExplicitFailure {
        /// The author's message.
        message: String,
        /// The declaration that raised it.
        css: Option<SourceLocation>,
    },
}

impl EngineError {
    /// An internal invariant failure.
    #[must_use]
    pub fn bug(message: impl Into<String>) -> Self {
        Self::Bug {
            message: message.into(),
            css: None,
        }
    }

    /// A user error at `css`.
    #[must_use]
    pub fn user(message: impl Into<String>, css: Option<SourceLocation>) -> Self {
        Self::User {
            message: message.into(),
            css,
            html: None,
        }
    }

    /// Attach the location of the document node involved.
    #[must_use]
    pub fn with_html(self, location: Option<SourceLocation>) -> Self {
        match self {
            Self::User { message, css, .. } => Self::User {
                message,
                css,
                html: location,
            },
            other => other,
        }
    }

    /// Fill in the CSS location if none was recorded yet.
    #[must_use]
    pub fn or_at(self, location: SourceLocation) -> Self {
        match self {
            Self::Bug { message, css } => Self::Bug {
                message,
                css: css.or(Some(location)),
            },
            Self::User { message, css, html } => Self::User {
                message,
                css: css.or(Some(location)),
                html,
            },
            Self::UnsupportedFunction { name, css } => Self::UnsupportedFunction {
                name,
                css: css.or(Some(location)),
            },
            Self::ExplicitFailure { message, css } => Self::ExplicitFailure {
                message,
                css: css.or(Some(location)),
            },
        }
    }

    /// The diagnostic tier of this error.
    #[must_use]
    pub const fn severity(&self) -> Severity {
        match self {
            Self::Bug { .. } => Severity::Bug,
            Self::User { .. } | Self::UnsupportedFunction { .. } | Self::ExplicitFailure { .. } => {
                Severity::Error
            }
        }
    }

    /// Whether this is the recoverable unsupported-function signal.
    #[must_use]
    pub const fn is_unsupported_function(&self) -> bool {
        matches!(self, Self::UnsupportedFunction { .. })
    }

    /// The CSS location, if known.
    #[must_use]
    pub const fn css_location(&self) -> Option<SourceLocation> {
        match self {
            Self::Bug { css, .. }
            | Self::User { css, .. }
            | Self::UnsupportedFunction { css, .. }
            | Self::ExplicitFailure { css, .. } => *css,
        }
    }

    /// Convert into a diagnostic record.
    #[must_use]
    pub fn to_diagnostic(&self) -> Diagnostic {
        let html = match self {
            Self::User { html, .. } => *html,
            _ => None,
        };
        Diagnostic::new(self.severity(), self.to_string(), self.css_location()).with_html(html)
    }
}

/// The four kinds of plugin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum PluginKind {
    /// `::name(...)`
    PseudoElement,
    /// `:name(...)`
    PseudoClass,
    /// `name(...)` in a value
    Function,
    /// `name: value`
    Declaration,
}

/// Registration failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PluginRegistryError {
    /// Two plugins of the same kind share a name.
    #[error("a {kind} plugin named '{name}' is already registered")]
    Duplicate {
        /// Plugin kind.
        kind: PluginKind,
        /// The clashing name.
        name: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_tiers() {
        assert_eq!(EngineError::bug("x").severity(), Severity::Bug);
        assert_eq!(EngineError::user("x", None).severity(), Severity::Error);
        let unsupported = EngineError::UnsupportedFunction {
            name: "url".to_string(),
            css: None,
        };
        assert!(unsupported.is_unsupported_function());
        assert_eq!(unsupported.to_string(), "unsupported function url()");
    }

    #[test]
    fn test_or_at_keeps_first_location() {
        let first = SourceLocation::new(1, 2);
        let err = EngineError::user("bad", Some(first)).or_at(SourceLocation::new(9, 9));
        assert_eq!(err.css_location(), Some(first));
        let err = EngineError::bug("bad").or_at(first);
        assert_eq!(err.css_location(), Some(first));
    }

    #[test]
    fn test_registry_error_message() {
        let err = PluginRegistryError::Duplicate {
            kind: PluginKind::PseudoElement,
            name: "after".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "a pseudo-element plugin named 'after' is already registered"
        );
    }
}

//! Structured diagnostics emitted while processing a stylesheet.
//!
//! The engine never renders diagnostics itself. It pushes records into a
//! [`Diagnostics`] sink and the front end decides how to show them.
//! Identical records are kept once, so a warning raised for every matched
//! node of the same rule does not flood the output.

use std::cell::RefCell;
use std::collections::HashSet;

use serde::Serialize;
use strum_macros::{Display, EnumString};

use crate::source::SourceLocation;

/// How serious a diagnostic is.
///
/// `Bug` and `Error` abort the run; `Warn` and `Log` are collected and never
/// change the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumString, Serialize)]
#[strum(serialize_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    /// An engine invariant was violated.
    Bug,
    /// The stylesheet is invalid or a uniqueness constraint failed.
    Error,
    /// Something suspicious that does not alter the output.
    Warn,
    /// Informational output requested by the stylesheet author.
    Log,
}

impl Severity {
    /// Whether this severity aborts the run.
    #[must_use]
    pub const fn is_fatal(self) -> bool {
        matches!(self, Self::Bug | Self::Error)
    }
}

/// One diagnostic record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Diagnostic {
    /// Severity tier.
    pub severity: Severity,
    /// Human readable message.
    pub message: String,
    /// Where in the CSS source the problem originates.
    pub css: Option<SourceLocation>,
    /// The HTML node involved, if any.
    pub html: Option<SourceLocation>,
}

impl Diagnostic {
    /// Create a diagnostic with no HTML location.
    #[must_use]
    pub fn new(severity: Severity, message: impl Into<String>, css: Option<SourceLocation>) -> Self {
        Self {
            severity,
            message: message.into(),
            css,
            html: None,
        }
    }

    /// Attach the HTML location of the node involved.
    #[must_use]
    pub const fn with_html(mut self, html: Option<SourceLocation>) -> Self {
        self.html = html;
        self
    }
}

/// Collecting sink for diagnostics.
///
/// Uses interior mutability so it can be shared by reference across the
/// engine's cooperative tasks.
#[derive(Debug, Default)]
pub struct Diagnostics {
    records: RefCell<Vec<Diagnostic>>,
    seen: RefCell<HashSet<Diagnostic>>,
}

impl Diagnostics {
    /// Create an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a diagnostic (kept once per identical record).
    pub fn report(&self, diagnostic: Diagnostic) {
        if !self.seen.borrow_mut().insert(diagnostic.clone()) {
            return;
        }
        match diagnostic.severity {
            Severity::Bug | Severity::Error => log::error!("{}", diagnostic.message),
            Severity::Warn => log::warn!("{}", diagnostic.message),
            Severity::Log => log::info!("{}", diagnostic.message),
        }
        self.records.borrow_mut().push(diagnostic);
    }

    /// Record a warning.
    pub fn warn(&self, message: impl Into<String>, css: Option<SourceLocation>) {
        self.report(Diagnostic::new(Severity::Warn, message, css));
    }

    /// Record a warning tied to an HTML node.
    pub fn warn_at(
        &self,
        message: impl Into<String>,
        css: Option<SourceLocation>,
        html: Option<SourceLocation>,
    ) {
        self.report(Diagnostic::new(Severity::Warn, message, css).with_html(html));
    }

    /// Record an author-requested log line.
    pub fn log(&self, message: impl Into<String>, css: Option<SourceLocation>) {
        self.report(Diagnostic::new(Severity::Log, message, css));
    }

    /// Snapshot of every record so far, in report order.
    #[must_use]
    pub fn records(&self) -> Vec<Diagnostic> {
        self.records.borrow().clone()
    }

    /// Number of records with the given severity.
    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.records
            .borrow()
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }

    /// Drain all records, resetting the sink.
    pub fn take(&self) -> Vec<Diagnostic> {
        self.seen.borrow_mut().clear();
        std::mem::take(&mut *self.records.borrow_mut())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_records_kept_once() {
        let sink = Diagnostics::new();
        let at = Some(SourceLocation::new(1, 1));
        sink.warn("unused selector 'p'", at);
        sink.warn("unused selector 'p'", at);
        sink.warn("unused selector 'div'", at);
        assert_eq!(sink.count(Severity::Warn), 2);
    }

    #[test]
    fn test_severity_strings() {
        assert_eq!(Severity::Bug.to_string(), "BUG");
        assert_eq!("WARN".parse::<Severity>().ok(), Some(Severity::Warn));
        assert!(Severity::Error.is_fatal());
        assert!(!Severity::Log.is_fatal());
    }

    #[test]
    fn test_take_resets() {
        let sink = Diagnostics::new();
        sink.log("hello", None);
        assert_eq!(sink.take().len(), 1);
        assert!(sink.records().is_empty());
        sink.log("hello", None);
        assert_eq!(sink.records().len(), 1);
    }
}

//! Common utilities for CSS-plus.
//!
//! This crate provides shared infrastructure used by every other crate:
//! - **Source locations** - line/column positions for CSS and HTML input
//! - **Diagnostics** - BUG/ERROR/WARN/LOG records and a deduplicating sink

pub mod diagnostic;
pub mod source;

pub use diagnostic::{Diagnostic, Diagnostics, Severity};
pub use source::{LineTracker, SourceLocation, location_table};

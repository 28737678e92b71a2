//! Source positions shared by the CSS and HTML front ends.

use core::fmt;

use serde::Serialize;

/// A 1-based line/column position in a CSS or HTML source file.
///
/// Locations are small and `Copy`; the file they belong to is implied by
/// where they are stored (a declaration carries a CSS location, a node
/// carries an HTML location).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
pub struct SourceLocation {
    /// 1-based line number.
    pub line: u32,
    /// 1-based column number, counted in characters.
    pub column: u32,
}

impl SourceLocation {
    /// Create a location from a line and column.
    #[must_use]
    pub const fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Tracks line and column while a front end walks its input one character
/// at a time.
#[derive(Debug, Clone, Copy)]
pub struct LineTracker {
    line: u32,
    column: u32,
}

impl LineTracker {
    /// Start at line 1, column 1.
    #[must_use]
    pub const fn new() -> Self {
        Self { line: 1, column: 1 }
    }

    /// The location of the next character to be consumed.
    #[must_use]
    pub const fn location(&self) -> SourceLocation {
        SourceLocation::new(self.line, self.column)
    }

    /// Advance past `c`.
    pub const fn advance(&mut self, c: char) {
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
    }
}

impl Default for LineTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Compute the location of every character in `input`, plus one trailing
/// entry for end of input.
///
/// Front ends that index their input as a `Vec<char>` use this table to
/// attach positions without tracking lines inside every consume step.
#[must_use]
pub fn location_table(input: &[char]) -> Vec<SourceLocation> {
    let mut tracker = LineTracker::new();
    let mut table = Vec::with_capacity(input.len() + 1);
    for &c in input {
        table.push(tracker.location());
        tracker.advance(c);
    }
    table.push(tracker.location());
    table
}

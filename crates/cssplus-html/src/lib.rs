//! HTML tokenizer and tree builder for CSS-plus.
//!
//! # Scope
//!
//! This crate implements a forgiving subset of
//! [WHATWG § 13.2 Parsing HTML documents](https://html.spec.whatwg.org/multipage/parsing.html):
//!
//! - **Tokenizer**: data, RCDATA and RAWTEXT content, tags and attributes,
//!   comments, DOCTYPE, numeric and common named character references.
//!   Every token carries the source location of its first character.
//! - **Tree builder**: a stack of open elements with void elements,
//!   self-closing syntax and the common implied end tags (`p`, `li`, `dt`,
//!   `dd`, `option`, table rows and cells).
//!
//! The document is kept as written: no `html`, `head` or `body` elements are
//! synthesized, so serializing the tree reproduces the input structure.

/// Tree construction.
pub mod parser;
/// Tokenization.
pub mod tokenizer;

pub use parser::{HTMLParser, ParseIssue, parse_document};
pub use tokenizer::{Attribute, HTMLTokenizer, PositionedToken, Token};

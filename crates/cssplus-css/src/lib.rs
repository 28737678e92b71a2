//! CSS tokenizer, stylesheet parser, selector matching and serialization for CSS-plus.
//!
//! # Scope
//!
//! This crate implements:
//! - **CSS Tokenizer** ([§ 4 Tokenization](https://www.w3.org/TR/css-syntax-3/#tokenization))
//!   - All token types: ident, function, at-keyword, hash, string, url, number, dimension, etc.
//!   - Comment handling and escape sequences
//!   - A source location for every token
//!
//! - **CSS Parser** ([§ 5 Parsing](https://www.w3.org/TR/css-syntax-3/#parsing))
//!   - Stylesheet parsing: style rules and at-rules
//!   - Declaration parsing with `!important`
//!   - Error recovery: an invalid rule is dropped and reported as a [`CssParseIssue`]
//!
//! - **CSS Selectors** ([Selectors Level 4](https://www.w3.org/TR/selectors-4/))
//!   - Type, class, ID, universal and attribute selectors
//!   - All four combinators, relative selectors
//!   - Pseudo-classes and pseudo-elements with unparsed functional arguments
//!   - Matching of the structural pseudo-classes, `:not()`, `:is()`,
//!     `:where()`, `:has()` and `:nth-*()`
//!
//! - **Serialization** ([§ 9](https://www.w3.org/TR/css-syntax-3/#serialization))
//!
//! Custom pseudo-elements and pseudo-classes parse like any other; deciding
//! what they mean is left to the caller.

/// CSS parser.
pub mod parser;
/// Selector AST and matching.
pub mod selector;
/// Serialization back to CSS text.
pub mod serialize;
/// CSS tokenizer.
pub mod tokenizer;

pub use parser::{
    AtRule, CSSParser, ComponentValue, CssParseIssue, Declaration, Rule, StyleRule, Stylesheet,
    parse_component_values,
};
pub use selector::{
    AttributeOperator, AttributeSelector, Combinator, Selector, SelectorComponent, SelectorList,
    query_all, query_all_within,
};
pub use serialize::{
    format_number, serialize_component_value, serialize_component_values, serialize_string,
};
pub use tokenizer::{CSSToken, CSSTokenizer, HashType, NumericType, tokenize};

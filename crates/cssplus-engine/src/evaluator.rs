//! Value evaluation.
//!
//! Declaration values are component values; the evaluator turns them into
//! [`Value`]s against an *anchor* node. Function plugins may move the anchor
//! for their own arguments (`parent-context(attr(href))` reads `href` from
//! the parent), while the matched node stays fixed for the whole
//! declaration.

use cssplus_common::SourceLocation;
use cssplus_css::{CSSToken, ComponentValue, format_number, serialize_component_value};
use cssplus_dom::NodeId;

use crate::error::EngineError;
use crate::host::Host;
use crate::session::Session;

/// The result of evaluating an expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Text: unquoted strings, identifiers and rendered literals.
    String(String),
    /// A plain number.
    Number(f64),
    /// Document elements, in document order.
    Elements(Vec<NodeId>),
}

impl Value {
    /// The value as text. Element sets contribute their text content.
    #[must_use]
    pub fn to_text(&self, host: &Host) -> String {
        match self {
            Self::String(text) => text.clone(),
            Self::Number(number) => format_number(*number),
            Self::Elements(nodes) => nodes.iter().map(|&n| host.text_content(n)).collect(),
        }
    }

    /// The value as a number, parsing text if needed.
    #[must_use]
    pub fn to_number(&self) -> Option<f64> {
        match self {
            Self::Number(number) => Some(*number),
            Self::String(text) => text.trim().parse().ok(),
            Self::Elements(_) => None,
        }
    }
}

/// Split at top-level commas, trimming whitespace. A lone empty group
/// means no arguments at all.
#[must_use]
pub fn split_on_commas(values: &[ComponentValue]) -> Vec<&[ComponentValue]> {
    let groups: Vec<&[ComponentValue]> = values
        .split(ComponentValue::is_comma)
        .map(trim_whitespace)
        .collect();
    match groups.as_slice() {
        [only] if only.is_empty() => Vec::new(),
        _ => groups,
    }
}

/// `values` without leading and trailing whitespace tokens.
pub(crate) fn trim_whitespace(values: &[ComponentValue]) -> &[ComponentValue] {
    let start = values
        .iter()
        .position(|v| !v.is_whitespace())
        .unwrap_or(values.len());
    let end = values
        .iter()
        .rposition(|v| !v.is_whitespace())
        .map_or(start, |i| i + 1);
    &values[start..end]
}

/// Evaluates values for one declaration.
#[derive(Clone, Copy)]
pub struct Evaluator<'a> {
    session: &'a Session,
    anchor: NodeId,
    matched: NodeId,
    location: SourceLocation,
}

impl<'a> Evaluator<'a> {
    /// Evaluate against `anchor`; `matched` is the node the rule's selector
    /// matched, `location` the declaration's position.
    #[must_use]
    pub const fn new(
        session: &'a Session,
        anchor: NodeId,
        matched: NodeId,
        location: SourceLocation,
    ) -> Self {
        Self {
            session,
            anchor,
            matched,
            location,
        }
    }

    /// The same evaluator with a different anchor.
    #[must_use]
    pub const fn with_anchor(&self, anchor: NodeId) -> Self {
        Self { anchor, ..*self }
    }

    /// The run's shared state.
    #[must_use]
    pub const fn session(&self) -> &'a Session {
        self.session
    }

    /// The document.
    #[must_use]
    pub const fn host(&self) -> &'a Host {
        &self.session.host
    }

    /// The node expressions are currently evaluated against.
    #[must_use]
    pub const fn anchor(&self) -> NodeId {
        self.anchor
    }

    /// The node the rule matched. Never rewritten.
    #[must_use]
    pub const fn matched(&self) -> NodeId {
        self.matched
    }

    /// The declaration's source location.
    #[must_use]
    pub const fn location(&self) -> SourceLocation {
        self.location
    }

    /// A user error at the declaration, pointing at the anchor in the
    /// document.
    #[must_use]
    pub fn user_error(&self, message: impl Into<String>) -> EngineError {
        EngineError::user(message, Some(self.location))
            .with_html(self.host().location(self.anchor))
    }

    /// Record a warning at the declaration and the anchor.
    pub fn warn(&self, message: impl Into<String>) {
        self.session.diagnostics.warn_at(
            message,
            Some(self.location),
            self.host().location(self.anchor),
        );
    }

    /// Evaluate a whole declaration value: comma-separated groups of
    /// space-separated values.
    ///
    /// # Errors
    ///
    /// Propagates function errors, including the recoverable
    /// [`EngineError::UnsupportedFunction`].
    pub fn evaluate_declaration(
        &self,
        values: &[ComponentValue],
    ) -> Result<Vec<Vec<Value>>, EngineError> {
        split_on_commas(values)
            .into_iter()
            .map(|group| {
                group
                    .iter()
                    .filter(|v| !v.is_whitespace())
                    .map(|v| self.evaluate_value(v))
                    .collect()
            })
            .collect()
    }

    /// Evaluate one argument. A single component keeps its type; several
    /// are joined as text, whitespace included, so that `div > p` stays a
    /// usable selector.
    ///
    /// # Errors
    ///
    /// Propagates function errors.
    pub fn evaluate_arg(&self, values: &[ComponentValue]) -> Result<Value, EngineError> {
        let values = trim_whitespace(values);
        if let [single] = values {
            return self.evaluate_value(single);
        }
        let mut text = String::new();
        for value in values {
            if value.is_whitespace() {
                if !text.ends_with(' ') {
                    text.push(' ');
                }
            } else {
                text.push_str(&self.evaluate_value(value)?.to_text(self.host()));
            }
        }
        Ok(Value::String(text))
    }

    /// Evaluate one argument as text.
    ///
    /// # Errors
    ///
    /// Propagates function errors.
    pub fn evaluate_text(&self, values: &[ComponentValue]) -> Result<String, EngineError> {
        Ok(self.evaluate_arg(values)?.to_text(self.host()))
    }

    fn evaluate_value(&self, value: &ComponentValue) -> Result<Value, EngineError> {
        match value {
            ComponentValue::Token(token) => match token {
                CSSToken::String(text) | CSSToken::Ident(text) => Ok(Value::String(text.clone())),
                CSSToken::Number { value, .. } => Ok(Value::Number(*value)),
                CSSToken::Delim(c) => Ok(Value::String(c.to_string())),
                CSSToken::Url(_) => Err(EngineError::UnsupportedFunction {
                    name: "url".to_string(),
                    css: Some(self.location),
                }),
                _ => Ok(Value::String(serialize_component_value(value))),
            },
            ComponentValue::Function { name, value: args } => self.call(name, args),
            ComponentValue::Block { .. } => Ok(Value::String(serialize_component_value(value))),
        }
    }

    fn call(&self, name: &str, args: &[ComponentValue]) -> Result<Value, EngineError> {
        let Some(plugin) = self.session.registry.functions.get(name) else {
            return Err(EngineError::UnsupportedFunction {
                name: name.to_string(),
                css: Some(self.location),
            });
        };
        let groups = split_on_commas(args);
        let (evaluator, rest) = match plugin.rewrite_context(self, &groups)? {
            Some((anchor, consumed)) => {
                log::debug!("{name}() moved the anchor from {:?} to {anchor:?}", self.anchor);
                (self.with_anchor(anchor), groups.get(consumed..).unwrap_or_default())
            }
            None => (*self, groups.as_slice()),
        };
        let args = rest
            .iter()
            .map(|group| evaluator.evaluate_arg(group))
            .collect::<Result<Vec<_>, _>>()?;
        plugin
            .evaluate(&evaluator, args)
            .map_err(|err| err.or_at(self.location))
    }
}

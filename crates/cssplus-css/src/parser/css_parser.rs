//! CSS Parser per [§ 5 Parsing](https://www.w3.org/TR/css-syntax-3/#parsing).
//!
//! "The input to the parsing stage is a stream of tokens from the tokenization stage."
//! Style rule preludes are parsed into [`Selector`]s; at-rules are kept as
//! component values so they can be written back out unchanged.

use cssplus_common::SourceLocation;
use thiserror::Error;

use crate::selector::Selector;
use crate::tokenizer::{CSSToken, tokenize};

/// A recoverable problem found while parsing a stylesheet. The offending
/// rule or declaration is dropped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{location}: {message}")]
pub struct CssParseIssue {
    /// What went wrong.
    pub message: String,
    /// Where in the CSS source.
    pub location: SourceLocation,
}

impl CssParseIssue {
    /// Create an issue.
    #[must_use]
    pub fn new(message: impl Into<String>, location: SourceLocation) -> Self {
        Self {
            message: message.into(),
            location,
        }
    }
}

/// [§ 5.4.6 Consume a declaration](https://www.w3.org/TR/css-syntax-3/#consume-declaration)
///
/// A CSS declaration (e.g., `color: red`).
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    /// The property name.
    pub name: String,
    /// The property value as component values, with `!important` and
    /// surrounding whitespace removed.
    pub value: Vec<ComponentValue>,
    /// Whether the declaration has `!important`.
    pub important: bool,
    /// Location of the property name.
    pub location: SourceLocation,
}

/// [§ 5.4.8 Consume a component value](https://www.w3.org/TR/css-syntax-3/#consume-component-value)
#[derive(Debug, Clone, PartialEq)]
pub enum ComponentValue {
    /// A preserved token.
    Token(CSSToken),
    /// A function with its contents.
    Function {
        /// The function name.
        name: String,
        /// The function arguments.
        value: Vec<ComponentValue>,
    },
    /// A simple block.
    Block {
        /// The opening token character: `{`, `[` or `(`.
        token: char,
        /// The block contents.
        value: Vec<ComponentValue>,
    },
}

impl ComponentValue {
    /// Whether this is a whitespace token.
    #[must_use]
    pub const fn is_whitespace(&self) -> bool {
        matches!(self, Self::Token(CSSToken::Whitespace))
    }

    /// Whether this is a comma token.
    #[must_use]
    pub const fn is_comma(&self) -> bool {
        matches!(self, Self::Token(CSSToken::Comma))
    }
}

/// [§ 5.4.3 Consume a qualified rule](https://www.w3.org/TR/css-syntax-3/#consume-qualified-rule)
///
/// A CSS style rule (selector list + declarations).
#[derive(Debug, Clone, PartialEq)]
pub struct StyleRule {
    /// The list of selectors for this rule.
    pub selectors: Vec<Selector>,
    /// The declarations in this rule block.
    pub declarations: Vec<Declaration>,
    /// Location of the first prelude token.
    pub location: SourceLocation,
}

/// [§ 5.4.2 Consume an at-rule](https://www.w3.org/TR/css-syntax-3/#consume-at-rule)
#[derive(Debug, Clone, PartialEq)]
pub struct AtRule {
    /// The at-keyword name (without the `@`).
    pub name: String,
    /// The prelude component values.
    pub prelude: Vec<ComponentValue>,
    /// The optional block contents.
    pub block: Option<Vec<ComponentValue>>,
    /// Location of the at-keyword.
    pub location: SourceLocation,
}

/// A CSS rule (either a style rule or an at-rule).
#[derive(Debug, Clone, PartialEq)]
pub enum Rule {
    /// A style rule (qualified rule).
    Style(StyleRule),
    /// An at-rule.
    At(AtRule),
}

/// [§ 5.3.3 Parse a stylesheet](https://www.w3.org/TR/css-syntax-3/#parse-stylesheet)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Stylesheet {
    /// The list of rules in the stylesheet.
    pub rules: Vec<Rule>,
}

impl Stylesheet {
    /// Tokenize and parse `css`, returning the sheet and any dropped-rule issues.
    #[must_use]
    pub fn parse(css: &str) -> (Self, Vec<CssParseIssue>) {
        let mut parser = CSSParser::new(tokenize(css));
        let sheet = parser.parse_stylesheet();
        (sheet, parser.into_issues())
    }

    /// Iterate over the style rules only.
    pub fn style_rules(&self) -> impl Iterator<Item = &StyleRule> {
        self.rules.iter().filter_map(|rule| match rule {
            Rule::Style(style) => Some(style),
            Rule::At(_) => None,
        })
    }

    /// Iterate over the at-rules only.
    pub fn at_rules(&self) -> impl Iterator<Item = &AtRule> {
        self.rules.iter().filter_map(|rule| match rule {
            Rule::At(at) => Some(at),
            Rule::Style(_) => None,
        })
    }
}

/// CSS parser over a positioned token stream.
pub struct CSSParser {
    tokens: Vec<(CSSToken, SourceLocation)>,
    position: usize,
    issues: Vec<CssParseIssue>,
}

impl CSSParser {
    /// Create a new parser from a list of positioned tokens.
    #[must_use]
    pub const fn new(tokens: Vec<(CSSToken, SourceLocation)>) -> Self {
        Self {
            tokens,
            position: 0,
            issues: Vec::new(),
        }
    }

    /// Issues recorded while parsing.
    #[must_use]
    pub fn into_issues(self) -> Vec<CssParseIssue> {
        self.issues
    }

    /// [§ 5.3.3 Parse a stylesheet](https://www.w3.org/TR/css-syntax-3/#parse-stylesheet)
    pub fn parse_stylesheet(&mut self) -> Stylesheet {
        // "Consume a list of rules from input, with the top-level flag set."
        let rules = self.consume_list_of_rules(true);
        Stylesheet { rules }
    }

    /// [§ 5.3.10 Parse a list of component values](https://www.w3.org/TR/css-syntax-3/#parse-list-of-component-values)
    pub fn parse_list_of_component_values(&mut self) -> Vec<ComponentValue> {
        let mut values = Vec::new();
        while !matches!(self.peek(), None | Some(CSSToken::EOF)) {
            if let Some(value) = self.consume_component_value() {
                values.push(value);
            }
        }
        values
    }

    /// [§ 5.4.1 Consume a list of rules](https://www.w3.org/TR/css-syntax-3/#consume-list-of-rules)
    fn consume_list_of_rules(&mut self, top_level: bool) -> Vec<Rule> {
        let mut rules = Vec::new();
        loop {
            match self.peek() {
                Some(CSSToken::Whitespace) => self.position += 1,
                None | Some(CSSToken::EOF) => return rules,
                Some(CSSToken::CDO | CSSToken::CDC) if top_level => self.position += 1,
                Some(CSSToken::AtKeyword(_)) => {
                    if let Some(at_rule) = self.consume_at_rule() {
                        rules.push(Rule::At(at_rule));
                    }
                }
                Some(_) => {
                    if let Some(rule) = self.consume_qualified_rule() {
                        rules.push(Rule::Style(rule));
                    }
                }
            }
        }
    }

    /// [§ 5.4.2 Consume an at-rule](https://www.w3.org/TR/css-syntax-3/#consume-at-rule)
    fn consume_at_rule(&mut self) -> Option<AtRule> {
        let location = self.location();
        let Some(CSSToken::AtKeyword(name)) = self.consume().cloned() else {
            return None;
        };
        let mut prelude = Vec::new();
        loop {
            match self.peek() {
                Some(CSSToken::Semicolon) => {
                    self.position += 1;
                    break;
                }
                // "This is a parse error. Return the at-rule."
                None | Some(CSSToken::EOF) => break,
                Some(CSSToken::LeftBrace) => {
                    let block = self.consume_simple_block();
                    return Some(AtRule {
                        name,
                        prelude,
                        block: Some(block),
                        location,
                    });
                }
                Some(_) => {
                    if let Some(value) = self.consume_component_value() {
                        prelude.push(value);
                    }
                }
            }
        }
        Some(AtRule {
            name,
            prelude,
            block: None,
            location,
        })
    }

    /// [§ 5.4.3 Consume a qualified rule](https://www.w3.org/TR/css-syntax-3/#consume-qualified-rule)
    fn consume_qualified_rule(&mut self) -> Option<StyleRule> {
        let location = self.location();
        let mut prelude: Vec<(SourceLocation, ComponentValue)> = Vec::new();
        loop {
            match self.peek() {
                // "This is a parse error. Return nothing."
                None | Some(CSSToken::EOF) => {
                    self.issues
                        .push(CssParseIssue::new("unexpected end of stylesheet", location));
                    return None;
                }
                Some(CSSToken::LeftBrace) => {
                    self.position += 1;
                    let declarations = self.consume_list_of_declarations();
                    if self.peek() == Some(&CSSToken::RightBrace) {
                        self.position += 1;
                    }
                    let selectors = self.parse_selector_list(&prelude, location)?;
                    return Some(StyleRule {
                        selectors,
                        declarations,
                        location,
                    });
                }
                Some(_) => {
                    let at = self.location();
                    if let Some(value) = self.consume_component_value() {
                        prelude.push((at, value));
                    }
                }
            }
        }
    }

    /// [Selectors 4 § 4.1 Selector Lists](https://www.w3.org/TR/selectors-4/#selector-list)
    ///
    /// "A selector list is a comma-separated list of selectors." An invalid
    /// selector invalidates the whole rule.
    fn parse_selector_list(
        &mut self,
        prelude: &[(SourceLocation, ComponentValue)],
        rule_location: SourceLocation,
    ) -> Option<Vec<Selector>> {
        let mut selectors = Vec::new();
        for group in prelude.split(|(_, value)| value.is_comma()) {
            let start = group
                .iter()
                .find(|(_, value)| !value.is_whitespace())
                .map_or(rule_location, |(at, _)| *at);
            let values: Vec<ComponentValue> = group.iter().map(|(_, v)| v.clone()).collect();
            match Selector::parse(&values, start) {
                Ok(selector) => selectors.push(selector),
                Err(message) => {
                    self.issues.push(CssParseIssue::new(message, start));
                    return None;
                }
            }
        }
        Some(selectors)
    }

    /// [§ 5.4.7 Consume a simple block](https://www.w3.org/TR/css-syntax-3/#consume-simple-block)
    fn consume_simple_block(&mut self) -> Vec<ComponentValue> {
        let ending_token = match self.consume() {
            Some(CSSToken::LeftBrace) => CSSToken::RightBrace,
            Some(CSSToken::LeftBracket) => CSSToken::RightBracket,
            Some(CSSToken::LeftParen) => CSSToken::RightParen,
            _ => return Vec::new(),
        };
        let mut value = Vec::new();
        loop {
            match self.peek() {
                Some(token) if *token == ending_token => {
                    self.position += 1;
                    return value;
                }
                None | Some(CSSToken::EOF) => return value,
                Some(_) => {
                    if let Some(v) = self.consume_component_value() {
                        value.push(v);
                    }
                }
            }
        }
    }

    /// [§ 5.4.5 Consume a list of declarations](https://www.w3.org/TR/css-syntax-3/#consume-list-of-declarations)
    fn consume_list_of_declarations(&mut self) -> Vec<Declaration> {
        let mut declarations = Vec::new();
        loop {
            match self.peek() {
                Some(CSSToken::Whitespace | CSSToken::Semicolon) => self.position += 1,
                None | Some(CSSToken::EOF | CSSToken::RightBrace) => return declarations,
                Some(CSSToken::AtKeyword(_)) => {
                    let location = self.location();
                    let _ = self.consume_at_rule();
                    self.issues.push(CssParseIssue::new(
                        "at-rules inside style blocks are not supported",
                        location,
                    ));
                }
                Some(CSSToken::Ident(_)) => {
                    if let Some(declaration) = self.consume_declaration() {
                        declarations.push(declaration);
                    }
                }
                // "This is a parse error. ... consume a component value and throw
                // away the returned value."
                Some(_) => {
                    let location = self.location();
                    self.issues
                        .push(CssParseIssue::new("invalid declaration", location));
                    self.skip_declaration();
                }
            }
        }
    }

    fn skip_declaration(&mut self) {
        while !matches!(
            self.peek(),
            None | Some(CSSToken::Semicolon | CSSToken::RightBrace | CSSToken::EOF)
        ) {
            let _ = self.consume_component_value();
        }
    }

    /// [§ 5.4.6 Consume a declaration](https://www.w3.org/TR/css-syntax-3/#consume-declaration)
    fn consume_declaration(&mut self) -> Option<Declaration> {
        let location = self.location();
        let Some(CSSToken::Ident(name)) = self.consume().cloned() else {
            return None;
        };
        self.skip_whitespace();
        // "If the next input token is anything other than a <colon-token>, this is
        // a parse error. Return nothing."
        if self.peek() != Some(&CSSToken::Colon) {
            self.issues.push(CssParseIssue::new(
                format!("expected ':' after property '{name}'"),
                location,
            ));
            self.skip_declaration();
            return None;
        }
        self.position += 1;
        self.skip_whitespace();

        let mut value = Vec::new();
        while !matches!(
            self.peek(),
            None | Some(CSSToken::EOF | CSSToken::Semicolon | CSSToken::RightBrace)
        ) {
            if let Some(v) = self.consume_component_value() {
                value.push(v);
            }
        }
        let important = check_important(&value);
        let value = trim_important(value);
        Some(Declaration {
            name: name.to_ascii_lowercase(),
            value,
            important,
            location,
        })
    }

    /// [§ 5.4.8 Consume a component value](https://www.w3.org/TR/css-syntax-3/#consume-component-value)
    fn consume_component_value(&mut self) -> Option<ComponentValue> {
        let token = match self.peek()? {
            CSSToken::LeftBrace => '{',
            CSSToken::LeftBracket => '[',
            CSSToken::LeftParen => '(',
            CSSToken::Function(name) => {
                let name = name.clone();
                self.position += 1;
                return Some(self.consume_function(name));
            }
            _ => return self.consume().cloned().map(ComponentValue::Token),
        };
        let value = self.consume_simple_block();
        Some(ComponentValue::Block { token, value })
    }

    /// [§ 5.4.9 Consume a function](https://www.w3.org/TR/css-syntax-3/#consume-function)
    fn consume_function(&mut self, name: String) -> ComponentValue {
        let mut value = Vec::new();
        loop {
            match self.peek() {
                Some(CSSToken::RightParen) => {
                    self.position += 1;
                    break;
                }
                None | Some(CSSToken::EOF) => break,
                Some(_) => {
                    if let Some(v) = self.consume_component_value() {
                        value.push(v);
                    }
                }
            }
        }
        ComponentValue::Function { name, value }
    }

    fn skip_whitespace(&mut self) {
        while self.peek() == Some(&CSSToken::Whitespace) {
            self.position += 1;
        }
    }

    fn location(&self) -> SourceLocation {
        self.tokens
            .get(self.position)
            .or_else(|| self.tokens.last())
            .map(|(_, at)| *at)
            .unwrap_or_default()
    }

    fn consume(&mut self) -> Option<&CSSToken> {
        let (token, _) = self.tokens.get(self.position)?;
        self.position += 1;
        Some(token)
    }

    fn peek(&self) -> Option<&CSSToken> {
        self.tokens.get(self.position).map(|(token, _)| token)
    }
}

/// Parse a standalone list of component values, e.g. a selector string
/// handed to a function at evaluation time.
#[must_use]
pub fn parse_component_values(input: &str) -> Vec<ComponentValue> {
    CSSParser::new(tokenize(input)).parse_list_of_component_values()
}

/// [CSS Cascade 4 § 6.4.2 Important declarations](https://www.w3.org/TR/css-cascade-4/#importance)
///
/// "A declaration is important if it has a !important annotation, i.e.
/// if the last two (non-whitespace, non-comment) tokens in its value are
/// a <delim-token> with the value "!" followed by an <ident-token> with
/// a value that is an ASCII case-insensitive match for "important"."
fn check_important(value: &[ComponentValue]) -> bool {
    let mut meaningful = value.iter().rev().filter(|v| !v.is_whitespace());
    matches!(
        meaningful.next(),
        Some(ComponentValue::Token(CSSToken::Ident(s))) if s.eq_ignore_ascii_case("important")
    ) && matches!(
        meaningful.next(),
        Some(ComponentValue::Token(CSSToken::Delim('!')))
    )
}

fn trim_trailing_whitespace(value: &mut Vec<ComponentValue>) {
    while value.last().is_some_and(ComponentValue::is_whitespace) {
        let _ = value.pop();
    }
}

/// Remove trailing whitespace and a trailing `!important` from a value.
fn trim_important(mut value: Vec<ComponentValue>) -> Vec<ComponentValue> {
    if check_important(&value) {
        trim_trailing_whitespace(&mut value);
        let _ = value.pop(); // important
        trim_trailing_whitespace(&mut value);
        let _ = value.pop(); // !
    }
    trim_trailing_whitespace(&mut value);
    value
}

//! CSS Selector parsing and matching
//!
//! This module implements selector parsing and matching per
//! [Selectors Level 4](https://www.w3.org/TR/selectors-4/).
//!
//! A [`Selector`] is kept as the flat sequence of components it was written
//! as, combinators included, so that callers can inspect and rewrite the
//! pseudo-element chain at its tail. Matching splits it into compounds on
//! demand (see [`matching`]).

use core::fmt;

use cssplus_common::SourceLocation;
use strum_macros::Display;

use crate::parser::{ComponentValue, CssParseIssue, parse_component_values};
use crate::serialize::{
    serialize_component_value, serialize_component_values, serialize_identifier, serialize_string,
    serialize_token,
};
use crate::tokenizer::CSSToken;

/// Selector matching against a document tree.
pub mod matching;
/// `An+B` microsyntax for the `:nth-*` pseudo-classes.
pub mod nth;

pub use matching::{query_all, query_all_within};

/// [§ 6 Attribute selectors](https://www.w3.org/TR/selectors-4/#attribute-selectors)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum AttributeOperator {
    /// `[att=val]`: "exactly val"
    #[strum(serialize = "=")]
    Equals,
    /// `[att~=val]`: "a whitespace-separated list of words, one of which is exactly val"
    #[strum(serialize = "~=")]
    Includes,
    /// `[att|=val]`: "either being exactly val or beginning with val immediately followed by -"
    #[strum(serialize = "|=")]
    DashMatch,
    /// `[att^=val]`: "begins with the prefix val"
    #[strum(serialize = "^=")]
    Prefix,
    /// `[att$=val]`: "ends with the suffix val"
    #[strum(serialize = "$=")]
    Suffix,
    /// `[att*=val]`: "contains at least one instance of the substring val"
    #[strum(serialize = "*=")]
    Substring,
}

/// [§ 6.4 Attribute selectors](https://www.w3.org/TR/selectors-4/#attribute-selectors)
///
/// Examples: `[href]`, `[type=text]`, `[class~=active]`, `[lang|=en i]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeSelector {
    /// The attribute name, lowercased.
    pub name: String,
    /// The operator and value; `None` for a bare `[att]` presence test.
    pub matcher: Option<(AttributeOperator, String)>,
    /// The `i` flag: compare values ASCII case-insensitively.
    pub case_insensitive: bool,
}

/// [§ 16 Combinators](https://www.w3.org/TR/selectors-4/#combinators)
///
/// "A combinator is punctuation that represents a particular kind of
/// relationship between the selectors on either side."
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Combinator {
    /// `A B`: B is an arbitrary descendant of A.
    #[strum(serialize = " ")]
    Descendant,
    /// `A > B`: B is a direct child of A.
    #[strum(serialize = ">")]
    Child,
    /// `A + B`: B immediately follows A.
    #[strum(serialize = "+")]
    NextSibling,
    /// `A ~ B`: B follows A, not necessarily immediately.
    #[strum(serialize = "~")]
    SubsequentSibling,
}

/// One component of a selector as written.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectorComponent {
    /// [§ 5.1 Type selector](https://www.w3.org/TR/selectors-4/#type-selectors), lowercased.
    Type(String),
    /// [§ 5.2 Universal selector](https://www.w3.org/TR/selectors-4/#universal-selector)
    Universal,
    /// [§ 6.7 ID selector](https://www.w3.org/TR/selectors-4/#id-selectors)
    Id(String),
    /// [§ 6.6 Class selector](https://www.w3.org/TR/selectors-4/#class-html)
    Class(String),
    /// [§ 6 Attribute selectors](https://www.w3.org/TR/selectors-4/#attribute-selectors)
    Attribute(AttributeSelector),
    /// A combinator between two compounds, or leading a relative selector.
    Combinator(Combinator),
    /// `:name` or `:name(args)`. Functional arguments are kept unparsed.
    PseudoClass {
        /// Lowercased name.
        name: String,
        /// Arguments of the functional form.
        args: Option<Vec<ComponentValue>>,
    },
    /// `::name` or `::name(args)`.
    PseudoElement {
        /// Lowercased name.
        name: String,
        /// Arguments of the functional form.
        args: Option<Vec<ComponentValue>>,
    },
}

impl SelectorComponent {
    /// Whether this is a combinator.
    #[must_use]
    pub const fn is_combinator(&self) -> bool {
        matches!(self, Self::Combinator(_))
    }

    /// The name of a pseudo-class or pseudo-element.
    #[must_use]
    pub fn pseudo_name(&self) -> Option<&str> {
        match self {
            Self::PseudoClass { name, .. } | Self::PseudoElement { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Functional arguments of a pseudo-class or pseudo-element.
    #[must_use]
    pub fn pseudo_args(&self) -> Option<&[ComponentValue]> {
        match self {
            Self::PseudoClass { args, .. } | Self::PseudoElement { args, .. } => args.as_deref(),
            _ => None,
        }
    }

    fn write_css(&self, out: &mut String) {
        match self {
            Self::Type(name) => out.push_str(&serialize_identifier(name)),
            Self::Universal => out.push('*'),
            Self::Id(id) => {
                out.push('#');
                out.push_str(&serialize_identifier(id));
            }
            Self::Class(class) => {
                out.push('.');
                out.push_str(&serialize_identifier(class));
            }
            Self::Attribute(attr) => {
                out.push('[');
                out.push_str(&serialize_identifier(&attr.name));
                if let Some((operator, value)) = &attr.matcher {
                    out.push_str(&operator.to_string());
                    out.push_str(&serialize_string(value));
                    if attr.case_insensitive {
                        out.push_str(" i");
                    }
                }
                out.push(']');
            }
            Self::Combinator(Combinator::Descendant) => out.push(' '),
            Self::Combinator(combinator) => {
                out.push(' ');
                out.push_str(&combinator.to_string());
                out.push(' ');
            }
            Self::PseudoClass { name, args } | Self::PseudoElement { name, args } => {
                out.push_str(if matches!(self, Self::PseudoElement { .. }) {
                    "::"
                } else {
                    ":"
                });
                out.push_str(&serialize_identifier(name));
                if let Some(args) = args {
                    out.push('(');
                    out.push_str(serialize_component_values(args).trim());
                    out.push(')');
                }
            }
        }
    }
}

/// [§ 4.3 Complex selectors](https://www.w3.org/TR/selectors-4/#complex)
///
/// "A complex selector is a chain of one or more compound selectors separated
/// by combinators." A selector that starts with a combinator is *relative*
/// (`> p`, as written inside `:has()`).
#[derive(Debug, Clone, PartialEq)]
pub struct Selector {
    /// Components in source order.
    pub components: Vec<SelectorComponent>,
    /// Where the selector starts in the stylesheet.
    pub location: SourceLocation,
}

impl Selector {
    /// Wrap already-built components.
    #[must_use]
    pub const fn new(components: Vec<SelectorComponent>, location: SourceLocation) -> Self {
        Self {
            components,
            location,
        }
    }

    /// Parse one selector (no top-level commas) from component values.
    ///
    /// # Errors
    ///
    /// Returns a message describing the first syntax error.
    pub fn parse(values: &[ComponentValue], location: SourceLocation) -> Result<Self, String> {
        let mut components: Vec<SelectorComponent> = Vec::new();
        let mut pending_descendant = false;
        let mut iter = values.iter().peekable();

        while let Some(value) = iter.next() {
            match value {
                ComponentValue::Token(CSSToken::Whitespace) => {
                    pending_descendant = !components.is_empty();
                    continue;
                }
                ComponentValue::Token(CSSToken::Delim(c @ ('>' | '+' | '~'))) => {
                    if components.last().is_some_and(SelectorComponent::is_combinator) {
                        return Err(format!("unexpected combinator '{c}'"));
                    }
                    let combinator = match c {
                        '>' => Combinator::Child,
                        '+' => Combinator::NextSibling,
                        _ => Combinator::SubsequentSibling,
                    };
                    components.push(SelectorComponent::Combinator(combinator));
                    pending_descendant = false;
                    continue;
                }
                _ => {}
            }

            if pending_descendant && !components.last().is_some_and(SelectorComponent::is_combinator) {
                components.push(SelectorComponent::Combinator(Combinator::Descendant));
            }
            pending_descendant = false;

            let component = match value {
                ComponentValue::Token(CSSToken::Ident(name)) => {
                    SelectorComponent::Type(name.to_ascii_lowercase())
                }
                ComponentValue::Token(CSSToken::Delim('*')) => SelectorComponent::Universal,
                ComponentValue::Token(CSSToken::Hash { value, .. }) => {
                    SelectorComponent::Id(value.clone())
                }
                ComponentValue::Token(CSSToken::Delim('.')) => match iter.next() {
                    Some(ComponentValue::Token(CSSToken::Ident(class))) => {
                        SelectorComponent::Class(class.clone())
                    }
                    _ => return Err("expected a class name after '.'".to_string()),
                },
                ComponentValue::Block { token: '[', value } => {
                    SelectorComponent::Attribute(parse_attribute_selector(value)?)
                }
                ComponentValue::Token(CSSToken::Colon) => {
                    let element = matches!(iter.peek(), Some(ComponentValue::Token(CSSToken::Colon)));
                    if element {
                        let _ = iter.next();
                    }
                    let (name, args) = match iter.next() {
                        Some(ComponentValue::Token(CSSToken::Ident(name))) => {
                            (name.to_ascii_lowercase(), None)
                        }
                        Some(ComponentValue::Function { name, value }) => {
                            (name.to_ascii_lowercase(), Some(value.clone()))
                        }
                        _ => return Err("expected a pseudo-class name after ':'".to_string()),
                    };
                    if element {
                        SelectorComponent::PseudoElement { name, args }
                    } else {
                        SelectorComponent::PseudoClass { name, args }
                    }
                }
                other => {
                    return Err(format!(
                        "unexpected '{}' in selector",
                        serialize_component_value(other)
                    ));
                }
            };

            // Type and universal selectors may only start a compound.
            if matches!(component, SelectorComponent::Type(_) | SelectorComponent::Universal)
                && components.last().is_some_and(|c| !c.is_combinator())
            {
                return Err("a type selector must come first in a compound selector".to_string());
            }
            components.push(component);
        }

        if components.is_empty() {
            return Err("empty selector".to_string());
        }
        if components.last().is_some_and(SelectorComponent::is_combinator) {
            return Err("selector ends with a combinator".to_string());
        }
        Ok(Self::new(components, location))
    }

    /// Parse a single selector from text.
    ///
    /// # Errors
    ///
    /// Returns the syntax error, or an error if the text holds a list.
    pub fn parse_str(text: &str) -> Result<Self, CssParseIssue> {
        let mut list = SelectorList::parse_str(text)?;
        if list.selectors.len() != 1 {
            return Err(CssParseIssue::new(
                format!("expected a single selector, found {}", list.selectors.len()),
                SourceLocation::default(),
            ));
        }
        Ok(list.selectors.remove(0))
    }

    /// Whether the selector begins with a combinator.
    #[must_use]
    pub fn is_relative(&self) -> bool {
        self.components
            .first()
            .is_some_and(SelectorComponent::is_combinator)
    }

    /// Split into compounds and the combinators between them, ignoring a
    /// leading combinator. `combinators[i]` sits between `compounds[i]` and
    /// `compounds[i + 1]`.
    #[must_use]
    pub fn compounds(&self) -> (Vec<&[SelectorComponent]>, Vec<Combinator>) {
        let body = if self.is_relative() {
            &self.components[1..]
        } else {
            &self.components[..]
        };
        let compounds = body.split(SelectorComponent::is_combinator).collect();
        let combinators = body
            .iter()
            .filter_map(|c| match c {
                SelectorComponent::Combinator(combinator) => Some(*combinator),
                _ => None,
            })
            .collect();
        (compounds, combinators)
    }

    /// Serialize back to selector text.
    #[must_use]
    pub fn to_css(&self) -> String {
        let mut out = String::new();
        for component in &self.components {
            component.write_css(&mut out);
        }
        out.trim().to_string()
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_css())
    }
}

/// [§ 4.1 Selector Lists](https://www.w3.org/TR/selectors-4/#selector-list)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectorList {
    /// The comma-separated selectors.
    pub selectors: Vec<Selector>,
}

impl SelectorList {
    /// Parse a comma-separated list from component values.
    ///
    /// # Errors
    ///
    /// Returns the first selector's syntax error.
    pub fn parse(values: &[ComponentValue], location: SourceLocation) -> Result<Self, String> {
        let selectors = values
            .split(ComponentValue::is_comma)
            .map(|group| Selector::parse(group, location))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { selectors })
    }

    /// Tokenize and parse a selector list from text.
    ///
    /// # Errors
    ///
    /// Returns the first selector's syntax error.
    pub fn parse_str(text: &str) -> Result<Self, CssParseIssue> {
        let values = parse_component_values(text);
        Self::parse(&values, SourceLocation::default()).map_err(|message| {
            CssParseIssue::new(format!("{message} in '{}'", text.trim()), SourceLocation::default())
        })
    }

    /// Serialize as `a, b, c`.
    #[must_use]
    pub fn to_css(&self) -> String {
        self.selectors
            .iter()
            .map(Selector::to_css)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// [§ 6.4 Attribute selectors](https://www.w3.org/TR/selectors-4/#attribute-selectors)
///
/// Parses the contents of a `[...]` block.
fn parse_attribute_selector(values: &[ComponentValue]) -> Result<AttributeSelector, String> {
    let mut tokens = values.iter().filter(|v| !v.is_whitespace()).peekable();

    let name = match tokens.next() {
        Some(ComponentValue::Token(CSSToken::Ident(name))) => name.to_ascii_lowercase(),
        _ => return Err("expected an attribute name".to_string()),
    };

    let operator = match tokens.next() {
        None => {
            return Ok(AttributeSelector {
                name,
                matcher: None,
                case_insensitive: false,
            });
        }
        Some(ComponentValue::Token(CSSToken::Delim('='))) => AttributeOperator::Equals,
        Some(ComponentValue::Token(CSSToken::Delim(c @ ('~' | '|' | '^' | '$' | '*')))) => {
            if !matches!(tokens.next(), Some(ComponentValue::Token(CSSToken::Delim('=')))) {
                return Err(format!("expected '=' after '{c}' in attribute selector"));
            }
            match c {
                '~' => AttributeOperator::Includes,
                '|' => AttributeOperator::DashMatch,
                '^' => AttributeOperator::Prefix,
                '$' => AttributeOperator::Suffix,
                _ => AttributeOperator::Substring,
            }
        }
        Some(_) => return Err("invalid attribute selector operator".to_string()),
    };

    let value = match tokens.next() {
        Some(ComponentValue::Token(CSSToken::Ident(v) | CSSToken::String(v))) => v.clone(),
        Some(ComponentValue::Token(token @ CSSToken::Number { .. })) => {
            serialize_token(token)
        }
        _ => return Err("expected an attribute value".to_string()),
    };

    let case_insensitive = match tokens.next() {
        None => false,
        Some(ComponentValue::Token(CSSToken::Ident(flag))) if flag.eq_ignore_ascii_case("i") => true,
        Some(ComponentValue::Token(CSSToken::Ident(flag))) if flag.eq_ignore_ascii_case("s") => false,
        Some(_) => return Err("unexpected token after attribute value".to_string()),
    };
    if tokens.peek().is_some() {
        return Err("unexpected token after attribute value".to_string());
    }

    Ok(AttributeSelector {
        name,
        matcher: Some((operator, value)),
        case_insensitive,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Selector {
        match Selector::parse_str(text) {
            Ok(selector) => selector,
            Err(e) => panic!("failed to parse {text:?}: {e}"),
        }
    }

    #[test]
    fn test_parse_compound_and_combinators() {
        let selector = parse("div.note > p#intro + a[href]");
        let (compounds, combinators) = selector.compounds();
        assert_eq!(compounds.len(), 3);
        assert_eq!(combinators, vec![Combinator::Child, Combinator::NextSibling]);
        assert_eq!(
            compounds[0],
            &[
                SelectorComponent::Type("div".to_string()),
                SelectorComponent::Class("note".to_string())
            ][..]
        );
    }

    #[test]
    fn test_whitespace_is_descendant_only_between_compounds() {
        let selector = parse("  section   p ");
        assert_eq!(
            selector.components,
            vec![
                SelectorComponent::Type("section".to_string()),
                SelectorComponent::Combinator(Combinator::Descendant),
                SelectorComponent::Type("p".to_string()),
            ]
        );
    }

    #[test]
    fn test_pseudo_elements_keep_arguments() {
        let selector = parse("div::after(2):has(.x)::before");
        assert_eq!(selector.components.len(), 4);
        assert_eq!(selector.components[1].pseudo_name(), Some("after"));
        assert!(selector.components[1].pseudo_args().is_some());
        assert!(matches!(
            selector.components[2],
            SelectorComponent::PseudoClass { ref name, .. } if name == "has"
        ));
        assert_eq!(selector.to_css(), "div::after(2):has(.x)::before");
    }

    #[test]
    fn test_relative_selector() {
        let selector = parse("> p");
        assert!(selector.is_relative());
        let (compounds, combinators) = selector.compounds();
        assert_eq!(compounds.len(), 1);
        assert!(combinators.is_empty());
    }

    #[test]
    fn test_attribute_selector_forms() {
        let selector = parse("[lang|=\"en\" i]");
        assert_eq!(
            selector.components,
            vec![SelectorComponent::Attribute(AttributeSelector {
                name: "lang".to_string(),
                matcher: Some((AttributeOperator::DashMatch, "en".to_string())),
                case_insensitive: true,
            })]
        );
        assert_eq!(selector.to_css(), "[lang|=\"en\" i]");
    }

    #[test]
    fn test_invalid_selectors() {
        assert!(Selector::parse_str("div >").is_err());
        assert!(Selector::parse_str("p > > a").is_err());
        assert!(Selector::parse_str(".").is_err());
        assert!(Selector::parse_str("a div.b span*").is_err());
        assert!(Selector::parse_str("[=x]").is_err());
        assert!(Selector::parse_str("a, b").is_err());
    }

    #[test]
    fn test_list_round_trip() {
        let list = SelectorList::parse_str("h1,h2 > em ,  .a ~ .b").map(|l| l.to_css());
        assert_eq!(list.ok().as_deref(), Some("h1, h2 > em, .a ~ .b"));
    }
}

//! [§ 9 Serialization](https://www.w3.org/TR/css-syntax-3/#serialization)
//!
//! Writes tokens, component values and whole stylesheets back to CSS text.
//! The output round-trips through the tokenizer to the same component
//! values, which is all the residual stylesheet and diagnostics need.

use core::fmt::Write;

use crate::parser::{AtRule, ComponentValue, Declaration, Rule, StyleRule, Stylesheet};
use crate::tokenizer::CSSToken;

/// Render a number the way CSS-plus values print: integers without a
/// fractional part, everything else in shortest round-trip form.
#[must_use]
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        #[allow(clippy::cast_possible_truncation)]
        let int = value as i64;
        int.to_string()
    } else {
        value.to_string()
    }
}

/// [CSSOM § 2.1 serialize an identifier](https://drafts.csswg.org/cssom/#serialize-an-identifier)
#[must_use]
pub fn serialize_identifier(ident: &str) -> String {
    let mut out = String::with_capacity(ident.len());
    for (i, c) in ident.chars().enumerate() {
        let ident_char = c.is_ascii_alphanumeric() || c == '-' || c == '_' || !c.is_ascii();
        if i == 0 && c.is_ascii_digit() {
            let _ = write!(out, "\\{:x} ", u32::from(c));
        } else if ident_char {
            out.push(c);
        } else {
            out.push('\\');
            out.push(c);
        }
    }
    out
}

/// [CSSOM § 2.1 serialize a string](https://drafts.csswg.org/cssom/#serialize-a-string)
#[must_use]
pub fn serialize_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            '\n' => out.push_str("\\a "),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Serialize a single token.
#[must_use]
pub fn serialize_token(token: &CSSToken) -> String {
    match token {
        CSSToken::Ident(v) => serialize_identifier(v),
        CSSToken::Function(name) => format!("{}(", serialize_identifier(name)),
        CSSToken::AtKeyword(name) => format!("@{}", serialize_identifier(name)),
        CSSToken::Hash { value, .. } => format!("#{value}"),
        CSSToken::String(v) => serialize_string(v),
        CSSToken::Url(v) => format!("url({v})"),
        CSSToken::Delim(c) => c.to_string(),
        CSSToken::Number { value, .. } => format_number(*value),
        CSSToken::Percentage { value, .. } => format!("{}%", format_number(*value)),
        CSSToken::Dimension { value, unit, .. } => format!("{}{unit}", format_number(*value)),
        CSSToken::Whitespace => " ".to_string(),
        CSSToken::CDO => "<!--".to_string(),
        CSSToken::CDC => "-->".to_string(),
        CSSToken::Colon => ":".to_string(),
        CSSToken::Semicolon => ";".to_string(),
        CSSToken::Comma => ",".to_string(),
        CSSToken::LeftBracket => "[".to_string(),
        CSSToken::RightBracket => "]".to_string(),
        CSSToken::LeftParen => "(".to_string(),
        CSSToken::RightParen => ")".to_string(),
        CSSToken::LeftBrace => "{".to_string(),
        CSSToken::RightBrace => "}".to_string(),
        CSSToken::BadString | CSSToken::BadUrl | CSSToken::EOF => String::new(),
    }
}

/// Serialize one component value.
#[must_use]
pub fn serialize_component_value(value: &ComponentValue) -> String {
    let mut out = String::new();
    write_component_value(value, &mut out);
    out
}

/// Serialize a list of component values, concatenated as written.
#[must_use]
pub fn serialize_component_values(values: &[ComponentValue]) -> String {
    let mut out = String::new();
    for value in values {
        write_component_value(value, &mut out);
    }
    out
}

fn write_component_value(value: &ComponentValue, out: &mut String) {
    match value {
        ComponentValue::Token(token) => out.push_str(&serialize_token(token)),
        ComponentValue::Function { name, value } => {
            out.push_str(&serialize_identifier(name));
            out.push('(');
            for v in value {
                write_component_value(v, out);
            }
            out.push(')');
        }
        ComponentValue::Block { token, value } => {
            let close = match token {
                '[' => ']',
                '(' => ')',
                _ => '}',
            };
            out.push(*token);
            for v in value {
                write_component_value(v, out);
            }
            out.push(close);
        }
    }
}

impl Declaration {
    /// The value as CSS text.
    #[must_use]
    pub fn value_text(&self) -> String {
        serialize_component_values(&self.value).trim().to_string()
    }

    /// `name: value` with `!important` when set; no trailing semicolon.
    #[must_use]
    pub fn to_css(&self) -> String {
        let important = if self.important { " !important" } else { "" };
        format!("{}: {}{important}", self.name, self.value_text())
    }
}

impl AtRule {
    /// Write the at-rule back out as it was parsed.
    #[must_use]
    pub fn to_css(&self) -> String {
        let prelude = serialize_component_values(&self.prelude);
        let prelude = prelude.trim();
        let head = if prelude.is_empty() {
            format!("@{}", self.name)
        } else {
            format!("@{} {prelude}", self.name)
        };
        match &self.block {
            Some(block) => format!("{head} {{{}}}", serialize_component_values(block)),
            None => format!("{head};"),
        }
    }
}

impl StyleRule {
    /// `selectors { declarations }` on multiple lines.
    #[must_use]
    pub fn to_css(&self) -> String {
        let selectors: Vec<String> = self.selectors.iter().map(ToString::to_string).collect();
        let mut out = format!("{} {{\n", selectors.join(", "));
        for declaration in &self.declarations {
            let _ = writeln!(out, "  {};", declaration.to_css());
        }
        out.push('}');
        out
    }
}

impl Stylesheet {
    /// Serialize every rule, one blank line apart.
    #[must_use]
    pub fn to_css(&self) -> String {
        let mut out = String::new();
        for rule in &self.rules {
            let text = match rule {
                Rule::Style(style) => style.to_css(),
                Rule::At(at) => at.to_css(),
            };
            out.push_str(&text);
            out.push('\n');
        }
        out
    }
}

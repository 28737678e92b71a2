//! [CSS Syntax § 6 The An+B microsyntax](https://www.w3.org/TR/css-syntax-3/#anb-microsyntax)

use crate::parser::ComponentValue;
use crate::tokenizer::CSSToken;

/// A parsed `An+B` expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Nth {
    /// The step `A`.
    pub step: i64,
    /// The offset `B`.
    pub offset: i64,
}

impl Nth {
    /// "The An+B notation defines an integer step (A) and offset (B), and
    /// represents the An+Bth elements in a list, for every positive integer
    /// or zero value of n."
    ///
    /// `index` is 1-based.
    #[must_use]
    pub const fn matches(self, index: i64) -> bool {
        let distance = index - self.offset;
        if self.step == 0 {
            return distance == 0;
        }
        distance % self.step == 0 && distance / self.step >= 0
    }

    /// Parse the leading `An+B` part of a pseudo-class argument. Anything
    /// after it (such as an `of S` clause) is ignored.
    #[must_use]
    pub fn parse(values: &[ComponentValue]) -> Option<Self> {
        let mut text = String::new();
        for value in values {
            match value {
                ComponentValue::Token(CSSToken::Whitespace) => {}
                ComponentValue::Token(CSSToken::Ident(ident)) if !text.is_empty() => {
                    // `of S` follows the expression.
                    if ident.eq_ignore_ascii_case("of") {
                        break;
                    }
                    text.push_str(ident);
                }
                ComponentValue::Token(CSSToken::Ident(ident)) => text.push_str(ident),
                ComponentValue::Token(CSSToken::Number {
                    int_value: Some(int),
                    ..
                }) => {
                    // The tokenizer folds the sign into the number; put it
                    // back so `2n+1` reads as written.
                    if !text.is_empty() && !text.ends_with(['+', '-']) && *int >= 0 {
                        text.push('+');
                    }
                    text.push_str(&int.to_string());
                }
                ComponentValue::Token(CSSToken::Dimension {
                    int_value: Some(int),
                    unit,
                    ..
                }) => {
                    text.push_str(&int.to_string());
                    text.push_str(unit);
                }
                ComponentValue::Token(CSSToken::Delim(c @ ('+' | '-'))) => text.push(*c),
                _ => return None,
            }
        }
        parse_anb(&text.to_ascii_lowercase())
    }
}

fn parse_anb(text: &str) -> Option<Nth> {
    match text {
        "odd" => return Some(Nth { step: 2, offset: 1 }),
        "even" => return Some(Nth { step: 2, offset: 0 }),
        "" => return None,
        _ => {}
    }
    let Some((a, b)) = text.split_once('n') else {
        return text.parse().ok().map(|offset| Nth { step: 0, offset });
    };
    let step = match a {
        "" | "+" => 1,
        "-" => -1,
        _ => a.parse().ok()?,
    };
    let offset = match b {
        "" => 0,
        _ if b.starts_with('+') || b.starts_with('-') => b.parse().ok()?,
        _ => return None,
    };
    Some(Nth { step, offset })
}

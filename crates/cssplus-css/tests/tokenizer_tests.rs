//! Integration tests for the CSS tokenizer.

use cssplus_common::SourceLocation;
use cssplus_css::tokenizer::{CSSToken, CSSTokenizer, HashType, NumericType};

/// Helper to tokenize a string and return the tokens without locations
fn tokenize(input: &str) -> Vec<CSSToken> {
    let mut tokenizer = CSSTokenizer::new(input);
    tokenizer.run();
    tokenizer.into_tokens().into_iter().map(|(t, _)| t).collect()
}

#[test]
fn test_whitespace() {
    let tokens = tokenize("   \t\n  ");
    assert_eq!(tokens, vec![CSSToken::Whitespace, CSSToken::EOF]);
}

#[test]
fn test_ident_and_function() {
    let tokens = tokenize("background-color attr(");
    assert_eq!(
        tokens,
        vec![
            CSSToken::Ident("background-color".to_string()),
            CSSToken::Whitespace,
            CSSToken::Function("attr".to_string()),
            CSSToken::EOF,
        ]
    );
}

#[test]
fn test_hash_types() {
    let tokens = tokenize("#main #123");
    assert_eq!(
        tokens[0],
        CSSToken::Hash {
            value: "main".to_string(),
            hash_type: HashType::Id
        }
    );
    assert_eq!(
        tokens[2],
        CSSToken::Hash {
            value: "123".to_string(),
            hash_type: HashType::Unrestricted
        }
    );
}

#[test]
fn test_numbers() {
    let tokens = tokenize("42 -3.5 +7 10px 50%");
    assert_eq!(
        tokens[0],
        CSSToken::Number {
            value: 42.0,
            int_value: Some(42),
            numeric_type: NumericType::Integer
        }
    );
    assert_eq!(
        tokens[2],
        CSSToken::Number {
            value: -3.5,
            int_value: None,
            numeric_type: NumericType::Number
        }
    );
    assert_eq!(tokens[4].numeric_value(), Some(7.0));
    assert!(matches!(
        &tokens[6],
        CSSToken::Dimension { value, unit, .. } if (*value - 10.0).abs() < f64::EPSILON && unit == "px"
    ));
    assert!(matches!(tokens[8], CSSToken::Percentage { .. }));
}

#[test]
fn test_strings_and_escapes() {
    let tokens = tokenize(r#"'it\'s' "a\"b""#);
    assert_eq!(tokens[0], CSSToken::String("it's".to_string()));
    assert_eq!(tokens[2], CSSToken::String("a\"b".to_string()));
}

#[test]
fn test_unterminated_string_is_bad_at_newline() {
    let tokens = tokenize("'abc\nx");
    assert_eq!(tokens[0], CSSToken::BadString);
}

#[test]
fn test_url_tokens() {
    assert_eq!(tokenize("url(a.png)")[0], CSSToken::Url("a.png".to_string()));
    // A quoted url is a plain function call.
    assert_eq!(tokenize("url('a.png')")[0], CSSToken::Function("url".to_string()));
}

#[test]
fn test_comments_are_dropped() {
    let tokens = tokenize("a/* note */b");
    assert_eq!(
        tokens,
        vec![
            CSSToken::Ident("a".to_string()),
            CSSToken::Ident("b".to_string()),
            CSSToken::EOF
        ]
    );
}

#[test]
fn test_pseudo_element_punctuation() {
    let tokens = tokenize("p::after(2)");
    assert_eq!(
        tokens,
        vec![
            CSSToken::Ident("p".to_string()),
            CSSToken::Colon,
            CSSToken::Colon,
            CSSToken::Function("after".to_string()),
            CSSToken::Number {
                value: 2.0,
                int_value: Some(2),
                numeric_type: NumericType::Integer
            },
            CSSToken::RightParen,
            CSSToken::EOF,
        ]
    );
}

#[test]
fn test_token_locations() {
    let tokens = cssplus_css::tokenize("a {\n  color: red;\n}");
    let color = tokens
        .iter()
        .find(|(t, _)| *t == CSSToken::Ident("color".to_string()))
        .map(|(_, at)| *at);
    assert_eq!(color, Some(SourceLocation::new(2, 3)));
}

//! [§ 13.2.5.72 Character reference state](https://html.spec.whatwg.org/multipage/parsing.html#character-reference-state)
//!
//! Numeric references are decoded fully. Named references cover the
//! entities that show up in hand-written documents, not the full table.

/// Named references, without the leading `&` or trailing `;`.
const NAMED: &[(&str, &str)] = &[
    ("amp", "&"),
    ("lt", "<"),
    ("gt", ">"),
    ("quot", "\""),
    ("apos", "'"),
    ("nbsp", "\u{00A0}"),
    ("copy", "\u{00A9}"),
    ("reg", "\u{00AE}"),
    ("trade", "\u{2122}"),
    ("mdash", "\u{2014}"),
    ("ndash", "\u{2013}"),
    ("hellip", "\u{2026}"),
    ("bull", "\u{2022}"),
    ("middot", "\u{00B7}"),
    ("lsquo", "\u{2018}"),
    ("rsquo", "\u{2019}"),
    ("ldquo", "\u{201C}"),
    ("rdquo", "\u{201D}"),
    ("laquo", "\u{00AB}"),
    ("raquo", "\u{00BB}"),
    ("sect", "\u{00A7}"),
    ("para", "\u{00B6}"),
    ("deg", "\u{00B0}"),
    ("times", "\u{00D7}"),
    ("divide", "\u{00F7}"),
    ("euro", "\u{20AC}"),
    ("pound", "\u{00A3}"),
    ("larr", "\u{2190}"),
    ("rarr", "\u{2192}"),
    ("uarr", "\u{2191}"),
    ("darr", "\u{2193}"),
    ("shy", "\u{00AD}"),
    ("zwj", "\u{200D}"),
    ("zwnj", "\u{200C}"),
];

/// "If the character reference was consumed as part of an attribute" or
/// not, these legacy names also match without the trailing semicolon.
const LEGACY: &[&str] = &["amp", "lt", "gt", "quot", "nbsp", "copy", "reg"];

/// Decode the reference that starts right after an `&`.
///
/// Returns the replacement text and how many characters (after the `&`)
/// were consumed, or `None` when the `&` is just a literal ampersand.
#[must_use]
pub fn decode_character_reference(rest: &[char]) -> Option<(String, usize)> {
    if rest.first() == Some(&'#') {
        return decode_numeric(rest);
    }
    let name: String = rest
        .iter()
        .take_while(|c| c.is_ascii_alphanumeric())
        .take(32)
        .collect();
    let len = name.chars().count();
    let value = NAMED.iter().find(|(n, _)| *n == name).map(|(_, v)| *v)?;
    if rest.get(len) == Some(&';') {
        Some((value.to_string(), len + 1))
    } else if LEGACY.contains(&name.as_str()) {
        Some((value.to_string(), len))
    } else {
        None
    }
}

/// [§ 13.2.5.75 Numeric character reference state](https://html.spec.whatwg.org/multipage/parsing.html#numeric-character-reference-state)
fn decode_numeric(rest: &[char]) -> Option<(String, usize)> {
    let (radix, start) = match rest.get(1) {
        Some('x' | 'X') => (16, 2),
        _ => (10, 1),
    };
    let digits: String = rest[start..]
        .iter()
        .take_while(|c| c.is_digit(radix))
        .collect();
    if digits.is_empty() {
        return None;
    }
    let mut consumed = start + digits.len();
    if rest.get(consumed) == Some(&';') {
        consumed += 1;
    }
    // "If the number is 0x00 ... or greater than 0x10FFFF ... set the
    // character reference code to 0xFFFD."
    let c = u32::from_str_radix(&digits, radix)
        .ok()
        .filter(|&n| n != 0)
        .and_then(char::from_u32)
        .unwrap_or('\u{FFFD}');
    Some((c.to_string(), consumed))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(s: &str) -> Option<(String, usize)> {
        let chars: Vec<char> = s.chars().collect();
        decode_character_reference(&chars)
    }

    #[test]
    fn test_named_and_legacy() {
        assert_eq!(decode("amp; rest"), Some(("&".to_string(), 4)));
        assert_eq!(decode("lt rest"), Some(("<".to_string(), 2)));
        assert_eq!(decode("mdash rest"), None);
        assert_eq!(decode("bogus;"), None);
    }

    #[test]
    fn test_numeric() {
        assert_eq!(decode("#65;"), Some(("A".to_string(), 4)));
        assert_eq!(decode("#x41"), Some(("A".to_string(), 3)));
        assert_eq!(decode("#0;"), Some(("\u{FFFD}".to_string(), 3)));
        assert_eq!(decode("#;"), None);
    }
}

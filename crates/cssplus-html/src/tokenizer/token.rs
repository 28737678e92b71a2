use cssplus_common::SourceLocation;

/// An attribute on a start tag token.
///
/// Per [§ 13.2.5 Tokenization](https://html.spec.whatwg.org/multipage/parsing.html#tokenization):
/// "a list of attributes, each of which has a name and a value"
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// "each of which has a name"
    pub name: String,
    /// "and a value"
    pub value: String,
}

/// [§ 13.2.5 Tokenization](https://html.spec.whatwg.org/multipage/parsing.html#tokenization)
///
/// "The output of the tokenization step is a series of zero or more of the following
/// tokens: DOCTYPE, start tag, end tag, comment, character, end-of-file."
///
/// Adjacent character tokens are merged into a single [`Token::Text`] run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Everything between `<!DOCTYPE` and `>`, trimmed.
    Doctype {
        /// The raw doctype body, e.g. `html`.
        name: String,
    },
    /// "Start and end tag tokens have a tag name, a self-closing flag, and a
    /// list of attributes"
    StartTag {
        /// "a tag name", lowercased
        name: String,
        /// "a self-closing flag"
        self_closing: bool,
        /// "a list of attributes", duplicates already dropped
        attributes: Vec<Attribute>,
    },
    /// End tag token. Attributes on end tags are parse errors and dropped.
    EndTag {
        /// "a tag name", lowercased
        name: String,
    },
    /// "Comment and character tokens have data."
    Comment {
        /// "data"
        data: String,
    },
    /// A run of character tokens with character references decoded.
    Text {
        /// The decoded characters.
        data: String,
    },
    /// End-of-file token signals the end of input.
    EndOfFile,
}

/// A token plus the location of its first source character.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionedToken {
    /// The token.
    pub token: Token,
    /// Where it starts.
    pub location: SourceLocation,
}

use cssplus_common::{SourceLocation, location_table};
use strum_macros::Display;

use super::character_reference::decode_character_reference;
use super::token::{Attribute, PositionedToken, Token};
use crate::parser::ParseIssue;

/// [§ 13.2.5 Tokenization](https://html.spec.whatwg.org/multipage/parsing.html#tokenization)
///
/// The subset of the tokenizer state machine this crate implements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum TokenizerState {
    /// [§ 13.2.5.1 Data state](https://html.spec.whatwg.org/multipage/parsing.html#data-state)
    Data,
    /// [§ 13.2.5.2 RCDATA state](https://html.spec.whatwg.org/multipage/parsing.html#rcdata-state)
    RCDATA,
    /// [§ 13.2.5.3 RAWTEXT state](https://html.spec.whatwg.org/multipage/parsing.html#rawtext-state)
    RAWTEXT,
    /// [§ 13.2.5.6 Tag open state](https://html.spec.whatwg.org/multipage/parsing.html#tag-open-state)
    TagOpen,
    /// [§ 13.2.5.7 End tag open state](https://html.spec.whatwg.org/multipage/parsing.html#end-tag-open-state)
    EndTagOpen,
    /// [§ 13.2.5.8 Tag name state](https://html.spec.whatwg.org/multipage/parsing.html#tag-name-state)
    TagName,
    /// [§ 13.2.5.32 Before attribute name state](https://html.spec.whatwg.org/multipage/parsing.html#before-attribute-name-state)
    BeforeAttributeName,
    /// [§ 13.2.5.33 Attribute name state](https://html.spec.whatwg.org/multipage/parsing.html#attribute-name-state)
    AttributeName,
    /// [§ 13.2.5.34 After attribute name state](https://html.spec.whatwg.org/multipage/parsing.html#after-attribute-name-state)
    AfterAttributeName,
    /// [§ 13.2.5.35 Before attribute value state](https://html.spec.whatwg.org/multipage/parsing.html#before-attribute-value-state)
    BeforeAttributeValue,
    /// [§ 13.2.5.36 Attribute value (double-quoted) state](https://html.spec.whatwg.org/multipage/parsing.html#attribute-value-(double-quoted)-state)
    AttributeValueDoubleQuoted,
    /// [§ 13.2.5.37 Attribute value (single-quoted) state](https://html.spec.whatwg.org/multipage/parsing.html#attribute-value-(single-quoted)-state)
    AttributeValueSingleQuoted,
    /// [§ 13.2.5.38 Attribute value (unquoted) state](https://html.spec.whatwg.org/multipage/parsing.html#attribute-value-(unquoted)-state)
    AttributeValueUnquoted,
    /// [§ 13.2.5.40 Self-closing start tag state](https://html.spec.whatwg.org/multipage/parsing.html#self-closing-start-tag-state)
    SelfClosingStartTag,
    /// [§ 13.2.5.41 Bogus comment state](https://html.spec.whatwg.org/multipage/parsing.html#bogus-comment-state)
    BogusComment,
    /// [§ 13.2.5.42 Markup declaration open state](https://html.spec.whatwg.org/multipage/parsing.html#markup-declaration-open-state)
    MarkupDeclarationOpen,
    /// [§ 13.2.5.45 Comment state](https://html.spec.whatwg.org/multipage/parsing.html#comment-state)
    Comment,
    /// [§ 13.2.5.53 DOCTYPE state](https://html.spec.whatwg.org/multipage/parsing.html#doctype-state)
    DOCTYPE,
}

/// Elements whose content is RAWTEXT: no tags, no character references.
const RAWTEXT_ELEMENTS: &[&str] = &["script", "style", "xmp", "iframe", "noembed", "noframes"];
/// Elements whose content is RCDATA: no tags, but references are decoded.
const RCDATA_ELEMENTS: &[&str] = &["title", "textarea"];

/// A tag under construction.
#[derive(Debug, Default)]
struct TagBuilder {
    name: String,
    is_end: bool,
    self_closing: bool,
    attributes: Vec<Attribute>,
    current_attribute: Option<Attribute>,
}

/// [§ 13.2.5 Tokenization](https://html.spec.whatwg.org/multipage/parsing.html#tokenization)
///
/// "Implementations must act as if they used the following state machine to tokenize HTML."
pub struct HTMLTokenizer {
    state: TokenizerState,
    input: Vec<char>,
    locations: Vec<SourceLocation>,
    current_pos: usize,
    /// Position of the `<` that opened the current markup construct.
    markup_start: usize,
    current_tag: TagBuilder,
    /// Data buffer for comments and DOCTYPEs.
    buffer: String,
    text: String,
    text_start: usize,
    /// "The last start tag token emitted", used to find the end of
    /// RAWTEXT/RCDATA content.
    last_start_tag_name: Option<String>,
    token_stream: Vec<PositionedToken>,
    issues: Vec<ParseIssue>,
}

impl HTMLTokenizer {
    /// Create a tokenizer over `input`.
    #[must_use]
    pub fn new(input: &str) -> Self {
        let input: Vec<char> = input.chars().collect();
        let locations = location_table(&input);
        Self {
            state: TokenizerState::Data,
            input,
            locations,
            current_pos: 0,
            markup_start: 0,
            current_tag: TagBuilder::default(),
            buffer: String::new(),
            text: String::new(),
            text_start: 0,
            last_start_tag_name: None,
            token_stream: Vec::new(),
            issues: Vec::new(),
        }
    }

    /// Tokenize the whole input. The last token is always [`Token::EndOfFile`].
    #[must_use]
    pub fn run(mut self) -> (Vec<PositionedToken>, Vec<ParseIssue>) {
        while let Some(&c) = self.input.get(self.current_pos) {
            self.step(c);
        }
        self.handle_eof();
        let eof_at = self.location(self.input.len());
        self.token_stream.push(PositionedToken {
            token: Token::EndOfFile,
            location: eof_at,
        });
        (self.token_stream, self.issues)
    }

    fn location(&self, pos: usize) -> SourceLocation {
        self.locations.get(pos).copied().unwrap_or_default()
    }

    fn issue(&mut self, message: &str) {
        let location = self.location(self.current_pos);
        self.issues.push(ParseIssue::new(message, location));
    }

    fn emit(&mut self, token: Token, start: usize) {
        let location = self.location(start);
        self.token_stream.push(PositionedToken { token, location });
    }

    fn push_text(&mut self, s: &str) {
        if self.text.is_empty() {
            self.text_start = self.current_pos;
        }
        self.text.push_str(s);
    }

    fn flush_text(&mut self) {
        if !self.text.is_empty() {
            let data = std::mem::take(&mut self.text);
            self.emit(Token::Text { data }, self.text_start);
        }
    }

    fn starts_with(&self, prefix: &str, case_insensitive: bool) -> bool {
        let mut pos = self.current_pos;
        for expected in prefix.chars() {
            match self.input.get(pos) {
                Some(c) if *c == expected => {}
                Some(c) if case_insensitive && c.eq_ignore_ascii_case(&expected) => {}
                _ => return false,
            }
            pos += 1;
        }
        true
    }

    /// "An appropriate end tag token is an end tag token whose tag name
    /// matches the tag name of the last start tag to have been emitted."
    fn at_appropriate_end_tag(&self) -> bool {
        let Some(name) = &self.last_start_tag_name else {
            return false;
        };
        let mut closing = String::from("</");
        closing.push_str(name);
        if !self.starts_with(&closing, true) {
            return false;
        }
        let after = self.current_pos + closing.chars().count();
        matches!(
            self.input.get(after),
            None | Some('>' | '/' | ' ' | '\t' | '\n' | '\r' | '\u{0C}')
        )
    }

    /// Consume a character reference starting at the current `&` and return
    /// the replacement text.
    fn consume_character_reference(&mut self) -> String {
        let rest = &self.input[self.current_pos + 1..];
        if let Some((decoded, consumed)) = decode_character_reference(rest) {
            self.current_pos += 1 + consumed;
            decoded
        } else {
            self.current_pos += 1;
            "&".to_string()
        }
    }

    fn start_tag(&mut self, is_end: bool) {
        self.current_tag = TagBuilder {
            is_end,
            ..TagBuilder::default()
        };
    }

    fn commit_attribute(&mut self) {
        if let Some(attribute) = self.current_tag.current_attribute.take() {
            // "If there is already an attribute on the token with the exact
            // same name, then this is a duplicate-attribute parse error and
            // the new attribute must be removed from the token."
            if self
                .current_tag
                .attributes
                .iter()
                .any(|a| a.name == attribute.name)
            {
                self.issue("duplicate-attribute");
            } else {
                self.current_tag.attributes.push(attribute);
            }
        }
    }

    fn emit_tag(&mut self) {
        self.commit_attribute();
        let tag = std::mem::take(&mut self.current_tag);
        let token = if tag.is_end {
            if !tag.attributes.is_empty() {
                self.issue("end-tag-with-attributes");
            }
            self.state = TokenizerState::Data;
            Token::EndTag { name: tag.name }
        } else {
            self.state = if RAWTEXT_ELEMENTS.contains(&tag.name.as_str()) {
                TokenizerState::RAWTEXT
            } else if RCDATA_ELEMENTS.contains(&tag.name.as_str()) {
                TokenizerState::RCDATA
            } else {
                TokenizerState::Data
            };
            self.last_start_tag_name = Some(tag.name.clone());
            Token::StartTag {
                name: tag.name,
                self_closing: tag.self_closing,
                attributes: tag.attributes,
            }
        };
        self.emit(token, self.markup_start);
    }

    fn emit_buffer_as(&mut self, make: fn(String) -> Token) {
        let data = std::mem::take(&mut self.buffer);
        self.emit(make(data), self.markup_start);
        self.state = TokenizerState::Data;
    }

    fn attribute_mut(&mut self) -> &mut Attribute {
        self.current_tag
            .current_attribute
            .get_or_insert_with(|| Attribute {
                name: String::new(),
                value: String::new(),
            })
    }

    fn begin_attribute(&mut self) {
        self.commit_attribute();
        self.current_tag.current_attribute = Some(Attribute {
            name: String::new(),
            value: String::new(),
        });
    }

    /// Run one step of the state machine on the character at the current
    /// position. Every arm either consumes input or changes state.
    fn step(&mut self, c: char) {
        match self.state {
            TokenizerState::Data => match c {
                '<' => {
                    self.flush_text();
                    self.markup_start = self.current_pos;
                    self.current_pos += 1;
                    self.state = TokenizerState::TagOpen;
                }
                '&' => {
                    if self.text.is_empty() {
                        self.text_start = self.current_pos;
                    }
                    let decoded = self.consume_character_reference();
                    self.text.push_str(&decoded);
                }
                _ => {
                    self.push_text(c.encode_utf8(&mut [0; 4]));
                    self.current_pos += 1;
                }
            },
            TokenizerState::RCDATA | TokenizerState::RAWTEXT => {
                if c == '<' && self.at_appropriate_end_tag() {
                    self.flush_text();
                    self.markup_start = self.current_pos;
                    self.current_pos += 2;
                    self.start_tag(true);
                    self.state = TokenizerState::TagName;
                } else if c == '&' && self.state == TokenizerState::RCDATA {
                    if self.text.is_empty() {
                        self.text_start = self.current_pos;
                    }
                    let decoded = self.consume_character_reference();
                    self.text.push_str(&decoded);
                } else {
                    self.push_text(c.encode_utf8(&mut [0; 4]));
                    self.current_pos += 1;
                }
            }
            TokenizerState::TagOpen => match c {
                '!' => {
                    self.current_pos += 1;
                    self.state = TokenizerState::MarkupDeclarationOpen;
                }
                '/' => {
                    self.current_pos += 1;
                    self.state = TokenizerState::EndTagOpen;
                }
                c if c.is_ascii_alphabetic() => {
                    self.start_tag(false);
                    self.state = TokenizerState::TagName;
                }
                _ => {
                    // "This is an invalid-first-character-of-tag-name parse
                    // error. Emit a U+003C LESS-THAN SIGN character token.
                    // Reconsume in the data state."
                    self.issue("invalid-first-character-of-tag-name");
                    self.text_start = self.markup_start;
                    self.text.push('<');
                    self.state = TokenizerState::Data;
                }
            },
            TokenizerState::EndTagOpen => match c {
                c if c.is_ascii_alphabetic() => {
                    self.start_tag(true);
                    self.state = TokenizerState::TagName;
                }
                '>' => {
                    self.issue("missing-end-tag-name");
                    self.current_pos += 1;
                    self.state = TokenizerState::Data;
                }
                _ => {
                    self.issue("invalid-first-character-of-tag-name");
                    self.state = TokenizerState::BogusComment;
                }
            },
            TokenizerState::TagName => {
                self.current_pos += 1;
                match c {
                    c if c.is_ascii_whitespace() => {
                        self.state = TokenizerState::BeforeAttributeName;
                    }
                    '/' => self.state = TokenizerState::SelfClosingStartTag,
                    '>' => self.emit_tag(),
                    _ => self.current_tag.name.push(c.to_ascii_lowercase()),
                }
            }
            TokenizerState::BeforeAttributeName => match c {
                c if c.is_ascii_whitespace() => self.current_pos += 1,
                '/' | '>' => self.state = TokenizerState::AfterAttributeName,
                '=' => {
                    self.issue("unexpected-equals-sign-before-attribute-name");
                    self.begin_attribute();
                    self.attribute_mut().name.push('=');
                    self.current_pos += 1;
                    self.state = TokenizerState::AttributeName;
                }
                _ => {
                    self.begin_attribute();
                    self.state = TokenizerState::AttributeName;
                }
            },
            TokenizerState::AttributeName => match c {
                c if c.is_ascii_whitespace() || c == '/' || c == '>' => {
                    self.state = TokenizerState::AfterAttributeName;
                }
                '=' => {
                    self.current_pos += 1;
                    self.state = TokenizerState::BeforeAttributeValue;
                }
                _ => {
                    self.attribute_mut().name.push(c.to_ascii_lowercase());
                    self.current_pos += 1;
                }
            },
            TokenizerState::AfterAttributeName => match c {
                c if c.is_ascii_whitespace() => self.current_pos += 1,
                '/' => {
                    self.current_pos += 1;
                    self.state = TokenizerState::SelfClosingStartTag;
                }
                '=' => {
                    self.current_pos += 1;
                    self.state = TokenizerState::BeforeAttributeValue;
                }
                '>' => {
                    self.current_pos += 1;
                    self.emit_tag();
                }
                _ => {
                    self.begin_attribute();
                    self.state = TokenizerState::AttributeName;
                }
            },
            TokenizerState::BeforeAttributeValue => match c {
                c if c.is_ascii_whitespace() => self.current_pos += 1,
                '"' => {
                    self.current_pos += 1;
                    self.state = TokenizerState::AttributeValueDoubleQuoted;
                }
                '\'' => {
                    self.current_pos += 1;
                    self.state = TokenizerState::AttributeValueSingleQuoted;
                }
                '>' => {
                    self.issue("missing-attribute-value");
                    self.current_pos += 1;
                    self.emit_tag();
                }
                _ => self.state = TokenizerState::AttributeValueUnquoted,
            },
            TokenizerState::AttributeValueDoubleQuoted
            | TokenizerState::AttributeValueSingleQuoted => {
                let quote = if self.state == TokenizerState::AttributeValueDoubleQuoted {
                    '"'
                } else {
                    '\''
                };
                if c == quote {
                    self.current_pos += 1;
                    self.commit_attribute();
                    self.state = TokenizerState::BeforeAttributeName;
                } else if c == '&' {
                    let decoded = self.consume_character_reference();
                    self.attribute_mut().value.push_str(&decoded);
                } else {
                    self.attribute_mut().value.push(c);
                    self.current_pos += 1;
                }
            }
            TokenizerState::AttributeValueUnquoted => match c {
                c if c.is_ascii_whitespace() => {
                    self.current_pos += 1;
                    self.commit_attribute();
                    self.state = TokenizerState::BeforeAttributeName;
                }
                '&' => {
                    let decoded = self.consume_character_reference();
                    self.attribute_mut().value.push_str(&decoded);
                }
                '>' => {
                    self.current_pos += 1;
                    self.emit_tag();
                }
                _ => {
                    self.attribute_mut().value.push(c);
                    self.current_pos += 1;
                }
            },
            TokenizerState::SelfClosingStartTag => {
                if c == '>' {
                    self.current_pos += 1;
                    self.current_tag.self_closing = true;
                    self.emit_tag();
                } else {
                    self.issue("unexpected-solidus-in-tag");
                    self.state = TokenizerState::BeforeAttributeName;
                }
            }
            TokenizerState::MarkupDeclarationOpen => {
                if self.starts_with("--", false) {
                    self.current_pos += 2;
                    self.state = TokenizerState::Comment;
                } else if self.starts_with("DOCTYPE", true) {
                    self.current_pos += "DOCTYPE".len();
                    self.state = TokenizerState::DOCTYPE;
                } else {
                    self.issue("incorrectly-opened-comment");
                    self.state = TokenizerState::BogusComment;
                }
            }
            TokenizerState::Comment => {
                if self.starts_with("-->", false) {
                    self.current_pos += 3;
                    self.emit_buffer_as(|data| Token::Comment { data });
                } else {
                    self.buffer.push(c);
                    self.current_pos += 1;
                }
            }
            TokenizerState::BogusComment => {
                self.current_pos += 1;
                if c == '>' {
                    self.emit_buffer_as(|data| Token::Comment { data });
                } else {
                    self.buffer.push(c);
                }
            }
            TokenizerState::DOCTYPE => {
                self.current_pos += 1;
                if c == '>' {
                    self.emit_buffer_as(|data| Token::Doctype {
                        name: data.trim().to_string(),
                    });
                } else {
                    self.buffer.push(c);
                }
            }
        }
    }

    /// [§ 13.2.5 Tokenization] EOF handling for the state we stopped in.
    fn handle_eof(&mut self) {
        match self.state {
            TokenizerState::Data | TokenizerState::RCDATA | TokenizerState::RAWTEXT => {}
            TokenizerState::TagOpen => {
                self.issue("eof-before-tag-name");
                self.text_start = self.markup_start;
                self.text.push('<');
            }
            TokenizerState::EndTagOpen => {
                self.issue("eof-before-tag-name");
                self.text_start = self.markup_start;
                self.text.push_str("</");
            }
            TokenizerState::Comment | TokenizerState::BogusComment => {
                self.issue("eof-in-comment");
                self.emit_buffer_as(|data| Token::Comment { data });
            }
            TokenizerState::DOCTYPE => {
                self.issue("eof-in-doctype");
                self.emit_buffer_as(|data| Token::Doctype {
                    name: data.trim().to_string(),
                });
            }
            TokenizerState::MarkupDeclarationOpen => {
                self.issue("incorrectly-opened-comment");
                self.emit_buffer_as(|data| Token::Comment { data });
            }
            _ => {
                // "This is an eof-in-tag parse error. Emit an end-of-file token."
                self.issue("eof-in-tag");
            }
        }
        self.flush_text();
    }
}

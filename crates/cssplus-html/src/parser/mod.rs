//! [§ 13.2.6 Tree construction](https://html.spec.whatwg.org/multipage/parsing.html#tree-construction)
//!
//! A single insertion mode: tokens are inserted at the current node of the
//! stack of open elements, with the implied end tags that hand-written
//! documents rely on.

use cssplus_common::SourceLocation;
use cssplus_dom::serialize::is_void;
use cssplus_dom::{Attributes, DomTree, ElementData, Node, NodeId, NodeType};
use thiserror::Error;

use crate::tokenizer::{HTMLTokenizer, PositionedToken, Token};

/// A recoverable problem found while tokenizing or building the tree.
///
/// "Parse errors are only errors with the content" - the document is still
/// produced; issues are reported alongside it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{location}: {message}")]
pub struct ParseIssue {
    /// Parse error code, e.g. `duplicate-attribute`.
    pub message: String,
    /// Where in the HTML source it was found.
    pub location: SourceLocation,
}

impl ParseIssue {
    /// Create an issue.
    #[must_use]
    pub fn new(message: &str, location: SourceLocation) -> Self {
        Self {
            message: message.to_string(),
            location,
        }
    }
}

/// Start tags that close an open `p` element.
/// "If the stack of open elements has a p element in button scope, then close a p element."
const CLOSES_P: &[&str] = &[
    "address", "article", "aside", "blockquote", "details", "dialog", "dd", "div", "dl", "dt",
    "fieldset", "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6",
    "header", "hgroup", "hr", "li", "main", "menu", "nav", "ol", "p", "pre", "section", "table",
    "ul",
];

/// Elements whose end tag may be omitted.
const OPTIONAL_END_TAGS: &[&str] = &["p", "li", "dt", "dd", "option", "tr", "td", "th"];

/// Whether an open element named `open` is implicitly ended by a start tag
/// named `incoming`.
fn implicitly_closed_by(open: &str, incoming: &str) -> bool {
    match open {
        "p" => CLOSES_P.contains(&incoming),
        "li" => incoming == "li",
        "dt" | "dd" => matches!(incoming, "dt" | "dd"),
        "option" => matches!(incoming, "option" | "optgroup"),
        "tr" => incoming == "tr",
        "td" | "th" => matches!(incoming, "td" | "th" | "tr"),
        _ => false,
    }
}

/// Builds a [`DomTree`] from a token stream.
pub struct HTMLParser {
    tokens: Vec<PositionedToken>,
    tree: DomTree,
    /// [§ 13.2.4.2 The stack of open elements](https://html.spec.whatwg.org/multipage/parsing.html#the-stack-of-open-elements)
    /// The document node sits at the bottom.
    stack_of_open_elements: Vec<NodeId>,
    issues: Vec<ParseIssue>,
}

impl HTMLParser {
    /// Create a parser over an already tokenized document.
    #[must_use]
    pub fn new(tokens: Vec<PositionedToken>) -> Self {
        Self {
            tokens,
            tree: DomTree::new(),
            stack_of_open_elements: vec![NodeId::ROOT],
            issues: Vec::new(),
        }
    }

    /// "The current node is the bottommost node in this stack of open elements."
    fn current_node(&self) -> NodeId {
        self.stack_of_open_elements
            .last()
            .copied()
            .unwrap_or(NodeId::ROOT)
    }

    fn current_tag_name(&self) -> Option<&str> {
        self.tree.tag_name(self.current_node())
    }

    /// Run the parser and return the tree with any issues found.
    #[must_use]
    pub fn run(mut self) -> (DomTree, Vec<ParseIssue>) {
        for PositionedToken { token, location } in std::mem::take(&mut self.tokens) {
            self.process_token(token, location);
        }
        (self.tree, self.issues)
    }

    fn process_token(&mut self, token: Token, location: SourceLocation) {
        match token {
            Token::Doctype { name } => {
                let node = self.tree.alloc_at(NodeType::Doctype(name), Some(location));
                self.tree.append_child(self.current_node(), node);
            }
            Token::Comment { data } => {
                let node = self.tree.alloc_at(NodeType::Comment(data), Some(location));
                self.tree.append_child(self.current_node(), node);
            }
            Token::Text { data } => self.insert_text(data, location),
            Token::StartTag {
                name,
                self_closing,
                attributes,
            } => {
                while self
                    .current_tag_name()
                    .is_some_and(|open| implicitly_closed_by(open, &name))
                {
                    let _ = self.stack_of_open_elements.pop();
                }
                let attrs: Attributes = attributes.into_iter().map(|a| (a.name, a.value)).collect();
                let element = ElementData {
                    tag_name: name,
                    attrs,
                };
                let void = is_void(&element.tag_name);
                if self_closing && !void {
                    // "non-void-html-element-start-tag-with-trailing-solidus":
                    // treated as an empty element so authored `<div/>` stays empty.
                    self.issues.push(ParseIssue::new(
                        "non-void-html-element-start-tag-with-trailing-solidus",
                        location,
                    ));
                }
                let node = self
                    .tree
                    .alloc_at(NodeType::Element(element), Some(location));
                self.tree.append_child(self.current_node(), node);
                if !void && !self_closing {
                    self.stack_of_open_elements.push(node);
                }
            }
            Token::EndTag { name } => self.close_element(&name, location),
            Token::EndOfFile => self.stack_of_open_elements.truncate(1),
        }
    }

    fn insert_text(&mut self, data: String, location: SourceLocation) {
        let parent = self.current_node();
        let previous_text = self
            .tree
            .last_child(parent)
            .and_then(|last| match self.tree.get_mut(last) {
                Some(Node {
                    node_type: NodeType::Text(existing),
                    ..
                }) => Some(existing),
                _ => None,
            });
        if let Some(existing) = previous_text {
            existing.push_str(&data);
            return;
        }
        let node = self.tree.alloc_at(NodeType::Text(data), Some(location));
        self.tree.append_child(parent, node);
    }

    /// "An end tag whose tag name is one of ...: If the stack of open elements
    /// does not have an element in scope that is an HTML element with the same
    /// tag name as that of the token, then this is a parse error; ignore the token."
    fn close_element(&mut self, name: &str, location: SourceLocation) {
        let position = self
            .stack_of_open_elements
            .iter()
            .rposition(|&id| self.tree.tag_name(id) == Some(name));
        let Some(position) = position else {
            if !is_void(name) {
                self.issues
                    .push(ParseIssue::new(&format!("stray end tag </{name}>"), location));
            }
            return;
        };
        let skipped: Vec<String> = self.stack_of_open_elements[position + 1..]
            .iter()
            .filter_map(|&id| self.tree.tag_name(id))
            .filter(|tag| !OPTIONAL_END_TAGS.contains(tag))
            .map(ToString::to_string)
            .collect();
        for unclosed in skipped {
            self.issues.push(ParseIssue::new(
                &format!("end tag </{name}> closes unclosed <{unclosed}>"),
                location,
            ));
        }
        self.stack_of_open_elements.truncate(position);
    }
}

/// Tokenize and parse `html` into a document tree.
#[must_use]
pub fn parse_document(html: &str) -> (DomTree, Vec<ParseIssue>) {
    let (tokens, mut issues) = HTMLTokenizer::new(html).run();
    let (tree, parse_issues) = HTMLParser::new(tokens).run();
    issues.extend(parse_issues);
    (tree, issues)
}

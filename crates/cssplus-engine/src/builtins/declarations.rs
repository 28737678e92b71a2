//! Built-in declaration handlers.
//!
//! Each handler validates its values up front and returns a task that
//! performs the mutation once the target node resolves. Nothing touches the
//! tree before that.

use std::rc::Rc;

use cssplus_common::SourceLocation;
use cssplus_css::{Declaration, SelectorList};
use cssplus_dom::NodeId;

use crate::error::EngineError;
use crate::evaluator::Value;
use crate::host::Host;
use crate::plugin::{DeclarationPlugin, Plugin};
use crate::session::{Session, parse_selector_list};
use crate::task::{self, NodeTask};

/// Every value as text, space-separated values concatenated and groups
/// joined with `", "`.
fn joined_text(host: &Host, values: &[Vec<Value>]) -> String {
    values
        .iter()
        .map(|group| group.iter().map(|v| v.to_text(host)).collect::<String>())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Whitespace-separated words across every value.
fn words(host: &Host, values: &[Vec<Value>]) -> Vec<String> {
    values
        .iter()
        .flatten()
        .flat_map(|v| {
            v.to_text(host)
                .split_whitespace()
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .collect()
}

/// A user error raised while the mutation runs.
fn mutation_error(
    host: &Host,
    message: String,
    declaration: SourceLocation,
    node: NodeId,
) -> EngineError {
    EngineError::user(message, Some(declaration)).with_html(host.location(node))
}

/// Fail if moving `moved` into `node` would put a node inside itself.
fn check_movable(
    host: &Host,
    moved: &[NodeId],
    node: NodeId,
    location: SourceLocation,
) -> Result<(), EngineError> {
    if moved.iter().any(|&m| host.contains(m, node)) {
        return Err(mutation_error(
            host,
            "cannot move an element into itself or its own descendant".to_string(),
            location,
            node,
        ));
    }
    Ok(())
}

/// One piece of generated content.
#[derive(Debug, Clone)]
enum Piece {
    Text(String),
    Nodes(Vec<NodeId>),
}

/// `content: ...`: replace the node's children with text and moved
/// elements.
#[derive(Debug, Clone, Copy)]
pub struct Content;

impl Plugin for Content {
    fn name(&self) -> &str {
        "content"
    }
}

impl DeclarationPlugin for Content {
    fn evaluate_rule(
        &self,
        session: &Session,
        _lookup: NodeId,
        node_task: NodeTask,
        values: Vec<Vec<Value>>,
        declaration: &Declaration,
    ) -> Result<NodeTask, EngineError> {
        let mut pieces: Vec<Piece> = Vec::new();
        for value in values.into_iter().flatten() {
            match value {
                Value::Elements(nodes) => pieces.push(Piece::Nodes(nodes)),
                other => {
                    let text = other.to_text(&session.host);
                    match pieces.last_mut() {
                        Some(Piece::Text(last)) => last.push_str(&text),
                        _ => pieces.push(Piece::Text(text)),
                    }
                }
            }
        }

        let host = session.host.clone();
        let location = declaration.location;
        Ok(task::then(node_task, move |node| {
            for piece in &pieces {
                if let Piece::Nodes(moved) = piece {
                    check_movable(&host, moved, node, location)?;
                }
            }
            host.clear_children(node);
            for piece in pieces {
                match piece {
                    Piece::Text(text) if text.is_empty() => {}
                    Piece::Text(text) => {
                        let text = host.create_text(&text);
                        host.append(node, text);
                    }
                    Piece::Nodes(moved) => {
                        for child in moved {
                            host.append(node, child);
                        }
                    }
                }
            }
            Ok(node)
        }))
    }
}

/// `class-add: a b`
#[derive(Debug, Clone, Copy)]
pub struct ClassAdd;

impl Plugin for ClassAdd {
    fn name(&self) -> &str {
        "class-add"
    }
}

impl DeclarationPlugin for ClassAdd {
    fn evaluate_rule(
        &self,
        session: &Session,
        _lookup: NodeId,
        node_task: NodeTask,
        values: Vec<Vec<Value>>,
        _declaration: &Declaration,
    ) -> Result<NodeTask, EngineError> {
        let classes = words(&session.host, &values);
        let host = session.host.clone();
        Ok(task::then(node_task, move |node| {
            for class in &classes {
                host.add_class(node, class);
            }
            Ok(node)
        }))
    }
}

/// `class-remove: a b`
#[derive(Debug, Clone, Copy)]
pub struct ClassRemove;

impl Plugin for ClassRemove {
    fn name(&self) -> &str {
        "class-remove"
    }
}

impl DeclarationPlugin for ClassRemove {
    fn evaluate_rule(
        &self,
        session: &Session,
        _lookup: NodeId,
        node_task: NodeTask,
        values: Vec<Vec<Value>>,
        _declaration: &Declaration,
    ) -> Result<NodeTask, EngineError> {
        let classes = words(&session.host, &values);
        let host = session.host.clone();
        Ok(task::then(node_task, move |node| {
            for class in &classes {
                host.remove_class(node, class);
            }
            Ok(node)
        }))
    }
}

/// `attrs-add: name value, name value`. The value is every value after
/// the name, concatenated.
#[derive(Debug, Clone, Copy)]
pub struct AttrsAdd;

impl Plugin for AttrsAdd {
    fn name(&self) -> &str {
        "attrs-add"
    }
}

impl DeclarationPlugin for AttrsAdd {
    fn evaluate_rule(
        &self,
        session: &Session,
        lookup: NodeId,
        node_task: NodeTask,
        values: Vec<Vec<Value>>,
        declaration: &Declaration,
    ) -> Result<NodeTask, EngineError> {
        let host = session.host.clone();
        let mut pairs = Vec::new();
        for group in &values {
            let Some((name, value)) = group.split_first() else {
                continue;
            };
            let name = name.to_text(&host);
            if name.is_empty() || name.contains(char::is_whitespace) {
                return Err(mutation_error(
                    &host,
                    format!("attrs-add: '{name}' is not an attribute name"),
                    declaration.location,
                    lookup,
                ));
            }
            let value: String = value.iter().map(|v| v.to_text(&host)).collect();
            pairs.push((name, value));
        }
        Ok(task::then(node_task, move |node| {
            for (name, value) in &pairs {
                host.set_attribute(node, name, value);
            }
            Ok(node)
        }))
    }
}

/// `attrs-remove: a b`
#[derive(Debug, Clone, Copy)]
pub struct AttrsRemove;

impl Plugin for AttrsRemove {
    fn name(&self) -> &str {
        "attrs-remove"
    }
}

impl DeclarationPlugin for AttrsRemove {
    fn evaluate_rule(
        &self,
        session: &Session,
        _lookup: NodeId,
        node_task: NodeTask,
        values: Vec<Vec<Value>>,
        _declaration: &Declaration,
    ) -> Result<NodeTask, EngineError> {
        let names = words(&session.host, &values);
        let host = session.host.clone();
        Ok(task::then(node_task, move |node| {
            for name in &names {
                host.remove_attribute(node, name);
            }
            Ok(node)
        }))
    }
}

/// What `move-here` moves.
#[derive(Debug, Clone)]
enum Source {
    /// Matches of a selector inside the lookup node, found when the move
    /// runs.
    Selector(SelectorList),
    /// Elements already evaluated.
    Nodes(Vec<NodeId>),
}

/// `move-here: 'selector'` or `move-here: x-selector(...)`: move elements
/// into the node, after its current children.
#[derive(Debug, Clone, Copy)]
pub struct MoveHere;

impl Plugin for MoveHere {
    fn name(&self) -> &str {
        "move-here"
    }
}

impl DeclarationPlugin for MoveHere {
    fn evaluate_rule(
        &self,
        session: &Session,
        lookup: NodeId,
        node_task: NodeTask,
        values: Vec<Vec<Value>>,
        declaration: &Declaration,
    ) -> Result<NodeTask, EngineError> {
        let mut sources = Vec::new();
        for value in values.into_iter().flatten() {
            match value {
                Value::Elements(nodes) => sources.push(Source::Nodes(nodes)),
                other => {
                    let text = other.to_text(&session.host);
                    let list = parse_selector_list(&text)
                        .map_err(|err| err.or_at(declaration.location))?;
                    sources.push(Source::Selector(list));
                }
            }
        }

        let host = session.host.clone();
        let diagnostics = Rc::clone(&session.diagnostics);
        let location = declaration.location;
        let css = declaration.to_css();
        Ok(task::then(node_task, move |node| {
            let mut moved = Vec::new();
            for source in &sources {
                match source {
                    Source::Selector(list) => moved.extend(host.find(lookup, list)),
                    Source::Nodes(nodes) => moved.extend_from_slice(nodes),
                }
            }
            if moved.is_empty() {
                diagnostics.warn_at(
                    format!("'{css}' found nothing to move"),
                    Some(location),
                    host.location(lookup),
                );
                return Ok(node);
            }
            check_movable(&host, &moved, node, location)?;
            for child in moved {
                host.append(node, child);
            }
            Ok(node)
        }))
    }
}

/// `tag-name-set: name`: rename the element. Runs after every other
/// property of the node.
#[derive(Debug, Clone, Copy)]
pub struct TagNameSet;

impl Plugin for TagNameSet {
    fn name(&self) -> &str {
        "tag-name-set"
    }
}

impl DeclarationPlugin for TagNameSet {
    fn mutates_identity(&self) -> bool {
        true
    }

    fn evaluate_rule(
        &self,
        session: &Session,
        lookup: NodeId,
        node_task: NodeTask,
        values: Vec<Vec<Value>>,
        declaration: &Declaration,
    ) -> Result<NodeTask, EngineError> {
        let host = session.host.clone();
        let tag = joined_text(&host, &values).trim().to_ascii_lowercase();
        if tag.is_empty() || !tag.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(mutation_error(
                &host,
                format!("tag-name-set: '{tag}' is not a tag name"),
                declaration.location,
                lookup,
            ));
        }
        Ok(task::then(node_task, move |node| {
            host.replace_tag(node, &tag);
            Ok(node)
        }))
    }
}

/// `x-log: ...`: record the evaluated value as a LOG diagnostic.
#[derive(Debug, Clone, Copy)]
pub struct XLog;

impl Plugin for XLog {
    fn name(&self) -> &str {
        "x-log"
    }
}

impl DeclarationPlugin for XLog {
    fn evaluate_rule(
        &self,
        session: &Session,
        _lookup: NodeId,
        node_task: NodeTask,
        values: Vec<Vec<Value>>,
        declaration: &Declaration,
    ) -> Result<NodeTask, EngineError> {
        let message = joined_text(&session.host, &values);
        let diagnostics = Rc::clone(&session.diagnostics);
        let location = declaration.location;
        Ok(task::then(node_task, move |node| {
            diagnostics.log(message, Some(location));
            Ok(node)
        }))
    }
}

/// `x-throw: ...`: stop the run with the evaluated value as the message.
#[derive(Debug, Clone, Copy)]
pub struct XThrow;

impl Plugin for XThrow {
    fn name(&self) -> &str {
        "x-throw"
    }
}

impl DeclarationPlugin for XThrow {
    fn evaluate_rule(
        &self,
        session: &Session,
        _lookup: NodeId,
        node_task: NodeTask,
        values: Vec<Vec<Value>>,
        declaration: &Declaration,
    ) -> Result<NodeTask, EngineError> {
        let message = joined_text(&session.host, &values);
        let location = declaration.location;
        Ok(task::then(node_task, move |_| {
            Err(EngineError::ExplicitFailure {
                message,
                css: Some(location),
            })
        }))
    }
}

#[cfg(test)]
mod tests {
    use cssplus_common::Severity;
    use cssplus_css::Stylesheet;
    use cssplus_html::parse_document;
    use futures::executor::block_on;

    use super::*;
    use crate::config::EngineConfig;
    use crate::evaluator::Evaluator;
    use crate::plugin::PluginRegistry;

    fn session(html: &str) -> Session {
        Session::new(
            Host::new(parse_document(html).0),
            Vec::new(),
            PluginRegistry::with_builtins().unwrap_or_default(),
            EngineConfig::default(),
        )
    }

    fn node(session: &Session, selector: &str) -> NodeId {
        session
            .host
            .query_all(&parse_selector_list(selector).unwrap_or_default())[0]
    }

    /// Evaluate `declaration` against `lookup` and apply it to `target`.
    fn apply(
        session: &Session,
        lookup: NodeId,
        target: NodeId,
        declaration: &str,
    ) -> Result<NodeId, EngineError> {
        let (sheet, _) = Stylesheet::parse(&format!("x {{ {declaration} }}"));
        let Some(declaration) = sheet.style_rules().next().and_then(|r| r.declarations.first()) else {
            panic!("no declaration in '{declaration}'");
        };
        let Some(plugin) = session.registry.declarations.get(&declaration.name) else {
            panic!("no plugin for '{}'", declaration.name);
        };
        let values = Evaluator::new(session, lookup, lookup, declaration.location)
            .evaluate_declaration(&declaration.value)?;
        let task = plugin.evaluate_rule(session, lookup, task::resolved(target), values, declaration)?;
        block_on(task)
    }

    #[test]
    fn test_content_replaces_children() {
        let session = session("<h1 title=T>old <b>x</b></h1><p>moved</p>");
        let h1 = node(&session, "h1");
        let result = apply(
            &session,
            h1,
            h1,
            "content: 'Chapter ' attr(title) ': ' x-selector('b'), '!'",
        );
        assert_eq!(result, Ok(h1));
        assert_eq!(session.host.serialize(), "<h1 title=\"T\">Chapter T: <b>x</b>!</h1><p>moved</p>");
    }

    #[test]
    fn test_content_rejects_cycles() {
        let session = session("<div><p>x</p></div>");
        let div = node(&session, "div");
        let p = node(&session, "p");
        let section = session.host.create_element("section");
        session.host.append(p, section);
        assert!(matches!(
            apply(&session, div, section, "content: x-selector('p')"),
            Err(EngineError::User { .. })
        ));
        assert_eq!(session.host.serialize(), "<div><p>x<section></section></p></div>");
    }

    #[test]
    fn test_classes_and_attributes() {
        let session = session("<p class=\"a b\" lang=en>x</p>");
        let p = node(&session, "p");
        for declaration in [
            "class-add: c 'd e'",
            "class-remove: a",
            "attrs-add: title 'x' 1, data-n add(1, 2)",
            "attrs-remove: lang",
        ] {
            assert_eq!(apply(&session, p, p, declaration), Ok(p), "{declaration}");
        }
        assert_eq!(
            session.host.serialize(),
            "<p class=\"b c d e\" title=\"x1\" data-n=\"3\">x</p>"
        );
    }

    #[test]
    fn test_move_here() {
        let session = session("<aside><em>1</em><em>2</em></aside><div></div>");
        let aside = node(&session, "aside");
        let div = node(&session, "div");
        assert_eq!(apply(&session, aside, div, "move-here: 'em'"), Ok(div));
        assert_eq!(session.host.serialize(), "<aside></aside><div><em>1</em><em>2</em></div>");

        assert_eq!(apply(&session, aside, div, "move-here: 'em'"), Ok(div));
        assert_eq!(session.diagnostics.count(Severity::Warn), 1);
    }

    #[test]
    fn test_move_into_itself_fails() {
        let session = session("<div><p>x</p></div>");
        let div = node(&session, "div");
        let p = node(&session, "p");
        assert!(matches!(
            apply(&session, div, p, "move-here: x-selector('p')"),
            Err(EngineError::User { .. })
        ));
    }

    #[test]
    fn test_tag_name_set() {
        let session = session("<p class=a>x</p>");
        let p = node(&session, "p");
        assert_eq!(apply(&session, p, p, "tag-name-set: 'H2'"), Ok(p));
        assert_eq!(session.host.serialize(), "<h2 class=\"a\">x</h2>");
        assert!(matches!(
            apply(&session, p, p, "tag-name-set: 'not a tag'"),
            Err(EngineError::User { .. })
        ));
    }

    #[test]
    fn test_log_and_throw() {
        let session = session("<p>x</p>");
        let p = node(&session, "p");
        assert_eq!(apply(&session, p, p, "x-log: 'seen ' x-tag-name()"), Ok(p));
        let logs: Vec<String> = session
            .diagnostics
            .records()
            .into_iter()
            .filter(|d| d.severity == Severity::Log)
            .map(|d| d.message)
            .collect();
        assert_eq!(logs, ["seen p"]);

        assert!(matches!(
            apply(&session, p, p, "x-throw: 'stop'"),
            Err(EngineError::ExplicitFailure { message, .. }) if message == "stop"
        ));
    }
}

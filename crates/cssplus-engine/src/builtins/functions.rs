//! Built-in value functions.

use cssplus_css::ComponentValue;
use cssplus_dom::NodeId;

use crate::error::EngineError;
use crate::evaluator::{Evaluator, Value};
use crate::plugin::{FunctionPlugin, Plugin};
use crate::session::parse_selector_list;

/// The single argument of a one-argument function, as text.
fn single_text(evaluator: &Evaluator<'_>, name: &str, args: &[Value]) -> Result<String, EngineError> {
    match args {
        [only] => Ok(only.to_text(evaluator.host())),
        _ => Err(evaluator.user_error(format!(
            "{name}() expects one argument, got {}",
            args.len()
        ))),
    }
}

/// `attr(name)`: an attribute of the anchor. Missing attributes warn and
/// read as the empty string.
#[derive(Debug, Clone, Copy)]
pub struct Attr;

impl Plugin for Attr {
    fn name(&self) -> &str {
        "attr"
    }
}

impl FunctionPlugin for Attr {
    fn evaluate(&self, evaluator: &Evaluator<'_>, args: Vec<Value>) -> Result<Value, EngineError> {
        let name = single_text(evaluator, self.name(), &args)?;
        let host = evaluator.host();
        if let Some(value) = host.attribute(evaluator.anchor(), &name) {
            return Ok(Value::String(value));
        }
        let tag = host.tag_name(evaluator.anchor()).unwrap_or_default();
        evaluator.warn(format!("attr({name}): <{tag}> has no attribute '{name}'"));
        Ok(Value::String(String::new()))
    }
}

/// `add(a, b, ...)`: the sum of its arguments.
#[derive(Debug, Clone, Copy)]
pub struct Add;

impl Plugin for Add {
    fn name(&self) -> &str {
        "add"
    }
}

impl FunctionPlugin for Add {
    fn evaluate(&self, evaluator: &Evaluator<'_>, args: Vec<Value>) -> Result<Value, EngineError> {
        if args.is_empty() {
            return Err(evaluator.user_error("add() expects at least one argument"));
        }
        let mut sum = 0.0;
        for arg in &args {
            let Some(number) = arg.to_number() else {
                return Err(evaluator.user_error(format!(
                    "add() expects numbers, got '{}'",
                    arg.to_text(evaluator.host())
                )));
            };
            sum += number;
        }
        Ok(Value::Number(sum))
    }
}

/// `count-of-type('selector')`: how many elements matching `selector` come
/// at or before the anchor, in the document as it was before any mutation.
#[derive(Debug, Clone, Copy)]
pub struct CountOfType;

impl Plugin for CountOfType {
    fn name(&self) -> &str {
        "count-of-type"
    }
}

impl FunctionPlugin for CountOfType {
    fn evaluate(&self, evaluator: &Evaluator<'_>, args: Vec<Value>) -> Result<Value, EngineError> {
        let selector = single_text(evaluator, self.name(), &args)?;
        let session = evaluator.session();
        let Some(position) = session.document_position(evaluator.anchor()) else {
            return Err(evaluator.user_error(
                "count-of-type() cannot count from a node created by the stylesheet",
            ));
        };
        let count = session
            .cached_query(&selector)
            .map_err(|err| err.with_html(evaluator.host().location(evaluator.anchor())))?
            .iter()
            .filter(|&&node| session.document_position(node).is_some_and(|p| p <= position))
            .count();
        #[allow(clippy::cast_precision_loss)]
        let count = count as f64;
        Ok(Value::Number(count))
    }
}

/// `text-contents()`: the anchor's text.
#[derive(Debug, Clone, Copy)]
pub struct TextContents;

impl Plugin for TextContents {
    fn name(&self) -> &str {
        "text-contents"
    }
}

impl FunctionPlugin for TextContents {
    fn evaluate(&self, evaluator: &Evaluator<'_>, _args: Vec<Value>) -> Result<Value, EngineError> {
        Ok(Value::String(evaluator.host().text_content(evaluator.anchor())))
    }
}

/// `x-tag-name()`: the anchor's tag name.
#[derive(Debug, Clone, Copy)]
pub struct XTagName;

impl Plugin for XTagName {
    fn name(&self) -> &str {
        "x-tag-name"
    }
}

impl FunctionPlugin for XTagName {
    fn evaluate(&self, evaluator: &Evaluator<'_>, _args: Vec<Value>) -> Result<Value, EngineError> {
        Ok(Value::String(
            evaluator.host().tag_name(evaluator.anchor()).unwrap_or_default(),
        ))
    }
}

/// `x-selector('selector')`: the anchor's descendants matching `selector`.
#[derive(Debug, Clone, Copy)]
pub struct XSelector;

impl Plugin for XSelector {
    fn name(&self) -> &str {
        "x-selector"
    }
}

impl FunctionPlugin for XSelector {
    fn evaluate(&self, evaluator: &Evaluator<'_>, args: Vec<Value>) -> Result<Value, EngineError> {
        let selector = single_text(evaluator, self.name(), &args)?;
        let list = parse_selector_list(&selector)?;
        Ok(Value::Elements(evaluator.host().find(evaluator.anchor(), &list)))
    }
}

/// Which node a context function moves the anchor to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    /// The parent element.
    Parent,
    /// The nearest ancestor matching a selector.
    Ancestor,
    /// The one descendant matching a selector.
    Descendant,
    /// The nearest following sibling matching a selector.
    NextSibling,
    /// The element with a given id, anywhere in the document.
    Target,
}

/// `parent-context(expr)`, `ancestor-context(sel, expr)`,
/// `descendant-context(sel, expr)`, `next-sibling-context(sel, expr)` and
/// `target-context(idref, expr)`: evaluate `expr` against another node.
#[derive(Debug, Clone, Copy)]
pub struct ContextFunction {
    relation: Relation,
}

impl ContextFunction {
    /// The context function for `relation`.
    #[must_use]
    pub const fn new(relation: Relation) -> Self {
        Self { relation }
    }

    fn resolve(&self, evaluator: &Evaluator<'_>, reference: &str) -> Result<NodeId, EngineError> {
        let host = evaluator.host();
        let anchor = evaluator.anchor();
        let name = self.name();
        let found: Vec<NodeId> = match self.relation {
            Relation::Parent => host.parent(anchor).into_iter().collect(),
            Relation::Ancestor => {
                let list = parse_selector_list(reference)?;
                host.parent(anchor)
                    .and_then(|parent| host.closest(parent, &list))
                    .into_iter()
                    .collect()
            }
            Relation::Descendant => host.find(anchor, &parse_selector_list(reference)?),
            Relation::NextSibling => host
                .next_matching_sibling(anchor, &parse_selector_list(reference)?)
                .into_iter()
                .collect(),
            Relation::Target => {
                let id = reference.strip_prefix('#').unwrap_or(reference);
                host.get_element_by_id(id).into_iter().collect()
            }
        };
        match found.as_slice() {
            [node] => Ok(*node),
            [] => Err(evaluator.user_error(format!("{name}({reference}) found no element"))),
            many => Err(evaluator.user_error(format!(
                "{name}({reference}) must find exactly one element, found {}",
                many.len()
            ))),
        }
    }
}

impl Plugin for ContextFunction {
    fn name(&self) -> &str {
        match self.relation {
            Relation::Parent => "parent-context",
            Relation::Ancestor => "ancestor-context",
            Relation::Descendant => "descendant-context",
            Relation::NextSibling => "next-sibling-context",
            Relation::Target => "target-context",
        }
    }
}

impl FunctionPlugin for ContextFunction {
    fn rewrite_context(
        &self,
        evaluator: &Evaluator<'_>,
        groups: &[&[ComponentValue]],
    ) -> Result<Option<(NodeId, usize)>, EngineError> {
        if self.relation == Relation::Parent {
            return self.resolve(evaluator, "").map(|node| Some((node, 0)));
        }
        let Some(reference) = groups.first() else {
            return Err(evaluator.user_error(format!(
                "{}() expects a selector and an expression",
                self.name()
            )));
        };
        let reference = evaluator.evaluate_text(reference)?;
        self.resolve(evaluator, &reference).map(|node| Some((node, 1)))
    }

    fn evaluate(&self, evaluator: &Evaluator<'_>, mut args: Vec<Value>) -> Result<Value, EngineError> {
        args.pop().ok_or_else(|| {
            evaluator.user_error(format!("{}() expects an expression to evaluate", self.name()))
        })
    }
}

#[cfg(test)]
mod tests {
    use cssplus_common::{Severity, SourceLocation};
    use cssplus_css::parse_component_values;
    use cssplus_html::parse_document;

    use super::*;
    use crate::config::EngineConfig;
    use crate::host::Host;
    use crate::plugin::PluginRegistry;
    use crate::session::Session;

    fn session(html: &str) -> Session {
        Session::new(
            Host::new(parse_document(html).0),
            Vec::new(),
            PluginRegistry::with_builtins().unwrap_or_default(),
            EngineConfig::default(),
        )
    }

    fn nodes(session: &Session, selector: &str) -> Vec<NodeId> {
        session
            .host
            .query_all(&parse_selector_list(selector).unwrap_or_default())
    }

    fn eval(session: &Session, anchor: NodeId, text: &str) -> Result<Value, EngineError> {
        let groups = Evaluator::new(session, anchor, anchor, SourceLocation::new(1, 1))
            .evaluate_declaration(&parse_component_values(text))?;
        groups
            .into_iter()
            .flatten()
            .next()
            .ok_or_else(|| EngineError::bug("no value"))
    }

    fn text(value: &str) -> Value {
        Value::String(value.to_string())
    }

    #[test]
    fn test_count_of_type() {
        let session = session("<h2>a</h2><p>x</p><h2>b</h2><h2>c</h2>");
        let headings = nodes(&session, "h2");
        let counts: Vec<Value> = headings
            .iter()
            .filter_map(|&h| eval(&session, h, "count-of-type('h2')").ok())
            .collect();
        assert_eq!(counts, [Value::Number(1.0), Value::Number(2.0), Value::Number(3.0)]);

        let p = nodes(&session, "p")[0];
        assert_eq!(eval(&session, p, "count-of-type(h2)").ok(), Some(Value::Number(1.0)));

        let created = session.host.create_element("div");
        assert!(matches!(
            eval(&session, created, "count-of-type('h2')"),
            Err(EngineError::User { .. })
        ));
    }

    #[test]
    fn test_count_of_type_ignores_later_mutations() {
        let session = session("<h2>a</h2><h2>b</h2>");
        let headings = nodes(&session, "h2");
        let early = session.host.create_element("h2");
        session.host.prepend(session.host.with_tree(cssplus_dom::DomTree::root), early);
        assert_eq!(
            eval(&session, headings[1], "count-of-type('h2')").ok(),
            Some(Value::Number(2.0))
        );
    }

    #[test]
    fn test_add() {
        let session = session("<p>x</p>");
        let p = nodes(&session, "p")[0];
        assert_eq!(eval(&session, p, "add(1, '2', 3.5)").ok(), Some(Value::Number(6.5)));
        assert!(matches!(eval(&session, p, "add(1, two)"), Err(EngineError::User { .. })));
        assert!(matches!(eval(&session, p, "add()"), Err(EngineError::User { .. })));
    }

    #[test]
    fn test_attr_missing_warns() {
        let session = session("<p title=t>x</p>");
        let p = nodes(&session, "p")[0];
        assert_eq!(eval(&session, p, "attr(title)").ok(), Some(text("t")));
        assert_eq!(eval(&session, p, "attr(lang)").ok(), Some(text("")));
        assert_eq!(session.diagnostics.count(Severity::Warn), 1);
    }

    #[test]
    fn test_x_selector_collects_descendants() {
        let session = session("<ul><li>a</li><li>b</li></ul><li>c</li>");
        let ul = nodes(&session, "ul")[0];
        let Ok(Value::Elements(found)) = eval(&session, ul, "x-selector('li')") else {
            panic!("expected elements");
        };
        assert_eq!(found.len(), 2);
        assert_eq!(
            eval(&session, ul, "x-selector('li')").map(|v| v.to_text(&session.host)).ok(),
            Some("ab".to_string())
        );
    }

    #[test]
    fn test_context_functions() {
        let session = session(
            "<section id=s title=outer><div title=inner><p>x</p><b title=one>1</b><i>2</i></div></section>",
        );
        let p = nodes(&session, "p")[0];
        let div = nodes(&session, "div")[0];
        assert_eq!(eval(&session, p, "parent-context(attr(title))").ok(), Some(text("inner")));
        assert_eq!(
            eval(&session, p, "ancestor-context('section', attr(title))").ok(),
            Some(text("outer"))
        );
        assert_eq!(
            eval(&session, p, "next-sibling-context('b', attr(title))").ok(),
            Some(text("one"))
        );
        assert_eq!(
            eval(&session, div, "descendant-context('i', text-contents())").ok(),
            Some(text("2"))
        );
        assert_eq!(
            eval(&session, p, "target-context('#s', x-tag-name())").ok(),
            Some(text("section"))
        );
        assert_eq!(
            eval(&session, p, "target-context(s, x-tag-name())").ok(),
            Some(text("section"))
        );
    }

    #[test]
    fn test_next_sibling_context_takes_nearest_match() {
        let session = session("<div><h1>t</h1><p>1</p><p>2</p></div>");
        let h1 = nodes(&session, "h1")[0];
        assert_eq!(
            eval(&session, h1, "next-sibling-context('p', text-contents())").ok(),
            Some(text("1"))
        );
    }

    #[test]
    fn test_context_uniqueness_is_required() {
        let session = session("<div><p>1</p><p>2</p></div>");
        let div = nodes(&session, "div")[0];
        for text in [
            "descendant-context('p', text-contents())",
            "descendant-context('em', text-contents())",
            "target-context('#nope', x-tag-name())",
            "ancestor-context('section', x-tag-name())",
            "next-sibling-context('p', x-tag-name())",
        ] {
            assert!(matches!(eval(&session, div, text), Err(EngineError::User { .. })), "{text}");
        }
    }
}

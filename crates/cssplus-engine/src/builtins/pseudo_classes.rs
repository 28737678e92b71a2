//! Built-in pseudo-classes.

use cssplus_common::SourceLocation;
use cssplus_css::ComponentValue;
use cssplus_dom::NodeId;

use crate::error::EngineError;
use crate::evaluator::{Evaluator, split_on_commas};
use crate::plugin::{Plugin, PseudoClassPlugin};
use crate::session::{Session, parse_selector_list};

/// `:target(attr, 'selector')`: the element referenced by the node's
/// `attr` (an `#id` link) matches `selector`.
#[derive(Debug, Clone, Copy)]
pub struct Target;

impl Plugin for Target {
    fn name(&self) -> &str {
        "target"
    }
}

impl PseudoClassPlugin for Target {
    fn matches(
        &self,
        session: &Session,
        node: NodeId,
        args: &[ComponentValue],
    ) -> Result<bool, EngineError> {
        let evaluator = Evaluator::new(session, node, node, SourceLocation::default());
        let groups = split_on_commas(args);
        let [attribute, selector] = groups.as_slice() else {
            return Err(evaluator.user_error(":target expects an attribute name and a selector"));
        };
        let attribute = evaluator.evaluate_text(attribute)?;
        let selector = parse_selector_list(&evaluator.evaluate_text(selector)?)?;

        let Some(reference) = session.host.attribute(node, &attribute) else {
            return Ok(false);
        };
        let id = reference.strip_prefix('#').unwrap_or(&reference);
        Ok(session
            .host
            .get_element_by_id(id)
            .is_some_and(|target| session.host.matches(target, &selector)))
    }
}

//! The built-in plugin library.
//!
//! | Kind | Plugins |
//! |---|---|
//! | pseudo-element | `::after`, `::before`, `::outside`, `::inside`, `::for-each`, `::marker` |
//! | pseudo-class | `:target` |
//! | function | `attr`, `add`, `count-of-type`, `text-contents`, `x-tag-name`, `x-selector`, `parent-context`, `ancestor-context`, `descendant-context`, `next-sibling-context`, `target-context` |
//! | declaration | `content`, `class-add`, `class-remove`, `attrs-add`, `attrs-remove`, `move-here`, `tag-name-set`, `x-log`, `x-throw` |

mod declarations;
mod functions;
mod pseudo_classes;
mod pseudo_elements;

pub use declarations::{
    AttrsAdd, AttrsRemove, ClassAdd, ClassRemove, Content, MoveHere, TagNameSet, XLog, XThrow,
};
pub use functions::{
    Add, Attr, ContextFunction, CountOfType, Relation, TextContents, XSelector, XTagName,
};
pub use pseudo_classes::Target;
pub use pseudo_elements::{ForEach, Placement, Synthesize};

use crate::error::PluginRegistryError;
use crate::plugin::PluginRegistry;

/// Register every built-in plugin.
///
/// # Errors
///
/// Returns a duplicate-name error if `registry` already holds a plugin
/// with a built-in name.
pub fn register_all(registry: &mut PluginRegistry) -> Result<(), PluginRegistryError> {
    registry.register_pseudo_element(Synthesize::after())?;
    registry.register_pseudo_element(Synthesize::before())?;
    registry.register_pseudo_element(Synthesize::outside())?;
    registry.register_pseudo_element(Synthesize::inside())?;
    registry.register_pseudo_element(ForEach)?;
    registry.register_pseudo_element(Synthesize::marker())?;

    registry.register_pseudo_class(Target)?;

    registry.register_function(Attr)?;
    registry.register_function(Add)?;
    registry.register_function(CountOfType)?;
    registry.register_function(TextContents)?;
    registry.register_function(XTagName)?;
    registry.register_function(XSelector)?;
    for relation in [
        Relation::Parent,
        Relation::Ancestor,
        Relation::Descendant,
        Relation::NextSibling,
        Relation::Target,
    ] {
        registry.register_function(ContextFunction::new(relation))?;
    }

    registry.register_declaration(Content)?;
    registry.register_declaration(ClassAdd)?;
    registry.register_declaration(ClassRemove)?;
    registry.register_declaration(AttrsAdd)?;
    registry.register_declaration(AttrsRemove)?;
    registry.register_declaration(MoveHere)?;
    registry.register_declaration(TagNameSet)?;
    registry.register_declaration(XLog)?;
    registry.register_declaration(XThrow)?;
    Ok(())
}

//! The plugin protocol.
//!
//! Everything CSS-plus does beyond vanilla CSS is a plugin of one of four
//! kinds, looked up by name in a [`PluginRegistry`] built once per run.
//! Iteration over a registry follows registration order.

use std::collections::HashMap;
use std::rc::Rc;

use cssplus_css::{ComponentValue, Declaration};
use cssplus_dom::NodeId;

use crate::error::{EngineError, PluginKind, PluginRegistryError};
use crate::evaluator::{Evaluator, Value};
use crate::pseudo_chain::RuleWithPseudos;
use crate::session::Session;
use crate::task::NodeTask;

/// Common to every plugin kind.
pub trait Plugin {
    /// The name the plugin is registered and looked up under.
    fn name(&self) -> &str;
}

/// A node synthesized by a pseudo-element.
#[derive(Clone)]
pub struct CreatedNode {
    /// Resolves once the node is attached to the document.
    pub node_task: NodeTask,
    /// The node guards and declarations are checked against. Usually the
    /// synthesized node itself; iteration plugins use the iterated match.
    pub lookup_node: NodeId,
}

/// `::name(index, ...)`: synthesizes nodes relative to a context node.
pub trait PseudoElementPlugin: Plugin {
    /// Whether the second argument may itself be a comma-separated list.
    fn accepts_list_argument(&self) -> bool {
        false
    }

    /// Partition the rules invoking this pseudo-element at `depth` into
    /// groups, one synthesized unit each. Groups are attached in the order
    /// returned.
    fn reduce(&self, rules: Vec<RuleWithPseudos>, depth: usize) -> Vec<Vec<RuleWithPseudos>> {
        reduce_by_index(rules, depth)
    }

    /// Synthesize the nodes for one group. `context` resolves to the node
    /// the new nodes attach to; the returned tasks must not touch the tree
    /// before it resolves.
    ///
    /// # Errors
    ///
    /// Returns a user error for invalid invocation arguments.
    fn create(
        &self,
        session: &Session,
        group: &[RuleWithPseudos],
        lookup: NodeId,
        context: &NodeTask,
        depth: usize,
    ) -> Result<Vec<CreatedNode>, EngineError>;
}

/// `:name(args)`: a pseudo-class the native matcher does not know.
pub trait PseudoClassPlugin: Plugin {
    /// Whether `node` matches.
    ///
    /// # Errors
    ///
    /// Returns a user error for invalid arguments.
    fn matches(
        &self,
        session: &Session,
        node: NodeId,
        args: &[ComponentValue],
    ) -> Result<bool, EngineError>;
}

/// `name(args)` inside a declaration value.
pub trait FunctionPlugin: Plugin {
    /// Pick a new anchor before the arguments are evaluated. Returns the new
    /// anchor and how many leading argument groups the rewrite consumed; the
    /// rest are evaluated against the new anchor.
    ///
    /// # Errors
    ///
    /// Returns a user error when the new anchor cannot be resolved.
    fn rewrite_context(
        &self,
        _evaluator: &Evaluator<'_>,
        _groups: &[&[ComponentValue]],
    ) -> Result<Option<(NodeId, usize)>, EngineError> {
        Ok(None)
    }

    /// Compute the function's value from its evaluated arguments.
    ///
    /// # Errors
    ///
    /// Returns a user error for invalid arguments.
    fn evaluate(&self, evaluator: &Evaluator<'_>, args: Vec<Value>) -> Result<Value, EngineError>;
}

/// `name: value`: a property the engine applies itself.
pub trait DeclarationPlugin: Plugin {
    /// Whether the plugin changes what the node is (its tag). Such plugins
    /// run after every other property on the node.
    fn mutates_identity(&self) -> bool {
        false
    }

    /// Apply the winning declaration. Returns a task resolving to the node
    /// after the mutation; it must await `node_task` before touching the
    /// tree.
    ///
    /// # Errors
    ///
    /// Returns a user error for values the plugin cannot apply.
    fn evaluate_rule(
        &self,
        session: &Session,
        lookup: NodeId,
        node_task: NodeTask,
        values: Vec<Vec<Value>>,
        declaration: &Declaration,
    ) -> Result<NodeTask, EngineError>;
}

/// Stable-sort by the integer index of the invocation at `depth` (default
/// 1) and partition runs of equal index.
#[must_use]
pub fn reduce_by_index(mut rules: Vec<RuleWithPseudos>, depth: usize) -> Vec<Vec<RuleWithPseudos>> {
    rules.sort_by_key(|rule| rule.index_at(depth));
    let mut groups: Vec<Vec<RuleWithPseudos>> = Vec::new();
    for rule in rules {
        match groups.last_mut() {
            Some(group) if group[0].index_at(depth) == rule.index_at(depth) => group.push(rule),
            _ => groups.push(vec![rule]),
        }
    }
    groups
}

/// Name-keyed plugins of one kind, in registration order.
pub struct Registry<P: ?Sized> {
    kind: PluginKind,
    plugins: Vec<Rc<P>>,
    by_name: HashMap<String, usize>,
}

impl<P: ?Sized + Plugin> Registry<P> {
    /// An empty registry.
    #[must_use]
    pub fn new(kind: PluginKind) -> Self {
        Self {
            kind,
            plugins: Vec::new(),
            by_name: HashMap::new(),
        }
    }

    /// Add a plugin.
    ///
    /// # Errors
    ///
    /// Returns [`PluginRegistryError::Duplicate`] if the name is taken.
    pub fn register(&mut self, plugin: Rc<P>) -> Result<(), PluginRegistryError> {
        let name = plugin.name().to_ascii_lowercase();
        if self.by_name.contains_key(&name) {
            return Err(PluginRegistryError::Duplicate {
                kind: self.kind,
                name,
            });
        }
        let _ = self.by_name.insert(name, self.plugins.len());
        self.plugins.push(plugin);
        Ok(())
    }

    /// Look a plugin up by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Rc<P>> {
        self.by_name
            .get(&name.to_ascii_lowercase())
            .and_then(|&i| self.plugins.get(i))
    }

    /// Whether a plugin with this name exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Plugins in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Rc<P>> {
        self.plugins.iter()
    }

    /// Number of plugins.
    #[must_use]
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

/// All four registries.
pub struct PluginRegistry {
    /// `::name` plugins.
    pub pseudo_elements: Registry<dyn PseudoElementPlugin>,
    /// `:name` plugins.
    pub pseudo_classes: Registry<dyn PseudoClassPlugin>,
    /// Value functions.
    pub functions: Registry<dyn FunctionPlugin>,
    /// Declaration handlers.
    pub declarations: Registry<dyn DeclarationPlugin>,
}

impl Default for PluginRegistry {
    fn default() -> Self {
        Self {
            pseudo_elements: Registry::new(PluginKind::PseudoElement),
            pseudo_classes: Registry::new(PluginKind::PseudoClass),
            functions: Registry::new(PluginKind::Function),
            declarations: Registry::new(PluginKind::Declaration),
        }
    }
}

impl PluginRegistry {
    /// A registry holding no plugins.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in plugin library.
    ///
    /// # Errors
    ///
    /// Fails only if the built-in library itself has a name clash.
    pub fn with_builtins() -> Result<Self, PluginRegistryError> {
        let mut registry = Self::new();
        crate::builtins::register_all(&mut registry)?;
        Ok(registry)
    }

    /// Register a pseudo-element.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is taken.
    pub fn register_pseudo_element(
        &mut self,
        plugin: impl PseudoElementPlugin + 'static,
    ) -> Result<(), PluginRegistryError> {
        self.pseudo_elements.register(Rc::new(plugin))
    }

    /// Register a pseudo-class.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is taken.
    pub fn register_pseudo_class(
        &mut self,
        plugin: impl PseudoClassPlugin + 'static,
    ) -> Result<(), PluginRegistryError> {
        self.pseudo_classes.register(Rc::new(plugin))
    }

    /// Register a value function.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is taken.
    pub fn register_function(
        &mut self,
        plugin: impl FunctionPlugin + 'static,
    ) -> Result<(), PluginRegistryError> {
        self.functions.register(Rc::new(plugin))
    }

    /// Register a declaration handler.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is taken.
    pub fn register_declaration(
        &mut self,
        plugin: impl DeclarationPlugin + 'static,
    ) -> Result<(), PluginRegistryError> {
        self.declarations.register(Rc::new(plugin))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Noop(&'static str);

    impl Plugin for Noop {
        fn name(&self) -> &str {
            self.0
        }
    }

    impl PseudoClassPlugin for Noop {
        fn matches(&self, _: &Session, _: NodeId, _: &[ComponentValue]) -> Result<bool, EngineError> {
            Ok(true)
        }
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let mut registry = PluginRegistry::new();
        assert!(registry.register_pseudo_class(Noop("x-one")).is_ok());
        assert!(registry.register_pseudo_class(Noop("x-two")).is_ok());
        assert_eq!(
            registry.register_pseudo_class(Noop("X-One")),
            Err(PluginRegistryError::Duplicate {
                kind: PluginKind::PseudoClass,
                name: "x-one".to_string(),
            })
        );
        let names: Vec<&str> = registry.pseudo_classes.iter().map(|p| p.name()).collect();
        assert_eq!(names, ["x-one", "x-two"]);
    }

    #[test]
    fn test_builtins_register_cleanly() {
        let Ok(registry) = PluginRegistry::with_builtins() else {
            panic!("built-in names must be unique");
        };
        for name in ["after", "before", "outside", "inside", "for-each", "marker"] {
            assert!(registry.pseudo_elements.contains(name), "{name}");
        }
        assert!(registry.pseudo_classes.contains("target"));
        assert!(registry.functions.contains("parent-context"));
        assert!(registry.declarations.contains("tag-name-set"));
        assert!(registry.declarations.get("tag-name-set").is_some_and(|p| p.mutates_identity()));
        assert!(!registry.declarations.get("content").is_some_and(|p| p.mutates_identity()));
    }
}

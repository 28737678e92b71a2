//! The CSS-plus rule evaluation engine.
//!
//! # Scope
//!
//! This crate applies a CSS-plus stylesheet to an HTML document:
//! - **Annotation** - every selector is split into its host part and its
//!   pseudo-element chain, and matched against the untouched document
//! - **Cascade** - per node and property, the winning declaration by
//!   `!important`, specificity and source order
//! - **Expansion** - pseudo-elements synthesize nodes level by level, each
//!   attached only once its context node exists
//! - **Evaluation** - value functions, some of which move the node their
//!   arguments are read from
//! - **Residual stylesheet** - declarations the engine does not apply itself,
//!   moved onto generated classes
//! - **Coverage** - how often each selector and declaration took effect
//!
//! Everything beyond vanilla CSS is a plugin; [`builtins`] holds the
//! library that ships with the engine.
//!
//! # Example
//!
//! ```
//! use cssplus_engine::{EngineConfig, process};
//!
//! let output = process(
//!     "h1::before { content: 'Chapter ' count-of-type('h1') }",
//!     "<h1>Intro</h1>",
//!     &EngineConfig::default(),
//! )
//! .map_err(|failure| failure.error)?;
//! assert_eq!(output.html, "<h1><div>Chapter 1</div>Intro</h1>");
//! # Ok::<(), cssplus_engine::EngineError>(())
//! ```

pub mod annotation;
pub mod builtins;
pub mod cascade;
pub mod config;
pub mod coverage;
pub mod error;
pub mod evaluator;
pub mod expansion;
pub mod host;
pub mod plugin;
pub mod pseudo_chain;
pub mod residual;
pub mod session;
pub mod specificity;
pub mod task;

pub use config::{EngineConfig, HashMode};
pub use coverage::{Coverage, CoverageKind, CoverageRecord};
pub use error::{EngineError, PluginKind, PluginRegistryError};
pub use evaluator::{Evaluator, Value};
pub use host::Host;
pub use plugin::{
    CreatedNode, DeclarationPlugin, FunctionPlugin, Plugin, PluginRegistry, PseudoClassPlugin,
    PseudoElementPlugin,
};
pub use pseudo_chain::{MatchedRule, PseudoChain, PseudoInvocation, RuleWithPseudos};
pub use residual::ResidualStylesheet;
pub use session::Session;
pub use specificity::Specificity;

use cssplus_common::{Diagnostic, Severity};
use cssplus_css::{AtRule, StyleRule, Stylesheet};
use cssplus_dom::DomTree;
use cssplus_html::parse_document;
use futures::executor::block_on;
use thiserror::Error;

use crate::annotation::{Annotation, annotate, rewrite_legacy_pseudo_elements};
use crate::cascade::evaluate_rules;
use crate::expansion::expand;

/// Everything a successful run produces.
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    /// The transformed document.
    pub tree: DomTree,
    /// The transformed document as HTML.
    pub html: String,
    /// At-rules of the input plus one rule per residual declaration.
    pub residual: Stylesheet,
    /// `residual` serialized.
    pub residual_css: String,
    /// Selector and declaration hit counts.
    pub coverage: Coverage,
    /// Every WARN and LOG raised along the way.
    pub diagnostics: Vec<Diagnostic>,
}

impl ProcessOutput {
    /// Diagnostics of one severity.
    #[must_use]
    pub fn diagnostics_of(&self, severity: Severity) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(move |d| d.severity == severity)
    }
}

/// A run that stopped on a BUG, ERROR or `x-throw`.
#[derive(Debug, Clone, Error)]
#[error("{error}")]
pub struct EngineFailure {
    /// The error that stopped the run.
    pub error: EngineError,
    /// Every diagnostic recorded up to and including the failure.
    pub diagnostics: Vec<Diagnostic>,
}

/// Apply `css` to `html` with the built-in plugin library.
///
/// # Errors
///
/// Returns the first fatal error together with the diagnostics recorded
/// before it.
pub fn process(css: &str, html: &str, config: &EngineConfig) -> Result<ProcessOutput, EngineFailure> {
    let registry = PluginRegistry::with_builtins().map_err(|err| EngineFailure {
        error: EngineError::bug(err.to_string()),
        diagnostics: Vec::new(),
    })?;
    process_with(css, html, config, registry)
}

/// Apply `css` to `html` with a caller-built plugin registry.
///
/// # Errors
///
/// Returns the first fatal error together with the diagnostics recorded
/// before it.
pub fn process_with(
    css: &str,
    html: &str,
    config: &EngineConfig,
    registry: PluginRegistry,
) -> Result<ProcessOutput, EngineFailure> {
    let (tree, html_issues) = parse_document(html);
    let (sheet, css_issues) = Stylesheet::parse(css);
    let mut rules: Vec<StyleRule> = sheet.style_rules().cloned().collect();
    let at_rules: Vec<AtRule> = sheet.at_rules().cloned().collect();
    if config.legacy_pseudo_elements {
        rewrite_legacy_pseudo_elements(&mut rules, &registry);
    }
    log::debug!(
        "processing {} style rule(s) and {} at-rule(s)",
        rules.len(),
        at_rules.len()
    );

    let session = Session::new(Host::new(tree), rules, registry, config.clone());
    for issue in html_issues {
        session.diagnostics.report(
            Diagnostic::new(Severity::Warn, format!("HTML: {}", issue.message), None)
                .with_html(Some(issue.location)),
        );
    }
    for issue in css_issues {
        session.diagnostics.warn(issue.message, Some(issue.location));
    }

    let run = annotate(&session).and_then(|annotation| block_on(traverse(&session, annotation)));
    if let Err(error) = run {
        session.diagnostics.report(error.to_diagnostic());
        return Err(EngineFailure {
            error,
            diagnostics: session.diagnostics.take(),
        });
    }

    session.coverage.borrow().report_unused(&session.diagnostics);
    let residual = session.residual.borrow().to_stylesheet(&at_rules);
    let residual_css = residual.to_css();
    let coverage = session.coverage.borrow().clone();
    Ok(ProcessOutput {
        tree: session.host.snapshot(),
        html: session.host.serialize(),
        residual,
        residual_css,
        coverage,
        diagnostics: session.diagnostics.take(),
    })
}

/// Visit the matched nodes in document order, finishing each node's whole
/// expansion before moving on.
async fn traverse(session: &Session, mut annotation: Annotation) -> Result<(), EngineError> {
    for node in core::mem::take(&mut annotation.order) {
        let rules = annotation.take(node);
        log::debug!("node {node:?}: {} matched rule(s)", rules.len());
        let context = task::resolved(node);
        let (cascade, expansion) = futures::future::join(
            evaluate_rules(session, 0, &rules, node, node, context.clone()),
            expand(session, 0, rules, node, node, context),
        )
        .await;
        cascade.and(expansion)?;
    }
    Ok(())
}

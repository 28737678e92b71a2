//! Coverage: how often each selector matched and each declaration was
//! applied, keyed back to the stylesheet source.

use std::collections::BTreeMap;

use cssplus_common::{Diagnostics, SourceLocation};
use cssplus_css::StyleRule;
use serde::Serialize;
use strum_macros::Display;

/// What a coverage record counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CoverageKind {
    /// Elements a selector matched.
    Selector,
    /// Times a declaration won the cascade and was applied or deferred.
    Declaration,
}

/// One counted piece of the stylesheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoverageRecord {
    /// `line:column` in the stylesheet.
    pub location: String,
    /// Selector or declaration.
    pub kind: CoverageKind,
    /// The selector or declaration text.
    pub text: String,
    /// How many times it was used.
    pub count: usize,
    #[serde(skip)]
    source: SourceLocation,
}

type Key = (usize, CoverageKind, usize);

/// Use counts for every selector and declaration of a stylesheet.
#[derive(Debug, Clone, Default)]
pub struct Coverage {
    records: BTreeMap<Key, CoverageRecord>,
}

impl Coverage {
    /// Start every selector and declaration of `rules` at zero.
    #[must_use]
    pub fn new(rules: &[StyleRule]) -> Self {
        let mut records = BTreeMap::new();
        for (r, rule) in rules.iter().enumerate() {
            for (s, selector) in rule.selectors.iter().enumerate() {
                let record = CoverageRecord::new(
                    CoverageKind::Selector,
                    selector.to_css(),
                    selector.location,
                );
                let _ = records.insert((r, CoverageKind::Selector, s), record);
            }
            for (d, declaration) in rule.declarations.iter().enumerate() {
                let record = CoverageRecord::new(
                    CoverageKind::Declaration,
                    declaration.to_css(),
                    declaration.location,
                );
                let _ = records.insert((r, CoverageKind::Declaration, d), record);
            }
        }
        Self { records }
    }

    /// Count a match of selector `selector` of rule `rule`.
    pub fn hit_selector(&mut self, rule: usize, selector: usize) {
        self.hit((rule, CoverageKind::Selector, selector));
    }

    /// Count a use of declaration `declaration` of rule `rule`.
    pub fn hit_declaration(&mut self, rule: usize, declaration: usize) {
        self.hit((rule, CoverageKind::Declaration, declaration));
    }

    fn hit(&mut self, key: Key) {
        if let Some(record) = self.records.get_mut(&key) {
            record.count += 1;
        }
    }

    /// Records in stylesheet order.
    #[must_use]
    pub fn records(&self) -> Vec<CoverageRecord> {
        self.records.values().cloned().collect()
    }

    /// Warn about selectors that matched nothing, and about declarations
    /// never used although their rule matched.
    pub fn report_unused(&self, diagnostics: &Diagnostics) {
        let mut rule_matched = false;
        let mut current_rule = usize::MAX;
        for (&(rule, kind, _), record) in &self.records {
            if rule != current_rule {
                current_rule = rule;
                let selectors =
                    (rule, CoverageKind::Selector, 0)..=(rule, CoverageKind::Selector, usize::MAX);
                rule_matched = self.records.range(selectors).any(|(_, r)| r.count > 0);
            }
            if record.count > 0 {
                continue;
            }
            match kind {
                CoverageKind::Selector => {
                    diagnostics.warn(
                        format!("unused selector '{}'", record.text),
                        Some(record.source),
                    );
                }
                CoverageKind::Declaration if rule_matched => {
                    diagnostics.warn(
                        format!("declaration '{}' was never applied", record.text),
                        Some(record.source),
                    );
                }
                CoverageKind::Declaration => {}
            }
        }
    }

    /// The records as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns the serializer error.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.records())
    }
}

impl CoverageRecord {
    fn new(kind: CoverageKind, text: String, source: SourceLocation) -> Self {
        Self {
            location: source.to_string(),
            kind,
            text,
            count: 0,
            source,
        }
    }

    /// The stylesheet position.
    #[must_use]
    pub const fn source(&self) -> SourceLocation {
        self.source
    }
}

#[cfg(test)]
mod tests {
    use cssplus_common::Severity;
    use cssplus_css::Stylesheet;

    use super::*;

    fn coverage(css: &str) -> Coverage {
        let (sheet, _) = Stylesheet::parse(css);
        let rules: Vec<StyleRule> = sheet.style_rules().cloned().collect();
        Coverage::new(&rules)
    }

    #[test]
    fn test_counts_and_order() {
        let mut coverage = coverage("p, h1 { color: red; content: 'x' }\nem { color: blue }");
        coverage.hit_selector(0, 0);
        coverage.hit_selector(0, 0);
        coverage.hit_declaration(0, 1);
        let records = coverage.records();
        let summary: Vec<(CoverageKind, &str, usize)> = records
            .iter()
            .map(|r| (r.kind, r.text.as_str(), r.count))
            .collect();
        assert_eq!(
            summary,
            [
                (CoverageKind::Selector, "p", 2),
                (CoverageKind::Selector, "h1", 0),
                (CoverageKind::Declaration, "color: red", 0),
                (CoverageKind::Declaration, "content: \"x\"", 1),
                (CoverageKind::Selector, "em", 0),
                (CoverageKind::Declaration, "color: blue", 0),
            ]
        );
    }

    #[test]
    fn test_unused_warnings() {
        let mut coverage = coverage("p, h1 { color: red; content: 'x' }\nem { color: blue }");
        coverage.hit_selector(0, 0);
        coverage.hit_declaration(0, 1);
        let diagnostics = Diagnostics::new();
        coverage.report_unused(&diagnostics);
        let messages: Vec<String> = diagnostics.records().into_iter().map(|d| d.message).collect();
        assert_eq!(
            messages,
            [
                "unused selector 'h1'",
                "declaration 'color: red' was never applied",
                "unused selector 'em'",
            ]
        );
        assert_eq!(diagnostics.count(Severity::Warn), 3);
    }

    #[test]
    fn test_json_shape() {
        let mut coverage = coverage("p { color: red }");
        coverage.hit_selector(0, 0);
        let json: serde_json::Value =
            serde_json::from_str(&coverage.to_json().unwrap_or_default()).unwrap_or_default();
        assert_eq!(json[0]["kind"], "selector");
        assert_eq!(json[0]["text"], "p");
        assert_eq!(json[0]["count"], 1);
        assert_eq!(json[1]["kind"], "declaration");
    }
}

//! Engine configuration.

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// How residual declarations are keyed, and so how many classes they mint.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum HashMode {
    /// Hash of the declaration text alone. Identical declarations share one
    /// class wherever they appear, and class names are stable across runs.
    #[default]
    Content,
    /// Hash of selector, declaration and a running counter. Every site gets
    /// its own class, so each residual rule points at one origin.
    Provenance,
}

/// Settings for one run of the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Residual keying mode.
    pub hash_mode: HashMode,
    /// Treat `:name` as `::name` when `name` is a registered pseudo-element.
    pub legacy_pseudo_elements: bool,
    /// Prefix of generated residual class names.
    pub class_prefix: String,
    /// Tag used for synthesized pseudo-element nodes.
    pub synthesized_tag: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            hash_mode: HashMode::Content,
            legacy_pseudo_elements: false,
            class_prefix: "decl-".to_string(),
            synthesized_tag: "div".to_string(),
        }
    }
}

impl EngineConfig {
    /// Read a configuration from JSON. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns the JSON error if the text is malformed or a field has the
    /// wrong type.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = EngineConfig::from_json(r#"{ "hash_mode": "provenance" }"#);
        assert_eq!(
            config.ok(),
            Some(EngineConfig {
                hash_mode: HashMode::Provenance,
                ..EngineConfig::default()
            })
        );
    }

    #[test]
    fn test_hash_mode_strings() {
        assert_eq!(HashMode::Content.to_string(), "content");
        assert_eq!("Provenance".parse::<HashMode>().ok(), Some(HashMode::Provenance));
        assert!("sha".parse::<HashMode>().is_err());
    }
}

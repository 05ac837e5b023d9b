//! Process-wide mediator configuration.
//!
//! `MediatorOptions` is built once at startup (usually from `courier.toml`),
//! wrapped in an `Arc`, and shared read-only with every dispatch call and
//! every handler invocation.

use serde::{Deserialize, Serialize};

/// Configuration controlling identity derivation and candidate modules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediatorOptions {
    /// Identify messages by bare type name instead of their full path.
    #[serde(default)]
    pub ignore_namespace: bool,

    /// Module paths whose registered request types are dispatch candidates.
    ///
    /// Empty means every registered module.
    #[serde(default)]
    pub modules: Vec<String>,
}

impl MediatorOptions {
    /// Options using short-name identities.
    pub fn short_names() -> Self {
        Self {
            ignore_namespace: true,
            modules: Vec::new(),
        }
    }

    /// Restrict request candidates to the given modules.
    pub fn with_modules<I, S>(mut self, modules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.modules = modules.into_iter().map(Into::into).collect();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_uses_full_names_and_all_modules() {
        let options = MediatorOptions::default();
        assert!(!options.ignore_namespace);
        assert!(options.modules.is_empty());
    }

    #[test]
    fn deserialize_empty_toml_uses_defaults() {
        let options: MediatorOptions = toml::from_str("").unwrap();
        assert_eq!(options, MediatorOptions::default());
    }

    #[test]
    fn deserialize_with_values() {
        let toml_str = r#"
ignore_namespace = true
modules = ["shop::orders", "shop::billing"]
"#;
        let options: MediatorOptions = toml::from_str(toml_str).unwrap();
        assert!(options.ignore_namespace);
        assert_eq!(options.modules, vec!["shop::orders", "shop::billing"]);
    }

    #[test]
    fn builders_compose() {
        let options = MediatorOptions::short_names().with_modules(["a", "b::c"]);
        assert!(options.ignore_namespace);
        assert_eq!(options.modules, vec!["a".to_string(), "b::c".to_string()]);
    }

    #[test]
    fn json_roundtrip() {
        let options = MediatorOptions::short_names().with_modules(["shop"]);
        let json = serde_json::to_string(&options).unwrap();
        let parsed: MediatorOptions = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, options);
    }
}

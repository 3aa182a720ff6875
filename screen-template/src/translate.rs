use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::TemplateResult;

/// Translation domain used when none is configured.
pub const DEFAULT_DOMAIN: &str = "timeslot";

/// Resolves translatable strings. Implementations fall back to the key when no
/// translation exists.
pub trait Translator: Send + Sync {
    fn translate(&self, key: &str, domain: &str) -> String;
}

/// Returns every key untranslated.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyTranslator;

impl Translator for KeyTranslator {
    fn translate(&self, key: &str, _domain: &str) -> String {
        key.to_string()
    }
}

impl<F> Translator for F
where
    F: Fn(&str, &str) -> String + Send + Sync,
{
    fn translate(&self, key: &str, domain: &str) -> String {
        self(key, domain)
    }
}

/// In-memory translation catalog: domain -> key -> translated text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    domains: HashMap<String, HashMap<String, String>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a catalog from YAML of the form `domain: { key: text }`.
    pub fn from_yaml(yaml: &str) -> TemplateResult<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn insert(
        &mut self,
        domain: impl Into<String>,
        key: impl Into<String>,
        text: impl Into<String>,
    ) {
        self.domains
            .entry(domain.into())
            .or_default()
            .insert(key.into(), text.into());
    }

    pub fn get(&self, key: &str, domain: &str) -> Option<&str> {
        self.domains
            .get(domain)
            .and_then(|d| d.get(key))
            .map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.domains.values().all(HashMap::is_empty)
    }
}

impl Translator for Catalog {
    fn translate(&self, key: &str, domain: &str) -> String {
        self.get(key, domain).unwrap_or(key).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_falls_back_to_key() {
        let mut catalog = Catalog::new();
        catalog.insert("timeslot", "Submit", "Enviar");
        assert_eq!(catalog.translate("Submit", "timeslot"), "Enviar");
        assert_eq!(catalog.translate("Submit", "other"), "Submit");
        assert_eq!(catalog.translate("Cancel", "timeslot"), "Cancel");
    }

    #[test]
    fn test_catalog_from_yaml() {
        let yaml = r#"
timeslot:
  Search...: "Buscar..."
  Submit: "Enviar"
"#;
        let catalog = Catalog::from_yaml(yaml).unwrap();
        assert_eq!(catalog.get("Search...", "timeslot"), Some("Buscar..."));
        assert!(!catalog.is_empty());
    }

    #[test]
    fn test_closure_translator() {
        let upper = |key: &str, _domain: &str| key.to_uppercase();
        assert_eq!(upper.translate("hi", DEFAULT_DOMAIN), "HI");
        assert_eq!(KeyTranslator.translate("hi", DEFAULT_DOMAIN), "hi");
    }
}

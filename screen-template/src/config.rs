use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::cache::TemplateSources;
use crate::error::TemplateResult;
use crate::translate::{Catalog, DEFAULT_DOMAIN};

/// Template id rendered when a requested id has no source.
pub const DEFAULT_TEMPLATE_ID: &str = "/index";

/// Engine configuration, usually loaded from YAML:
///
/// ```yaml
/// defaultTemplateId: /index
/// translationDomain: timeslot
/// host: https://app.example
/// templates:
///   /index: "<main><Include templateId=\"/header\"/></main>"
///   /header: "<h1 class=\"@data-theme\">Home</h1>"
/// translations:
///   timeslot:
///     Submit: Enviar
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    #[serde(default = "default_template_id")]
    pub default_template_id: String,

    #[serde(default = "default_domain")]
    pub translation_domain: String,

    /// Origin the default router treats as same-site. Without one, no anchor is rewritten.
    #[serde(default)]
    pub host: Option<String>,

    #[serde(default)]
    pub templates: TemplateSources,

    #[serde(default)]
    pub translations: Catalog,
}

fn default_template_id() -> String {
    DEFAULT_TEMPLATE_ID.to_string()
}

fn default_domain() -> String {
    DEFAULT_DOMAIN.to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            default_template_id: default_template_id(),
            translation_domain: default_domain(),
            host: None,
            templates: TemplateSources::new(),
            translations: Catalog::new(),
        }
    }
}

impl EngineConfig {
    pub fn from_yaml(yaml: &str) -> TemplateResult<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> TemplateResult<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }
}

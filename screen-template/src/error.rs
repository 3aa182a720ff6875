use thiserror::Error;

pub type TemplateResult<T> = Result<T, TemplateError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TemplateError {
    #[error("Invalid component: {component}. {reason}")]
    InvalidComponent { component: String, reason: String },

    #[error("Markup error: {0}")]
    Markup(String),

    #[error("Markup error in template '{template_id}': {message}")]
    TemplateMarkup {
        template_id: String,
        message: String,
    },

    #[error("Template '{template_id}' has no source and no fallback")]
    UnresolvedTemplate { template_id: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(String),
}

impl TemplateError {
    /// Attach the template id to a markup error raised while building it.
    pub fn in_template(self, template_id: &str) -> Self {
        match self {
            TemplateError::Markup(message) => TemplateError::TemplateMarkup {
                template_id: template_id.to_string(),
                message,
            },
            other => other,
        }
    }
}

impl From<quick_xml::Error> for TemplateError {
    fn from(err: quick_xml::Error) -> Self {
        TemplateError::Markup(err.to_string())
    }
}

impl From<serde_yaml::Error> for TemplateError {
    fn from(err: serde_yaml::Error) -> Self {
        TemplateError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for TemplateError {
    fn from(err: serde_json::Error) -> Self {
        TemplateError::Config(err.to_string())
    }
}

impl From<std::io::Error> for TemplateError {
    fn from(err: std::io::Error) -> Self {
        TemplateError::Io(err.to_string())
    }
}

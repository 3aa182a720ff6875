use std::sync::Arc;

use crate::binder::Binder;
use crate::builder::TreeBuilder;
use crate::cache::{TemplateCache, TemplateSource, TemplateSources};
use crate::config::{EngineConfig, DEFAULT_TEMPLATE_ID};
use crate::context::Context;
use crate::error::{TemplateError, TemplateResult};
use crate::node::{Node, Template};
use crate::registry::{Component, ComponentRegistry};
use crate::render::Rendered;
use crate::router::{HostRouter, NullRouter, Router};
use crate::tokenizer::{MarkupTokenizer, Tokenizer};
use crate::translate::{KeyTranslator, Translator, DEFAULT_DOMAIN};

/// What [`Engine::bind`] binds: an already built tree or a cached template.
#[derive(Debug, Clone, Copy)]
pub enum BindTarget<'a> {
    Nodes(&'a [Node]),
    TemplateId(&'a str),
}

impl<'a> From<&'a [Node]> for BindTarget<'a> {
    fn from(nodes: &'a [Node]) -> Self {
        BindTarget::Nodes(nodes)
    }
}

impl<'a> From<&'a str> for BindTarget<'a> {
    fn from(template_id: &'a str) -> Self {
        BindTarget::TemplateId(template_id)
    }
}

/// Input of [`Engine::render_element`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderRequest<'a> {
    /// Inline children; when present they are rendered instead of any template.
    pub children: Option<&'a [Node]>,
    pub template_id: Option<&'a str>,
    /// Fallback id. The engine's configured default is used when unset.
    pub default_template_id: Option<&'a str>,
}

/// A resolved template ready to be bound against any number of contexts.
pub struct BoundTemplate<'e> {
    binder: &'e Binder,
    template: Arc<Template>,
}

impl BoundTemplate<'_> {
    pub fn template(&self) -> &Arc<Template> {
        &self.template
    }

    pub fn render(&self, context: &Context) -> Vec<Rendered> {
        self.binder.bind(&self.template, context)
    }
}

/// The template engine: component registry, template cache and binder wired together.
///
/// One engine is meant to live for the whole process and be shared between renders.
pub struct Engine {
    registry: Arc<ComponentRegistry>,
    templates: Arc<TemplateCache>,
    binder: Binder,
    default_template_id: String,
}

impl Engine {
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        EngineBuilder::from_config(config).build()
    }

    pub fn register_component(&self, component: Component) -> TemplateResult<()> {
        self.registry.register(component)
    }

    pub fn has_component(&self, name: &str) -> bool {
        self.registry.has(name)
    }

    pub fn registry(&self) -> &Arc<ComponentRegistry> {
        &self.registry
    }

    pub fn templates(&self) -> &Arc<TemplateCache> {
        &self.templates
    }

    pub fn binder(&self) -> &Binder {
        &self.binder
    }

    pub fn default_template_id(&self) -> &str {
        &self.default_template_id
    }

    /// Build markup outside the cache.
    pub fn build(&self, source: &str) -> TemplateResult<Template> {
        self.templates.builder().build(source)
    }

    /// Resolve a template id. `Ok(None)` when the id has no source.
    pub fn resolve_template(&self, template_id: &str) -> TemplateResult<Option<BoundTemplate<'_>>> {
        Ok(self
            .templates
            .resolve(template_id)?
            .map(|template| BoundTemplate {
                binder: &self.binder,
                template,
            }))
    }

    pub fn bind_nodes(&self, nodes: &[Node], context: &Context) -> Vec<Rendered> {
        self.binder.bind(nodes, context)
    }

    /// Bind a tree or a template id. `Ok(None)` when a template id has no source.
    pub fn bind<'a>(
        &self,
        target: impl Into<BindTarget<'a>>,
        context: &Context,
    ) -> TemplateResult<Option<Vec<Rendered>>> {
        match target.into() {
            BindTarget::Nodes(nodes) => Ok(Some(self.bind_nodes(nodes, context))),
            BindTarget::TemplateId(id) => Ok(self
                .resolve_template(id)?
                .map(|template| template.render(context))),
        }
    }

    /// Render inline children, else the requested template, else the default one.
    pub fn render_element(
        &self,
        request: RenderRequest<'_>,
        context: &Context,
    ) -> TemplateResult<Option<Vec<Rendered>>> {
        if let Some(children) = request.children {
            return Ok(Some(self.bind_nodes(children, context)));
        }

        let default_id = request
            .default_template_id
            .unwrap_or(&self.default_template_id);
        Ok(self
            .templates
            .resolve_or(request.template_id, default_id)?
            .map(|template| self.binder.bind(&template, context)))
    }

    /// Render `template_id`, falling back to the default template.
    pub fn render(&self, template_id: &str, context: &Context) -> TemplateResult<Vec<Rendered>> {
        let request = RenderRequest {
            template_id: Some(template_id),
            ..RenderRequest::default()
        };
        self.render_element(request, context)?
            .ok_or_else(|| TemplateError::UnresolvedTemplate {
                template_id: template_id.to_string(),
            })
    }
}

/// Collaborators default to: no templates, keys left untranslated, no anchor rewriting.
pub struct EngineBuilder {
    registry: Option<Arc<ComponentRegistry>>,
    source: Arc<dyn TemplateSource>,
    tokenizer: Arc<dyn Tokenizer>,
    translator: Arc<dyn Translator>,
    router: Arc<dyn Router>,
    domain: String,
    default_template_id: String,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineBuilder {
    pub fn new() -> Self {
        EngineBuilder {
            registry: None,
            source: Arc::new(TemplateSources::new()),
            tokenizer: Arc::new(MarkupTokenizer),
            translator: Arc::new(KeyTranslator),
            router: Arc::new(NullRouter),
            domain: DEFAULT_DOMAIN.to_string(),
            default_template_id: DEFAULT_TEMPLATE_ID.to_string(),
        }
    }

    /// Templates, translations, domain and default id from `config`. A configured
    /// host installs a [`HostRouter`] whose navigation is only logged; call
    /// [`EngineBuilder::router`] afterwards to navigate for real.
    pub fn from_config(config: &EngineConfig) -> Self {
        let mut builder = EngineBuilder::new()
            .sources(config.templates.clone())
            .translator(Arc::new(config.translations.clone()))
            .domain(&config.translation_domain)
            .default_template_id(&config.default_template_id);
        if let Some(host) = &config.host {
            builder = builder.router(Arc::new(HostRouter::new(host.as_str(), |_| {})));
        }
        builder
    }

    pub fn sources(mut self, source: impl TemplateSource + 'static) -> Self {
        self.source = Arc::new(source);
        self
    }

    pub fn source(mut self, source: Arc<dyn TemplateSource>) -> Self {
        self.source = source;
        self
    }

    pub fn registry(mut self, registry: Arc<ComponentRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn tokenizer(mut self, tokenizer: Arc<dyn Tokenizer>) -> Self {
        self.tokenizer = tokenizer;
        self
    }

    pub fn translator(mut self, translator: Arc<dyn Translator>) -> Self {
        self.translator = translator;
        self
    }

    pub fn router(mut self, router: Arc<dyn Router>) -> Self {
        self.router = router;
        self
    }

    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self
    }

    pub fn default_template_id(mut self, template_id: impl Into<String>) -> Self {
        self.default_template_id = template_id.into();
        self
    }

    pub fn build(self) -> Engine {
        let registry = self
            .registry
            .unwrap_or_else(|| Arc::new(ComponentRegistry::new()));

        let builder = TreeBuilder::new(Arc::clone(&registry))
            .with_tokenizer(self.tokenizer)
            .with_translator(Arc::clone(&self.translator))
            .with_domain(self.domain.clone());
        let templates = Arc::new(TemplateCache::new(self.source, builder));

        let binder = Binder::new()
            .with_router(self.router)
            .with_translator(self.translator)
            .with_domain(self.domain)
            .with_templates(Arc::clone(&templates));

        Engine {
            registry,
            templates,
            binder,
            default_template_id: self.default_template_id,
        }
    }
}

use std::sync::Arc;

use crate::error::TemplateResult;
use crate::node::{Node, RawNode, Template};
use crate::normalizer::Normalizer;
use crate::registry::ComponentRegistry;
use crate::tokenizer::{MarkupTokenizer, Tokenizer};
use crate::translate::{KeyTranslator, Translator, DEFAULT_DOMAIN};

/// Parses markup into an immutable node tree, expanding registered components.
#[derive(Clone)]
pub struct TreeBuilder {
    registry: Arc<ComponentRegistry>,
    tokenizer: Arc<dyn Tokenizer>,
    translator: Arc<dyn Translator>,
    domain: String,
}

impl TreeBuilder {
    pub fn new(registry: Arc<ComponentRegistry>) -> Self {
        TreeBuilder {
            registry,
            tokenizer: Arc::new(MarkupTokenizer),
            translator: Arc::new(KeyTranslator),
            domain: DEFAULT_DOMAIN.to_string(),
        }
    }

    pub fn with_tokenizer(mut self, tokenizer: Arc<dyn Tokenizer>) -> Self {
        self.tokenizer = tokenizer;
        self
    }

    pub fn with_translator(mut self, translator: Arc<dyn Translator>) -> Self {
        self.translator = translator;
        self
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self
    }

    pub fn registry(&self) -> &Arc<ComponentRegistry> {
        &self.registry
    }

    /// Tokenize and build `source`. Binds no data.
    pub fn build(&self, source: &str) -> TemplateResult<Template> {
        let raw = self.tokenizer.tokenize(source)?;
        Ok(self.build_raw(&raw))
    }

    /// Build an already tokenized node stream.
    pub fn build_raw(&self, raw: &[RawNode]) -> Template {
        let normalizer = Normalizer::new(self.translator.as_ref(), &self.domain);
        Template::new(self.build_nodes(&normalizer, raw, None))
    }

    fn build_nodes(
        &self,
        normalizer: &Normalizer<'_>,
        raw: &[RawNode],
        parent: Option<&str>,
    ) -> Vec<Node> {
        raw.iter()
            .filter_map(|node| self.build_node(normalizer, node, parent))
            .collect()
    }

    /// Pre-order: the node is normalized (and keyed) before its children.
    fn build_node(
        &self,
        normalizer: &Normalizer<'_>,
        raw: &RawNode,
        parent: Option<&str>,
    ) -> Option<Node> {
        let mut element = match normalizer.normalize(raw, parent)? {
            Node::Element(element) => element,
            text => return Some(text),
        };

        element.children = self.build_nodes(normalizer, &raw.children, Some(&raw.name));

        let element = match self.registry.get(&element.name) {
            Some(component) => component.instantiate(element),
            None => element,
        };
        Some(Node::Element(element))
    }
}

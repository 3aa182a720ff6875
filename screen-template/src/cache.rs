use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::builder::TreeBuilder;
use crate::error::TemplateResult;
use crate::node::Template;

/// Supplies the markup source for a template id.
pub trait TemplateSource: Send + Sync {
    fn get(&self, template_id: &str) -> Option<String>;
}

impl TemplateSource for HashMap<String, String> {
    fn get(&self, template_id: &str) -> Option<String> {
        HashMap::get(self, template_id).cloned()
    }
}

/// In-memory template source: template id -> markup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplateSources {
    templates: HashMap<String, String>,
}

impl TemplateSources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a YAML mapping of template id to markup.
    pub fn from_yaml(yaml: &str) -> TemplateResult<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn with(mut self, template_id: impl Into<String>, markup: impl Into<String>) -> Self {
        self.insert(template_id, markup);
        self
    }

    pub fn insert(&mut self, template_id: impl Into<String>, markup: impl Into<String>) {
        self.templates.insert(template_id.into(), markup.into());
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

impl From<HashMap<String, String>> for TemplateSources {
    fn from(templates: HashMap<String, String>) -> Self {
        TemplateSources { templates }
    }
}

impl TemplateSource for TemplateSources {
    fn get(&self, template_id: &str) -> Option<String> {
        self.templates.get(template_id).cloned()
    }
}

/// Builds each template id at most once and keeps the result for the process lifetime.
pub struct TemplateCache {
    source: Arc<dyn TemplateSource>,
    builder: TreeBuilder,
    entries: DashMap<String, Arc<Template>>,
}

impl TemplateCache {
    pub fn new(source: Arc<dyn TemplateSource>, builder: TreeBuilder) -> Self {
        TemplateCache {
            source,
            builder,
            entries: DashMap::new(),
        }
    }

    pub fn builder(&self) -> &TreeBuilder {
        &self.builder
    }

    /// Resolve `template_id` to its built tree.
    ///
    /// `Ok(None)` when the source has no markup for the id. Markup errors are returned
    /// and nothing is cached, so a later call retries.
    pub fn resolve(&self, template_id: &str) -> TemplateResult<Option<Arc<Template>>> {
        if let Some(hit) = self.entries.get(template_id) {
            return Ok(Some(Arc::clone(hit.value())));
        }

        // The shard stays locked while building so a racing caller waits instead of re-parsing.
        match self.entries.entry(template_id.to_string()) {
            Entry::Occupied(entry) => Ok(Some(Arc::clone(entry.get()))),
            Entry::Vacant(entry) => {
                let Some(markup) = self.source.get(template_id) else {
                    log::debug!("no template source for '{}'", template_id);
                    return Ok(None);
                };
                let template = self.builder.build(&markup).map_err(|e| {
                    log::warn!("template '{}' failed to build: {}", template_id, e);
                    e.in_template(template_id)
                })?;
                log::debug!(
                    "template '{}' built with {} top-level nodes",
                    template_id,
                    template.len()
                );
                let cached = entry.insert(Arc::new(template));
                Ok(Some(Arc::clone(cached.value())))
            }
        }
    }

    /// Resolve `template_id`, falling back to `default_id` when it has no source.
    pub fn resolve_or(
        &self,
        template_id: Option<&str>,
        default_id: &str,
    ) -> TemplateResult<Option<Arc<Template>>> {
        if let Some(id) = template_id {
            if let Some(template) = self.resolve(id)? {
                return Ok(Some(template));
            }
        }
        self.resolve(default_id)
    }

    pub fn is_cached(&self, template_id: &str) -> bool {
        self.entries.contains_key(template_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TemplateError;
    use crate::registry::ComponentRegistry;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts lookups so tests can observe how often the cache reaches the source.
    struct CountingSource {
        sources: TemplateSources,
        lookups: AtomicUsize,
    }

    impl TemplateSource for CountingSource {
        fn get(&self, template_id: &str) -> Option<String> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            self.sources.get(template_id)
        }
    }

    fn cache_with(source: Arc<dyn TemplateSource>) -> TemplateCache {
        TemplateCache::new(source, TreeBuilder::new(Arc::new(ComponentRegistry::new())))
    }

    #[test]
    fn test_resolve_returns_shared_instance() {
        let cache = cache_with(Arc::new(TemplateSources::new().with("/index", "<p>home</p>")));
        let first = cache.resolve("/index").unwrap().unwrap();
        let second = cache.resolve("/index").unwrap().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(cache.is_cached("/index"));
    }

    #[test]
    fn test_source_consulted_once() {
        let source = Arc::new(CountingSource {
            sources: TemplateSources::new().with("/a", "<p>a</p>"),
            lookups: AtomicUsize::new(0),
        });
        let cache = cache_with(source.clone());
        for _ in 0..3 {
            cache.resolve("/a").unwrap();
        }
        assert_eq!(source.lookups.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_missing_template_is_none() {
        let cache = cache_with(Arc::new(TemplateSources::new()));
        assert!(cache.resolve("/missing").unwrap().is_none());
        assert!(!cache.is_cached("/missing"));
    }

    #[test]
    fn test_resolve_or_falls_back() {
        let cache = cache_with(Arc::new(TemplateSources::new().with("/index", "<p>home</p>")));
        let template = cache.resolve_or(Some("/nope"), "/index").unwrap().unwrap();
        assert_eq!(template.text_runs(), vec!["home"]);
        assert!(cache.resolve_or(None, "/nope").unwrap().is_none());
    }

    #[test]
    fn test_markup_error_names_template_and_is_not_cached() {
        let cache = cache_with(Arc::new(TemplateSources::new().with("/broken", "<div>")));
        let err = cache.resolve("/broken").unwrap_err();
        assert!(matches!(
            err,
            TemplateError::TemplateMarkup { ref template_id, .. } if template_id == "/broken"
        ));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_concurrent_first_access_builds_one_entry() {
        let cache = Arc::new(cache_with(Arc::new(
            TemplateSources::new().with("/shared", "<ul><li>x</li></ul>"),
        )));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || cache.resolve("/shared").unwrap().unwrap())
            })
            .collect();
        let results: Vec<Arc<Template>> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        for r in &results[1..] {
            assert!(Arc::ptr_eq(&results[0], r));
        }
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_sources_from_yaml() {
        let yaml = "/index: \"<p>home</p>\"\n/about: \"<p>about</p>\"\n";
        let sources = TemplateSources::from_yaml(yaml).unwrap();
        assert_eq!(sources.len(), 2);
        assert_eq!(sources.get("/about").as_deref(), Some("<p>about</p>"));
    }
}

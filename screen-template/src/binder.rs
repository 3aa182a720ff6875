//! Binding of built trees against a per-render context.
//!
//! The binder never touches the tree it is given; every pass builds a fresh
//! [`Rendered`] output. Each node is routed to one handler through [`Dispatch`], and
//! the `If`, `Data` and `Include` handlers re-enter the binder for their children.

use regex::{Captures, Regex};
use std::sync::{Arc, OnceLock};

use crate::cache::TemplateCache;
use crate::conditional;
use crate::context::{Context, Override};
use crate::iteration;
use crate::node::{Attributes, Element, ElementKind, Node};
use crate::render::{ComponentInstance, Rendered, RenderedElement};
use crate::router::{NullRouter, Router};
use crate::translate::{KeyTranslator, Translator, DEFAULT_DOMAIN};
use crate::value::{Handler, Value};

/// Nesting limit for `Include`; deeper includes render nothing.
pub const MAX_INCLUDE_DEPTH: usize = 16;

const DATA_PREFIX: &str = "@data-";

fn directive_regex() -> &'static Regex {
    static DIRECTIVE_REGEX: OnceLock<Regex> = OnceLock::new();
    DIRECTIVE_REGEX.get_or_init(|| Regex::new(r"@data-|@lang-|@screen-").unwrap())
}

fn data_regex() -> &'static Regex {
    static DATA_REGEX: OnceLock<Regex> = OnceLock::new();
    DATA_REGEX.get_or_init(|| Regex::new(r"@data-.?[^& ]*").unwrap())
}

fn lang_regex() -> &'static Regex {
    static LANG_REGEX: OnceLock<Regex> = OnceLock::new();
    LANG_REGEX.get_or_init(|| Regex::new(r"@lang-[^& ]+").unwrap())
}

/// Which handler binds an element.
#[derive(Debug)]
pub enum Dispatch<'a> {
    /// A registered host component, emitted with unbound children.
    Component,
    Conditional,
    Iteration,
    Include,
    Translation,
    /// The context intercepts this element type.
    Override(&'a Override),
    /// A plain host element, bound recursively.
    Element,
}

impl<'a> Dispatch<'a> {
    pub fn of(element: &Element, context: &'a Context) -> Self {
        match element.kind {
            ElementKind::Component => Dispatch::Component,
            ElementKind::Conditional => Dispatch::Conditional,
            ElementKind::Iteration => Dispatch::Iteration,
            ElementKind::Include => Dispatch::Include,
            ElementKind::Translation => Dispatch::Translation,
            ElementKind::Tag => match context.override_for(&element.name) {
                Some(o) => Dispatch::Override(o),
                None => Dispatch::Element,
            },
        }
    }
}

/// Binds node trees against a [`Context`].
#[derive(Clone)]
pub struct Binder {
    router: Arc<dyn Router>,
    translator: Arc<dyn Translator>,
    domain: String,
    templates: Option<Arc<TemplateCache>>,
}

impl Default for Binder {
    fn default() -> Self {
        Self::new()
    }
}

impl Binder {
    /// A binder that never rewrites anchors, leaves keys untranslated and cannot include.
    pub fn new() -> Self {
        Binder {
            router: Arc::new(NullRouter),
            translator: Arc::new(KeyTranslator),
            domain: DEFAULT_DOMAIN.to_string(),
            templates: None,
        }
    }

    pub fn with_router(mut self, router: Arc<dyn Router>) -> Self {
        self.router = router;
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

    /// Template cache used to resolve `Include`.
    pub fn with_templates(mut self, templates: Arc<TemplateCache>) -> Self {
        self.templates = Some(templates);
        self
    }

    pub fn bind(&self, nodes: &[Node], context: &Context) -> Vec<Rendered> {
        self.bind_at(nodes, context, 0)
    }

    pub(crate) fn bind_at(&self, nodes: &[Node], context: &Context, depth: usize) -> Vec<Rendered> {
        nodes
            .iter()
            .map(|node| self.bind_node(node, context, depth))
            .collect()
    }

    fn bind_node(&self, node: &Node, context: &Context, depth: usize) -> Rendered {
        match node {
            Node::Text(text) => Rendered::Text(text.clone()),
            Node::Element(element) => self.bind_element(element, context, depth),
        }
    }

    fn bind_element(&self, element: &Element, context: &Context, depth: usize) -> Rendered {
        let attributes = self.transform_attributes(&element.attributes, context);

        match Dispatch::of(element, context) {
            Dispatch::Component => Rendered::Component(ComponentInstance {
                name: element.name.clone(),
                key: element.key.clone(),
                attributes,
                children: element.children.clone(),
            }),
            Dispatch::Conditional => {
                conditional::evaluate(self, &attributes, &element.children, context, depth)
            }
            Dispatch::Iteration => {
                iteration::iterate(self, &element.children, attributes.get("value"), depth)
            }
            Dispatch::Include => self.include(&attributes, context, depth),
            Dispatch::Translation => {
                self.translation(&attributes, &element.children, context, depth)
            }
            Dispatch::Override(intercept) => {
                log::trace!("override intercepts <{}>", element.name);
                intercept.call(&Element {
                    attributes,
                    ..element.clone()
                })
            }
            Dispatch::Element => {
                let children = self.bind_at(&element.children, context, depth);
                let mut bound = RenderedElement {
                    name: element.name.clone(),
                    key: element.key.clone(),
                    attributes,
                    children,
                };
                self.intercept_anchor(&mut bound);
                Rendered::Element(bound)
            }
        }
    }

    /// An `a` with a cross-site `url` and no click handler navigates through the router.
    fn intercept_anchor(&self, element: &mut RenderedElement) {
        if element.name != "a" || element.attributes.contains_key("onClick") {
            return;
        }
        let Some(url) = element.attributes.get("url").and_then(Value::as_str) else {
            return;
        };
        if url.is_empty() || self.router.is_same_site(url) {
            return;
        }

        let url = url.to_string();
        let router = Arc::clone(&self.router);
        element.attributes.insert(
            "onClick".to_string(),
            Value::Handler(Handler::new(move || router.navigate(&url))),
        );
    }

    fn include(&self, attributes: &Attributes, context: &Context, depth: usize) -> Rendered {
        let Some(template_id) = attributes.get("templateId").and_then(Value::display) else {
            log::warn!("Include without a templateId");
            return Rendered::Empty;
        };
        if depth >= MAX_INCLUDE_DEPTH {
            log::warn!(
                "Include of '{}' exceeds the maximum depth of {}",
                template_id,
                MAX_INCLUDE_DEPTH
            );
            return Rendered::Empty;
        }
        let Some(templates) = &self.templates else {
            log::warn!("Include of '{}' with no template cache", template_id);
            return Rendered::Empty;
        };

        match templates.resolve(&template_id) {
            Ok(Some(template)) => Rendered::Fragment(self.bind_at(&template, context, depth + 1)),
            Ok(None) => {
                log::warn!("Include of unknown template '{}'", template_id);
                Rendered::Empty
            }
            Err(e) => {
                log::warn!("Include of '{}' failed: {}", template_id, e);
                Rendered::Empty
            }
        }
    }

    fn translation(
        &self,
        attributes: &Attributes,
        children: &[Node],
        context: &Context,
        depth: usize,
    ) -> Rendered {
        match attributes.get("text").and_then(Value::display) {
            Some(key) => Rendered::Text(self.translator.translate(&key, &self.domain)),
            None => Rendered::Fragment(self.bind_at(children, context, depth)),
        }
    }

    /// Apply directives in `attributes` against `context`.
    ///
    /// An attribute named `@data-<key>` is removed and, when `<key>` holds a map,
    /// replaced by that map's entries. String values containing `@data-`, `@lang-`
    /// or `@screen-` are substituted token by token; tokens whose lookup misses are
    /// dropped. With an empty context the attributes are returned unchanged.
    pub fn transform_attributes(&self, attributes: &Attributes, context: &Context) -> Attributes {
        if context.is_empty() || attributes.is_empty() {
            return attributes.clone();
        }

        let mut out = attributes.clone();
        for (name, value) in attributes {
            if let Some(at) = name.find(DATA_PREFIX) {
                out.remove(name);
                let key = &name[at + DATA_PREFIX.len()..];
                match context.value(key) {
                    Some(Value::Map(entries)) => {
                        out.extend(entries.iter().map(|(k, v)| (k.clone(), v.clone())))
                    }
                    _ => log::trace!("nothing to spread for '{}'", name),
                }
                continue;
            }

            if name == "children" {
                continue;
            }
            let Value::String(raw) = value else {
                continue;
            };
            if !directive_regex().is_match(raw) {
                continue;
            }
            out.insert(name.clone(), self.substitute(raw, context));
        }
        out
    }

    fn substitute(&self, raw: &str, context: &Context) -> Value {
        // A value that is exactly one `@data-` directive keeps a collection's structure.
        if let Some(key) = raw.strip_prefix(DATA_PREFIX) {
            if data_regex().find(raw).is_some_and(|m| m.as_str() == raw) {
                if let Some(v @ (Value::List(_) | Value::Map(_))) = context.value(key) {
                    return v.clone();
                }
            }
        }

        let tokens: Vec<String> = raw
            .split(' ')
            .filter_map(|token| self.substitute_token(token, context))
            .filter(|token| !token.is_empty())
            .collect();
        Value::String(tokens.join(" "))
    }

    /// `None` when a directive in the token has nothing to substitute.
    fn substitute_token(&self, token: &str, context: &Context) -> Option<String> {
        if token.contains(DATA_PREFIX) {
            let mut missed = false;
            let replaced = data_regex().replace_all(token, |caps: &Captures| {
                let key = &caps[0][DATA_PREFIX.len()..];
                match context.value(key).and_then(Value::display) {
                    Some(text) => text,
                    None => {
                        log::trace!("directive lookup missed '{}'", key);
                        missed = true;
                        String::new()
                    }
                }
            });
            return (!missed).then(|| replaced.into_owned());
        }

        if token.contains("@lang-") {
            let replaced = lang_regex().replace_all(token, |caps: &Captures| {
                self.translator.translate(&caps[0]["@lang-".len()..], &self.domain)
            });
            return Some(replaced.into_owned());
        }

        Some(token.to_string())
    }
}

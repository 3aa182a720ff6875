use dashmap::DashMap;

use crate::error::{TemplateError, TemplateResult};
use crate::node::{rekeyed, Attributes, Element, ElementKind, Node};
use crate::value::Value;

/// Names of the built-in pseudo-components registered by [`ComponentRegistry::new`].
pub const BUILTIN_COMPONENTS: &[&str] = &["If", "Data", "Include", "Lang"];

/// A template fragment that a custom tag expands into.
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    /// Declared type name; also the tag name the component is invoked with.
    pub name: String,
    pub kind: ElementKind,
    /// Default attributes, overridden by the caller's attributes.
    pub attributes: Attributes,
    /// Default children, used when the caller supplies none.
    pub children: Vec<Node>,
}

impl Component {
    /// A host component, mounted by the host runtime under `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Component {
            name: name.into(),
            kind: ElementKind::Component,
            attributes: Attributes::new(),
            children: Vec::new(),
        }
    }

    pub fn conditional() -> Self {
        Component {
            kind: ElementKind::Conditional,
            ..Component::new("If")
        }
    }

    pub fn iteration() -> Self {
        Component {
            kind: ElementKind::Iteration,
            ..Component::new("Data")
        }
    }

    pub fn include() -> Self {
        Component {
            kind: ElementKind::Include,
            ..Component::new("Include")
        }
    }

    pub fn translation() -> Self {
        Component {
            kind: ElementKind::Translation,
            ..Component::new("Lang")
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.children = children;
        self
    }

    /// The type name, if it is usable as a tag name.
    pub fn type_name(&self) -> Option<&str> {
        is_type_name(&self.name).then_some(self.name.as_str())
    }

    /// Expand this component at a call site.
    ///
    /// The caller's attributes are merged over the defaults and its children, when
    /// it has any, replace the default children. The expansion keeps the caller's
    /// key; default children are copied with fresh keys.
    pub fn instantiate(&self, caller: Element) -> Element {
        let mut attributes = self.attributes.clone();
        attributes.extend(caller.attributes);

        let children = if caller.children.is_empty() {
            rekeyed(&self.children)
        } else {
            caller.children
        };

        Element {
            name: self.name.clone(),
            kind: self.kind,
            attributes,
            children,
            key: caller.key,
        }
    }
}

/// A type name starts with an ASCII letter and continues with letters, digits, `_` or `-`.
pub fn is_type_name(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        }
        _ => false,
    }
}

/// Tag name -> component mapping, consulted while building trees.
///
/// Registration is expected at start-up; concurrent registration is last-write-wins.
#[derive(Debug)]
pub struct ComponentRegistry {
    components: DashMap<String, Component>,
}

impl Default for ComponentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ComponentRegistry {
    /// A registry holding the built-in components.
    pub fn new() -> Self {
        let registry = Self::empty();
        for builtin in [
            Component::conditional(),
            Component::iteration(),
            Component::include(),
            Component::translation(),
        ] {
            registry.components.insert(builtin.name.clone(), builtin);
        }
        registry
    }

    pub fn empty() -> Self {
        ComponentRegistry {
            components: DashMap::new(),
        }
    }

    /// Register a component under its type name, replacing any previous registration.
    pub fn register(&self, component: Component) -> TemplateResult<()> {
        let name = component
            .type_name()
            .ok_or_else(|| TemplateError::InvalidComponent {
                component: component.name.clone(),
                reason: "a component must declare a type name \
                         (a letter followed by letters, digits, '_' or '-')"
                    .to_string(),
            })?
            .to_string();

        if self.components.insert(name.clone(), component).is_some() {
            log::debug!("component '{}' re-registered", name);
        } else {
            log::debug!("component '{}' registered", name);
        }
        Ok(())
    }

    pub fn has(&self, name: &str) -> bool {
        self.components.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<Component> {
        self.components.get(name).map(|c| c.value().clone())
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.components.iter().map(|c| c.key().clone()).collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Expand `caller` with the component registered under its name.
    /// `None` when no component is registered under that name.
    pub fn instantiate(&self, caller: Element) -> Option<Element> {
        let component = self.components.get(&caller.name)?;
        Some(component.instantiate(caller))
    }
}

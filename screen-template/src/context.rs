use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::node::Element;
use crate::render::Rendered;
use crate::value::{Map, Value};

/// Intercepts binding of every element whose type name matches the override's key.
///
/// It receives the element with directives already applied but children still unbound,
/// and its result is used verbatim in place of the element.
#[derive(Clone)]
pub struct Override(Arc<dyn Fn(&Element) -> Rendered + Send + Sync>);

impl Override {
    pub fn new(f: impl Fn(&Element) -> Rendered + Send + Sync + 'static) -> Self {
        Override(Arc::new(f))
    }

    pub fn call(&self, element: &Element) -> Rendered {
        (self.0)(element)
    }
}

impl fmt::Debug for Override {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Override(..)")
    }
}

/// One entry of a binding context.
#[derive(Debug, Clone)]
pub enum Binding {
    Value(Value),
    Override(Override),
}

/// The data a template is bound against for one render pass.
#[derive(Debug, Clone, Default)]
pub struct Context {
    entries: BTreeMap<String, Binding>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn with_override(
        mut self,
        type_name: impl Into<String>,
        f: impl Fn(&Element) -> Rendered + Send + Sync + 'static,
    ) -> Self {
        self.entries
            .insert(type_name.into(), Binding::Override(Override::new(f)));
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.entries.insert(name.into(), Binding::Value(value.into()));
    }

    pub fn insert_override(&mut self, type_name: impl Into<String>, value: Override) {
        self.entries.insert(type_name.into(), Binding::Override(value));
    }

    pub fn get(&self, name: &str) -> Option<&Binding> {
        self.entries.get(name)
    }

    pub fn value(&self, name: &str) -> Option<&Value> {
        match self.entries.get(name) {
            Some(Binding::Value(v)) => Some(v),
            _ => None,
        }
    }

    pub fn override_for(&self, type_name: &str) -> Option<&Override> {
        match self.entries.get(type_name) {
            Some(Binding::Override(o)) => Some(o),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Binding)> {
        self.entries.iter()
    }
}

impl From<Map> for Context {
    fn from(map: Map) -> Self {
        Context {
            entries: map
                .into_iter()
                .map(|(k, v)| (k, Binding::Value(v)))
                .collect(),
        }
    }
}

/// A JSON object becomes one entry per key; any other JSON value yields an empty context.
impl From<serde_json::Value> for Context {
    fn from(json: serde_json::Value) -> Self {
        match Value::from(json) {
            Value::Map(map) => Context::from(map),
            _ => Context::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_values_and_overrides_are_distinct() {
        let ctx = Context::new()
            .with("title", "Hello")
            .with_override("Alert", |_| Rendered::Empty);
        assert_eq!(ctx.value("title"), Some(&Value::from("Hello")));
        assert!(ctx.override_for("title").is_none());
        assert!(ctx.override_for("Alert").is_some());
        assert!(ctx.value("Alert").is_none());
        assert_eq!(ctx.len(), 2);
    }

    #[test]
    fn test_from_json_object() {
        let ctx = Context::from(serde_json::json!({"state": "active", "count": 3}));
        assert_eq!(ctx.value("state"), Some(&Value::from("active")));
        assert_eq!(ctx.value("count"), Some(&Value::from(3)));
        assert!(Context::from(serde_json::json!([1, 2])).is_empty());
    }
}

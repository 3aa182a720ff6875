use serde::Serialize;

use crate::node::{Attributes, Node};
use crate::value::Value;

/// Output of the binder, handed to the host rendering runtime.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Rendered {
    /// Nothing is rendered at this position.
    Empty,
    Text(String),
    /// A bare value, from `Data` used without children.
    Value(Value),
    Element(RenderedElement),
    Component(ComponentInstance),
    Fragment(Vec<Rendered>),
}

/// A host element with bound attributes and children.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedElement {
    pub name: String,
    pub key: String,
    pub attributes: Attributes,
    pub children: Vec<Rendered>,
}

/// A host component. Its children are handed over unbound; the host runtime binds
/// them against the component's own data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentInstance {
    pub name: String,
    pub key: String,
    pub attributes: Attributes,
    pub children: Vec<Node>,
}

impl Rendered {
    pub fn is_empty(&self) -> bool {
        match self {
            Rendered::Empty => true,
            Rendered::Fragment(items) => items.iter().all(Rendered::is_empty),
            _ => false,
        }
    }

    pub fn as_element(&self) -> Option<&RenderedElement> {
        match self {
            Rendered::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Elements in document order, looking through fragments.
    pub fn elements(&self) -> Vec<&RenderedElement> {
        fn collect<'a>(r: &'a Rendered, out: &mut Vec<&'a RenderedElement>) {
            match r {
                Rendered::Element(e) => out.push(e),
                Rendered::Fragment(items) => items.iter().for_each(|i| collect(i, out)),
                _ => {}
            }
        }
        let mut out = Vec::new();
        collect(self, &mut out);
        out
    }

    /// Concatenated text and value output, depth-first.
    pub fn text_content(&self) -> String {
        match self {
            Rendered::Empty | Rendered::Component(_) => String::new(),
            Rendered::Text(t) => t.clone(),
            Rendered::Value(v) => v.display().unwrap_or_default(),
            Rendered::Element(e) => e.children.iter().map(Rendered::text_content).collect(),
            Rendered::Fragment(items) => items.iter().map(Rendered::text_content).collect(),
        }
    }
}

impl RenderedElement {
    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }
}

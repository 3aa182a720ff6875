use serde::Serialize;
use std::collections::BTreeMap;
use std::ops::Deref;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::value::Value;

/// Attribute set of an element. Insertion order is irrelevant.
pub type Attributes = BTreeMap<String, Value>;

static NEXT_NODE_KEY: AtomicU64 = AtomicU64::new(1);

/// Mint a process-unique node key. Keys increase monotonically across every parse.
pub fn next_key() -> String {
    format!("n_{}", NEXT_NODE_KEY.fetch_add(1, Ordering::Relaxed))
}

/// Deep copy of `nodes` with a fresh key on every element.
pub fn rekeyed(nodes: &[Node]) -> Vec<Node> {
    nodes
        .iter()
        .map(|node| match node {
            Node::Element(e) => Node::Element(Element {
                name: e.name.clone(),
                kind: e.kind,
                attributes: e.attributes.clone(),
                children: rekeyed(&e.children),
                key: next_key(),
            }),
            Node::Text(t) => Node::Text(t.clone()),
        })
        .collect()
}

/// How the binder dispatches an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ElementKind {
    /// Plain host element (`div`, `a`, ...), or an unregistered custom tag.
    Tag,
    /// Registered host component; mounted by the host runtime, children left unbound.
    Component,
    /// Built-in `If`.
    Conditional,
    /// Built-in `Data`.
    Iteration,
    /// Built-in `Include`.
    Include,
    /// Built-in `Lang`.
    Translation,
}

/// A semantic element produced by the tree builder.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Element {
    pub name: String,
    pub kind: ElementKind,
    pub attributes: Attributes,
    pub children: Vec<Node>,
    pub key: String,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Element {
            name: name.into(),
            kind: ElementKind::Tag,
            attributes: Attributes::new(),
            children: Vec::new(),
            key: next_key(),
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

    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }
}

/// A node of a parsed template. Never mutated once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Node {
    Text(String),
    Element(Element),
}

impl Node {
    pub fn text(text: impl Into<String>) -> Self {
        Node::Text(text.into())
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Node::Text(t) => Some(t),
            Node::Element(_) => None,
        }
    }
}

impl From<Element> for Node {
    fn from(e: Element) -> Self {
        Node::Element(e)
    }
}

/// The built output of one markup source.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Template {
    nodes: Vec<Node>,
}

impl Template {
    pub fn new(nodes: Vec<Node>) -> Self {
        Template { nodes }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn into_nodes(self) -> Vec<Node> {
        self.nodes
    }

    /// Every plain text run of the tree, depth-first in document order.
    pub fn text_runs(&self) -> Vec<&str> {
        fn collect<'a>(nodes: &'a [Node], out: &mut Vec<&'a str>) {
            for node in nodes {
                match node {
                    Node::Text(t) => out.push(t),
                    Node::Element(e) => collect(&e.children, out),
                }
            }
        }
        let mut out = Vec::new();
        collect(&self.nodes, &mut out);
        out
    }
}

impl Deref for Template {
    type Target = [Node];

    fn deref(&self) -> &[Node] {
        &self.nodes
    }
}

/// Kind of a node as reported by the tokenizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawKind {
    Text,
    Tag,
    Comment,
    Script,
    Style,
    Link,
    Cdata,
    Directive,
}

/// Generic node emitted by a tokenizer, before semantic shaping.
#[derive(Debug, Clone, PartialEq)]
pub struct RawNode {
    pub kind: RawKind,
    /// Tag name; empty for non-element nodes.
    pub name: String,
    /// Text content for text, comment and CDATA nodes.
    pub data: String,
    /// Attributes in source order.
    pub attributes: Vec<(String, String)>,
    pub children: Vec<RawNode>,
}

impl RawNode {
    pub fn text(data: impl Into<String>) -> Self {
        RawNode {
            kind: RawKind::Text,
            name: String::new(),
            data: data.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn tag(name: impl Into<String>) -> Self {
        RawNode {
            kind: RawKind::Tag,
            name: name.into(),
            data: String::new(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn leaf(kind: RawKind, data: impl Into<String>) -> Self {
        RawNode {
            kind,
            data: data.into(),
            ..RawNode::tag("")
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    pub fn with_child(mut self, child: RawNode) -> Self {
        self.children.push(child);
        self
    }
}

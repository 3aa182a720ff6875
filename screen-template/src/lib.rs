//! # Screen Template Engine
//!
//! Parses HTML-like markup into immutable node trees and binds them against a
//! per-render data context, producing a tree for a host rendering runtime.
//!
//! ## Features
//! - Attribute normalization (host attribute names, booleans, inline styles, `@lang(key)`)
//! - Custom components expanded at build time through a [`ComponentRegistry`]
//! - `@data-`/`@lang-` directives in attribute values, resolved at bind time
//! - `If`, `Data`, `Include` and `Lang` built-in components
//! - Per-id template cache shared across renders
//! - Cross-site anchors rerouted through a [`Router`]
//!
//! ## Example
//! ```ignore
//! use screen_template::{Context, Engine, TemplateSources};
//!
//! let engine = Engine::builder()
//!     .sources(TemplateSources::new().with(
//!         "/index",
//!         r#"<ul><Data value="@data-items"><li class="@data-value">item</li></Data></ul>"#,
//!     ))
//!     .build();
//!
//! let context = Context::new().with("items", vec!["a".into(), "b".into()]);
//! let tree = engine.render("/index", &context).expect("Failed to render");
//! ```

pub mod binder;
pub mod builder;
pub mod cache;
pub mod conditional;
pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod iteration;
pub mod node;
pub mod normalizer;
pub mod registry;
pub mod render;
pub mod router;
pub mod tokenizer;
pub mod translate;
pub mod value;

// --- Core types ---
pub use binder::{Binder, Dispatch, MAX_INCLUDE_DEPTH};
pub use builder::TreeBuilder;
pub use cache::{TemplateCache, TemplateSource, TemplateSources};
pub use config::EngineConfig;
pub use context::{Binding, Context, Override};
pub use engine::{BindTarget, BoundTemplate, Engine, EngineBuilder, RenderRequest};
pub use error::{TemplateError, TemplateResult};
pub use node::{Attributes, Element, ElementKind, Node, RawKind, RawNode, Template};
pub use registry::{Component, ComponentRegistry};
pub use render::{ComponentInstance, Rendered, RenderedElement};
pub use value::{Handler, Map, Value};

// --- Collaborators ---
pub use router::{HostRouter, NullRouter, Router};
pub use tokenizer::{MarkupTokenizer, Tokenizer};
pub use translate::{Catalog, KeyTranslator, Translator};

/// Build markup with only the built-in components registered.
pub fn parse_template(source: &str) -> TemplateResult<Template> {
    TreeBuilder::new(std::sync::Arc::new(ComponentRegistry::new())).build(source)
}

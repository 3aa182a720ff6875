//! The `Data` primitive.

use crate::binder::Binder;
use crate::context::Context;
use crate::node::Node;
use crate::render::Rendered;
use crate::value::Value;

/// Bind `children` once per item of `value`.
///
/// A list binds each item as `value`; a map binds each entry as `name` and `value`, in
/// key order. Anything else binds once as `value`, or is returned as is when there are
/// no children.
pub fn iterate(
    binder: &Binder,
    children: &[Node],
    value: Option<&Value>,
    depth: usize,
) -> Rendered {
    match value {
        Some(Value::List(items)) => {
            if children.is_empty() {
                return Rendered::Empty;
            }
            Rendered::Fragment(
                items
                    .iter()
                    .map(|item| {
                        let ctx = Context::new().with("value", item.clone());
                        Rendered::Fragment(binder.bind_at(children, &ctx, depth))
                    })
                    .collect(),
            )
        }
        Some(Value::Map(entries)) => {
            if children.is_empty() {
                return Rendered::Empty;
            }
            Rendered::Fragment(
                entries
                    .iter()
                    .map(|(name, entry)| {
                        let ctx = Context::new()
                            .with("name", name.as_str())
                            .with("value", entry.clone());
                        Rendered::Fragment(binder.bind_at(children, &ctx, depth))
                    })
                    .collect(),
            )
        }
        other => {
            let value = other.cloned().unwrap_or_default();
            if !children.is_empty() {
                let ctx = Context::new().with("value", value);
                return Rendered::Fragment(binder.bind_at(children, &ctx, depth));
            }
            match value {
                Value::Null => Rendered::Empty,
                v => Rendered::Value(v),
            }
        }
    }
}

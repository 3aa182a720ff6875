//! Markup tokenizer producing the generic node stream consumed by the tree builder.
//!
//! Tag and attribute names keep their case, `<Tag/>` is recognized as self-closing,
//! HTML void elements need no closing tag, entity references are decoded and
//! whitespace is kept verbatim. A `&` that does not start a reference is kept as text.

use quick_xml::escape::resolve_html5_entity;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::fmt::Display;

use crate::error::{TemplateError, TemplateResult};
use crate::node::{RawKind, RawNode};

/// Elements that never have content, so `<br>` and `<input ...>` are complete on their own.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

/// Turns markup source into a stream of generic nodes.
pub trait Tokenizer: Send + Sync {
    fn tokenize(&self, source: &str) -> TemplateResult<Vec<RawNode>>;
}

/// Default tokenizer backed by `quick-xml`, with HTML-style attribute parsing
/// (unquoted and valueless attributes are accepted).
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkupTokenizer;

impl Tokenizer for MarkupTokenizer {
    fn tokenize(&self, source: &str) -> TemplateResult<Vec<RawNode>> {
        let mut reader = Reader::from_str(source);
        let config = reader.config_mut();
        config.trim_text(false);
        config.allow_dangling_amp = true;
        // end tags are matched against our own stack, which knows about void elements
        config.check_end_names = false;
        config.allow_unmatched_ends = true;

        let mut tree = TreeSink::default();

        loop {
            match reader.read_event()? {
                Event::Start(ref e) => {
                    let node = open_element(e)?;
                    if is_void(&node.name) {
                        tree.push(node);
                    } else {
                        tree.open.push(node);
                    }
                }
                Event::Empty(ref e) => {
                    let node = open_element(e)?;
                    tree.push(node);
                }
                Event::End(ref e) => {
                    let qname = e.name();
                    let name = std::str::from_utf8(qname.as_ref()).map_err(markup_error)?;
                    tree.close(name)?;
                }
                Event::Text(e) => {
                    let text = e.decode().map_err(markup_error)?;
                    tree.push_text(&text);
                }
                Event::GeneralRef(e) => {
                    let raw = e.decode().map_err(markup_error)?;
                    tree.push_text(&resolve_entity(&raw));
                }
                Event::CData(e) => {
                    let text = String::from_utf8_lossy(e.as_ref()).into_owned();
                    tree.push(RawNode::leaf(RawKind::Cdata, text));
                }
                Event::Comment(e) => {
                    let text = e.decode().map_err(markup_error)?;
                    tree.push(RawNode::leaf(RawKind::Comment, text.into_owned()));
                }
                Event::Decl(_) | Event::PI(_) | Event::DocType(_) => {
                    tree.push(RawNode::leaf(RawKind::Directive, ""));
                }
                Event::Eof => break,
            }
        }

        if let Some(unclosed) = tree.open.last() {
            return Err(TemplateError::Markup(format!(
                "unclosed element <{}>",
                unclosed.name
            )));
        }

        Ok(tree.roots)
    }
}

/// Accumulates finished nodes under the innermost open element.
#[derive(Default)]
struct TreeSink {
    roots: Vec<RawNode>,
    open: Vec<RawNode>,
}

impl TreeSink {
    fn siblings(&mut self) -> &mut Vec<RawNode> {
        match self.open.last_mut() {
            Some(parent) => &mut parent.children,
            None => &mut self.roots,
        }
    }

    fn push(&mut self, node: RawNode) {
        self.siblings().push(node);
    }

    /// Entity references split text runs; adjacent runs are merged back into one node.
    fn push_text(&mut self, text: &str) {
        let siblings = self.siblings();
        match siblings.last_mut() {
            Some(last) if last.kind == RawKind::Text => last.data.push_str(text),
            _ => siblings.push(RawNode::text(text)),
        }
    }

    /// Close the innermost open element, which must be named `name`.
    /// Closing tags of void elements are ignored.
    fn close(&mut self, name: &str) -> TemplateResult<()> {
        if is_void(name) {
            return Ok(());
        }
        match self.open.pop() {
            Some(node) if node.name == name => {
                self.push(node);
                Ok(())
            }
            Some(node) => Err(TemplateError::Markup(format!(
                "expected </{}>, found </{}>",
                node.name, name
            ))),
            None => Err(TemplateError::Markup(format!(
                "closing tag </{}> without matching opening tag",
                name
            ))),
        }
    }
}

fn is_void(name: &str) -> bool {
    VOID_ELEMENTS.contains(&name)
}

fn open_element(start: &BytesStart) -> TemplateResult<RawNode> {
    let qname = start.name();
    let name = std::str::from_utf8(qname.as_ref()).map_err(markup_error)?;

    let kind = match name {
        "script" => RawKind::Script,
        "style" => RawKind::Style,
        "link" => RawKind::Link,
        _ => RawKind::Tag,
    };

    let mut node = RawNode {
        kind,
        ..RawNode::tag(name)
    };

    for attr in start.html_attributes() {
        let attr = attr.map_err(markup_error)?;
        let key = std::str::from_utf8(attr.key.as_ref()).map_err(markup_error)?;
        let value = std::str::from_utf8(&attr.value).map_err(markup_error)?;
        node.attributes.push((key.to_string(), decode_entities(value)));
    }

    Ok(node)
}

/// Decode the entity references of an attribute value.
///
/// A `&` not followed by a name or number and `;` stays as it is, so query
/// strings like `?a=1&b=2` survive.
fn decode_entities(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp + 1..];
        let name_len = after
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '#'))
            .unwrap_or(after.len());

        if name_len > 0 && after[name_len..].starts_with(';') {
            out.push_str(&resolve_entity(&after[..name_len]));
            rest = &after[name_len + 1..];
        } else {
            out.push('&');
            rest = after;
        }
    }

    out.push_str(rest);
    out
}

/// Resolve a general entity reference. Unknown named entities are kept literally.
fn resolve_entity(raw: &str) -> String {
    if let Some(rest) = raw.strip_prefix('#') {
        let code = match rest.strip_prefix('x').or_else(|| rest.strip_prefix('X')) {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => rest.parse::<u32>().ok(),
        };
        if let Some(ch) = code.and_then(char::from_u32) {
            return ch.to_string();
        }
    }

    match resolve_html5_entity(raw) {
        Some(resolved) => resolved.to_string(),
        None => format!("&{};", raw),
    }
}

fn markup_error(err: impl Display) -> TemplateError {
    TemplateError::Markup(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn tokenize(source: &str) -> Vec<RawNode> {
        MarkupTokenizer.tokenize(source).expect("tokenize")
    }

    #[test]
    fn test_preserves_case_and_self_closing() {
        let nodes = tokenize(r#"<Alert Title="Hi"/><div/>"#);
        assert_eq!(
            nodes,
            vec![
                RawNode::tag("Alert").with_attribute("Title", "Hi"),
                RawNode::tag("div"),
            ]
        );
    }

    #[test]
    fn test_nested_children_and_text() {
        let nodes = tokenize("<ul><li>one</li>\n<li>two</li></ul>");
        assert_eq!(nodes.len(), 1);
        let ul = &nodes[0];
        assert_eq!(ul.children.len(), 3);
        assert_eq!(ul.children[0].children, vec![RawNode::text("one")]);
        assert_eq!(ul.children[1], RawNode::text("\n"));
    }

    #[test]
    fn test_decodes_entities_in_text_and_attributes() {
        let nodes = tokenize(r#"<p title="a &amp; b">x &lt; y&#33;</p>"#);
        assert_eq!(nodes[0].attributes, vec![("title".to_string(), "a & b".to_string())]);
        assert_eq!(nodes[0].children, vec![RawNode::text("x < y!")]);
    }

    #[test]
    fn test_directive_attribute_names() {
        let nodes = tokenize(r#"<button @data-attr class="@data-state">Go</button>"#);
        assert_eq!(
            nodes[0].attributes,
            vec![
                ("@data-attr".to_string(), String::new()),
                ("class".to_string(), "@data-state".to_string()),
            ]
        );
    }

    #[test]
    fn test_classifies_comment_script_style_link() {
        let nodes =
            tokenize("<!-- c --><script>x</script><style>p{}</style><link href=\"a.css\"/>");
        let kinds: Vec<RawKind> = nodes.iter().map(|n| n.kind).collect();
        assert_eq!(
            kinds,
            vec![RawKind::Comment, RawKind::Script, RawKind::Style, RawKind::Link]
        );
    }

    #[test]
    fn test_unclosed_element_is_an_error() {
        let result = MarkupTokenizer.tokenize("<div><p>text</p>");
        assert!(matches!(result, Err(TemplateError::Markup(_))));
    }

    #[test]
    fn test_mismatched_end_is_an_error() {
        let result = MarkupTokenizer.tokenize("<div></span>");
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_entity_kept_literally() {
        assert_eq!(resolve_entity("bogus"), "&bogus;");
        assert_eq!(resolve_entity("nbsp"), "\u{a0}");
        assert_eq!(resolve_entity("#x41"), "A");
    }

    #[test]
    fn test_void_elements_need_no_closing_tag() {
        let nodes = tokenize("<p>a<br>b</p>");
        assert_eq!(
            nodes,
            vec![RawNode::tag("p")
                .with_child(RawNode::text("a"))
                .with_child(RawNode::tag("br"))
                .with_child(RawNode::text("b"))]
        );

        let nodes = tokenize(r#"<form><input name="q" value="x"><hr></form>"#);
        let form = &nodes[0];
        assert_eq!(form.children.len(), 2);
        assert_eq!(
            form.children[0],
            RawNode::tag("input")
                .with_attribute("name", "q")
                .with_attribute("value", "x")
        );
        assert_eq!(form.children[1], RawNode::tag("hr"));
    }

    #[test]
    fn test_void_link_is_classified() {
        let nodes = tokenize(r#"<div><link rel="stylesheet" href="a.css"><p>x</p></div>"#);
        let kinds: Vec<RawKind> = nodes[0].children.iter().map(|n| n.kind).collect();
        assert_eq!(kinds, vec![RawKind::Link, RawKind::Tag]);
    }

    #[test]
    fn test_stray_void_closing_tag_is_ignored() {
        let nodes = tokenize("<p>a<br></br>b</p></br>");
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].children.len(), 3);
    }

    #[test]
    fn test_bare_ampersand_in_attribute_is_kept() {
        let nodes = tokenize(r#"<a url="/search?a=1&b=2">x</a>"#);
        assert_eq!(
            nodes[0].attributes,
            vec![("url".to_string(), "/search?a=1&b=2".to_string())]
        );
    }

    #[test]
    fn test_bare_ampersand_in_text_is_kept() {
        let nodes = tokenize("<p>Tom & Jerry</p><p>R&D</p>");
        assert_eq!(nodes[0].children, vec![RawNode::text("Tom & Jerry")]);
        assert_eq!(nodes[1].children, vec![RawNode::text("R&D")]);
    }

    #[test]
    fn test_html_entities_decoded() {
        let nodes = tokenize(r#"<p title="a&nbsp;b">caf&eacute; &copy; 2024</p>"#);
        assert_eq!(
            nodes[0].attributes,
            vec![("title".to_string(), "a\u{a0}b".to_string())]
        );
        assert_eq!(nodes[0].children, vec![RawNode::text("caf\u{e9} \u{a9} 2024")]);
    }

    #[test]
    fn test_decode_entities_in_attribute_values() {
        assert_eq!(decode_entities("a &amp; b"), "a & b");
        assert_eq!(decode_entities("&#65;&#x42;"), "AB");
        assert_eq!(decode_entities("x & y"), "x & y");
        assert_eq!(decode_entities("trailing&"), "trailing&");
        assert_eq!(decode_entities("&bogus;"), "&bogus;");
    }
}

//! Semantic shaping of tokenizer nodes into template elements.

use regex::Regex;
use std::sync::OnceLock;

use crate::node::{next_key, Attributes, Element, ElementKind, Node, RawKind, RawNode};
use crate::translate::Translator;
use crate::value::{Map, Value};

/// HTML attribute names and their host-runtime equivalents.
/// Names not listed pass through unchanged.
pub const ATTRIBUTE_NAMES: &[(&str, &str)] = &[
    ("accept-charset", "acceptCharset"),
    ("accesskey", "accessKey"),
    ("allowfullscreen", "allowFullScreen"),
    ("autocapitalize", "autoCapitalize"),
    ("autocomplete", "autoComplete"),
    ("autocorrect", "autoCorrect"),
    ("autofocus", "autoFocus"),
    ("autoplay", "autoPlay"),
    ("autosave", "autoSave"),
    ("cellpadding", "cellPadding"),
    ("cellspacing", "cellSpacing"),
    ("charset", "charSet"),
    ("class", "className"),
    ("classid", "classID"),
    ("colspan", "colSpan"),
    ("contenteditable", "contentEditable"),
    ("contextmenu", "contextMenu"),
    ("controlslist", "controlsList"),
    ("crossorigin", "crossOrigin"),
    ("datetime", "dateTime"),
    ("enctype", "encType"),
    ("enterkeyhint", "enterKeyHint"),
    ("for", "htmlFor"),
    ("formaction", "formAction"),
    ("formenctype", "formEncType"),
    ("formmethod", "formMethod"),
    ("formnovalidate", "formNoValidate"),
    ("formtarget", "formTarget"),
    ("frameborder", "frameBorder"),
    ("hreflang", "hrefLang"),
    ("http-equiv", "httpEquiv"),
    ("inputmode", "inputMode"),
    ("itemid", "itemID"),
    ("itemprop", "itemProp"),
    ("itemref", "itemRef"),
    ("itemscope", "itemScope"),
    ("itemtype", "itemType"),
    ("keyparams", "keyParams"),
    ("keytype", "keyType"),
    ("marginheight", "marginHeight"),
    ("marginwidth", "marginWidth"),
    ("maxlength", "maxLength"),
    ("mediagroup", "mediaGroup"),
    ("minlength", "minLength"),
    ("nomodule", "noModule"),
    ("novalidate", "noValidate"),
    ("playsinline", "playsInline"),
    ("radiogroup", "radioGroup"),
    ("readonly", "readOnly"),
    ("referrerpolicy", "referrerPolicy"),
    ("rowspan", "rowSpan"),
    ("spellcheck", "spellCheck"),
    ("srcdoc", "srcDoc"),
    ("srclang", "srcLang"),
    ("srcset", "srcSet"),
    ("tabindex", "tabIndex"),
    ("usemap", "useMap"),
];

/// Containers that may only hold element children.
const TABLE_CONTAINERS: &[&str] = &["table", "tbody", "thead", "tfoot", "tr"];

/// Tags whose `value` is an initial value only.
const INPUT_TAGS: &[&str] = &["input", "select", "textarea"];

pub fn host_attribute_name(name: &str) -> Option<&'static str> {
    ATTRIBUTE_NAMES
        .iter()
        .find(|(html, _)| *html == name)
        .map(|(_, host)| *host)
}

/// Normalizes raw nodes against a translator and translation domain.
pub struct Normalizer<'a> {
    translator: &'a dyn Translator,
    domain: &'a str,
}

impl<'a> Normalizer<'a> {
    pub fn new(translator: &'a dyn Translator, domain: &'a str) -> Self {
        Normalizer { translator, domain }
    }

    /// Normalize one raw node. Children are not visited; the returned element has none.
    ///
    /// Returns `None` for dropped nodes: comments, scripts, styles, links, empty text,
    /// text directly inside a table container, and any kind not modeled here.
    pub fn normalize(&self, raw: &RawNode, parent: Option<&str>) -> Option<Node> {
        match raw.kind {
            RawKind::Text => {
                if raw.data.is_empty() {
                    return None;
                }
                if parent.is_some_and(|p| TABLE_CONTAINERS.contains(&p)) {
                    return None;
                }
                Some(Node::Text(raw.data.clone()))
            }
            RawKind::Tag => Some(Node::Element(Element {
                name: raw.name.clone(),
                kind: ElementKind::Tag,
                attributes: self.normalize_attributes(&raw.attributes, &raw.name),
                children: Vec::new(),
                key: next_key(),
            })),
            RawKind::Comment | RawKind::Script | RawKind::Style | RawKind::Link => None,
            RawKind::Cdata | RawKind::Directive => None,
        }
    }

    pub fn normalize_attributes(&self, attributes: &[(String, String)], tag: &str) -> Attributes {
        let is_input = INPUT_TAGS.contains(&tag);
        let mut out = Attributes::new();

        for (name, raw) in attributes {
            let value = if name == "style" {
                Value::Map(parse_style(raw))
            } else {
                match coerce_bool(raw) {
                    Some(b) => Value::Bool(b),
                    None => match lang_key(raw) {
                        Some(key) => Value::String(self.translator.translate(key, self.domain)),
                        None => Value::String(raw.clone()),
                    },
                }
            };

            let name = if name == "value" && is_input {
                "defaultValue"
            } else {
                host_attribute_name(name).unwrap_or(name.as_str())
            };

            out.insert(name.to_string(), value);
        }

        out
    }
}

/// `"true"` and `"false"` become native booleans; everything else is left alone.
pub fn coerce_bool(value: &str) -> Option<bool> {
    match value {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

/// Parse `{key: value, key2: value2}` into a style mapping.
///
/// Braces are optional. Each pair is split on its first colon and both sides are
/// trimmed; pairs with no colon or an empty property are skipped.
pub fn parse_style(style: &str) -> Map {
    let stripped: String = style.chars().filter(|c| *c != '{' && *c != '}').collect();
    let mut out = Map::new();

    for pair in stripped.split(',') {
        let Some((key, value)) = pair.split_once(':') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        out.insert(key.to_string(), Value::String(value.trim().to_string()));
    }

    out
}

/// Extract `<key>` from an `@lang(<key>)` value.
pub fn lang_key(value: &str) -> Option<&str> {
    static LANG_REGEX: OnceLock<Regex> = OnceLock::new();
    let re = LANG_REGEX.get_or_init(|| Regex::new(r"^\s*@lang\((.*)\)\s*$").unwrap());
    re.captures(value)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

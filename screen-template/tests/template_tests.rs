use pretty_assertions::assert_eq;
use screen_template::{
    Component, Context, Engine, EngineBuilder, EngineConfig, Node, Rendered, RenderedElement,
    Router, TemplateSources, Value,
};
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

fn get_template_path(filename: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("templates");
    path.push(filename);
    path
}

fn screens_engine() -> Engine {
    let config = EngineConfig::from_file(get_template_path("screens.yaml")).unwrap();
    Engine::from_config(&config)
}

fn profile_context() -> Context {
    let json = fs::read_to_string(get_template_path("profile.json")).unwrap();
    Context::from(serde_json::from_str::<serde_json::Value>(&json).unwrap())
}

/// Every element named `name`, depth-first, looking through fragments.
fn find_all<'a>(tree: &'a [Rendered], name: &str) -> Vec<&'a RenderedElement> {
    let mut out = Vec::new();
    for node in tree {
        for element in node.elements() {
            if element.name == name {
                out.push(element);
            }
            out.extend(find_all(&element.children, name));
        }
    }
    out
}

fn find<'a>(tree: &'a [Rendered], name: &str) -> &'a RenderedElement {
    find_all(tree, name)
        .into_iter()
        .next()
        .unwrap_or_else(|| panic!("no <{}> rendered", name))
}

fn strip_keys(nodes: &[Node]) -> Vec<Node> {
    nodes
        .iter()
        .map(|n| match n {
            Node::Element(e) => {
                let mut e = e.clone();
                e.key = String::new();
                e.children = strip_keys(&e.children);
                Node::Element(e)
            }
            text => text.clone(),
        })
        .collect()
}

#[derive(Default)]
struct RecordingRouter {
    visited: Mutex<Vec<String>>,
}

impl Router for RecordingRouter {
    fn is_same_site(&self, url: &str) -> bool {
        url.starts_with("https://app.example")
    }

    fn navigate(&self, url: &str) {
        self.visited.lock().unwrap().push(url.to_string());
    }
}

#[test]
fn test_screens_config_loads() {
    let config = EngineConfig::from_file(get_template_path("screens.yaml")).unwrap();
    assert_eq!(config.default_template_id, "/index");
    assert_eq!(config.host.as_deref(), Some("https://app.example"));
    assert_eq!(config.templates.len(), 3);
}

#[test]
fn test_profile_renders_against_json_context() {
    let engine = screens_engine();
    let tree = engine.render("/profile", &profile_context()).unwrap();

    let header = find(&tree, "header");
    assert_eq!(header.attribute("className"), Some(&Value::from("bar dark")));
    assert_eq!(find(&tree, "h1").children[0].text_content(), "Painel");

    let button = find(&tree, "button");
    assert_eq!(button.attribute("disabled"), Some(&Value::Bool(false)));

    let badge = find(&tree, "span");
    assert_eq!(badge.attribute("className"), Some(&Value::from("badge")));
    // text content is never substituted
    assert_eq!(badge.children[0].text_content(), "@data-unread");

    let tags: Vec<_> = find_all(&tree, "li")
        .iter()
        .map(|li| li.attribute("className").cloned())
        .collect();
    assert_eq!(
        tags,
        vec![Some(Value::from("tag tag-new")), Some(Value::from("tag tag-vip"))]
    );

    let table = find(&tree, "table");
    assert_eq!(table.children.len(), 1);
    let tds = find_all(&tree, "td");
    assert_eq!(tds[1].attribute("title"), Some(&Value::from("Ada")));

    assert_eq!(
        find(&tree, "label").attribute("htmlFor"),
        Some(&Value::from("email"))
    );
    let input = find(&tree, "input");
    assert_eq!(
        input.attribute("defaultValue"),
        Some(&Value::from("ada@example.com"))
    );
    assert_eq!(input.attribute("readOnly"), Some(&Value::Bool(true)));
    assert!(input.attribute("value").is_none());
}

#[test]
fn test_profile_conditionals_hide_content() {
    let engine = screens_engine();
    let ctx = Context::new().with("role", "guest").with("unread", 0);
    let tree = engine.render("/profile", &ctx).unwrap();
    assert!(find_all(&tree, "button").is_empty());
    assert!(find_all(&tree, "span").is_empty());
    // missing theme token is dropped
    assert_eq!(
        find(&tree, "header").attribute("className"),
        Some(&Value::from("bar"))
    );
}

#[test]
fn test_unknown_template_falls_back_to_default() {
    let engine = screens_engine();
    let tree = engine.render("/nope", &Context::new()).unwrap();
    let main = find(&tree, "main");
    assert_eq!(main.attribute("className"), Some(&Value::from("page")));
    assert_eq!(find(&tree, "p").children[0].text_content(), "Welcome");
}

#[test]
fn test_resolve_twice_shares_the_cached_tree() {
    let engine = screens_engine();
    let first = engine.resolve_template("/profile").unwrap().unwrap();
    let second = engine.resolve_template("/profile").unwrap().unwrap();
    assert!(Arc::ptr_eq(first.template(), second.template()));
}

#[test]
fn test_build_twice_is_structurally_identical() {
    let engine = screens_engine();
    let source =
        r#"<div class="a"><If context="@data-x" is="y"><b disabled="true">x</b></If></div>"#;
    let first = engine.build(source).unwrap();
    let second = engine.build(source).unwrap();
    assert_eq!(strip_keys(&first), strip_keys(&second));
    assert_ne!(
        first[0].as_element().unwrap().key,
        second[0].as_element().unwrap().key
    );
}

#[test]
fn test_anchor_rewrite_uses_router() {
    let router = Arc::new(RecordingRouter::default());
    let engine = EngineBuilder::new()
        .sources(TemplateSources::new().with(
            "/links",
            concat!(
                r#"<nav><a url="http://external.example/x">out</a>"#,
                r#"<a url="https://app.example/in">in</a></nav>"#,
            ),
        ))
        .router(router.clone())
        .build();

    let tree = engine.render("/links", &Context::new()).unwrap();
    let anchors = find_all(&tree, "a");
    assert!(anchors[1].attribute("onClick").is_none());

    let handler = anchors[0]
        .attribute("onClick")
        .and_then(Value::as_handler)
        .expect("synthetic click handler");
    handler.call();
    assert_eq!(
        *router.visited.lock().unwrap(),
        vec!["http://external.example/x".to_string()]
    );
}

#[test]
fn test_html_markup_renders() {
    let engine = Engine::builder()
        .sources(TemplateSources::new().with(
            "/search",
            concat!(
                r#"<form><input name="q" value="@data-q"><br>"#,
                r#"<a url="/search?a=1&b=2">Tom & Jerry&nbsp;&eacute;</a></form>"#,
            ),
        ))
        .build();

    let tree = engine
        .render("/search", &Context::new().with("q", "rust"))
        .unwrap();
    let form = find(&tree, "form");
    assert_eq!(form.children.len(), 3);
    assert_eq!(
        find(&tree, "input").attribute("defaultValue"),
        Some(&Value::from("rust"))
    );
    assert_eq!(find_all(&tree, "br").len(), 1);

    let anchor = find(&tree, "a");
    assert_eq!(anchor.attribute("url"), Some(&Value::from("/search?a=1&b=2")));
    assert_eq!(anchor.children[0].text_content(), "Tom & Jerry\u{a0}\u{e9}");
}

#[test]
fn test_registered_component_expands_and_can_be_overridden() {
    let engine = Engine::builder()
        .sources(TemplateSources::new().with(
            "/alerts",
            r#"<div><Alert level="warn">Disk almost full</Alert><Alert/></div>"#,
        ))
        .build();
    engine
        .register_component(
            Component::new("Alert")
                .with_attribute("role", "alert")
                .with_children(vec![Node::text("Something happened")]),
        )
        .unwrap();

    let tree = engine.render("/alerts", &Context::new()).unwrap();
    let div = find(&tree, "div");
    let instances: Vec<_> = div
        .children
        .iter()
        .filter_map(|c| match c {
            Rendered::Component(instance) => Some(instance),
            _ => None,
        })
        .collect();
    assert_eq!(instances.len(), 2);
    assert_eq!(instances[0].attributes.get("role"), Some(&Value::from("alert")));
    assert_eq!(instances[0].children, vec![Node::text("Disk almost full")]);
    assert_eq!(instances[1].children, vec![Node::text("Something happened")]);

    // an override intercepts a plain tag of the same name
    let ctx = Context::new().with_override("div", |element| {
        Rendered::Text(format!("{} children", element.children.len()))
    });
    let tree = engine.render("/alerts", &ctx).unwrap();
    assert_eq!(tree[0], Rendered::Text("2 children".to_string()));
}

#[test]
fn test_concurrent_renders_share_one_engine() {
    let engine = screens_engine();
    let ctx = profile_context();
    std::thread::scope(|s| {
        let handles: Vec<_> = (0..4)
            .map(|_| s.spawn(|| engine.render("/profile", &ctx).unwrap()))
            .collect();
        for handle in handles {
            let tree = handle.join().unwrap();
            assert_eq!(find_all(&tree, "li").len(), 2);
        }
    });
    assert_eq!(engine.templates().len(), 2);
}

#[test]
fn test_rendered_tree_serializes_to_json() {
    let engine = screens_engine();
    let tree = engine.render("/index", &Context::new().with("theme", "dark")).unwrap();
    let json = serde_json::to_value(&tree).unwrap();

    let main = &json[0]["element"];
    assert_eq!(main["name"], "main");
    assert_eq!(main["attributes"]["className"], "page");

    let anchors = find_all(&tree, "a");
    let help = serde_json::to_value(anchors[1]).unwrap();
    assert_eq!(help["attributes"]["onClick"], serde_json::Value::Null);
    assert_eq!(help["attributes"]["url"], "https://docs.example/help");
}

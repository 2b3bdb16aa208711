//! End-to-end render pipeline tests: untyped document in, rendered tree out.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use trellis_core::{
    Behavior, KindHandle, Registry, RegistrySet, RenderContext, RenderableFactory, ViewNode,
    WarningKind,
};
use trellis_render::{PageRenderer, RenderOptions};
use trellis_schema::{Migration, Migrator};

/// Constructs a payload naming the component, the serving provider, and the
/// declared props, which is enough to assert on tree shape and content.
struct EchoFactory;

#[async_trait]
impl RenderableFactory for EchoFactory {
    async fn construct(&self, node: &ViewNode, ctx: &RenderContext) -> anyhow::Result<Value> {
        Ok(json!({
            "component": node.kind,
            "provider": ctx.provider,
            "props": node.props,
        }))
    }
}

fn echo() -> Arc<dyn RenderableFactory> {
    Arc::new(EchoFactory)
}

fn catalog() -> Arc<RegistrySet> {
    let noop: Arc<dyn Behavior> = Arc::new(|_: &[Value]| {});
    let kinds = Registry::builder("kind")
        .register("Card", KindHandle::fixed(EchoFactory))
        .register("Text", KindHandle::fixed(EchoFactory))
        .register("Grid", KindHandle::fixed(EchoFactory))
        // Registered for the web provider only; other providers fall back
        // to nothing and fail resolution.
        .register("Chart", KindHandle::per_provider([("web", echo())]))
        // Registered under a non-requested provider to exercise fallback.
        .register("Badge", KindHandle::per_provider([("default", echo())]))
        .build();
    let templates = Registry::builder("template")
        .register("Dashboard", KindHandle::fixed(EchoFactory))
        .build();
    let behaviors = Registry::builder("behavior")
        .register("navigate", Arc::clone(&noop))
        .register("refresh", noop)
        .build();
    Arc::new(RegistrySet::new(kinds, templates, behaviors))
}

#[tokio::test]
async fn well_formed_page_renders_cleanly() {
    let renderer = PageRenderer::new(catalog());
    let doc = json!({
        "metadata": {"title": "Home", "description": "Landing page"},
        "templateKind": "Dashboard",
        "slots": {
            "main": {
                "kind": "Card",
                "props": {"elevation": 2},
                "on": {"click": {"behavior": "navigate", "params": ["/detail"]}},
                "children": [
                    {"kind": "Text", "props": {"children": "Welcome"}}
                ]
            }
        }
    });

    let result = renderer
        .render_page(doc, &RenderOptions::new("web"))
        .await;

    assert!(result.is_clean(), "unexpected errors: {:?}", result.errors);
    assert!(result.warnings.is_empty());

    let tree = result.tree.unwrap();
    assert_eq!(tree.kind, "Dashboard");
    assert_eq!(tree.payload["props"]["title"], json!("Home"));

    let main = tree.slot("main").unwrap();
    assert_eq!(main.len(), 1);
    let card = &main[0];
    assert_eq!(card.kind, "Card");
    assert_eq!(card.provider.as_deref(), Some("web"));
    assert_eq!(card.events.len(), 1);
    assert_eq!(card.events[0].behavior, "navigate");

    let text = &card.items().unwrap()[0];
    assert_eq!(text.payload["props"]["children"], json!("Welcome"));
}

#[tokio::test]
async fn unknown_template_fails_validation_with_its_path() {
    let renderer = PageRenderer::new(catalog());
    let doc = json!({
        "metadata": {"title": "Home"},
        "templateKind": "DoesNotExist",
        "slots": {}
    });

    let result = renderer.render_page(doc, &RenderOptions::new("web")).await;

    assert!(result.tree.is_none());
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].code(), "VALIDATION");
    assert_eq!(
        result.errors[0].path().unwrap().to_string(),
        "templateKind"
    );
}

#[tokio::test]
async fn validation_collects_every_issue_with_paths() {
    let renderer = PageRenderer::new(catalog());
    let doc = json!({
        "metadata": {"title": "Home"},
        "templateKind": "Dashboard",
        "slots": {
            "main": {
                "kind": "Card",
                "children": [
                    {"kind": "Text"},
                    {"kind": "Text"},
                    {"kind": "Sparkline"}
                ],
                "on": {"click": "teleport"}
            }
        }
    });

    let result = renderer.render_page(doc, &RenderOptions::new("web")).await;

    assert!(result.tree.is_none());
    let paths: Vec<String> = result
        .errors
        .iter()
        .filter_map(|e| e.path().map(|p| p.to_string()))
        .collect();
    assert!(paths.contains(&"slots.main.children[2].kind".to_string()));
    assert!(paths.contains(&"slots.main.on.click".to_string()));
    assert_eq!(result.errors.len(), 2);
}

#[tokio::test]
async fn sibling_slots_are_isolated_from_each_other() {
    let renderer = PageRenderer::new(catalog());
    // "Chart" exists only for web; rendering for mobile fails resolution in
    // the left slot while the right slot renders normally.
    let doc = json!({
        "metadata": {"title": "Split"},
        "templateKind": "Dashboard",
        "slots": {
            "left": {"kind": "Chart", "props": {"series": [1, 2, 3]}},
            "right": {"kind": "Text", "props": {"children": "ok"}}
        }
    });

    let result = renderer
        .render_page(doc, &RenderOptions::new("mobile"))
        .await;

    let tree = result.tree.unwrap();
    let left = tree.slot("left").unwrap();
    let right = tree.slot("right").unwrap();

    assert!(left[0].is_placeholder());
    // Placeholders keep the attempted props for diagnostics.
    assert_eq!(left[0].payload["series"], json!([1, 2, 3]));
    assert!(!right[0].is_placeholder());
    assert_eq!(result.errors.len(), 1);
    assert_eq!(
        result.errors[0].path().unwrap().to_string(),
        "slots.left"
    );
}

#[tokio::test]
async fn provider_fallback_renders_with_one_warning() {
    let renderer = PageRenderer::new(catalog());
    let doc = json!({
        "metadata": {"title": "Badges"},
        "templateKind": "Dashboard",
        "slots": {"main": {"kind": "Badge", "props": {"label": "new"}}}
    });

    let result = renderer.render_page(doc, &RenderOptions::new("web")).await;

    let tree = result.tree.unwrap();
    let badge = &tree.slot("main").unwrap()[0];
    assert!(!badge.is_placeholder());
    assert_eq!(badge.provider.as_deref(), Some("default"));

    assert!(result.errors.is_empty());
    assert_eq!(result.warnings.len(), 1);
    assert_eq!(result.warnings[0].kind, WarningKind::Fallback);
    assert_eq!(result.warnings[0].node_kind, "Badge");
    assert_eq!(result.warnings[0].requested_provider, "web");
    assert_eq!(result.warnings[0].fallback_provider.as_deref(), Some("default"));
}

#[tokio::test]
async fn depth_ceiling_stops_runaway_nesting() {
    let renderer = PageRenderer::new(catalog());
    // Card nested five deep, rendered with a ceiling of 3. Slot roots are
    // depth 0, so the node at depth 3 becomes the placeholder.
    let doc = json!({
        "metadata": {"title": "Deep"},
        "templateKind": "Dashboard",
        "slots": {
            "main": {
                "kind": "Card",
                "children": [{
                    "kind": "Card",
                    "children": [{
                        "kind": "Card",
                        "children": [{
                            "kind": "Card",
                            "children": [{"kind": "Card"}]
                        }]
                    }]
                }]
            }
        }
    });

    let options = RenderOptions::new("web").with_max_depth(3);
    let result = renderer.render_page(doc, &options).await;

    let tree = result.tree.unwrap();
    let mut node = &tree.slot("main").unwrap()[0];
    for _ in 0..3 {
        assert!(!node.is_placeholder() || node.error().unwrap().code() == "MAX_DEPTH");
        if node.is_placeholder() {
            break;
        }
        node = &node.items().unwrap()[0];
    }
    assert!(node.is_placeholder());
    assert_eq!(node.error().unwrap().code(), "MAX_DEPTH");
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].code(), "MAX_DEPTH");
}

#[tokio::test]
async fn migration_runs_before_validation() {
    // Version 1 documents used "layout" where version 2 uses "templateKind".
    let migrator = Migrator::builder()
        .register(Migration::new("1.0", "2.0", |mut doc: Value| -> anyhow::Result<Value> {
            if let Some(root) = doc.as_object_mut() {
                if let Some(layout) = root.remove("layout") {
                    root.insert("templateKind".to_string(), layout);
                }
            }
            Ok(doc)
        }))
        .build();
    let renderer = PageRenderer::new(catalog()).with_migrator(migrator);

    let doc = json!({
        "metadata": {"title": "Legacy", "version": "1.0"},
        "layout": "Dashboard",
        "slots": {"main": {"kind": "Text", "props": {"children": "migrated"}}}
    });

    let options = RenderOptions::new("web").with_target_version("2.0");
    let result = renderer.render_page(doc, &options).await;

    assert!(result.is_clean(), "unexpected errors: {:?}", result.errors);
    assert_eq!(result.tree.unwrap().kind, "Dashboard");
}

#[tokio::test]
async fn unreachable_version_fails_the_pass() {
    let renderer = PageRenderer::new(catalog()).with_migrator(Migrator::builder().build());
    let doc = json!({
        "metadata": {"title": "Ancient", "version": "0.1"},
        "templateKind": "Dashboard",
        "slots": {}
    });

    let options = RenderOptions::new("web").with_target_version("2.0");
    let result = renderer.render_page(doc, &options).await;

    assert!(result.tree.is_none());
    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].to_string().contains("no migration path"));
}

#[tokio::test]
async fn slow_sibling_stalls_only_itself_and_order_is_declared_not_completion() {
    use std::sync::Mutex;
    use std::time::Duration;

    struct TimedFactory {
        tag: &'static str,
        delay: Duration,
        completed: Arc<Mutex<Vec<&'static str>>>,
    }

    #[async_trait]
    impl RenderableFactory for TimedFactory {
        async fn construct(&self, _: &ViewNode, _: &RenderContext) -> anyhow::Result<Value> {
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.completed.lock().unwrap().push(self.tag);
            Ok(json!({"tag": self.tag}))
        }
    }

    let completed = Arc::new(Mutex::new(Vec::new()));
    let timed = |tag, millis| {
        KindHandle::fixed(TimedFactory {
            tag,
            delay: Duration::from_millis(millis),
            completed: Arc::clone(&completed),
        })
    };
    let kinds = Registry::builder("kind")
        .register("Slow", timed("slow", 50))
        .register("Fast", timed("fast", 0))
        .build();
    let templates = Registry::builder("template")
        .register("Dashboard", KindHandle::fixed(EchoFactory))
        .build();
    let registries = Arc::new(RegistrySet::new(kinds, templates, Registry::empty("behavior")));
    let renderer = PageRenderer::new(registries);

    let doc = json!({
        "metadata": {"title": "Timing"},
        "templateKind": "Dashboard",
        "slots": {
            "main": [{"kind": "Slow"}, {"kind": "Fast"}],
            "side": {"kind": "Fast"}
        }
    });

    let result = renderer.render_page(doc, &RenderOptions::new("web")).await;
    assert!(result.is_clean(), "unexpected errors: {:?}", result.errors);

    // Fast siblings complete while the slow one is still suspended.
    let completion_order = completed.lock().unwrap().clone();
    assert_eq!(completion_order, vec!["fast", "fast", "slow"]);

    // The composed tree still follows declared order, not completion order.
    let tree = result.tree.unwrap();
    let main_tags: Vec<&str> = tree
        .slot("main")
        .unwrap()
        .iter()
        .map(|n| n.payload["tag"].as_str().unwrap())
        .collect();
    assert_eq!(main_tags, vec!["slow", "fast"]);
    assert_eq!(tree.slot("side").unwrap()[0].payload["tag"], json!("fast"));
}

#[tokio::test]
async fn slot_arrays_render_in_declared_order() {
    let renderer = PageRenderer::new(catalog());
    let doc = json!({
        "metadata": {"title": "List"},
        "templateKind": "Dashboard",
        "slots": {
            "main": [
                {"kind": "Text", "props": {"children": "a"}},
                {"kind": "Text", "props": {"children": "b"}},
                {"kind": "Text", "props": {"children": "c"}}
            ]
        }
    });

    let result = renderer.render_page(doc, &RenderOptions::new("web")).await;

    let tree = result.tree.unwrap();
    let main = tree.slot("main").unwrap();
    let texts: Vec<&str> = main
        .iter()
        .map(|n| n.payload["props"]["children"].as_str().unwrap())
        .collect();
    assert_eq!(texts, vec!["a", "b", "c"]);
}

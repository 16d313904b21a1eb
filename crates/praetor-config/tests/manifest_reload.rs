//! Hot reload of handler manifests through a reloading registry.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use http::{Method, StatusCode};
use praetor_config::{Bindings, ManifestLoader};
use praetor_core::{
    Dispatcher, Exchange, Handler, Registry, Request, ResolveError, Signature, TypeProvider,
};

#[derive(Default)]
struct Orders;
impl Handler for Orders {}

const ORDERS: &str = "app::Orders";

const V1: &str = r#"
[[handler]]
name = "app::Orders"
constructor = "orders"

[[handler.action]]
name = "list"
invoke = "orders.list_html"
verbs = ["GET"]
produces = "text/html"
"#;

const V2: &str = r#"
[[handler]]
name = "app::Orders"
constructor = "orders"

[[handler.action]]
name = "list"
invoke = "orders.list_json"
verbs = ["GET"]
produces = "application/json"

[[handler.action]]
name = "purge"
invoke = "orders.purge"
verbs = ["DELETE"]
"#;

fn bindings() -> Bindings {
    Bindings::new()
        .constructor("orders", Orders::default)
        .action("orders.list_html", |_: &mut Orders, ex: &mut Exchange| {
            ex.response.write("<ul></ul>");
            Ok(())
        })
        .action("orders.list_json", |_: &mut Orders, ex: &mut Exchange| {
            ex.response.write("[]");
            Ok(())
        })
        .action("orders.purge", |_: &mut Orders, ex: &mut Exchange| {
            ex.response.set_status(StatusCode::NO_CONTENT);
            Ok(())
        })
}

fn write(path: &Path, content: &str) {
    fs::write(path, content).unwrap();
}

#[test]
fn test_reloading_registry_observes_manifest_edits() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("handlers.toml");
    write(&path, V1);

    let registry = Arc::new(Registry::reloading(ManifestLoader::new(&path, bindings())));
    let provider = TypeProvider::for_signature(&registry, Signature::new(ORDERS));
    let dispatcher = Dispatcher::new();

    let response = dispatcher.dispatch(&provider, Request::new(Method::GET, "/orders"));
    assert_eq!(response.body_text(), "<ul></ul>");
    assert_eq!(
        response.content_type().map(ToString::to_string).as_deref(),
        Some("text/html")
    );
    let response = dispatcher.dispatch(&provider, Request::new(Method::DELETE, "/orders"));
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);

    write(&path, V2);

    let response = dispatcher.dispatch(&provider, Request::new(Method::GET, "/orders"));
    assert_eq!(response.body_text(), "[]");
    let response = dispatcher.dispatch(&provider, Request::new(Method::DELETE, "/orders"));
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[test]
fn test_cached_registry_ignores_manifest_edits() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("handlers.toml");
    write(&path, V1);

    let catalog = ManifestLoader::new(&path, bindings()).load_catalog().unwrap();
    let registry = Registry::cached(catalog);
    let before = registry.resolve(&Signature::new(ORDERS)).unwrap();

    write(&path, V2);
    let after = registry.resolve(&Signature::new(ORDERS)).unwrap();
    assert!(Arc::ptr_eq(&before, &after));
    assert!(after.action("purge").is_none());
}

#[test]
fn test_broken_manifest_surfaces_as_configuration_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("handlers.toml");
    write(&path, V1);

    let registry = Registry::reloading(ManifestLoader::new(&path, bindings()));
    assert!(registry.resolve(&Signature::new(ORDERS)).is_ok());

    write(&path, "[[handler]]\nname = ");
    let err = registry.resolve(&Signature::new(ORDERS)).unwrap_err();
    assert!(matches!(err, ResolveError::ContextLoad { .. }));
    assert!(err.is_configuration());

    write(&path, &V2.replace("orders.purge", "orders.missing"));
    let err = registry.resolve(&Signature::new(ORDERS)).unwrap_err();
    assert!(err.to_string().contains("orders.missing"));

    write(&path, V2);
    assert_eq!(
        registry.resolve(&Signature::new(ORDERS)).unwrap().action_count(),
        2
    );
}

#[test]
fn test_dispatch_with_broken_manifest_answers_500() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing.toml");

    let registry = Arc::new(Registry::reloading(ManifestLoader::new(&path, bindings())));
    let provider = TypeProvider::for_signature(&registry, Signature::new(ORDERS));

    let response = Dispatcher::new().dispatch(&provider, Request::new(Method::GET, "/orders"));
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

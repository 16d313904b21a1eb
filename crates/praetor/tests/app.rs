//! End-to-end dispatch through an assembled application.

use std::fs;
use std::sync::Arc;

use http::{Method, StatusCode};
use praetor::config::DispatchConfig;
use praetor::prelude::*;

fn orders_app() -> App {
    App::builder()
        .catalog(fixtures::catalog())
        .route(
            Resource::new("pages")
                .with_signature(Signature::new(fixtures::DERIVED))
                .with_child(
                    Resource::new("edit")
                        .with_signature(Signature::with_filter(fixtures::DERIVED, "edit")),
                ),
        )
        .route(Resource::new("orders").with_signature(Signature::new(fixtures::ORDERS)))
        .build()
        .unwrap()
}

#[test]
fn test_negotiated_responses() {
    let app = orders_app();

    let html = app.handle(Request::new(Method::GET, "/orders").with_accept("text/html"));
    assert_eq!(html.body_text(), "orders:list_html");
    assert_eq!(html.content_type().unwrap().to_string(), "text/html");

    let json = app.handle(Request::new(Method::GET, "/orders").with_accept("application/json"));
    assert_eq!(json.body_text(), "orders:list_json");

    let created = app.handle(
        Request::new(Method::POST, "/orders")
            .with_content_type("application/json")
            .with_body("{\"id\":1}"),
    );
    assert_eq!(created.status(), StatusCode::CREATED);
    assert_eq!(created.body_text(), "orders:create");

    let upload = app.handle(
        Request::new(Method::POST, "/orders")
            .with_content_type("text/csv")
            .with_body("id\n1\n"),
    );
    assert_eq!(upload.body_text(), "orders:upload");
}

#[test]
fn test_rejections() {
    let app = orders_app();

    let put = app.handle(Request::new(Method::PUT, "/orders"));
    assert_eq!(put.status(), StatusCode::METHOD_NOT_ALLOWED);

    let xml = app.handle(Request::new(Method::POST, "/orders").with_content_type("text/xml"));
    assert_eq!(xml.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);

    let png = app.handle(Request::new(Method::GET, "/orders").with_accept("image/png"));
    assert_eq!(png.status(), StatusCode::NOT_ACCEPTABLE);
}

#[test]
fn test_routes_and_filters() {
    let app = orders_app();

    let page = app.handle(Request::new(Method::GET, "/pages").with_accept("text/html"));
    assert_eq!(page.body_text(), "derived:show");

    let edit = app.handle(Request::new(Method::GET, "/pages/edit"));
    assert_eq!(edit.body_text(), "derived:edit");

    assert_eq!(
        app.path_of(&Signature::with_filter(fixtures::DERIVED, "edit")),
        Some("/pages/edit")
    );

    let root = app.handle(Request::new(Method::GET, "/"));
    assert_eq!(root.status(), StatusCode::NOT_FOUND);
    let unknown = app.handle(Request::new(Method::GET, "/pages/missing"));
    assert_eq!(unknown.status(), StatusCode::NOT_FOUND);
}

#[test]
fn test_failed_action_reaches_boundary() {
    let app = App::builder()
        .catalog(fixtures::catalog())
        .route(Resource::new("orders").with_signature(Signature::new(fixtures::ORDERS)))
        .boundary(|error: DispatchError| {
            let mut response = Response::new();
            response.send_error(StatusCode::BAD_REQUEST);
            response.write(error.to_string());
            response
        })
        .build()
        .unwrap();

    let response = app.handle(
        Request::new(Method::POST, "/orders")
            .with_content_type("application/json")
            .with_body("not json"),
    );
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(response.body_text().contains("not a JSON object"));
}

struct Greeting(String);

struct Greeter {
    greeting: Arc<Greeting>,
}

impl Handler for Greeter {}

#[test]
fn test_injected_services() {
    let catalog = Catalog::new().with(
        HandlerClass::new("app::Greeter")
            .injected(|services: &Container| {
                Ok(Greeter {
                    greeting: services.resolve_required()?,
                })
            })
            .action(
                ActionDecl::typed("hello", |g: &mut Greeter, ex: &mut Exchange| {
                    ex.response.write(&g.greeting.0);
                    Ok(())
                })
                .get(),
            ),
    );

    let app = App::builder()
        .catalog(catalog)
        .factory(InjectingFactory::new(
            Container::new().with(Greeting("salve".to_string())),
        ))
        .route(Resource::new("hello").with_signature(Signature::new("app::Greeter")))
        .build()
        .unwrap();

    let response = app.handle(Request::new(Method::GET, "/hello"));
    assert_eq!(response.body_text(), "salve");
}

#[derive(Default)]
struct Clock;
impl Handler for Clock {}

const MANIFEST_V1: &str = r#"
[[handler]]
name = "app::Clock"
constructor = "clock"

[[handler.action]]
name = "now"
invoke = "clock.noon"
verbs = ["GET"]
produces = "text/plain"
"#;

fn clock_bindings() -> Bindings {
    Bindings::new()
        .constructor("clock", Clock::default)
        .action("clock.noon", |_: &mut Clock, ex: &mut Exchange| {
            ex.response.write("12:00");
            Ok(())
        })
        .action("clock.midnight", |_: &mut Clock, ex: &mut Exchange| {
            ex.response.write("00:00");
            Ok(())
        })
}

fn manifest_config(dir: &tempfile::TempDir, hot_reload: bool) -> PraetorConfig {
    PraetorConfig::builder()
        .dispatch(DispatchConfig {
            develop: true,
            hot_reload,
            manifest_path: Some(dir.path().join("handlers.toml")),
        })
        .build()
}

fn clock_app(config: PraetorConfig) -> App {
    App::builder()
        .config(config)
        .bindings(clock_bindings())
        .route(Resource::new("clock").with_signature(Signature::new("app::Clock")))
        .build()
        .unwrap()
}

#[test]
fn test_hot_reload_serves_manifest_edits() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = dir.path().join("handlers.toml");
    fs::write(&manifest, MANIFEST_V1).unwrap();

    let app = clock_app(manifest_config(&dir, true));
    assert!(app.registry().is_reloading());
    assert_eq!(app.handle(Request::new(Method::GET, "/clock")).body_text(), "12:00");

    fs::write(&manifest, MANIFEST_V1.replace("clock.noon", "clock.midnight")).unwrap();
    assert_eq!(app.handle(Request::new(Method::GET, "/clock")).body_text(), "00:00");
}

#[test]
fn test_manifest_without_hot_reload_is_read_once() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = dir.path().join("handlers.toml");
    fs::write(&manifest, MANIFEST_V1).unwrap();

    let app = clock_app(manifest_config(&dir, false));
    assert!(!app.registry().is_reloading());

    fs::write(&manifest, MANIFEST_V1.replace("clock.noon", "clock.midnight")).unwrap();
    assert_eq!(app.handle(Request::new(Method::GET, "/clock")).body_text(), "12:00");
}

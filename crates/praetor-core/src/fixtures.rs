//! Sample handler classes for tests and examples.
//!
//! Three classes are provided:
//!
//! - [`BASE`]: abstract. `show` (GET, produces `text/html`) and `save`
//!   (POST, consumes form data).
//! - [`DERIVED`]: extends `BASE`. Redeclares `show` without verbs so it
//!   inherits them, adds `export` (GET, produces `application/json`) and
//!   `edit` (GET) under the `edit` method filter.
//! - [`ORDERS`]: derives from the root. Two GET actions that differ only in
//!   what they produce, and two POST actions that differ in what they consume.
//!
//! Every action writes `<class>:<action>` to the response body.
//!
//! # Example
//!
//! ```
//! use praetor_core::{fixtures, LoadingContext};
//!
//! let catalog = fixtures::catalog();
//! assert!(catalog.load_class(fixtures::DERIVED).is_some());
//! ```

use crate::action::ActionDecl;
use crate::catalog::Catalog;
use crate::class::HandlerClass;
use crate::exchange::Exchange;
use crate::handler::Handler;

/// Abstract page class.
pub const BASE: &str = "fixtures::Base";

/// Concrete page class extending [`BASE`].
pub const DERIVED: &str = "fixtures::Derived";

/// Concrete class with negotiated actions.
pub const ORDERS: &str = "fixtures::Orders";

/// Handler used by all fixture classes.
#[derive(Debug, Default)]
pub struct Page {
    /// Number of actions run on this instance.
    pub visits: u32,
}

impl Handler for Page {}

fn writes(name: &'static str, body: &'static str) -> ActionDecl {
    ActionDecl::typed(name, move |page: &mut Page, exchange: &mut Exchange| {
        page.visits += 1;
        exchange.response.write(body);
        Ok(())
    })
}

/// The abstract [`BASE`] class.
#[must_use]
pub fn base_class() -> HandlerClass {
    HandlerClass::new(BASE)
        .action(writes("show", "base:show").get().produces("text/html"))
        .action(
            writes("save", "base:save")
                .post()
                .consumes("application/x-www-form-urlencoded"),
        )
}

/// The [`DERIVED`] class.
#[must_use]
pub fn derived_class() -> HandlerClass {
    HandlerClass::new(DERIVED)
        .extends(BASE)
        .constructor(Page::default)
        .action(writes("show", "derived:show"))
        .action(
            writes("export", "derived:export")
                .get()
                .produces("application/json"),
        )
        .action(writes("edit", "derived:edit").get().segment("edit"))
}

/// The [`ORDERS`] class.
#[must_use]
pub fn orders_class() -> HandlerClass {
    HandlerClass::new(ORDERS)
        .constructor(Page::default)
        .action(writes("list_html", "orders:list_html").get().produces("text/html"))
        .action(
            writes("list_json", "orders:list_json")
                .get()
                .produces("application/json"),
        )
        .action(
            ActionDecl::typed("create", |page: &mut Page, exchange: &mut Exchange| {
                page.visits += 1;
                anyhow::ensure!(
                    exchange.request.body().starts_with(b"{"),
                    "request body is not a JSON object"
                );
                exchange.response.set_status(http::StatusCode::CREATED);
                exchange.response.write("orders:create");
                Ok(())
            })
            .post()
            .consumes("application/json")
            .produces("application/json"),
        )
        .action(writes("upload", "orders:upload").post().consumes("text/csv"))
}

/// A catalog holding all fixture classes.
#[must_use]
pub fn catalog() -> Catalog {
    Catalog::new()
        .with(base_class())
        .with(derived_class())
        .with(orders_class())
}

//! Actions: the request-handling methods of a handler class.
//!
//! An [`ActionDecl`] is what a class registers: a name, the verbs it answers,
//! optional `consumes`/`produces` media types, an optional segment marker and
//! the code to run. When a class's action table is built each declaration
//! becomes an [`ActionDescriptor`] that also records where in the class
//! hierarchy it was declared.
//!
//! # Example
//!
//! ```
//! use praetor_core::{ActionDecl, Exchange, Handler};
//!
//! #[derive(Default)]
//! struct Orders;
//! impl Handler for Orders {}
//!
//! let decl = ActionDecl::typed("list", |_: &mut Orders, ex: &mut Exchange| {
//!     ex.response.write("[]");
//!     Ok(())
//! })
//! .get()
//! .produces("application/json");
//!
//! assert_eq!(decl.name(), "list");
//! ```

use std::fmt;
use std::sync::Arc;

use http::Method;

use crate::class::HandlerClass;
use crate::exchange::Exchange;
use crate::handler::Handler;
use crate::media::{ContentNegotiator, MediaType, MediaTypeList};

type ActionFn = dyn Fn(&mut dyn Handler, &mut Exchange) -> anyhow::Result<()> + Send + Sync;

/// Code run when an action is selected.
#[derive(Clone)]
pub struct Invoker(Arc<ActionFn>);

impl Invoker {
    /// Wraps a function over any handler.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&mut dyn Handler, &mut Exchange) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Wraps a function over a concrete handler type.
    ///
    /// Invoking it on any other handler type fails.
    pub fn typed<H, F>(f: F) -> Self
    where
        H: Handler,
        F: Fn(&mut H, &mut Exchange) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self::new(move |handler, exchange| {
            let handler = handler.as_any_mut().downcast_mut::<H>().ok_or_else(|| {
                anyhow::anyhow!("action expects handler {}", std::any::type_name::<H>())
            })?;
            f(handler, exchange)
        })
    }

    /// Runs the action.
    pub fn call(&self, handler: &mut dyn Handler, exchange: &mut Exchange) -> anyhow::Result<()> {
        (self.0)(handler, exchange)
    }
}

impl fmt::Debug for Invoker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Invoker(..)")
    }
}

/// An action as registered on a class.
#[derive(Debug, Clone)]
pub struct ActionDecl {
    name: String,
    verbs: Vec<Method>,
    consumes: Option<MediaTypeList>,
    produces: Option<MediaTypeList>,
    segment: Option<String>,
    invoker: Invoker,
}

impl ActionDecl {
    /// Declares an action with no verbs yet.
    ///
    /// A declaration without verbs is only an action if it overrides an
    /// inherited action of the same name, whose verbs it then takes over.
    pub fn new(name: impl Into<String>, invoker: Invoker) -> Self {
        Self {
            name: name.into(),
            verbs: Vec::new(),
            consumes: None,
            produces: None,
            segment: None,
            invoker,
        }
    }

    /// Declares an action over a concrete handler type.
    pub fn typed<H, F>(name: impl Into<String>, f: F) -> Self
    where
        H: Handler,
        F: Fn(&mut H, &mut Exchange) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self::new(name, Invoker::typed(f))
    }

    /// Adds a verb.
    #[must_use]
    pub fn verb(mut self, verb: Method) -> Self {
        if !self.verbs.contains(&verb) {
            self.verbs.push(verb);
        }
        self
    }

    /// Answers `GET`.
    #[must_use]
    pub fn get(self) -> Self {
        self.verb(Method::GET)
    }

    /// Answers `POST`.
    #[must_use]
    pub fn post(self) -> Self {
        self.verb(Method::POST)
    }

    /// Answers `PUT`.
    #[must_use]
    pub fn put(self) -> Self {
        self.verb(Method::PUT)
    }

    /// Answers `DELETE`.
    #[must_use]
    pub fn delete(self) -> Self {
        self.verb(Method::DELETE)
    }

    /// Restricts the request content types, e.g. `"application/json, text/*"`.
    #[must_use]
    pub fn consumes(mut self, types: &str) -> Self {
        self.consumes = Some(MediaTypeList::parse(types));
        self
    }

    /// Declares the producible response types.
    #[must_use]
    pub fn produces(mut self, types: &str) -> Self {
        self.produces = Some(MediaTypeList::parse(types));
        self
    }

    /// Marks the action as belonging to a method-filtered signature.
    #[must_use]
    pub fn segment(mut self, segment: impl Into<String>) -> Self {
        self.segment = Some(segment.into());
        self
    }

    /// Returns the action name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the declared verbs.
    pub fn verbs(&self) -> &[Method] {
        &self.verbs
    }

    /// Returns the segment marker.
    pub fn segment_marker(&self) -> Option<&str> {
        self.segment.as_deref()
    }
}

/// An action placed in a class hierarchy.
///
/// `depth` is the hierarchy level of the declaring class (its parent's depth
/// plus one) and `index` its position among that class's actions.
#[derive(Debug)]
pub struct ActionDescriptor {
    name: String,
    declared_by: String,
    depth: usize,
    index: usize,
    verbs: Vec<Method>,
    consumes: Option<MediaTypeList>,
    produces: Option<MediaTypeList>,
    invoker: Invoker,
}

impl ActionDescriptor {
    /// Builds a descriptor from a declaration.
    ///
    /// Verbs, consumes and produces missing from `decl` are taken from
    /// `overridden`. Returns `None` if the result has no verbs.
    pub(crate) fn from_decl(
        decl: &ActionDecl,
        declared_by: &str,
        depth: usize,
        index: usize,
        overridden: Option<&ActionDescriptor>,
    ) -> Option<Self> {
        let verbs = if decl.verbs.is_empty() {
            overridden.map(|o| o.verbs.clone()).unwrap_or_default()
        } else {
            decl.verbs.clone()
        };
        if verbs.is_empty() {
            return None;
        }
        Some(Self {
            name: decl.name.clone(),
            declared_by: declared_by.to_string(),
            depth,
            index,
            verbs,
            consumes: decl
                .consumes
                .clone()
                .or_else(|| overridden.and_then(|o| o.consumes.clone())),
            produces: decl
                .produces
                .clone()
                .or_else(|| overridden.and_then(|o| o.produces.clone())),
            invoker: decl.invoker.clone(),
        })
    }

    /// Returns the action name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the name of the class that declared the action.
    pub fn declared_by(&self) -> &str {
        &self.declared_by
    }

    /// Returns the hierarchy depth of the declaring class.
    pub const fn depth(&self) -> usize {
        self.depth
    }

    /// Returns the position among the declaring class's actions.
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Returns the verbs the action answers.
    pub fn verbs(&self) -> &[Method] {
        &self.verbs
    }

    /// Returns the declared request content types.
    pub fn consumes(&self) -> Option<&MediaTypeList> {
        self.consumes.as_ref()
    }

    /// Returns the declared response content types.
    pub fn produces(&self) -> Option<&MediaTypeList> {
        self.produces.as_ref()
    }

    /// Tests whether the action answers `verb`.
    pub fn supports(&self, verb: &Method) -> bool {
        self.verbs.contains(verb)
    }

    /// Tests whether a class deriving from the declaring class keeps this
    /// action. It does not if it declares an action of the same name.
    pub fn can_inherit(&self, class: &HandlerClass) -> bool {
        !class.declares(&self.name)
    }

    /// Tests whether the action accepts a request body of `content_type`.
    ///
    /// Actions without `consumes` accept anything. A missing request type
    /// counts as `*/*`.
    pub fn can_consume(&self, content_type: Option<&MediaType>) -> bool {
        match &self.consumes {
            None => true,
            Some(types) => {
                let any = MediaType::any();
                types.matches_some(content_type.unwrap_or(&any))
            }
        }
    }

    /// Returns the best type this action can produce for `accepted`.
    ///
    /// Actions without `produces` produce `*/*`.
    pub fn can_produce(
        &self,
        negotiator: &dyn ContentNegotiator,
        accepted: &MediaTypeList,
    ) -> Option<MediaType> {
        match &self.produces {
            Some(produced) => negotiator.negotiate(accepted, produced),
            None => negotiator.negotiate(accepted, &MediaTypeList::any()),
        }
    }

    /// Runs the action on `handler`.
    pub fn invoke(&self, handler: &mut dyn Handler, exchange: &mut Exchange) -> anyhow::Result<()> {
        tracing::trace!(action = %self, "invoking action");
        self.invoker.call(handler, exchange)
    }
}

impl fmt::Display for ActionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.declared_by, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchange::Request;
    use crate::media::QualityNegotiator;

    #[derive(Default)]
    struct Counter {
        hits: u32,
    }
    impl Handler for Counter {}

    #[derive(Default)]
    struct Other;
    impl Handler for Other {}

    fn hit() -> ActionDecl {
        ActionDecl::typed("hit", |c: &mut Counter, _: &mut Exchange| {
            c.hits += 1;
            Ok(())
        })
    }

    fn descriptor(decl: &ActionDecl) -> ActionDescriptor {
        ActionDescriptor::from_decl(decl, "test::Counter", 1, 0, None).unwrap()
    }

    #[test]
    fn test_decl_without_verbs_is_not_an_action() {
        assert!(ActionDescriptor::from_decl(&hit(), "test::Counter", 1, 0, None).is_none());
    }

    #[test]
    fn test_verbs_are_deduplicated() {
        let decl = hit().get().get().post();
        assert_eq!(decl.verbs(), &[Method::GET, Method::POST]);
    }

    #[test]
    fn test_override_inherits_missing_parts() {
        let base = descriptor(&hit().post().consumes("application/json").produces("text/plain"));
        let decl = hit().produces("text/html");
        let derived =
            ActionDescriptor::from_decl(&decl, "test::Derived", 2, 0, Some(&base)).unwrap();

        assert_eq!(derived.verbs(), &[Method::POST]);
        assert_eq!(derived.consumes().unwrap().to_string(), "application/json");
        assert_eq!(derived.produces().unwrap().to_string(), "text/html");
        assert_eq!(derived.to_string(), "test::Derived#hit");
    }

    #[test]
    fn test_can_consume() {
        let open = descriptor(&hit().post());
        let json = descriptor(&hit().post().consumes("application/json"));
        let ct = MediaType::parse("application/json").unwrap();
        let xml = MediaType::parse("text/xml").unwrap();

        assert!(open.can_consume(None));
        assert!(open.can_consume(Some(&xml)));
        assert!(json.can_consume(Some(&ct)));
        assert!(!json.can_consume(Some(&xml)));
        assert!(json.can_consume(None));
    }

    #[test]
    fn test_can_produce() {
        let html = descriptor(&hit().get().produces("text/html"));
        let accepts_html = MediaTypeList::parse("text/*");
        let accepts_png = MediaTypeList::parse("image/png");

        let best = html.can_produce(&QualityNegotiator, &accepts_html).unwrap();
        assert_eq!(best.to_string(), "text/html");
        assert!(html.can_produce(&QualityNegotiator, &accepts_png).is_none());

        let anything = descriptor(&hit().get());
        assert!(anything.can_produce(&QualityNegotiator, &accepts_png).is_some());
    }

    #[test]
    fn test_typed_invoker() {
        let action = descriptor(&hit().get());
        let mut exchange = Exchange::new(Request::new(Method::GET, "/"));

        let mut counter = Counter::default();
        action.invoke(&mut counter, &mut exchange).unwrap();
        action.invoke(&mut counter, &mut exchange).unwrap();
        assert_eq!(counter.hits, 2);

        let err = action.invoke(&mut Other, &mut exchange).unwrap_err();
        assert!(err.to_string().contains("Counter"));
    }
}

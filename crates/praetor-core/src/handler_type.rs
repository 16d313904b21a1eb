//! Handler types and action negotiation.
//!
//! A [`HandlerType`] is the resolved, immutable form of a signature: its
//! class, its action table indexed by verb, and how to create and negotiate
//! for instances. Handler types are shared across threads and requests.
//!
//! # Negotiation
//!
//! [`HandlerType::resolve`] picks the action for a request:
//!
//! 1. No action answers the verb: `405 Method Not Allowed`.
//! 2. Every candidate is checked in table order. A candidate that accepts the
//!    request content type and can produce an acceptable response type
//!    replaces any earlier match, so the **last** match in table order wins.
//! 3. No match but some candidate accepted the content type:
//!    `406 Not Acceptable`. Otherwise `415 Unsupported Media Type`.
//!
//! Because tables list deeper classes and later declarations first, the last
//! match is the least specific candidate that fits. Applications rely on this
//! order; it is part of the contract.
//!
//! Each candidate is negotiated on its own. The client's quality values pick
//! the best type within one candidate but are never compared across
//! candidates, so a later fit replaces an earlier one even when its type
//! ranks lower in `Accept`.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use http::{Method, StatusCode};

use crate::action::ActionDescriptor;
use crate::class::HandlerClass;
use crate::error::ResolveError;
use crate::exchange::Request;
use crate::factory::HandlerFactory;
use crate::handler::HandlerInstance;
use crate::media::{ContentNegotiator, MediaType, MediaTypeList};
use crate::signature::Signature;
use crate::table::ActionTable;

/// Result of negotiating an action for a request.
#[derive(Debug, Clone)]
pub enum NegotiationOutcome {
    /// An action was selected.
    Matched {
        /// The action to run.
        action: Arc<ActionDescriptor>,
        /// The response type, when negotiation settled on a concrete one.
        content_type: Option<MediaType>,
    },
    /// No action fits; the status is 405, 406 or 415.
    Rejected(StatusCode),
}

impl NegotiationOutcome {
    /// Returns `true` if an action was selected.
    pub const fn is_matched(&self) -> bool {
        matches!(self, Self::Matched { .. })
    }

    /// Returns the selected action.
    pub fn action(&self) -> Option<&Arc<ActionDescriptor>> {
        match self {
            Self::Matched { action, .. } => Some(action),
            Self::Rejected(_) => None,
        }
    }

    /// Returns the rejection status.
    pub const fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Matched { .. } => None,
            Self::Rejected(status) => Some(*status),
        }
    }
}

/// A resolved handler signature.
pub struct HandlerType {
    class: Arc<HandlerClass>,
    signature: Signature,
    factory: Arc<dyn HandlerFactory>,
    negotiator: Arc<dyn ContentNegotiator>,
    actions: Vec<Arc<ActionDescriptor>>,
    by_verb: HashMap<Method, Vec<Arc<ActionDescriptor>>>,
}

impl HandlerType {
    /// Creates a handler type from a built action table.
    ///
    /// Fails if the table belongs to the root or to an abstract class.
    pub fn new(
        table: &ActionTable,
        factory: Arc<dyn HandlerFactory>,
        negotiator: Arc<dyn ContentNegotiator>,
    ) -> Result<Self, ResolveError> {
        let class = table
            .class()
            .cloned()
            .ok_or_else(|| ResolveError::abstract_handler(table.signature().class_name()))?;
        if class.is_abstract() {
            return Err(ResolveError::abstract_handler(class.name()));
        }

        let actions = table.actions().to_vec();
        let mut by_verb: HashMap<Method, Vec<Arc<ActionDescriptor>>> = HashMap::new();
        for action in &actions {
            for verb in action.verbs() {
                by_verb
                    .entry(verb.clone())
                    .or_default()
                    .push(Arc::clone(action));
            }
        }

        Ok(Self {
            class,
            signature: table.signature().clone(),
            factory,
            negotiator,
            actions,
            by_verb,
        })
    }

    /// Returns the class.
    pub fn class(&self) -> &HandlerClass {
        &self.class
    }

    /// Returns the class name.
    pub fn class_name(&self) -> &str {
        self.class.name()
    }

    /// Returns the signature.
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Returns all actions in table order.
    pub fn actions(&self) -> &[Arc<ActionDescriptor>] {
        &self.actions
    }

    /// Returns the number of actions.
    pub fn action_count(&self) -> usize {
        self.actions.len()
    }

    /// Returns the action named `name`.
    pub fn action(&self, name: &str) -> Option<&Arc<ActionDescriptor>> {
        self.actions.iter().find(|a| a.name() == name)
    }

    /// Returns the actions answering `verb`, in table order.
    pub fn actions_for(&self, verb: &Method) -> &[Arc<ActionDescriptor>] {
        self.by_verb
            .get(verb)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Creates a fresh handler instance.
    pub fn create_instance(self: &Arc<Self>) -> Result<HandlerInstance, ResolveError> {
        let handler = self.factory.create(&self.class)?;
        Ok(HandlerInstance::new(handler, Arc::clone(self)))
    }

    /// Negotiates the action for a request.
    pub fn negotiate(&self, request: &Request) -> NegotiationOutcome {
        self.resolve(
            request.method(),
            request.content_type().as_ref(),
            &request.accepted_types(),
        )
    }

    /// Negotiates the action for a verb, request content type and accepted
    /// response types.
    pub fn resolve(
        &self,
        verb: &Method,
        content_type: Option<&MediaType>,
        accepted: &MediaTypeList,
    ) -> NegotiationOutcome {
        let candidates = self.actions_for(verb);
        if candidates.is_empty() {
            return NegotiationOutcome::Rejected(StatusCode::METHOD_NOT_ALLOWED);
        }

        let mut can_consume_any = false;
        let mut matched = None;
        for action in candidates {
            if !action.can_consume(content_type) {
                continue;
            }
            can_consume_any = true;
            if let Some(produced) = action.can_produce(self.negotiator.as_ref(), accepted) {
                matched = Some((action, produced));
            }
        }

        match matched {
            Some((action, produced)) => NegotiationOutcome::Matched {
                action: Arc::clone(action),
                content_type: produced.is_concrete().then_some(produced),
            },
            None if can_consume_any => NegotiationOutcome::Rejected(StatusCode::NOT_ACCEPTABLE),
            None => NegotiationOutcome::Rejected(StatusCode::UNSUPPORTED_MEDIA_TYPE),
        }
    }
}

impl fmt::Display for HandlerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Type:{}", self.class.name())
    }
}

impl fmt::Debug for HandlerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerType")
            .field("signature", &self.signature)
            .field("actions", &self.actions.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::DefaultFactory;
    use crate::fixtures;
    use crate::media::QualityNegotiator;

    fn orders() -> HandlerType {
        let table = ActionTable::build(
            Arc::new(fixtures::orders_class()),
            Signature::new(fixtures::ORDERS),
            &ActionTable::root(),
        );
        HandlerType::new(&table, Arc::new(DefaultFactory), Arc::new(QualityNegotiator)).unwrap()
    }

    fn mt(s: &str) -> MediaType {
        MediaType::parse(s).unwrap()
    }

    fn matched_name(outcome: &NegotiationOutcome) -> &str {
        outcome.action().map(|a| a.name()).unwrap_or("<rejected>")
    }

    #[test]
    fn test_unknown_verb_is_405() {
        let outcome = orders().resolve(&Method::DELETE, None, &MediaTypeList::any());
        assert_eq!(outcome.status(), Some(StatusCode::METHOD_NOT_ALLOWED));
    }

    #[test]
    fn test_accept_selects_action() {
        let outcome = orders().resolve(
            &Method::GET,
            None,
            &MediaTypeList::parse("application/json"),
        );
        assert_eq!(matched_name(&outcome), "list_json");
        assert_eq!(
            outcome_content_type(&outcome).as_deref(),
            Some("application/json")
        );
    }

    #[test]
    fn test_last_match_wins() {
        // Both GET actions can answer `*/*`; the later one in table order wins.
        let handler_type = orders();
        let order: Vec<_> = handler_type
            .actions_for(&Method::GET)
            .iter()
            .map(|a| a.name())
            .collect();
        assert_eq!(order, ["list_json", "list_html"]);

        let outcome = handler_type.resolve(&Method::GET, None, &MediaTypeList::any());
        assert_eq!(matched_name(&outcome), "list_html");
    }

    #[test]
    fn test_later_match_ignores_client_ranking() {
        let accept = MediaTypeList::parse("application/json;q=0.9, text/html;q=0.1");
        let outcome = orders().resolve(&Method::GET, None, &accept);
        assert_eq!(matched_name(&outcome), "list_html");
        assert_eq!(outcome_content_type(&outcome).as_deref(), Some("text/html"));
    }

    #[test]
    fn test_unacceptable_is_406() {
        let outcome = orders().resolve(&Method::GET, None, &MediaTypeList::parse("image/png"));
        assert_eq!(outcome.status(), Some(StatusCode::NOT_ACCEPTABLE));

        let json = mt("application/json");
        let outcome = orders().resolve(
            &Method::POST,
            Some(&json),
            &MediaTypeList::parse("image/png"),
        );
        assert_eq!(outcome.status(), Some(StatusCode::NOT_ACCEPTABLE));
    }

    #[test]
    fn test_unsupported_content_type_is_415() {
        let xml = mt("text/xml");
        let outcome = orders().resolve(&Method::POST, Some(&xml), &MediaTypeList::any());
        assert_eq!(outcome.status(), Some(StatusCode::UNSUPPORTED_MEDIA_TYPE));
    }

    #[test]
    fn test_consumes_selects_action() {
        let csv = mt("text/csv");
        let outcome = orders().resolve(&Method::POST, Some(&csv), &MediaTypeList::any());
        assert_eq!(matched_name(&outcome), "upload");
        // `upload` declares no produces, so no concrete type is negotiated.
        assert!(outcome_content_type(&outcome).is_none());
    }

    #[test]
    fn test_negotiate_reads_request() {
        let request = Request::new(Method::POST, "/orders")
            .with_content_type("application/json")
            .with_accept("application/json");
        let outcome = orders().negotiate(&request);
        assert_eq!(matched_name(&outcome), "create");
    }

    #[test]
    fn test_lookup_helpers() {
        let handler_type = orders();
        assert_eq!(handler_type.to_string(), format!("Type:{}", fixtures::ORDERS));
        assert_eq!(handler_type.action_count(), 4);
        assert!(handler_type.action("create").is_some());
        assert!(handler_type.action("missing").is_none());
        assert!(handler_type.actions_for(&Method::PATCH).is_empty());
    }

    #[test]
    fn test_abstract_class_has_no_type() {
        let table = ActionTable::build(
            Arc::new(fixtures::base_class()),
            Signature::new(fixtures::BASE),
            &ActionTable::root(),
        );
        let err = HandlerType::new(&table, Arc::new(DefaultFactory), Arc::new(QualityNegotiator))
            .unwrap_err();
        assert!(matches!(err, ResolveError::AbstractHandler { .. }));
    }

    #[test]
    fn test_create_instance() {
        let handler_type = Arc::new(orders());
        let instance = handler_type.create_instance().unwrap();
        assert!(!instance.is_bound());
        assert!(Arc::ptr_eq(instance.handler_type(), &handler_type));
    }

    fn outcome_content_type(outcome: &NegotiationOutcome) -> Option<String> {
        match outcome {
            NegotiationOutcome::Matched { content_type, .. } => {
                content_type.as_ref().map(ToString::to_string)
            }
            NegotiationOutcome::Rejected(_) => None,
        }
    }
}

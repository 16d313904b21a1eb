//! Merged, ordered action tables.
//!
//! An [`ActionTable`] holds every action a handler type can run: the ones
//! inherited from its ancestors that were not redeclared, plus its own. The
//! table is sorted deepest class first and, within a class, last declared
//! first. Negotiation scans it in that order.

use std::sync::Arc;

use crate::action::ActionDescriptor;
use crate::class::{HandlerClass, ROOT_CLASS};
use crate::signature::Signature;

/// The actions of one handler signature, in negotiation order.
#[derive(Debug)]
pub struct ActionTable {
    signature: Signature,
    class: Option<Arc<HandlerClass>>,
    depth: usize,
    actions: Vec<Arc<ActionDescriptor>>,
}

impl ActionTable {
    /// The empty table of the hierarchy root.
    #[must_use]
    pub fn root() -> Self {
        Self {
            signature: Signature::new(ROOT_CLASS),
            class: None,
            depth: 0,
            actions: Vec::new(),
        }
    }

    /// Builds the table of `class` under `signature` on top of its parent's
    /// table.
    ///
    /// `parent` must be the table of the parent class's unfiltered signature.
    #[must_use]
    pub fn build(class: Arc<HandlerClass>, signature: Signature, parent: &ActionTable) -> Self {
        let depth = parent.depth + 1;

        let mut actions: Vec<Arc<ActionDescriptor>> = parent
            .actions
            .iter()
            .filter(|a| a.can_inherit(&class))
            .cloned()
            .collect();

        let mut index = 0;
        for decl in class.actions() {
            if !signature.matches_segment(decl.segment_marker()) {
                continue;
            }
            let overridden = parent.find(decl.name());
            match ActionDescriptor::from_decl(decl, class.name(), depth, index, overridden) {
                Some(action) => {
                    actions.push(Arc::new(action));
                    index += 1;
                }
                None => tracing::debug!(
                    class = %class.name(),
                    action = %decl.name(),
                    "declaration has no verbs, not an action"
                ),
            }
        }

        actions.sort_by(|a, b| {
            b.depth()
                .cmp(&a.depth())
                .then_with(|| b.index().cmp(&a.index()))
        });

        Self {
            signature,
            class: Some(class),
            depth,
            actions,
        }
    }

    /// Returns the signature the table was built for.
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Returns the class, `None` for the root table.
    pub fn class(&self) -> Option<&Arc<HandlerClass>> {
        self.class.as_ref()
    }

    /// Returns the hierarchy depth of the class.
    pub const fn depth(&self) -> usize {
        self.depth
    }

    /// Returns the actions in negotiation order.
    pub fn actions(&self) -> &[Arc<ActionDescriptor>] {
        &self.actions
    }

    /// Returns the action named `name`.
    pub fn find(&self, name: &str) -> Option<&ActionDescriptor> {
        self.actions
            .iter()
            .find(|a| a.name() == name)
            .map(AsRef::as_ref)
    }

    /// Returns the number of actions.
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Returns `true` if the table has no actions.
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

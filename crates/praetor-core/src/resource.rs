//! Route trees and provider wiring.
//!
//! A [`Resource`] is a node in the application's route tree. Nodes that are
//! backed by a handler carry a [`Signature`]. Once the registry is known,
//! [`Resource::init_type_providers`] walks the tree and gives every such node
//! a [`TypeProvider`].
//!
//! Matching request URLs against the tree belongs to the transport layer;
//! [`Resource::find`] only follows exact path segments.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use praetor_core::{fixtures, Registry, Resource, Signature};
//!
//! let mut root = Resource::root()
//!     .with_child(Resource::new("pages").with_signature(Signature::new(fixtures::DERIVED)));
//!
//! let registry = Arc::new(Registry::cached(fixtures::catalog()));
//! let bound = root.init_type_providers(&registry);
//!
//! assert_eq!(bound[&Signature::new(fixtures::DERIVED)], "/pages");
//! assert!(root.find("/pages").unwrap().provider().handler_type().unwrap().is_some());
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use crate::provider::TypeProvider;
use crate::registry::Registry;
use crate::signature::Signature;

/// A node of the route tree.
#[derive(Debug)]
pub struct Resource {
    segment: String,
    signature: Option<Signature>,
    provider: TypeProvider,
    children: Vec<Resource>,
}

impl Resource {
    /// Creates the root node, at path `/`.
    #[must_use]
    pub fn root() -> Self {
        Self::new("")
    }

    /// Creates a node for one path segment.
    #[must_use]
    pub fn new(segment: impl Into<String>) -> Self {
        Self {
            segment: segment.into(),
            signature: None,
            provider: TypeProvider::Unbound,
            children: Vec::new(),
        }
    }

    /// Backs the node with a handler.
    ///
    /// The node's provider stays [`TypeProvider::Uninitialized`] until
    /// [`init_type_providers`](Self::init_type_providers) runs.
    #[must_use]
    pub fn with_signature(mut self, signature: Signature) -> Self {
        self.signature = Some(signature);
        self.provider = TypeProvider::Uninitialized;
        self
    }

    /// Adds a child node.
    #[must_use]
    pub fn with_child(mut self, child: Resource) -> Self {
        self.children.push(child);
        self
    }

    /// Returns the path segment.
    pub fn segment(&self) -> &str {
        &self.segment
    }

    /// Returns the handler signature.
    pub fn signature(&self) -> Option<&Signature> {
        self.signature.as_ref()
    }

    /// Returns the provider.
    pub fn provider(&self) -> &TypeProvider {
        &self.provider
    }

    /// Returns the child nodes.
    pub fn children(&self) -> &[Resource] {
        &self.children
    }

    /// Installs providers on every node with a signature.
    ///
    /// Returns the path of each bound signature. A signature bound at more
    /// than one path maps to the last one visited.
    pub fn init_type_providers(&mut self, registry: &Arc<Registry>) -> HashMap<Signature, String> {
        let mut bound = HashMap::new();
        self.init_at("", registry, &mut bound);
        tracing::debug!(
            routes = bound.len(),
            reloading = registry.is_reloading(),
            "type providers initialised"
        );
        bound
    }

    fn init_at(
        &mut self,
        parent_path: &str,
        registry: &Arc<Registry>,
        bound: &mut HashMap<Signature, String>,
    ) {
        let path = join(parent_path, &self.segment);
        if let Some(signature) = &self.signature {
            self.provider = TypeProvider::for_signature(registry, signature.clone());
            bound.insert(signature.clone(), display_path(&path));
        }
        for child in &mut self.children {
            child.init_at(&path, registry, bound);
        }
    }

    /// Finds the node at `path` by exact segment match.
    pub fn find(&self, path: &str) -> Option<&Resource> {
        path.split('/')
            .filter(|s| !s.is_empty())
            .try_fold(self, |node, segment| {
                node.children.iter().find(|c| c.segment == segment)
            })
    }
}

fn join(parent: &str, segment: &str) -> String {
    if segment.is_empty() {
        parent.to_string()
    } else {
        format!("{parent}/{segment}")
    }
}

fn display_path(path: &str) -> String {
    if path.is_empty() {
        "/".to_string()
    } else {
        path.to_string()
    }
}

//! Handler signatures.
//!
//! A [`Signature`] names a handler class plus an optional method filter. Routes
//! carry a signature which the registry resolves into a
//! [`HandlerType`](crate::HandlerType).
//!
//! The textual form is `class` or `class#filter`. Class names are Rust paths,
//! so `#` never occurs in them:
//!
//! ```
//! use praetor_core::Signature;
//!
//! let sig = Signature::parse("shop::Orders#archive").unwrap();
//! assert_eq!(sig.class_name(), "shop::Orders");
//! assert_eq!(sig.filter(), Some("archive"));
//! assert_eq!(sig.to_string(), "shop::Orders#archive");
//! ```

use std::fmt;

/// Separator between class name and method filter.
pub const SEPARATOR: char = '#';

/// Identity key of a handler type: a class name and an optional method filter.
///
/// When a filter is present only actions declared with a matching segment
/// marker take part in the handler type; without a filter only unmarked
/// actions do.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Signature {
    class_name: String,
    filter: Option<String>,
}

impl Signature {
    /// Creates a signature without a method filter.
    #[must_use]
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            filter: None,
        }
    }

    /// Creates a signature with a method filter.
    #[must_use]
    pub fn with_filter(class_name: impl Into<String>, filter: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            filter: Some(filter.into()),
        }
    }

    /// Builds the textual form of a signature.
    ///
    /// Returns `None` if `class_name` is `None`.
    ///
    /// ```
    /// use praetor_core::Signature;
    ///
    /// assert_eq!(Signature::build(Some("a::B"), None).as_deref(), Some("a::B"));
    /// assert_eq!(Signature::build(Some("a::B"), Some("x")).as_deref(), Some("a::B#x"));
    /// assert_eq!(Signature::build(None, Some("x")), None);
    /// ```
    #[must_use]
    pub fn build(class_name: Option<&str>, filter: Option<&str>) -> Option<String> {
        let class_name = class_name?;
        Some(match filter {
            Some(filter) => format!("{class_name}{SEPARATOR}{filter}"),
            None => class_name.to_string(),
        })
    }

    /// Parses the textual form of a signature.
    ///
    /// Splits on the first separator. Blank input yields `None`; any other
    /// input yields a best-effort split.
    #[must_use]
    pub fn parse(signature: &str) -> Option<Self> {
        if signature.trim().is_empty() {
            return None;
        }
        Some(match signature.split_once(SEPARATOR) {
            Some((class_name, filter)) => Self::with_filter(class_name, filter),
            None => Self::new(signature),
        })
    }

    /// Returns the class name.
    #[must_use]
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Returns the method filter, if any.
    #[must_use]
    pub fn filter(&self) -> Option<&str> {
        self.filter.as_deref()
    }

    /// Returns the signature of the same class without a filter.
    #[must_use]
    pub fn unfiltered(&self) -> Self {
        Self::new(self.class_name.clone())
    }

    /// Tests whether an action carrying `segment` participates in this signature.
    #[must_use]
    pub fn matches_segment(&self, segment: Option<&str>) -> bool {
        self.filter.as_deref() == segment
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.filter {
            Some(filter) => write!(f, "{}{SEPARATOR}{filter}", self.class_name),
            None => f.write_str(&self.class_name),
        }
    }
}

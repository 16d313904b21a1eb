//! Media types and content negotiation.
//!
//! [`MediaType`] is a parsed media range (`text/html`, `application/*`,
//! `*/*;q=0.5`) whose parts may be wildcards. [`MediaTypeList`] is the ordered
//! list found in `Accept` headers and in action `consumes`/`produces`
//! declarations.
//!
//! Choosing the response type for a request is delegated to a
//! [`ContentNegotiator`]. [`QualityNegotiator`] is the default: it pairs every
//! accepted range with every producible type and picks the most specific
//! combination, then the higher client quality, then the higher server
//! quality, then the closer match.
//!
//! # Example
//!
//! ```
//! use praetor_core::media::{ContentNegotiator, MediaTypeList, QualityNegotiator};
//!
//! let accepted = MediaTypeList::parse("text/html;q=0.9, application/json");
//! let produced = MediaTypeList::parse("text/html, application/json");
//!
//! let best = QualityNegotiator.negotiate(&accepted, &produced).unwrap();
//! assert_eq!(best.to_string(), "application/json");
//! ```

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Error raised when a media type cannot be parsed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MediaTypeError {
    /// The text is not a media range.
    #[error("invalid media type '{input}': {reason}")]
    Invalid {
        /// The rejected text.
        input: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The `q` parameter is not a number in `0..=1`.
    #[error("invalid quality '{value}' in media type '{input}'")]
    InvalidQuality {
        /// The rejected text.
        input: String,
        /// The rejected quality value.
        value: String,
    },
}

/// A media range with optional wildcard parts and a quality weight.
///
/// A `None` part stands for the `*` wildcard. Part names are stored in lower
/// case.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaType {
    main: Option<String>,
    sub: Option<String>,
    quality: f32,
}

impl MediaType {
    /// The `*/*` range.
    #[must_use]
    pub const fn any() -> Self {
        Self {
            main: None,
            sub: None,
            quality: 1.0,
        }
    }

    /// Creates a media type from its parts with quality 1.
    #[must_use]
    pub fn from_parts(main: Option<&str>, sub: Option<&str>) -> Self {
        Self {
            main: main.map(str::to_ascii_lowercase),
            sub: sub.map(str::to_ascii_lowercase),
            quality: 1.0,
        }
    }

    /// Parses a single media range such as `text/html;q=0.8`.
    pub fn parse(input: &str) -> Result<Self, MediaTypeError> {
        let trimmed = input.trim();
        // Bare `*` is sent by some clients as shorthand for `*/*`.
        let text = if trimmed == "*" { "*/*" } else { trimmed };

        let mime: mime::Mime = text.parse().map_err(|e: mime::FromStrError| {
            MediaTypeError::Invalid {
                input: input.to_string(),
                reason: e.to_string(),
            }
        })?;

        let (main, sub) = mime
            .essence_str()
            .split_once('/')
            .ok_or_else(|| MediaTypeError::Invalid {
                input: input.to_string(),
                reason: "missing subtype".to_string(),
            })?;

        let quality = match mime.get_param("q") {
            Some(value) => value
                .as_str()
                .parse::<f32>()
                .ok()
                .filter(|q| (0.0..=1.0).contains(q))
                .ok_or_else(|| MediaTypeError::InvalidQuality {
                    input: input.to_string(),
                    value: value.as_str().to_string(),
                })?,
            None => 1.0,
        };

        Ok(Self {
            main: wildcard_to_none(main),
            sub: wildcard_to_none(sub),
            quality,
        })
    }

    /// Returns the main type, or `None` for a wildcard.
    #[must_use]
    pub fn main(&self) -> Option<&str> {
        self.main.as_deref()
    }

    /// Returns the subtype, or `None` for a wildcard.
    #[must_use]
    pub fn sub(&self) -> Option<&str> {
        self.sub.as_deref()
    }

    /// Returns the quality weight.
    #[must_use]
    pub const fn quality(&self) -> f32 {
        self.quality
    }

    /// `*/*` is 0, `x/*` is 1, `*/y` is 2 and `x/y` is 3.
    #[must_use]
    pub const fn specificity(&self) -> u8 {
        match (&self.main, &self.sub) {
            (None, None) => 0,
            (Some(_), None) => 1,
            (None, Some(_)) => 2,
            (Some(_), Some(_)) => 3,
        }
    }

    /// Returns `true` when neither part is a wildcard.
    #[must_use]
    pub const fn is_concrete(&self) -> bool {
        self.main.is_some() && self.sub.is_some()
    }

    /// Tests whether two ranges overlap, treating wildcards as matching anything.
    #[must_use]
    pub fn matches(&self, other: &Self) -> bool {
        part_matches(self.main.as_deref(), other.main.as_deref())
            && part_matches(self.sub.as_deref(), other.sub.as_deref())
    }

    /// Tests whether this type and `other` name the same range, ignoring quality.
    #[must_use]
    pub fn same_range(&self, other: &Self) -> bool {
        self.main == other.main && self.sub == other.sub
    }
}

impl FromStr for MediaType {
    type Err = MediaTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}",
            self.main.as_deref().unwrap_or("*"),
            self.sub.as_deref().unwrap_or("*")
        )?;
        if self.quality < 1.0 {
            write!(f, ";q={}", self.quality)?;
        }
        Ok(())
    }
}

fn wildcard_to_none(part: &str) -> Option<String> {
    (part != "*").then(|| part.to_ascii_lowercase())
}

fn part_matches(a: Option<&str>, b: Option<&str>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a == b,
        _ => true,
    }
}

/// An ordered list of media ranges.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MediaTypeList {
    types: Vec<MediaType>,
}

impl MediaTypeList {
    /// Parses a comma-separated list, skipping entries that do not parse.
    ///
    /// Skipped entries are logged at `warn` level.
    #[must_use]
    pub fn parse(input: &str) -> Self {
        let types = input
            .split(',')
            .filter(|part| !part.trim().is_empty())
            .filter_map(|part| match MediaType::parse(part) {
                Ok(media) => Some(media),
                Err(e) => {
                    tracing::warn!(error = %e, "skipping media type");
                    None
                }
            })
            .collect();
        Self { types }
    }

    /// Parses a comma-separated list, failing on the first invalid entry.
    pub fn try_parse(input: &str) -> Result<Self, MediaTypeError> {
        input
            .split(',')
            .filter(|part| !part.trim().is_empty())
            .map(MediaType::parse)
            .collect()
    }

    /// A list holding only `*/*`.
    #[must_use]
    pub fn any() -> Self {
        Self {
            types: vec![MediaType::any()],
        }
    }

    /// Returns `true` if the list has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Iterates over the entries in order.
    pub fn iter(&self) -> impl Iterator<Item = &MediaType> {
        self.types.iter()
    }

    /// Tests whether any entry matches `media`.
    #[must_use]
    pub fn matches_some(&self, media: &MediaType) -> bool {
        self.types.iter().any(|t| t.matches(media))
    }
}

impl FromIterator<MediaType> for MediaTypeList {
    fn from_iter<I: IntoIterator<Item = MediaType>>(iter: I) -> Self {
        Self {
            types: iter.into_iter().collect(),
        }
    }
}

impl From<MediaType> for MediaTypeList {
    fn from(media: MediaType) -> Self {
        Self { types: vec![media] }
    }
}

impl fmt::Display for MediaTypeList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, media) in self.types.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{media}")?;
        }
        Ok(())
    }
}

/// Chooses the response media type for one candidate action.
///
/// `negotiate` returns the best type this candidate can produce for the
/// client, or `None` when nothing it produces is acceptable. Implementations
/// are queried once per candidate and must not keep state between calls.
pub trait ContentNegotiator: Send + Sync {
    /// Picks the best of `produced` for a client accepting `accepted`.
    fn negotiate(&self, accepted: &MediaTypeList, produced: &MediaTypeList) -> Option<MediaType>;
}

impl<F> ContentNegotiator for F
where
    F: Fn(&MediaTypeList, &MediaTypeList) -> Option<MediaType> + Send + Sync,
{
    fn negotiate(&self, accepted: &MediaTypeList, produced: &MediaTypeList) -> Option<MediaType> {
        self(accepted, produced)
    }
}

/// Quality-weighted `Accept` negotiation.
///
/// Each accepted range is combined with each produced type. A wildcard part
/// combined with a concrete part takes the concrete value and adds one to the
/// match distance; two differing concrete parts do not combine. Ranges with
/// `q=0` are never acceptable. Combinations are ranked by specificity, then
/// client quality, then server quality, then lower distance; the first of
/// equally ranked combinations wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct QualityNegotiator;

#[derive(Debug)]
struct Candidate {
    media: MediaType,
    client_quality: f32,
    server_quality: f32,
    distance: u8,
}

impl Candidate {
    fn combine(accepted: &MediaType, produced: &MediaType) -> Option<Self> {
        let mut distance = 0;
        let main = combine_part(accepted.main(), produced.main(), &mut distance)?;
        let sub = combine_part(accepted.sub(), produced.sub(), &mut distance)?;
        Some(Self {
            media: MediaType::from_parts(main, sub),
            client_quality: accepted.quality(),
            server_quality: produced.quality(),
            distance,
        })
    }

    fn rank(&self, other: &Self) -> Ordering {
        self.media
            .specificity()
            .cmp(&other.media.specificity())
            .then(self.client_quality.total_cmp(&other.client_quality))
            .then(self.server_quality.total_cmp(&other.server_quality))
            .then(other.distance.cmp(&self.distance))
    }
}

// Outer `None`: the parts are incompatible.
fn combine_part<'a>(
    accepted: Option<&'a str>,
    produced: Option<&'a str>,
    distance: &mut u8,
) -> Option<Option<&'a str>> {
    match (accepted, produced) {
        (None, None) => Some(None),
        (Some(a), Some(p)) => (a == p).then_some(Some(a)),
        (Some(part), None) | (None, Some(part)) => {
            *distance += 1;
            Some(Some(part))
        }
    }
}

impl ContentNegotiator for QualityNegotiator {
    fn negotiate(&self, accepted: &MediaTypeList, produced: &MediaTypeList) -> Option<MediaType> {
        let any = MediaTypeList::any();
        let accepted = if accepted.is_empty() { &any } else { accepted };
        let produced = if produced.is_empty() { &any } else { produced };

        let mut best: Option<Candidate> = None;
        for a in accepted.iter().filter(|a| a.quality() > 0.0) {
            for p in produced.iter() {
                let Some(candidate) = Candidate::combine(a, p) else {
                    continue;
                };
                let better = best
                    .as_ref()
                    .map_or(true, |b| candidate.rank(b) == Ordering::Greater);
                if better {
                    best = Some(candidate);
                }
            }
        }
        best.map(|c| c.media)
    }
}

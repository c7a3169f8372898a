//! # location
//!
//! Feature locations: the recursive `join(...)` / `complement(...)` grammar that GenBank
//! uses to describe where a feature sits on its parent sequence.
//!
//! Coordinates are stored 0-based and half-open. The textual form is 1-based and inclusive,
//! so `1..243` parses to `start=0, end=243`. A bare point such as `467` is stored as
//! `start=end=467`, without the 1-based shift applied to ranges.
//!
//! ```
//! use gbseq::Location;
//!
//! let location: Location = "complement(join(3..5,8..9))".parse().unwrap();
//! assert!(location.is_complement());
//! assert_eq!(location.resolve("aaccgggttta").unwrap(), "aacgg");
//! assert_eq!(location.to_string(), "complement(join(3..5,8..9))");
//! ```

mod builder;
mod parser;
mod resolve;

pub use builder::build_location;
pub use parser::parse_location;

use crate::error::LocationError;

/// A contiguous leaf range `[start, end)` with optional partial markers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    /// 0-based inclusive start
    pub start: usize,

    /// 0-based exclusive end
    pub end: usize,

    /// The feature extends beyond the 5' end of the range (`<`)
    pub five_prime_partial: bool,

    /// The feature extends beyond the 3' end of the range (`>`)
    pub three_prime_partial: bool,
}
impl Span {
    #[must_use]
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start,
            end,
            five_prime_partial: false,
            three_prime_partial: false,
        }
    }

    #[must_use]
    pub fn with_five_prime_partial(mut self, partial: bool) -> Self {
        self.five_prime_partial = partial;
        self
    }

    #[must_use]
    pub fn with_three_prime_partial(mut self, partial: bool) -> Self {
        self.three_prime_partial = partial;
        self
    }

    /// A span is rendered in point form when `start == end`
    #[must_use]
    pub fn is_point(&self) -> bool {
        self.start == self.end
    }

    /// Number of bases covered by the span
    #[must_use]
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A location tree
///
/// Invariants:
/// * a [`Location::Complement`] wraps exactly one child (enforced by the type)
/// * a [`Location::Join`] holds two or more children (enforced by [`Location::join`]
///   and checked by [`Location::validate`])
/// * a [`Location::Range`] is a leaf
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// A leaf range or point
    Range(Span),

    /// Concatenation of the children, in listed order
    Join(Vec<Location>),

    /// Reverse complement of the child's resolved content
    Complement(Box<Location>),
}
impl Location {
    /// Creates a leaf from 0-based half-open coordinates
    ///
    /// # Errors
    ///
    /// Returns [`LocationError::InvertedRange`] if `start > end`
    pub fn range(start: usize, end: usize) -> Result<Self, LocationError> {
        if start > end {
            return Err(LocationError::InvertedRange { start, end });
        }
        Ok(Self::Range(Span::new(start, end)))
    }

    /// Creates a point leaf (`start == end == position`)
    #[must_use]
    pub fn point(position: usize) -> Self {
        Self::Range(Span::new(position, position))
    }

    /// Creates a join node
    ///
    /// # Errors
    ///
    /// Returns [`LocationError::JoinArity`] if fewer than two children are given
    pub fn join(children: Vec<Location>) -> Result<Self, LocationError> {
        if children.len() < 2 {
            return Err(LocationError::JoinArity(children.len()));
        }
        Ok(Self::Join(children))
    }

    /// Wraps a location in a complement node
    #[must_use]
    pub fn complement(inner: Location) -> Self {
        Self::Complement(Box::new(inner))
    }

    #[must_use]
    pub fn is_complement(&self) -> bool {
        matches!(self, Self::Complement(_))
    }

    #[must_use]
    pub fn is_join(&self) -> bool {
        matches!(self, Self::Join(_))
    }

    /// Returns the leaf span, if this node is a leaf
    #[must_use]
    pub fn span(&self) -> Option<&Span> {
        match self {
            Self::Range(span) => Some(span),
            _ => None,
        }
    }

    /// Returns the ordered children of this node (empty for leaves)
    #[must_use]
    pub fn children(&self) -> &[Location] {
        match self {
            Self::Range(_) => &[],
            Self::Join(children) => children,
            Self::Complement(inner) => std::slice::from_ref(inner.as_ref()),
        }
    }

    /// Checks the structural invariants of the whole tree
    ///
    /// Trees built through the parser or the checked constructors always validate;
    /// trees assembled directly from the enum variants may not.
    pub fn validate(&self) -> Result<(), LocationError> {
        match self {
            Self::Range(span) => {
                if span.start > span.end {
                    return Err(LocationError::InvertedRange {
                        start: span.start,
                        end: span.end,
                    });
                }
                Ok(())
            }
            Self::Join(children) => {
                if children.len() < 2 {
                    return Err(LocationError::JoinArity(children.len()));
                }
                children.iter().try_for_each(Location::validate)
            }
            Self::Complement(inner) => inner.validate(),
        }
    }
}
impl std::str::FromStr for Location {
    type Err = LocationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_location(s)
    }
}

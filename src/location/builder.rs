//! Renders location trees back into GenBank location expressions

use std::fmt;

use super::{Location, Span};

/// Renders a location tree into its textual form
///
/// The output is accepted by [`parse_location`](super::parse_location) and parses back
/// into an equal tree.
#[must_use]
pub fn build_location(location: &Location) -> String {
    location.to_string()
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let five = if self.five_prime_partial { "<" } else { "" };
        let three = if self.three_prime_partial { ">" } else { "" };
        if self.is_point() {
            write!(f, "{five}{three}{}", self.start)
        } else {
            write!(f, "{five}{}..{three}{}", self.start + 1, self.end)
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Range(span) => span.fmt(f),
            Self::Complement(inner) => write!(f, "complement({inner})"),
            Self::Join(children) => {
                f.write_str("join(")?;
                for (idx, child) in children.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(",")?;
                    }
                    child.fmt(f)?;
                }
                f.write_str(")")
            }
        }
    }
}

//! Materialises the subsequence a location tree describes

use super::Location;
use crate::{error::LocationError, utils::reverse_complement};

impl Location {
    /// Resolves the location against a sequence
    ///
    /// Leaves slice `sequence[start..end]`, joins concatenate their children in listed
    /// order, and complement nodes reverse-complement the fully assembled content of their
    /// child. `complement(join(a,b))` therefore yields `rc(b) + rc(a)`, whereas
    /// `join(complement(a),complement(b))` yields `rc(a) + rc(b)`.
    ///
    /// # Errors
    ///
    /// Returns [`LocationError::OutOfBounds`] if a leaf does not fit inside the sequence.
    pub fn resolve(&self, sequence: &str) -> Result<String, LocationError> {
        let mut buffer = String::new();
        self.resolve_into(sequence, &mut buffer)?;
        Ok(buffer)
    }

    /// Resolves the location, appending the result to `buffer`
    pub fn resolve_into(&self, sequence: &str, buffer: &mut String) -> Result<(), LocationError> {
        match self {
            Self::Range(span) => {
                let slice = sequence
                    .get(span.start..span.end)
                    .ok_or(LocationError::OutOfBounds {
                        start: span.start,
                        end: span.end,
                        len: sequence.len(),
                    })?;
                buffer.push_str(slice);
            }
            Self::Join(children) => {
                for child in children {
                    child.resolve_into(sequence, buffer)?;
                }
            }
            Self::Complement(inner) => {
                let content = inner.resolve(sequence)?;
                buffer.push_str(&reverse_complement(&content));
            }
        }
        Ok(())
    }
}

/// Custom Result type for gbseq operations, wrapping the custom [`Error`] type
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed inner cause carried by a [`SyntaxError`]
pub type Cause = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The main error type for the gbseq library, encompassing all possible error cases
/// that can occur while reading, writing, or resolving GenBank records.
#[derive(thiserror::Error, Debug)]
#[error(transparent)]
pub enum Error {
    /// Malformed GenBank text
    SyntaxError(#[from] SyntaxError),
    /// Errors raised while parsing, validating, or resolving a location expression
    LocationError(#[from] LocationError),
    /// Errors that occur during write operations
    WriteError(#[from] WriteError),
    /// Errors raised by the memory-mapped reader
    ReadError(#[from] ReadError),
    /// Standard I/O errors from the Rust standard library
    IoError(#[from] std::io::Error),
    /// Errors from the niffler decompression layer
    NifflerError(#[from] niffler::Error),
    /// Generic errors, typically raised by a user-supplied parallel processor
    AnyhowError(#[from] anyhow::Error),
}
impl Error {
    /// Returns the syntax error if this is one
    #[must_use]
    pub fn as_syntax(&self) -> Option<&SyntaxError> {
        match self {
            Self::SyntaxError(e) => Some(e),
            _ => None,
        }
    }
}

/// A malformed line in a GenBank record.
///
/// Parsing stops at the first syntax error; no partially built record is ever returned
/// alongside it.
#[derive(thiserror::Error, Debug)]
#[error("line {line}: {message}: {text:?}")]
pub struct SyntaxError {
    /// 1-based line number of the offending line
    pub line: usize,

    /// The raw text of the offending line (without its line terminator)
    pub text: String,

    /// Human-readable description of the problem
    pub message: String,

    /// Optional lower-level cause (e.g. a [`LocationError`] or an integer parse failure)
    #[source]
    pub source: Option<Cause>,
}
impl SyntaxError {
    pub fn new(line: usize, text: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            line,
            text: text.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Attaches an inner cause to the error
    #[must_use]
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }
}

/// Errors specific to location expressions and the location tree
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum LocationError {
    /// The expression was empty after trimming
    #[error("Empty location expression")]
    Empty,

    /// A coordinate could not be parsed as a positive integer
    ///
    /// # Arguments
    /// * `String` - The offending coordinate text
    #[error("Invalid coordinate: {0:?}")]
    InvalidCoordinate(String),

    /// A 1-based range whose start lies after its end
    #[error("Range start ({start}) exceeds range end ({end})")]
    InvertedRange { start: usize, end: usize },

    /// Parentheses do not balance
    ///
    /// # Arguments
    /// * `String` - The full expression
    #[error("Unbalanced parentheses in {0:?}")]
    UnbalancedParentheses(String),

    /// An operator other than `join` or `complement`
    ///
    /// # Arguments
    /// * `String` - The unsupported operator name
    #[error("Unsupported location operator: {0:?}")]
    UnsupportedOperator(String),

    /// Text found after the closing parenthesis of an operator
    ///
    /// # Arguments
    /// * `String` - The trailing text
    #[error("Unexpected text after closing parenthesis: {0:?}")]
    TrailingText(String),

    /// `complement(...)` must wrap exactly one location
    ///
    /// # Arguments
    /// * `usize` - The number of arguments found
    #[error("complement() takes exactly one location, found {0}")]
    ComplementArity(usize),

    /// `join(...)` must contain at least two locations
    ///
    /// # Arguments
    /// * `usize` - The number of children found
    #[error("join() requires at least two locations, found {0}")]
    JoinArity(usize),

    /// A leaf range does not fit inside the sequence it is resolved against
    #[error("Range {start}..{end} is out of bounds for a sequence of length {len}")]
    OutOfBounds { start: usize, end: usize, len: usize },
}

/// Errors that can occur while writing GenBank records
#[derive(thiserror::Error, Debug)]
pub enum WriteError {
    /// A feature carries a location tree that cannot be rendered faithfully
    #[error("Feature {kind:?} has an invalid location")]
    InvalidFeatureLocation {
        kind: String,
        #[source]
        source: LocationError,
    },

    /// The locus name is empty or contains whitespace, which would not survive a round trip
    ///
    /// # Arguments
    /// * `String` - The offending locus name
    #[error("Invalid locus name: {0:?}")]
    InvalidLocusName(String),

    /// A feature key that is empty or contains whitespace or a `/`
    ///
    /// # Arguments
    /// * `String` - The offending feature key
    #[error("Invalid feature key: {0:?}")]
    InvalidFeatureKind(String),

    /// A qualifier whose name or value cannot be written on a single qualifier line
    #[error("Feature {kind:?} has an invalid qualifier {name:?}")]
    InvalidQualifier { kind: String, name: String },

    /// A header tag that would be read back as something else
    ///
    /// # Arguments
    /// * `String` - The offending tag
    #[error("Invalid header tag: {0:?}")]
    InvalidTag(String),

    /// A reference whose index would not be read back as written
    ///
    /// The index must be non-empty whenever a base range follows it, and may not contain
    /// whitespace.
    ///
    /// # Arguments
    /// * `usize` - Position of the reference in the header
    /// * `String` - The offending index
    #[error("Reference {0} has an invalid index {1:?}")]
    InvalidReference(usize, String),

    /// A sequence character that the ORIGIN block cannot carry
    #[error("Invalid sequence character {found:?} at position {position}")]
    InvalidSequence { position: usize, found: char },
}

/// Errors that can occur while reading memory-mapped files
#[derive(thiserror::Error, Debug)]
pub enum ReadError {
    /// The path does not refer to a regular file
    #[error("File is not a regular file")]
    IncompatibleFile,

    /// A record index beyond the number of records in the file
    ///
    /// # Arguments
    /// * `usize` - The requested index
    /// * `usize` - The number of records
    #[error("Requested record index ({0}) is out of record range ({1})")]
    OutOfRange(usize, usize),
}

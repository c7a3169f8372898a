//! # gbseq
//!
//! A bidirectional codec for GenBank flat-file records.
//!
//! ## Overview
//!
//! A GenBank record is a fixed-column text format with three sections: a header of
//! tagged metadata fields, a FEATURES table of annotated regions, and an ORIGIN block
//! holding the raw sequence. This library:
//!
//! * parses records into a structured [`Record`] ([`parse`], [`parse_multi`], [`Reader`])
//! * writes records back into the canonical layout ([`build`], [`build_multi`], [`Writer`])
//! * parses and renders the recursive location grammar used by features ([`Location`])
//! * resolves the subsequence a feature describes ([`Feature::sequence`])
//!
//! ## Example
//!
//! ```
//! use gbseq::{build, parse};
//!
//! let text = "\
//! LOCUS       demo     12 bp     DNA     linear     SYN     01-JAN-2000
//! DEFINITION  Demo construct.
//! FEATURES             Location/Qualifiers
//!      CDS             complement(4..9)
//!                      /gene=\"demo\"
//! ORIGIN
//!         1 atgaaaccct ag
//! //
//! ";
//! let record = parse(text.as_bytes())?;
//! assert_eq!(record.meta.definition, "Demo construct.");
//! assert_eq!(record.features[0].sequence(&record)?, "gggttt");
//! assert_eq!(build(&record)?, text.as_bytes());
//! # Ok::<(), gbseq::Error>(())
//! ```
//!
//! ## Coordinates
//!
//! Locations are stored 0-based and half-open; the text form is 1-based and inclusive.
//! See the [`location`] module for the details, including how points are stored.
//!
//! ## Parallel Processing
//!
//! Records in a multi-record file are independent, so they can be parsed concurrently:
//! see [`parse_multi_parallel`], [`MmapReader`] and the [`ParallelProcessor`] trait.

/// Error definitions
pub mod error;

/// Structured header metadata
pub mod header;

/// Location expressions
pub mod location;

/// Flat-file parsing
pub mod reader;

/// Flat-file rendering
pub mod writer;

/// File access through an injectable storage layer
pub mod io;

/// Parallel processing
mod parallel;

/// Record and feature types
mod record;

/// Sequence utilities
pub mod utils;

/// Prelude - Commonly used types and traits
pub mod prelude;

pub use error::{Error, LocationError, ReadError, Result, SyntaxError, WriteError};
pub use header::{Locus, Meta, Reference, ReferenceField};
pub use io::{
    read, read_multi, read_multi_with, read_with, write, write_multi, write_multi_with,
    write_with, LocalStorage, Storage,
};
pub use location::{build_location, parse_location, Location, Span};
pub use parallel::{parse_multi_parallel, MmapReader, ParallelProcessor, ParallelReader};
pub use reader::{parse, parse_multi, Reader};
pub use record::{Feature, Record};
pub use writer::{build, build_multi, Writer, WriterBuilder};

//! Reader module for the gbseq library
//!
//! This module turns GenBank flat-file text into [`Record`]s. Parsing is line-driven:
//! a small state machine walks each record from its LOCUS line through the header, the
//! FEATURES table and the ORIGIN block to the closing `//`.
//!
//! [`Reader`] streams records one at a time from any [`BufRead`]; [`parse`] and
//! [`parse_multi`] are the one-shot entry points.

mod features;
mod meta;
mod origin;
mod state;

use std::io::{BufRead, BufReader, Read};

use tracing::debug;

use self::state::RecordParser;
use crate::{error::SyntaxError, Record, Result};

/// Default capacity of the line buffer used by [`Reader::with_capacity`]
pub const DEFAULT_CAPACITY: usize = 8192;

/// A streaming reader over a GenBank flat file containing any number of records
///
/// Text before a LOCUS line or between records is skipped. Reading stops at the first
/// error; no partially parsed record is ever returned.
///
/// # Examples
///
/// ```
/// use gbseq::Reader;
///
/// let text = "\
/// LOCUS       demo                       8 bp    DNA     linear   SYN 01-JAN-2000
/// ORIGIN
///         1 acgtacgt
/// //
/// ";
/// let mut reader = Reader::new(text.as_bytes());
/// let record = reader.next_record().unwrap()?;
/// assert_eq!(record.sequence, "acgtacgt");
/// assert!(reader.next_record().is_none());
/// # Ok::<(), gbseq::Error>(())
/// ```
pub struct Reader<R: BufRead> {
    inner: R,

    /// Current line
    line: String,

    /// Previous line, reported if the input ends inside a record
    last: String,

    /// Number of lines read so far, plus the configured offset
    line_number: usize,

    /// Number of records returned so far
    n_processed: usize,

    parser: RecordParser,
    finished: bool,
}
impl<R: BufRead> Reader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            line: String::new(),
            last: String::new(),
            line_number: 0,
            n_processed: 0,
            parser: RecordParser::default(),
            finished: false,
        }
    }

    /// Offsets every reported line number by `offset`
    ///
    /// Used when the input is a slice of a larger file, so that errors still point at the
    /// line in the original file.
    #[must_use]
    pub fn with_line_offset(mut self, offset: usize) -> Self {
        self.line_number = offset;
        self
    }

    /// Reads the next line into the line buffer, returning false at end of input
    fn read_line(&mut self) -> Result<bool> {
        std::mem::swap(&mut self.line, &mut self.last);
        self.line.clear();
        if self.inner.read_line(&mut self.line)? == 0 {
            std::mem::swap(&mut self.line, &mut self.last);
            return Ok(false);
        }
        let trimmed = self.line.trim_end_matches(['\n', '\r']).len();
        self.line.truncate(trimmed);
        self.line_number += 1;
        Ok(true)
    }

    fn advance(&mut self) -> Result<Option<Record>> {
        loop {
            if !self.read_line()? {
                self.parser.finish(self.line_number, &self.line)?;
                return Ok(None);
            }
            if let Some(record) = self.parser.push_line(self.line_number, &self.line)? {
                return Ok(Some(record));
            }
        }
    }

    /// Parses the next record from the stream
    ///
    /// Returns `None` once the input is exhausted or after an error has been returned.
    pub fn next_record(&mut self) -> Option<Result<Record>> {
        if self.finished {
            return None;
        }
        match self.advance() {
            Ok(Some(record)) => {
                self.n_processed += 1;
                Some(Ok(record))
            }
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }

    /// Converts the reader into an iterator over its records
    pub fn records(mut self) -> impl Iterator<Item = Result<Record>> {
        std::iter::from_fn(move || self.next_record())
    }

    /// Number of records returned so far
    #[must_use]
    pub fn n_processed(&self) -> usize {
        self.n_processed
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}
impl<R: Read> Reader<BufReader<R>> {
    /// Wraps an unbuffered source with a line buffer of the given capacity
    pub fn with_capacity(inner: R, capacity: usize) -> Self {
        Self::new(BufReader::with_capacity(capacity, inner))
    }
}

/// Parses the first record of a stream
///
/// # Errors
///
/// Returns a [`SyntaxError`] if the record is malformed or if the stream contains no
/// record at all.
pub fn parse<R: Read>(inner: R) -> Result<Record> {
    let mut reader = Reader::with_capacity(inner, DEFAULT_CAPACITY);
    match reader.next_record() {
        Some(record) => record,
        None => Err(SyntaxError::new(reader.line_number, "", "no LOCUS line found").into()),
    }
}

/// Parses every record of a stream, in order
///
/// An empty stream yields an empty vector.
pub fn parse_multi<R: Read>(inner: R) -> Result<Vec<Record>> {
    let records = Reader::with_capacity(inner, DEFAULT_CAPACITY)
        .records()
        .collect::<Result<Vec<_>>>()?;
    debug!(records = records.len(), "parsed stream");
    Ok(records)
}

impl std::str::FromStr for Record {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self> {
        parse(s.as_bytes())
    }
}

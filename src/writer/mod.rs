//! Writer module for the gbseq library
//!
//! This module renders [`Record`]s into the canonical GenBank flat-file layout:
//! - fixed 12-column header tags with word-wrapped values
//! - one feature line per feature followed by one line per qualifier
//! - 60 bases per ORIGIN line in blocks of ten, prefixed by a 1-based index
//!
//! Every record is validated before any of it is written, so a record that could not be
//! read back unchanged never produces partial output.

mod format;

use std::io::{BufWriter, Write};

use tracing::debug;

pub use format::WRAP_WIDTH;

use crate::{Record, Result};

/// Default capacity of the output buffer created by [`WriterBuilder`]
pub const DEFAULT_BUFFER_CAPACITY: usize = 8192;

/// A writer for GenBank records
///
/// Each record is rendered into an internal buffer and handed to the underlying writer
/// in a single `write_all` call.
///
/// # Type Parameters
///
/// * `W` - The underlying writer type that implements `Write`
pub struct Writer<W: Write> {
    /// The underlying writer for output
    inner: W,

    /// Reusable render buffer
    buffer: Vec<u8>,

    /// Number of records written so far
    records_written: usize,
}
impl<W: Write> Writer<W> {
    /// Creates a writer without additional buffering
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            buffer: Vec::new(),
            records_written: 0,
        }
    }

    /// Validates and writes a single record
    ///
    /// # Errors
    ///
    /// Returns a [`WriteError`](crate::WriteError) if the record cannot be represented
    /// faithfully (nothing is written in that case), or an I/O error from the underlying
    /// writer.
    pub fn write_record(&mut self, record: &Record) -> Result<()> {
        format::validate(record)?;

        self.buffer.clear();
        format::write_header(&mut self.buffer, &record.meta)?;
        format::write_features(&mut self.buffer, &record.features)?;
        format::write_origin(&mut self.buffer, &record.sequence)?;
        self.inner.write_all(&self.buffer)?;

        self.records_written += 1;
        debug!(
            name = %record.meta.locus.name,
            features = record.features.len(),
            bytes = self.buffer.len(),
            "wrote record"
        );
        Ok(())
    }

    /// Writes every record in order, stopping at the first error
    pub fn write_all(&mut self, records: &[Record]) -> Result<()> {
        records
            .iter()
            .try_for_each(|record| self.write_record(record))
    }

    /// Number of records written so far
    #[must_use]
    pub fn records_written(&self) -> usize {
        self.records_written
    }

    /// Flushes any buffered data to the underlying writer
    pub fn flush(&mut self) -> Result<()> {
        self.inner.flush()?;
        Ok(())
    }

    /// Gets a mutable reference to the underlying writer
    pub fn by_ref(&mut self) -> &mut W {
        &mut self.inner
    }

    /// Consumes the writer and returns the underlying writer
    pub fn into_inner(self) -> W {
        self.inner
    }
}

/// Builder for buffered [`Writer`] instances
///
/// # Examples
///
/// ```
/// use gbseq::{Record, WriterBuilder};
///
/// let mut record = Record::default();
/// record.meta.locus.name = "demo".to_string();
/// record.sequence = "acgt".to_string();
///
/// let mut writer = WriterBuilder::default()
///     .buffer_capacity(1 << 16)
///     .build(Vec::new());
/// writer.write_record(&record)?;
/// writer.flush()?;
/// assert!(writer.by_ref().get_ref().ends_with(b"//\n"));
/// # Ok::<(), gbseq::Error>(())
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct WriterBuilder {
    /// Optional buffer capacity setting
    buffer_capacity: Option<usize>,
}
impl WriterBuilder {
    /// Sets the buffer capacity for the writer
    #[must_use]
    pub fn buffer_capacity(mut self, capacity: usize) -> Self {
        self.buffer_capacity = Some(capacity);
        self
    }

    /// Wraps `inner` in a [`BufWriter`] and returns a writer over it
    pub fn build<W: Write>(self, inner: W) -> Writer<BufWriter<W>> {
        let capacity = self.buffer_capacity.unwrap_or(DEFAULT_BUFFER_CAPACITY);
        Writer::new(BufWriter::with_capacity(capacity, inner))
    }
}

/// Renders a single record
///
/// # Errors
///
/// Returns a [`WriteError`](crate::WriteError) if the record cannot be represented
/// faithfully.
pub fn build(record: &Record) -> Result<Vec<u8>> {
    let mut writer = Writer::new(Vec::new());
    writer.write_record(record)?;
    Ok(writer.into_inner())
}

/// Renders several records back to back
pub fn build_multi(records: &[Record]) -> Result<Vec<u8>> {
    let mut writer = Writer::new(Vec::new());
    writer.write_all(records)?;
    Ok(writer.into_inner())
}

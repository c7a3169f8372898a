//! Parallel record processing
//!
//! Records in a multi-record file are independent once their boundaries are known, so a
//! file can be split at its `//` terminators and each slice parsed on its own thread.

use std::{fs::File, ops::Range, path::Path, sync::Arc};

use memchr::memmem;
use memmap2::Mmap;
use tracing::debug;

use crate::{
    error::{ReadError, SyntaxError},
    Reader, Record, Result,
};

/// Number of records a thread processes between calls to
/// [`ParallelProcessor::on_batch_complete`]
pub const BATCH_SIZE: usize = 256;

/// Trait for readers that can process records in parallel
///
/// This is implemented by the **reader** not by the **processor**.
/// For the **processor**, see the [`ParallelProcessor`] trait.
pub trait ParallelReader {
    fn process_parallel<P: ParallelProcessor + Clone + 'static>(
        self,
        processor: P,
        num_threads: usize,
    ) -> Result<()>;
}

/// Trait for types that can process records in parallel.
///
/// This is implemented by the **processor** not by the **reader**.
/// For the **reader**, see the [`ParallelReader`] trait.
pub trait ParallelProcessor: Send + Clone {
    /// Process a single record
    ///
    /// `index` is the 0-based position of the record in its file.
    fn process_record(&mut self, index: usize, record: &Record) -> Result<()>;

    /// Called when a thread finishes processing its batch
    /// Default implementation does nothing
    fn on_batch_complete(&mut self) -> Result<()> {
        Ok(())
    }

    /// Set the thread ID for this processor
    ///
    /// Each thread should call this method with its own unique ID.
    fn set_tid(&mut self, _tid: usize) {
        // Default implementation does nothing
    }

    /// Get the thread ID for this processor
    fn get_tid(&self) -> Option<usize> {
        None
    }
}

/// `0` selects every available core; larger requests are capped at the core count
fn resolve_threads(num_threads: usize) -> usize {
    if num_threads == 0 {
        num_cpus::get()
    } else {
        num_threads.min(num_cpus::get())
    }
}

/// Byte range of one record and the number of lines that precede it
#[derive(Debug, Clone)]
struct RecordSpan {
    bytes: Range<usize>,
    line_offset: usize,
}

/// Splits a buffer into record spans at its `//` terminator lines
///
/// Text between records stays attached to the following span and is skipped by the
/// parser. Spans without a line starting with `LOCUS` are dropped; a trailing span that
/// has one but no terminator is kept so that parsing it reports the truncation.
fn record_spans(buffer: &[u8]) -> Vec<RecordSpan> {
    let has_locus = |range: &Range<usize>| {
        let span = &buffer[range.clone()];
        span.starts_with(b"LOCUS") || memmem::find(span, b"\nLOCUS").is_some()
    };

    let mut terminators: Vec<usize> = memmem::find_iter(buffer, b"\n//").map(|idx| idx + 1).collect();
    if buffer.starts_with(b"//") {
        terminators.insert(0, 0);
    }

    let mut spans = Vec::new();
    let mut start = 0;
    let mut lines_before = 0;
    for terminator in terminators {
        let end = memchr::memchr(b'\n', &buffer[terminator..])
            .map_or(buffer.len(), |idx| terminator + idx + 1);
        let range = start..end;
        if has_locus(&range) {
            spans.push(RecordSpan {
                bytes: range.clone(),
                line_offset: lines_before,
            });
        }
        lines_before += memchr::memchr_iter(b'\n', &buffer[range]).count();
        start = end;
    }
    let rest = start..buffer.len();
    if has_locus(&rest) {
        spans.push(RecordSpan {
            bytes: rest,
            line_offset: lines_before,
        });
    }
    spans
}

/// Parses the single record in a span
fn parse_span(buffer: &[u8], span: &RecordSpan) -> Result<Record> {
    let mut reader = Reader::new(&buffer[span.bytes.clone()]).with_line_offset(span.line_offset);
    match reader.next_record() {
        Some(record) => record,
        None => Err(SyntaxError::new(span.line_offset + 1, "", "no LOCUS line found").into()),
    }
}

/// Parses every record of an in-memory buffer using multiple threads
///
/// Records are returned in file order. If any record fails to parse, the error of the
/// earliest failing record is returned.
///
/// # Arguments
///
/// * `buffer` - The complete flat-file text
/// * `num_threads` - The number of threads to use (`0` for all available cores)
pub fn parse_multi_parallel(buffer: &[u8], num_threads: usize) -> Result<Vec<Record>> {
    let spans = record_spans(buffer);
    if spans.is_empty() {
        return Ok(Vec::new());
    }
    let num_threads = resolve_threads(num_threads).min(spans.len());
    let spans_per_thread = spans.len().div_ceil(num_threads);
    debug!(records = spans.len(), threads = num_threads, "parsing in parallel");

    std::thread::scope(|scope| {
        let handles: Vec<_> = spans
            .chunks(spans_per_thread)
            .map(|chunk| {
                scope.spawn(move || {
                    chunk
                        .iter()
                        .map(|span| parse_span(buffer, span))
                        .collect::<Result<Vec<_>>>()
                })
            })
            .collect();

        let mut records = Vec::with_capacity(spans.len());
        for handle in handles {
            let chunk = handle
                .join()
                .map_err(|_| anyhow::anyhow!("record parsing thread panicked"))??;
            records.extend(chunk);
        }
        Ok(records)
    })
}

/// A memory-mapped reader for multi-record GenBank files
///
/// The file is scanned once for record boundaries; records are parsed on demand, either
/// individually through [`MmapReader::get`] or all at once with
/// [`ParallelReader::process_parallel`]. Compressed files are not supported here; use
/// [`read_multi`](crate::read_multi) for those.
///
/// # Examples
///
/// ```no_run
/// use gbseq::{MmapReader, Result};
///
/// fn main() -> Result<()> {
///     let reader = MmapReader::new("./data/plasmids.gb")?;
///     println!("Number of records: {}", reader.num_records());
///     let record = reader.get(0)?;
///     println!("{}", record.name());
///     Ok(())
/// }
/// ```
pub struct MmapReader {
    /// Memory mapped file contents, wrapped in Arc for thread-safe sharing
    mmap: Arc<Mmap>,

    /// Record boundaries, in file order
    spans: Vec<RecordSpan>,
}
impl MmapReader {
    /// Memory-maps a file and locates its records
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or is not a regular file.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        // Verify input file is a file before attempting to map
        let file = File::open(path.as_ref())?;
        if !file.metadata()?.is_file() {
            return Err(ReadError::IncompatibleFile.into());
        }

        // Safety: the file is open and won't be modified while mapped
        let mmap = unsafe { Mmap::map(&file)? };
        let spans = record_spans(&mmap);
        debug!(path = %path.as_ref().display(), records = spans.len(), "mapped file");

        Ok(Self {
            mmap: Arc::new(mmap),
            spans,
        })
    }

    /// Returns the number of records found in the file
    #[must_use]
    pub fn num_records(&self) -> usize {
        self.spans.len()
    }

    /// Parses the record at `idx` (0-based)
    ///
    /// # Errors
    ///
    /// Returns [`ReadError::OutOfRange`] for an index past the last record, or the
    /// record's syntax error.
    pub fn get(&self, idx: usize) -> Result<Record> {
        let Some(span) = self.spans.get(idx) else {
            return Err(ReadError::OutOfRange(idx, self.num_records()).into());
        };
        parse_span(&self.mmap, span)
    }
}

impl ParallelReader for MmapReader {
    /// Processes all records in parallel using multiple threads
    ///
    /// Each thread receives its own clone of the processor and handles a contiguous
    /// chunk of records. The first error raised by any thread is returned.
    fn process_parallel<P: ParallelProcessor + Clone + 'static>(
        self,
        processor: P,
        num_threads: usize,
    ) -> Result<()> {
        let num_records = self.num_records();
        if num_records == 0 {
            return Ok(());
        }
        let num_threads = resolve_threads(num_threads).min(num_records);
        let records_per_thread = num_records.div_ceil(num_threads);

        let reader = Arc::new(self);
        let mut handles = Vec::new();
        for tid in 0..num_threads {
            let mut processor = processor.clone();
            let reader = reader.clone();
            processor.set_tid(tid);

            let handle = std::thread::spawn(move || -> Result<()> {
                let start_idx = tid * records_per_thread;
                let end_idx = (start_idx + records_per_thread).min(num_records);

                for batch_start in (start_idx..end_idx).step_by(BATCH_SIZE) {
                    let batch_end = (batch_start + BATCH_SIZE).min(end_idx);
                    for idx in batch_start..batch_end {
                        let record = reader.get(idx)?;
                        processor.process_record(idx, &record)?;
                    }
                    processor.on_batch_complete()?;
                }
                Ok(())
            });
            handles.push(handle);
        }

        for handle in handles {
            handle
                .join()
                .map_err(|_| anyhow::anyhow!("record processing thread panicked"))??;
        }
        Ok(())
    }
}

//! The record state machine
//!
//! A record moves through the header, the feature table and the ORIGIN block before its
//! `//` terminator. The parser is fed one line at a time and hands back a [`Record`] each
//! time a terminator completes one.

use tracing::{debug, trace, warn};

use super::{
    features::FeatureBlock,
    meta::{split_tag, Line, TagBlock},
    origin::push_origin_line,
};
use crate::{error::SyntaxError, Meta, Record};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Waiting for a LOCUS line
    PreStart,
    Metadata,
    Features,
    Sequence,
}

/// True if the line begins with the record terminator
fn is_terminator(line: &str) -> bool {
    line.starts_with("//")
}

/// The tag of a column-0 line, matched whole so that `ORIGINATOR` is not `ORIGIN`
fn section(line: &str) -> &str {
    split_tag(line).0
}

/// True if the first column of the line is blank
fn is_indented(line: &str) -> bool {
    line.starts_with(' ') || line.starts_with('\t')
}

/// Incremental parser for one record at a time
#[derive(Debug)]
pub(crate) struct RecordParser {
    state: State,
    meta: Meta,
    block: Option<TagBlock>,
    features: FeatureBlock,
    record_features: Vec<crate::Feature>,
    sequence: String,

    /// Line number of the LOCUS line of the record in progress
    start_line: usize,
}
impl Default for RecordParser {
    fn default() -> Self {
        Self {
            state: State::PreStart,
            meta: Meta::default(),
            block: None,
            features: FeatureBlock::default(),
            record_features: Vec::new(),
            sequence: String::new(),
            start_line: 0,
        }
    }
}
impl RecordParser {
    /// True if a record has been started but not yet terminated
    pub fn in_record(&self) -> bool {
        self.state != State::PreStart
    }

    /// Line number of the LOCUS line of the record in progress
    pub fn start_line(&self) -> usize {
        self.start_line
    }

    fn transition(&mut self, state: State) {
        trace!(from = ?self.state, to = ?state, "state transition");
        self.state = state;
    }

    /// Dispatches the header tag being accumulated, if any
    fn flush_block(&mut self) -> Result<(), SyntaxError> {
        if let Some(block) = self.block.take() {
            block.apply(&mut self.meta)?;
        }
        Ok(())
    }

    fn finish_features(&mut self) -> Result<(), SyntaxError> {
        let mut features = self.features.finish()?;
        self.record_features.append(&mut features);
        Ok(())
    }

    /// Completes the record in progress and resets for the next one
    fn complete(&mut self) -> Record {
        let record = Record {
            meta: std::mem::take(&mut self.meta),
            features: std::mem::take(&mut self.record_features),
            sequence: std::mem::take(&mut self.sequence),
        };
        debug!(
            name = %record.meta.locus.name,
            features = record.features.len(),
            bases = record.sequence.len(),
            line = self.start_line,
            "parsed record"
        );
        self.transition(State::PreStart);
        record
    }

    /// Consumes one line (without its terminator)
    ///
    /// Returns the completed record when the line is a `//` terminator.
    pub fn push_line(&mut self, number: usize, line: &str) -> Result<Option<Record>, SyntaxError> {
        match self.state {
            State::PreStart => {
                if line.starts_with("LOCUS") {
                    self.start_line = number;
                    self.block = Some(TagBlock::new(Line::new(number, line)));
                    self.transition(State::Metadata);
                } else if !line.trim().is_empty() {
                    warn!(line = number, "skipping text outside of a record");
                }
                Ok(None)
            }
            State::Metadata => self.push_metadata(number, line),
            State::Features => self.push_feature(number, line),
            State::Sequence => {
                if is_terminator(line) {
                    return Ok(Some(self.complete()));
                }
                push_origin_line(&mut self.sequence, line);
                Ok(None)
            }
        }
    }

    fn push_metadata(&mut self, number: usize, line: &str) -> Result<Option<Record>, SyntaxError> {
        if line.trim().is_empty() {
            return Err(SyntaxError::new(
                number,
                line,
                "blank line inside the record header",
            ));
        }
        if is_indented(line) {
            match self.block.as_mut() {
                Some(block) => block.push(Line::new(number, line)),
                None => {
                    return Err(SyntaxError::new(
                        number,
                        line,
                        "continuation line without a preceding tag",
                    ))
                }
            }
            return Ok(None);
        }

        self.flush_block()?;
        if is_terminator(line) {
            return Ok(Some(self.complete()));
        }
        match section(line) {
            "FEATURES" => self.transition(State::Features),
            "ORIGIN" => self.transition(State::Sequence),
            _ => self.block = Some(TagBlock::new(Line::new(number, line))),
        }
        Ok(None)
    }

    fn push_feature(&mut self, number: usize, line: &str) -> Result<Option<Record>, SyntaxError> {
        if line.is_empty() || is_indented(line) {
            self.features.push_line(number, line)?;
            return Ok(None);
        }

        // a column-0 line ends the feature table
        self.finish_features()?;
        if is_terminator(line) {
            return Ok(Some(self.complete()));
        }
        if section(line) == "ORIGIN" {
            self.transition(State::Sequence);
        } else {
            trace!(line = number, "header tag after the feature table");
            self.block = Some(TagBlock::new(Line::new(number, line)));
            self.transition(State::Metadata);
        }
        Ok(None)
    }

    /// Signals the end of input
    ///
    /// Input that ends inside a record is an error.
    pub fn finish(&mut self, number: usize, last_line: &str) -> Result<(), SyntaxError> {
        if self.in_record() {
            return Err(SyntaxError::new(
                number,
                last_line,
                "unexpected end of stream before '//' terminator",
            ));
        }
        Ok(())
    }
}

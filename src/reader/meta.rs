//! Header tag blocks
//!
//! Every header tag begins on a line whose first column is non-blank; the lines that follow
//! with a blank first column belong to the same tag. A block is accumulated line by line
//! and dispatched on its tag once the next tag begins.

use tracing::trace;

use crate::{
    error::SyntaxError,
    header::{Locus, Meta, Reference, ReferenceField, TAG_WIDTH},
};

/// A numbered input line
#[derive(Debug, Clone, Default)]
pub(crate) struct Line {
    pub number: usize,
    pub text: String,
}
impl Line {
    pub fn new(number: usize, text: &str) -> Self {
        Self {
            number,
            text: text.to_string(),
        }
    }

    pub fn error(&self, message: impl Into<String>) -> SyntaxError {
        SyntaxError::new(self.number, self.text.as_str(), message)
    }
}

/// Splits a line into its tag column and its value column
///
/// The tag is the trimmed content of the first [`TAG_WIDTH`] columns; lines whose tag
/// column runs into the value fall back to splitting on the first whitespace.
pub(crate) fn split_tag(line: &str) -> (&str, &str) {
    if line.len() <= TAG_WIDTH {
        return (line.trim(), "");
    }
    match (line.get(..TAG_WIDTH), line.get(TAG_WIDTH..)) {
        (Some(tag), Some(value)) if tag.ends_with(' ') => (tag.trim(), value.trim_end()),
        _ => {
            let trimmed = line.trim_start();
            match trimmed.split_once(char::is_whitespace) {
                Some((tag, value)) => (tag, value.trim()),
                None => (trimmed.trim_end(), ""),
            }
        }
    }
}

/// Removes up to `width` leading spaces
fn strip_indent(line: &str, width: usize) -> &str {
    let spaces = line.bytes().take(width).take_while(|&b| b == b' ').count();
    &line[spaces..]
}

/// One header tag and all of its lines
#[derive(Debug)]
pub(crate) struct TagBlock {
    tag: String,
    lines: Vec<Line>,
}
impl TagBlock {
    pub fn new(line: Line) -> Self {
        let (tag, _) = split_tag(&line.text);
        Self {
            tag: tag.to_string(),
            lines: vec![line],
        }
    }

    pub fn push(&mut self, line: Line) {
        self.lines.push(line);
    }

    #[cfg(test)]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    fn head(&self) -> &Line {
        &self.lines[0]
    }

    fn continuations(&self) -> &[Line] {
        &self.lines[1..]
    }

    /// Value of the first line followed by every continuation, joined by single spaces
    fn joined(&self) -> String {
        let (_, first) = split_tag(&self.head().text);
        std::iter::once(first.trim())
            .chain(self.continuations().iter().map(|line| line.text.trim()))
            .filter(|piece| !piece.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Value lines with the tag column indentation removed, joined by newlines
    fn verbatim(&self) -> String {
        let (_, first) = split_tag(&self.head().text);
        std::iter::once(first)
            .chain(
                self.continuations()
                    .iter()
                    .map(|line| strip_indent(line.text.trim_end(), TAG_WIDTH)),
            )
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Folds the block into the header
    pub fn apply(self, meta: &mut Meta) -> Result<(), SyntaxError> {
        trace!(tag = %self.tag, lines = self.lines.len(), "header tag");
        match self.tag.as_str() {
            "LOCUS" => meta.locus = parse_locus(self.head())?,
            "DEFINITION" => meta.definition = self.joined(),
            "ACCESSION" => meta.accession = self.joined(),
            "VERSION" => meta.version = self.joined(),
            "KEYWORDS" => meta.keywords = self.joined(),
            "SOURCE" => self.apply_source(meta)?,
            "REFERENCE" => meta.references.push(self.parse_reference()?),
            _ => {
                let value = self.verbatim();
                // repeated blocks of one tag accumulate as further lines of its value
                match meta.other.get_mut(&self.tag) {
                    Some(existing) if existing.is_empty() => *existing = value,
                    Some(existing) => {
                        let value = value.trim_start_matches('\n');
                        if !value.is_empty() {
                            existing.push('\n');
                            existing.push_str(value);
                        }
                    }
                    None => {
                        meta.other.insert(self.tag, value);
                    }
                }
            }
        }
        Ok(())
    }

    fn apply_source(&self, meta: &mut Meta) -> Result<(), SyntaxError> {
        let (_, first) = split_tag(&self.head().text);
        let mut source = vec![first.trim()];
        let mut organism = None;
        let mut lineage = Vec::new();

        for line in self.continuations() {
            match split_tag(&line.text) {
                ("ORGANISM", name) => organism = Some(name.trim()),
                ("", text) if organism.is_none() => source.push(text.trim()),
                ("", text) => lineage.push(text.trim()),
                (sub_tag, _) => {
                    return Err(line.error(format!("unexpected sub-tag {sub_tag:?} in SOURCE")))
                }
            }
        }

        meta.source = source
            .into_iter()
            .filter(|piece| !piece.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        meta.organism = organism.unwrap_or_default().to_string();
        meta.taxonomy = parse_taxonomy(&lineage.join(" "));
        Ok(())
    }

    fn parse_reference(&self) -> Result<Reference, SyntaxError> {
        let (_, first) = split_tag(&self.head().text);
        let first = first.trim();
        let mut reference = Reference::default();
        match first.split_once(char::is_whitespace) {
            Some((index, range)) => {
                reference.index = index.to_string();
                reference.range = range.trim().to_string();
            }
            None => reference.index = first.to_string(),
        }

        // sub-field being accumulated
        let mut current: Option<(ReferenceField, Vec<&str>)> = None;
        for line in self.continuations() {
            let (sub_tag, text) = split_tag(&line.text);
            if sub_tag.is_empty() {
                match current.as_mut() {
                    Some((_, pieces)) => pieces.push(text.trim()),
                    None => {
                        // the base range itself wrapped onto the next line
                        if !reference.range.is_empty() {
                            reference.range.push(' ');
                        }
                        reference.range.push_str(text.trim());
                    }
                }
                continue;
            }

            let field = ReferenceField::from_tag(sub_tag).ok_or_else(|| {
                line.error(format!("unknown REFERENCE sub-tag {sub_tag:?}"))
            })?;
            if let Some((previous, pieces)) = current.take() {
                reference.set(previous, pieces.join(" "));
            }
            current = Some((field, vec![text.trim()]));
        }
        if let Some((previous, pieces)) = current {
            reference.set(previous, pieces.join(" "));
        }

        Ok(reference)
    }
}

/// Splits a `;`-separated lineage, dropping the final period
fn parse_taxonomy(text: &str) -> Vec<String> {
    let text = text.trim();
    let text = text.strip_suffix('.').unwrap_or(text);
    text.split(';')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}

fn looks_like_date(token: &str) -> bool {
    let bytes = token.as_bytes();
    bytes.len() == 11 && bytes[2] == b'-' && bytes[6] == b'-'
}

fn looks_like_division(token: &str) -> bool {
    token.len() == 3 && token.bytes().all(|b| b.is_ascii_uppercase())
}

/// Parses the LOCUS line
///
/// The fields are whitespace-separated rather than strictly columnar so that both the
/// modern layout and the writer's fixed five-space gutters are accepted.
pub(crate) fn parse_locus(line: &Line) -> Result<Locus, SyntaxError> {
    let malformed = |detail: &str| line.error(format!("malformed LOCUS line: {detail}"));

    let fields: Vec<&str> = line.text.split_whitespace().skip(1).collect();
    let Some((&name, rest)) = fields.split_first() else {
        return Err(malformed("missing locus name"));
    };
    let unit = rest
        .iter()
        .position(|&token| matches!(token, "bp" | "aa" | "rc"))
        .filter(|&idx| idx > 0)
        .ok_or_else(|| malformed("missing sequence length"))?;
    let length = rest[unit - 1]
        .parse::<usize>()
        .map_err(|e| malformed("invalid sequence length").with_source(e))?;

    let mut tail: Vec<&str> = rest[unit + 1..].to_vec();
    let modification_date = match tail.last() {
        Some(&token) if looks_like_date(token) => {
            tail.pop();
            token
        }
        _ => "",
    };
    let division = match tail.last() {
        Some(&token) if tail.len() > 1 && looks_like_division(token) => {
            tail.pop();
            token
        }
        _ => "",
    };
    let circular = tail
        .iter()
        .any(|token| token.eq_ignore_ascii_case("circular"));
    tail.retain(|token| {
        !token.eq_ignore_ascii_case("circular") && !token.eq_ignore_ascii_case("linear")
    });

    Ok(Locus {
        name: name.to_string(),
        length,
        molecule_type: tail.join(" "),
        circular,
        division: division.to_string(),
        modification_date: modification_date.to_string(),
    })
}

#[cfg(test)]
mod testing {
    use super::*;
    use anyhow::Result;

    fn block(lines: &[&str]) -> TagBlock {
        let mut iter = lines.iter().enumerate();
        let (_, first) = iter.next().expect("at least one line");
        let mut block = TagBlock::new(Line::new(1, first));
        for (idx, line) in iter {
            block.push(Line::new(idx + 1, line));
        }
        block
    }

    #[test]
    fn test_split_tag() {
        assert_eq!(
            split_tag("DEFINITION  Cloning vector pUC19c, complete sequence."),
            ("DEFINITION", "Cloning vector pUC19c, complete sequence.")
        );
        assert_eq!(split_tag("  ORGANISM  Synthetic"), ("ORGANISM", "Synthetic"));
        assert_eq!(split_tag("   PUBMED   2985470"), ("PUBMED", "2985470"));
        assert_eq!(split_tag("            continued"), ("", "continued"));
        assert_eq!(split_tag("FEATURES             Location/Qualifiers").0, "FEATURES");
        assert_eq!(split_tag("KEYWORDS"), ("KEYWORDS", ""));
        assert_eq!(split_tag("DEFINITION Short"), ("DEFINITION", "Short"));
    }

    #[test]
    fn test_locus_modern_layout() -> Result<()> {
        let line = Line::new(
            1,
            "LOCUS       pUC19c                  2686 bp    DNA     circular SYN 24-JUN-2009",
        );
        let locus = parse_locus(&line)?;
        assert_eq!(locus.name, "pUC19c");
        assert_eq!(locus.length, 2686);
        assert_eq!(locus.molecule_type, "DNA");
        assert!(locus.circular);
        assert_eq!(locus.division, "SYN");
        assert_eq!(locus.modification_date, "24-JUN-2009");
        Ok(())
    }

    #[test]
    fn test_locus_without_topology() -> Result<()> {
        let line = Line::new(
            1,
            "LOCUS       SCU49845     5028 bp    DNA             PLN       21-JUN-1999",
        );
        let locus = parse_locus(&line)?;
        assert_eq!(locus.molecule_type, "DNA");
        assert!(!locus.circular);
        assert_eq!(locus.division, "PLN");
        Ok(())
    }

    #[test]
    fn test_locus_errors() {
        let err = parse_locus(&Line::new(3, "LOCUS")).unwrap_err();
        assert_eq!(err.line, 3);
        assert!(err.message.contains("missing locus name"));

        let err = parse_locus(&Line::new(1, "LOCUS       name     abc bp")).unwrap_err();
        assert!(err.message.contains("invalid sequence length"));
        assert!(err.source.is_some());

        let err = parse_locus(&Line::new(1, "LOCUS       name     2686")).unwrap_err();
        assert!(err.message.contains("missing sequence length"));
    }

    #[test]
    fn test_joined_fields() -> Result<()> {
        let mut meta = Meta::default();
        block(&[
            "DEFINITION  Escherichia coli plasmid pUC19 lacZ alpha fragment gene, partial",
            "            cds; and beta-lactamase gene, complete cds.",
        ])
        .apply(&mut meta)?;
        assert_eq!(
            meta.definition,
            "Escherichia coli plasmid pUC19 lacZ alpha fragment gene, partial cds; and \
             beta-lactamase gene, complete cds."
        );
        Ok(())
    }

    #[test]
    fn test_source_block() -> Result<()> {
        let mut meta = Meta::default();
        block(&[
            "SOURCE      Escherichia coli K-12",
            "  ORGANISM  Escherichia coli K-12",
            "            Bacteria; Pseudomonadota; Gammaproteobacteria; Enterobacterales;",
            "            Enterobacteriaceae; Escherichia.",
        ])
        .apply(&mut meta)?;
        assert_eq!(meta.source, "Escherichia coli K-12");
        assert_eq!(meta.organism, "Escherichia coli K-12");
        assert_eq!(
            meta.taxonomy,
            vec![
                "Bacteria",
                "Pseudomonadota",
                "Gammaproteobacteria",
                "Enterobacterales",
                "Enterobacteriaceae",
                "Escherichia"
            ]
        );
        Ok(())
    }

    #[test]
    fn test_reference_block() -> Result<()> {
        let mut meta = Meta::default();
        block(&[
            "REFERENCE   1  (bases 1 to 2686)",
            "  AUTHORS   Yanisch-Perron,C., Vieira,J. and Messing,J.",
            "  TITLE     Improved M13 phage cloning vectors and host strains: nucleotide",
            "            sequences of the M13mp18 and pUC19 vectors",
            "  JOURNAL   Gene 33 (1), 103-119 (1985)",
            "   PUBMED   2985470",
        ])
        .apply(&mut meta)?;
        let reference = &meta.references[0];
        assert_eq!(reference.index, "1");
        assert_eq!(reference.range, "(bases 1 to 2686)");
        assert_eq!(reference.authors, "Yanisch-Perron,C., Vieira,J. and Messing,J.");
        assert_eq!(
            reference.title,
            "Improved M13 phage cloning vectors and host strains: nucleotide sequences of \
             the M13mp18 and pUC19 vectors"
        );
        assert_eq!(reference.journal, "Gene 33 (1), 103-119 (1985)");
        assert_eq!(reference.pubmed, "2985470");
        assert!(reference.remark.is_empty());
        Ok(())
    }

    #[test]
    fn test_unknown_reference_sub_tag() {
        let mut meta = Meta::default();
        let err = block(&[
            "REFERENCE   2",
            "  AUTHORS   Someone,A.",
            "  MEDLINE   85230512",
        ])
        .apply(&mut meta)
        .unwrap_err();
        assert_eq!(err.line, 3);
        assert!(err.message.contains("MEDLINE"));
    }

    #[test]
    fn test_other_tags_verbatim() -> Result<()> {
        let mut meta = Meta::default();
        let comment = block(&[
            "COMMENT     Vector map:",
            "              ori   1..589",
            "            END",
        ]);
        assert_eq!(comment.tag(), "COMMENT");
        comment.apply(&mut meta)?;
        assert_eq!(meta.other["COMMENT"], "Vector map:\n  ori   1..589\nEND");
        Ok(())
    }

    #[test]
    fn test_repeated_other_tag_accumulates() -> Result<()> {
        let mut meta = Meta::default();
        block(&["COMMENT     first comment."]).apply(&mut meta)?;
        block(&["COMMENT     second comment.", "            continued."]).apply(&mut meta)?;
        assert_eq!(meta.other.len(), 1);
        assert_eq!(
            meta.other["COMMENT"],
            "first comment.\nsecond comment.\ncontinued."
        );
        Ok(())
    }

    #[test]
    fn test_taxonomy_edge_cases() {
        assert!(parse_taxonomy("").is_empty());
        assert_eq!(parse_taxonomy("Unclassified."), vec!["Unclassified"]);
        assert_eq!(parse_taxonomy("other sequences; artificial sequences."), vec![
            "other sequences",
            "artificial sequences"
        ]);
    }
}

//! Line layout of the flat file
//!
//! Every function here renders one section of a record. None of them validate their
//! input; see [`validate`] for the checks run before a record is rendered.

use std::io::{self, Write};

use crate::{
    error::WriteError,
    header::{Meta, Reference, TAG_WIDTH},
    utils::wrap_words,
    Feature, Record,
};

/// Text columns available after the tag column
pub const WRAP_WIDTH: usize = 80 - TAG_WIDTH;

/// Gutter between LOCUS fields
const LOCUS_GUTTER: &str = "     ";

/// Indent of a continuation line in the header
const CONTINUATION: &str = "            ";

/// Indent of a feature key
const FEATURE_INDENT: &str = "     ";

/// Width of the feature key column
const KEY_WIDTH: usize = 16;

/// Indent of a qualifier line
const QUALIFIER_INDENT: &str = "                     ";

const BASES_PER_LINE: usize = 60;
const BASES_PER_BLOCK: usize = 10;
const INDEX_WIDTH: usize = 9;

/// Tags the header writer emits itself, which an entry in `Meta::other` must not shadow
const RESERVED_TAGS: [&str; 9] = [
    "LOCUS",
    "DEFINITION",
    "ACCESSION",
    "VERSION",
    "KEYWORDS",
    "SOURCE",
    "REFERENCE",
    "FEATURES",
    "ORIGIN",
];

/// Checks that a record can be written and read back unchanged
pub fn validate(record: &Record) -> Result<(), WriteError> {
    let name = &record.meta.locus.name;
    if name.is_empty() || name.contains(char::is_whitespace) {
        return Err(WriteError::InvalidLocusName(name.clone()));
    }

    for (tag, value) in &record.meta.other {
        let shadowed = RESERVED_TAGS.contains(&tag.as_str());
        let malformed = tag.trim().is_empty()
            || tag.starts_with(char::is_whitespace)
            || tag.starts_with("//");
        let blank_line = value.split('\n').skip(1).any(|line| line.trim().is_empty());
        if shadowed || malformed || blank_line {
            return Err(WriteError::InvalidTag(tag.clone()));
        }
    }

    for (position, reference) in record.meta.references.iter().enumerate() {
        let index = &reference.index;
        let orphan_range = index.is_empty() && !reference.range.is_empty();
        if orphan_range || index.contains(char::is_whitespace) {
            return Err(WriteError::InvalidReference(position, index.clone()));
        }
    }

    for feature in &record.features {
        validate_feature(feature)?;
    }

    if let Some((position, found)) = record
        .sequence
        .chars()
        .enumerate()
        .find(|(_, c)| !c.is_ascii_alphabetic())
    {
        return Err(WriteError::InvalidSequence { position, found });
    }
    Ok(())
}

fn validate_feature(feature: &Feature) -> Result<(), WriteError> {
    let kind = &feature.kind;
    if kind.is_empty() || kind.contains(char::is_whitespace) || kind.contains('/') {
        return Err(WriteError::InvalidFeatureKind(kind.clone()));
    }
    feature
        .location
        .validate()
        .map_err(|source| WriteError::InvalidFeatureLocation {
            kind: kind.clone(),
            source,
        })?;
    for (name, value) in &feature.qualifiers {
        let bad_name = name.is_empty() || name.contains(['=', '"']) || name.contains(char::is_whitespace);
        if bad_name || value.contains(['\n', '\r']) {
            return Err(WriteError::InvalidQualifier {
                kind: kind.clone(),
                name: name.clone(),
            });
        }
    }
    Ok(())
}

/// Writes `head` followed by `text`, without trailing whitespace
fn write_line<W: Write>(out: &mut W, head: &str, text: &str) -> io::Result<()> {
    if text.is_empty() {
        writeln!(out, "{}", head.trim_end())
    } else {
        writeln!(out, "{head}{text}")
    }
}

/// Pads a tag to the tag column
fn label(tag: &str) -> String {
    if tag.len() < TAG_WIDTH {
        format!("{tag:<width$}", width = TAG_WIDTH)
    } else {
        format!("{tag} ")
    }
}

/// Writes a word-wrapped field whose first line starts with `head`
fn write_wrapped<W: Write>(out: &mut W, head: &str, text: &str) -> io::Result<()> {
    for (idx, line) in wrap_words(text, WRAP_WIDTH).into_iter().enumerate() {
        write_line(out, if idx == 0 { head } else { CONTINUATION }, line)?;
    }
    Ok(())
}

fn write_locus<W: Write>(out: &mut W, meta: &Meta) -> io::Result<()> {
    let locus = &meta.locus;
    let mut length = itoa::Buffer::new();
    let length = format!("{} bp", length.format(locus.length));
    let fields = [
        locus.name.as_str(),
        length.as_str(),
        locus.molecule_type.as_str(),
        locus.topology(),
        locus.division.as_str(),
        locus.modification_date.as_str(),
    ];
    let fields: Vec<&str> = fields.into_iter().filter(|f| !f.is_empty()).collect();
    write_line(out, &label("LOCUS"), &fields.join(LOCUS_GUTTER))
}

fn write_source<W: Write>(out: &mut W, meta: &Meta) -> io::Result<()> {
    let has_lineage = !meta.organism.is_empty() || !meta.taxonomy.is_empty();
    if meta.source.is_empty() && !has_lineage {
        return Ok(());
    }
    write_wrapped(out, &label("SOURCE"), &meta.source)?;
    if has_lineage {
        write_line(out, "  ORGANISM  ", &meta.organism)?;
    }
    if !meta.taxonomy.is_empty() {
        let lineage = format!("{}.", meta.taxonomy.join("; "));
        for line in wrap_words(&lineage, WRAP_WIDTH) {
            write_line(out, CONTINUATION, line)?;
        }
    }
    Ok(())
}

fn write_reference<W: Write>(out: &mut W, reference: &Reference) -> io::Result<()> {
    let mut first = reference.index.clone();
    if !reference.range.is_empty() {
        first.push_str("  ");
        first.push_str(&reference.range);
    }
    write_line(out, &label("REFERENCE"), &first)?;
    for (field, value) in reference.fields() {
        write_wrapped(out, field.label(), value)?;
    }
    Ok(())
}

/// Writes a tag stored verbatim, one output line per stored line
fn write_verbatim<W: Write>(out: &mut W, tag: &str, value: &str) -> io::Result<()> {
    let head = label(tag);
    for (idx, line) in value.split('\n').enumerate() {
        write_line(out, if idx == 0 { &head } else { CONTINUATION }, line)?;
    }
    Ok(())
}

/// Writes every header section up to (not including) the feature table
pub fn write_header<W: Write>(out: &mut W, meta: &Meta) -> io::Result<()> {
    write_locus(out, meta)?;
    for (tag, text) in [
        ("DEFINITION", &meta.definition),
        ("ACCESSION", &meta.accession),
        ("VERSION", &meta.version),
        ("KEYWORDS", &meta.keywords),
    ] {
        if !text.is_empty() {
            write_wrapped(out, &label(tag), text)?;
        }
    }
    write_source(out, meta)?;
    for reference in &meta.references {
        write_reference(out, reference)?;
    }
    for (tag, value) in &meta.other {
        write_verbatim(out, tag, value)?;
    }
    Ok(())
}

fn write_feature<W: Write>(out: &mut W, feature: &Feature) -> io::Result<()> {
    let kind = &feature.kind;
    if kind.len() < KEY_WIDTH {
        writeln!(
            out,
            "{FEATURE_INDENT}{kind:<width$}{}",
            feature.location,
            width = KEY_WIDTH
        )?;
    } else {
        writeln!(out, "{FEATURE_INDENT}{kind} {}", feature.location)?;
    }
    for (name, value) in &feature.qualifiers {
        writeln!(
            out,
            "{QUALIFIER_INDENT}/{name}=\"{}\"",
            value.replace('"', "\"\"")
        )?;
    }
    Ok(())
}

/// Writes the FEATURES header line and every feature
pub fn write_features<W: Write>(out: &mut W, features: &[Feature]) -> io::Result<()> {
    writeln!(out, "FEATURES             Location/Qualifiers")?;
    for feature in features {
        write_feature(out, feature)?;
    }
    Ok(())
}

/// Writes the ORIGIN block and the record terminator
pub fn write_origin<W: Write>(out: &mut W, sequence: &str) -> io::Result<()> {
    writeln!(out, "ORIGIN")?;
    let mut index = itoa::Buffer::new();
    for (line_idx, bases) in sequence.as_bytes().chunks(BASES_PER_LINE).enumerate() {
        let position = index.format(line_idx * BASES_PER_LINE + 1);
        write!(out, "{position:>width$}", width = INDEX_WIDTH)?;
        for block in bases.chunks(BASES_PER_BLOCK) {
            out.write_all(b" ")?;
            out.write_all(block)?;
        }
        out.write_all(b"\n")?;
    }
    out.write_all(b"//\n")
}

#[cfg(test)]
mod testing {
    use super::*;
    use crate::{Location, Locus};
    use anyhow::Result;

    fn render<F>(f: F) -> Result<String>
    where
        F: FnOnce(&mut Vec<u8>) -> io::Result<()>,
    {
        let mut out = Vec::new();
        f(&mut out)?;
        Ok(String::from_utf8(out)?)
    }

    #[test]
    fn test_locus_line() -> Result<()> {
        let meta = Meta {
            locus: Locus {
                name: "pUC19c".to_string(),
                length: 2686,
                molecule_type: "DNA".to_string(),
                circular: true,
                division: "SYN".to_string(),
                modification_date: "24-JUN-2009".to_string(),
            },
            ..Default::default()
        };
        let text = render(|out| write_locus(out, &meta))?;
        assert_eq!(
            text,
            "LOCUS       pUC19c     2686 bp     DNA     circular     SYN     24-JUN-2009\n"
        );
        Ok(())
    }

    #[test]
    fn test_wrapped_definition() -> Result<()> {
        let text = "Escherichia coli plasmid pUC19 lacZ alpha fragment gene, partial cds; and \
                    beta-lactamase gene, complete cds.";
        let rendered = render(|out| write_wrapped(out, &label("DEFINITION"), text))?;
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("DEFINITION  Escherichia"));
        assert!(lines[1].starts_with("            "));
        assert!(lines.iter().all(|line| line.len() <= 80));
        Ok(())
    }

    #[test]
    fn test_feature_layout() -> Result<()> {
        let feature = Feature::new("CDS", "complement(join(1..5,8..10))".parse::<Location>()?)
            .with_qualifier("note", "say \"hi\"")
            .with_qualifier("codon_start", "1");
        let text = render(|out| write_feature(out, &feature))?;
        assert_eq!(
            text,
            "     CDS             complement(join(1..5,8..10))\n\
             \x20                    /note=\"say \"\"hi\"\"\"\n\
             \x20                    /codon_start=\"1\"\n"
        );

        let long = Feature::new("regulatory_region", "1..4".parse::<Location>()?);
        let text = render(|out| write_feature(out, &long))?;
        assert_eq!(text, "     regulatory_region 1..4\n");
        Ok(())
    }

    #[test]
    fn test_origin_layout() -> Result<()> {
        let sequence = "acgt".repeat(16);
        let text = render(|out| write_origin(out, &sequence))?;
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "ORIGIN");
        assert_eq!(
            lines[1],
            "        1 acgtacgtac gtacgtacgt acgtacgtac gtacgtacgt acgtacgtac gtacgtacgt"
        );
        assert_eq!(lines[2], "       61 acgt");
        assert_eq!(lines[3], "//");

        let empty = render(|out| write_origin(out, ""))?;
        assert_eq!(empty, "ORIGIN\n//\n");
        Ok(())
    }

    #[test]
    fn test_validate_rejects_unwritable_records() -> Result<()> {
        let mut record = Record::default();
        assert!(matches!(validate(&record), Err(WriteError::InvalidLocusName(_))));

        record.meta.locus.name = "demo".to_string();
        record.sequence = "acgt".to_string();
        validate(&record)?;

        record.sequence = "ac gt".to_string();
        assert!(matches!(
            validate(&record),
            Err(WriteError::InvalidSequence { position: 2, found: ' ' })
        ));
        record.sequence = "acgt".to_string();

        record.meta.other.insert("ORIGIN".to_string(), "x".to_string());
        assert!(matches!(validate(&record), Err(WriteError::InvalidTag(_))));
        record.meta.other.clear();

        record.add_feature(Feature::new("misc feature", Location::point(1)));
        assert!(matches!(validate(&record), Err(WriteError::InvalidFeatureKind(_))));
        record.features.clear();

        record.add_feature(Feature::new("gene", Location::point(1)).with_qualifier("note", "a\nb"));
        assert!(matches!(validate(&record), Err(WriteError::InvalidQualifier { .. })));
        record.features.clear();

        let mut reference = Reference {
            range: "(bases 1 to 4)".to_string(),
            ..Reference::default()
        };
        record.meta.references.push(reference.clone());
        assert!(matches!(
            validate(&record),
            Err(WriteError::InvalidReference(0, _))
        ));
        reference.index = "1 2".to_string();
        record.meta.references[0] = reference.clone();
        assert!(matches!(
            validate(&record),
            Err(WriteError::InvalidReference(0, _))
        ));
        reference.index = "1".to_string();
        record.meta.references[0] = reference;
        validate(&record)?;

        record.add_feature(Feature::new("gene", Location::Join(vec![])));
        assert!(matches!(
            validate(&record),
            Err(WriteError::InvalidFeatureLocation { .. })
        ));
        Ok(())
    }
}

//! Header module for the gbseq library
//!
//! This module provides the structured header of a GenBank record: the LOCUS summary,
//! the free-text descriptive fields, the source organism and its taxonomy, the literature
//! references, and an open mapping for every tag the parser does not model explicitly.

use indexmap::IndexMap;

/// Width of the tag column in the header block
pub const TAG_WIDTH: usize = 12;

/// The LOCUS line summary
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Locus {
    /// Locus name (a single token)
    pub name: String,

    /// Sequence length in bases
    pub length: usize,

    /// Molecule type (e.g. `DNA`, `mRNA`, `ss-RNA`)
    pub molecule_type: String,

    /// Circular topology; linear otherwise
    pub circular: bool,

    /// Three-letter GenBank division code (e.g. `SYN`, `BCT`)
    pub division: String,

    /// Modification date as written (e.g. `24-JUN-2009`)
    pub modification_date: String,
}
impl Locus {
    /// Returns the topology keyword used on the LOCUS line
    #[must_use]
    pub fn topology(&self) -> &'static str {
        if self.circular {
            "circular"
        } else {
            "linear"
        }
    }
}

/// Sub-fields of a REFERENCE block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceField {
    Authors,
    Consortium,
    Title,
    Journal,
    PubMed,
    Remark,
}
impl ReferenceField {
    /// All sub-fields, in the order they are written
    pub const ALL: [Self; 6] = [
        Self::Authors,
        Self::Consortium,
        Self::Title,
        Self::Journal,
        Self::PubMed,
        Self::Remark,
    ];

    /// Looks up a sub-field by its sub-tag
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "AUTHORS" => Some(Self::Authors),
            "CONSRTM" => Some(Self::Consortium),
            "TITLE" => Some(Self::Title),
            "JOURNAL" => Some(Self::Journal),
            "PUBMED" => Some(Self::PubMed),
            "REMARK" => Some(Self::Remark),
            _ => None,
        }
    }

    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            Self::Authors => "AUTHORS",
            Self::Consortium => "CONSRTM",
            Self::Title => "TITLE",
            Self::Journal => "JOURNAL",
            Self::PubMed => "PUBMED",
            Self::Remark => "REMARK",
        }
    }

    /// The sub-tag padded to the tag column, as it appears on the first line of the field
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Authors => "  AUTHORS   ",
            Self::Consortium => "  CONSRTM   ",
            Self::Title => "  TITLE     ",
            Self::Journal => "  JOURNAL   ",
            Self::PubMed => "   PUBMED   ",
            Self::Remark => "  REMARK    ",
        }
    }
}

/// A literature reference
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Reference {
    /// Reference number as written (usually `1`, `2`, ...)
    pub index: String,

    /// Base-range text following the index (e.g. `(bases 1 to 2686)`)
    pub range: String,

    pub authors: String,
    pub consortium: String,
    pub title: String,
    pub journal: String,
    pub pubmed: String,
    pub remark: String,
}
impl Reference {
    #[must_use]
    pub fn get(&self, field: ReferenceField) -> &str {
        match field {
            ReferenceField::Authors => &self.authors,
            ReferenceField::Consortium => &self.consortium,
            ReferenceField::Title => &self.title,
            ReferenceField::Journal => &self.journal,
            ReferenceField::PubMed => &self.pubmed,
            ReferenceField::Remark => &self.remark,
        }
    }

    pub fn set(&mut self, field: ReferenceField, value: String) {
        let slot = match field {
            ReferenceField::Authors => &mut self.authors,
            ReferenceField::Consortium => &mut self.consortium,
            ReferenceField::Title => &mut self.title,
            ReferenceField::Journal => &mut self.journal,
            ReferenceField::PubMed => &mut self.pubmed,
            ReferenceField::Remark => &mut self.remark,
        };
        *slot = value;
    }

    /// Iterates over the populated sub-fields in write order
    pub fn fields(&self) -> impl Iterator<Item = (ReferenceField, &str)> {
        ReferenceField::ALL
            .into_iter()
            .map(|field| (field, self.get(field)))
            .filter(|(_, value)| !value.is_empty())
    }
}

/// Structured header metadata of a GenBank record
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Meta {
    pub locus: Locus,
    pub definition: String,
    pub accession: String,
    pub version: String,
    pub keywords: String,

    /// Free-text source name from the SOURCE line
    pub source: String,

    /// Scientific name from the ORGANISM sub-tag
    pub organism: String,

    /// Taxonomic lineage, most general first
    pub taxonomy: Vec<String>,

    pub references: Vec<Reference>,

    /// Raw text of every other tag, keyed by tag name
    ///
    /// Continuation lines are kept line by line (joined with `\n`) with the tag column
    /// indentation removed.
    pub other: IndexMap<String, String>,
}

use indexmap::IndexMap;

use crate::{error::LocationError, Location, Meta};

/// An annotated region of a record's sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feature {
    /// Feature key (e.g. `CDS`, `gene`, `rep_origin`)
    pub kind: String,

    /// Free-text description; not part of the flat-file representation
    pub description: String,

    /// Qualifiers in first-seen order; a repeated qualifier keeps only its last value
    pub qualifiers: IndexMap<String, String>,

    pub location: Location,
}
impl Feature {
    #[must_use]
    pub fn new(kind: impl Into<String>, location: Location) -> Self {
        Self {
            kind: kind.into(),
            description: String::new(),
            qualifiers: IndexMap::new(),
            location,
        }
    }

    /// Sets a qualifier, replacing any previous value under the same name
    #[must_use]
    pub fn with_qualifier(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.qualifiers.insert(name.into(), value.into());
        self
    }

    /// Returns the value of a qualifier
    #[must_use]
    pub fn qualifier(&self, name: &str) -> Option<&str> {
        self.qualifiers.get(name).map(String::as_str)
    }

    /// Resolves the feature's subsequence against its parent record
    ///
    /// # Errors
    ///
    /// Returns [`LocationError::OutOfBounds`] if the location does not fit the parent's
    /// sequence.
    pub fn sequence(&self, parent: &Record) -> Result<String, LocationError> {
        self.location.resolve(&parent.sequence)
    }
}

/// A complete GenBank record
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Record {
    pub meta: Meta,

    /// Features in file order
    pub features: Vec<Feature>,

    /// Raw sequence, as written in the ORIGIN block
    pub sequence: String,
}
impl Record {
    #[must_use]
    pub fn new(meta: Meta, sequence: impl Into<String>) -> Self {
        Self {
            meta,
            features: Vec::new(),
            sequence: sequence.into(),
        }
    }

    /// Appends a feature and returns its index
    pub fn add_feature(&mut self, feature: Feature) -> usize {
        self.features.push(feature);
        self.features.len() - 1
    }

    /// Iterates over the features of a given kind
    pub fn features_of<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a Feature> + 'a {
        self.features.iter().filter(move |feature| feature.kind == kind)
    }

    /// Resolves the subsequence of the feature at `idx`
    ///
    /// Returns `None` if there is no feature at that index.
    pub fn feature_sequence(&self, idx: usize) -> Option<Result<String, LocationError>> {
        self.features.get(idx).map(|feature| feature.sequence(self))
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.meta.locus.name
    }
}

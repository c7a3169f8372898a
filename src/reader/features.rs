//! The FEATURES table
//!
//! Feature lines carry the key in columns 5..21 and the location from column 21 onward.
//! Location strings may wrap onto following lines; qualifiers start with `/` and quoted
//! values may span any number of lines.

use indexmap::IndexMap;
use tracing::trace;

use super::meta::Line;
use crate::{error::SyntaxError, location::parse_location, Feature};

/// Column at which locations and qualifiers begin
pub(crate) const QUALIFIER_COLUMN: usize = 21;

/// True if the key columns of a feature-table line are blank
fn key_field_blank(line: &str) -> bool {
    line.bytes()
        .take(QUALIFIER_COLUMN)
        .all(|b| b.is_ascii_whitespace())
}

/// Returns the body of a quoted value if `text` ends with an unescaped closing quote
///
/// Quotes inside a value are escaped by doubling them, so the value is closed exactly
/// when it ends with an odd run of quotes.
fn closing_quote(text: &str) -> Option<&str> {
    let run = text.bytes().rev().take_while(|&b| b == b'"').count();
    if run % 2 == 1 {
        Some(&text[..text.len() - 1])
    } else {
        None
    }
}

fn unescape(value: &str) -> String {
    value.replace("\"\"", "\"")
}

/// A quoted qualifier value still waiting for its closing quote
#[derive(Debug)]
struct OpenValue {
    name: String,
    value: String,
    line: Line,
}

/// The feature currently being assembled
#[derive(Debug)]
struct PendingFeature {
    kind: String,
    line: Line,
    location: String,

    /// Lines without a `/` still extend the location string
    location_open: bool,

    qualifiers: IndexMap<String, String>,
    open_value: Option<OpenValue>,

    /// Name of the last qualifier if its value was unquoted
    last_unquoted: Option<String>,
}
impl PendingFeature {
    fn push_qualifier(&mut self, line: Line, body: &str) -> Result<(), SyntaxError> {
        let Some((name, value)) = body.split_once('=') else {
            return Err(line.error("qualifier is missing its '=' separator"));
        };
        if name.is_empty() {
            return Err(line.error("qualifier has an empty name"));
        }

        self.last_unquoted = None;
        match value.strip_prefix('"') {
            Some(inner) => match closing_quote(inner) {
                Some(body) => {
                    self.qualifiers.insert(name.to_string(), unescape(body));
                }
                None => {
                    self.open_value = Some(OpenValue {
                        name: name.to_string(),
                        value: inner.to_string(),
                        line,
                    });
                }
            },
            None => {
                self.qualifiers.insert(name.to_string(), value.to_string());
                self.last_unquoted = Some(name.to_string());
            }
        }
        Ok(())
    }

    fn into_feature(self) -> Result<Feature, SyntaxError> {
        if let Some(open) = self.open_value {
            return Err(open.line.error("unterminated quoted qualifier value"));
        }
        let location = parse_location(&self.location).map_err(|e| {
            self.line
                .error(format!("invalid feature location {:?}", self.location))
                .with_source(e)
        })?;
        let mut feature = Feature::new(self.kind, location);
        feature.qualifiers = self.qualifiers;
        Ok(feature)
    }
}

/// Line-by-line parser for the FEATURES table
#[derive(Debug, Default)]
pub(crate) struct FeatureBlock {
    features: Vec<Feature>,
    pending: Option<PendingFeature>,
}
impl FeatureBlock {
    /// Consumes one indented line of the feature table
    pub fn push_line(&mut self, number: usize, line: &str) -> Result<(), SyntaxError> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Ok(());
        }

        if let Some(pending) = self.pending.as_mut() {
            if let Some(open) = pending.open_value.as_mut() {
                match closing_quote(trimmed) {
                    Some(body) => {
                        open.value.push_str(body);
                        if let Some(open) = pending.open_value.take() {
                            pending.qualifiers.insert(open.name, unescape(&open.value));
                        }
                    }
                    None => open.value.push_str(trimmed),
                }
                return Ok(());
            }

            if let Some(body) = trimmed.strip_prefix('/') {
                pending.location_open = false;
                return pending.push_qualifier(Line::new(number, line), body);
            }

            if key_field_blank(line) {
                if pending.location_open {
                    pending.location.push_str(trimmed);
                    return Ok(());
                }
                if let Some(name) = &pending.last_unquoted {
                    if let Some(value) = pending.qualifiers.get_mut(name) {
                        value.push_str(trimmed);
                        return Ok(());
                    }
                }
                return Err(SyntaxError::new(number, line, "unexpected continuation line"));
            }
        }

        self.start_feature(number, line)
    }

    fn start_feature(&mut self, number: usize, line: &str) -> Result<(), SyntaxError> {
        if line.contains('/') {
            return Err(SyntaxError::new(
                number,
                line,
                "qualifier lines must begin with '/'",
            ));
        }
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() < 2 {
            return Err(SyntaxError::new(
                number,
                line,
                "malformed feature line: expected a key and a location",
            ));
        }

        self.flush()?;
        self.pending = Some(PendingFeature {
            kind: tokens[0].to_string(),
            line: Line::new(number, line),
            location: tokens[tokens.len() - 1].to_string(),
            location_open: true,
            qualifiers: IndexMap::new(),
            open_value: None,
            last_unquoted: None,
        });
        Ok(())
    }

    /// Finalises the in-progress feature, if any
    fn flush(&mut self) -> Result<(), SyntaxError> {
        if let Some(pending) = self.pending.take() {
            let feature = pending.into_feature()?;
            trace!(kind = %feature.kind, location = %feature.location, "feature");
            self.features.push(feature);
        }
        Ok(())
    }

    /// Ends the feature table and returns every feature parsed from it
    pub fn finish(&mut self) -> Result<Vec<Feature>, SyntaxError> {
        self.flush()?;
        Ok(std::mem::take(&mut self.features))
    }
}

#[cfg(test)]
mod testing {
    use super::*;
    use crate::Location;
    use anyhow::Result;

    fn parse_table(lines: &[&str]) -> Result<Vec<Feature>, SyntaxError> {
        let mut block = FeatureBlock::default();
        for (idx, line) in lines.iter().enumerate() {
            block.push_line(idx + 1, line)?;
        }
        block.finish()
    }

    #[test]
    fn test_simple_features() -> Result<()> {
        let features = parse_table(&[
            "     source          1..2686",
            "                     /organism=\"synthetic DNA construct\"",
            "                     /mol_type=\"other DNA\"",
            "     CDS             complement(1626..2486)",
            "                     /gene=\"bla\"",
            "                     /codon_start=1",
            "                     /transl_table=11",
        ])?;
        assert_eq!(features.len(), 2);
        assert_eq!(features[0].kind, "source");
        assert_eq!(features[0].location, "1..2686".parse::<Location>()?);
        assert_eq!(features[0].qualifier("organism"), Some("synthetic DNA construct"));
        assert_eq!(features[1].kind, "CDS");
        assert!(features[1].location.is_complement());
        assert_eq!(features[1].qualifier("codon_start"), Some("1"));
        assert_eq!(features[1].qualifier("transl_table"), Some("11"));
        Ok(())
    }

    #[test]
    fn test_multiline_quoted_value() -> Result<()> {
        let features = parse_table(&[
            "     CDS             146..469",
            "                     /translation=\"MTMITPSLHACRSTLEDPRVPSSNSLAVVLQRRDWENPGVTQLNRL",
            "                     AAHPPFASWRNSEEARTDRPSQQLRSLNGEWRLM",
            "                     RYFLLTHLCGISHRIWCTLSTICSDA",
            "                     A\"",
        ])?;
        assert_eq!(
            features[0].qualifier("translation"),
            Some(
                "MTMITPSLHACRSTLEDPRVPSSNSLAVVLQRRDWENPGVTQLNRLAAHPPFASWRNSEEARTDRPSQQLRSLNGEWRLMRYFLLTHLCGISHRIWCTLSTICSDAA"
            )
        );
        assert!(!features[0].qualifier("translation").unwrap_or_default().contains('\n'));
        Ok(())
    }

    #[test]
    fn test_wrapped_location() -> Result<()> {
        let features = parse_table(&[
            "     mRNA            join(<265..402,673..781,911..1007,1088..1215,",
            "                     1377..1573,1866..2146,2306..2634,2683..>2855)",
            "                     /gene=\"ADH1\"",
        ])?;
        let Location::Join(children) = &features[0].location else {
            panic!("expected a join");
        };
        assert_eq!(children.len(), 8);
        assert_eq!(
            features[0].location.to_string(),
            "join(<265..402,673..781,911..1007,1088..1215,1377..1573,1866..2146,2306..2634,2683..>2855)"
        );
        Ok(())
    }

    #[test]
    fn test_escaped_quotes_and_slashes() -> Result<()> {
        let features = parse_table(&[
            "     misc_feature    10..20",
            "                     /note=\"the \"\"lac\"\" operator / promoter\"",
            "                     /label=\"ends with \"\"\"",
            "                     /empty=\"\"",
        ])?;
        assert_eq!(
            features[0].qualifier("note"),
            Some("the \"lac\" operator / promoter")
        );
        assert_eq!(features[0].qualifier("label"), Some("ends with \""));
        assert_eq!(features[0].qualifier("empty"), Some(""));
        Ok(())
    }

    #[test]
    fn test_duplicate_qualifier_last_wins() -> Result<()> {
        let features = parse_table(&[
            "     gene            1..100",
            "                     /note=\"first\"",
            "                     /gene=\"lacZ\"",
            "                     /note=\"second\"",
        ])?;
        assert_eq!(features[0].qualifier("note"), Some("second"));
        assert_eq!(features[0].qualifiers.len(), 2);
        Ok(())
    }

    #[test]
    fn test_unquoted_value_continuation() -> Result<()> {
        let features = parse_table(&[
            "     tRNA            100..175",
            "                     /anticodon=(pos:complement(136..138),",
            "                     aa:Ala,seq:tgc)",
        ])?;
        assert_eq!(
            features[0].qualifier("anticodon"),
            Some("(pos:complement(136..138),aa:Ala,seq:tgc)")
        );
        Ok(())
    }

    #[test]
    fn test_qualifier_without_equals() {
        let err = parse_table(&[
            "     CDS             1..99",
            "                     /pseudo",
        ])
        .unwrap_err();
        assert_eq!(err.line, 2);
        assert!(err.message.contains("'='"));
    }

    #[test]
    fn test_malformed_feature_line() {
        let err = parse_table(&["     CDS"]).unwrap_err();
        assert_eq!(err.line, 1);
        assert!(err.message.contains("malformed feature line"));
    }

    #[test]
    fn test_unterminated_quote() {
        let err = parse_table(&[
            "     CDS             1..99",
            "                     /product=\"never closed",
            "                     still open",
        ])
        .unwrap_err();
        assert_eq!(err.line, 2);
        assert!(err.message.contains("unterminated"));
    }

    #[test]
    fn test_invalid_location_is_wrapped() {
        let err = parse_table(&["     CDS             join(1..5,6..x)"]).unwrap_err();
        assert_eq!(err.line, 1);
        assert!(err.source.is_some());
    }
}

use bio::alphabets::dna;

/// Reverse-complements a nucleotide sequence
///
/// IUPAC ambiguity codes are complemented and case is preserved; other characters are
/// carried over unchanged.
#[must_use]
pub fn reverse_complement(sequence: &str) -> String {
    String::from_utf8_lossy(&dna::revcomp(sequence.as_bytes())).into_owned()
}

/// Greedily wraps `text` at single spaces so that no line exceeds `width` characters
///
/// The separating space at each break is dropped, so joining the returned lines with a
/// single space reproduces the input. Words longer than `width` are kept whole on their
/// own line.
#[must_use]
pub fn wrap_words(text: &str, width: usize) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut rest = text;
    while rest.chars().count() > width {
        // byte offset of the first character past the width limit
        let limit = rest
            .char_indices()
            .nth(width)
            .map_or(rest.len(), |(idx, _)| idx);

        let split = if rest[limit..].starts_with(' ') {
            Some(limit)
        } else {
            rest[..limit].rfind(' ').filter(|&idx| idx > 0)
        };
        let split = match split {
            Some(idx) => idx,
            None => match rest[limit..].find(' ') {
                Some(idx) => limit + idx,
                None => break,
            },
        };
        lines.push(&rest[..split]);
        rest = &rest[split + 1..];
    }
    lines.push(rest);
    lines
}

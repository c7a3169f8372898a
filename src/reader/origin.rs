/// Appends the residues of one ORIGIN line to `sequence`
///
/// Base indices, spacing and any other non-letter characters are discarded; letter case
/// is kept as written.
pub(crate) fn push_origin_line(sequence: &mut String, line: &str) {
    sequence.extend(line.chars().filter(char::is_ascii_alphabetic));
}

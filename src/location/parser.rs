//! Recursive-descent parser for location expressions

use super::{Location, Span};
use crate::error::LocationError;

/// Parses a location expression into a location tree
///
/// Accepts ranges (`1..243`, `<1..206`, `687..>3158`), points (`467`),
/// `complement(...)` and `join(...)` at any nesting depth.
///
/// # Errors
///
/// Returns a [`LocationError`] describing the first problem found in the expression.
pub fn parse_location(expr: &str) -> Result<Location, LocationError> {
    let expr = expr.trim();
    if expr.is_empty() {
        return Err(LocationError::Empty);
    }
    parse_node(expr, expr)
}

fn parse_node(expr: &str, full: &str) -> Result<Location, LocationError> {
    let Some(open) = expr.find('(') else {
        return parse_leaf(expr).map(Location::Range);
    };
    let close = matching_paren(expr, open)
        .ok_or_else(|| LocationError::UnbalancedParentheses(full.to_string()))?;
    let trailing = expr[close + 1..].trim();
    if !trailing.is_empty() {
        return Err(LocationError::TrailingText(trailing.to_string()));
    }

    let mut children = split_arguments(&expr[open + 1..close])
        .into_iter()
        .map(|arg| {
            let arg = arg.trim();
            if arg.is_empty() {
                Err(LocationError::Empty)
            } else {
                parse_node(arg, full)
            }
        })
        .collect::<Result<Vec<_>, _>>()?;

    match expr[..open].trim() {
        "complement" if children.len() == 1 => Ok(Location::complement(children.remove(0))),
        "complement" => Err(LocationError::ComplementArity(children.len())),
        // a single-child join or a bare parenthesised group collapses into its child
        "join" | "" if children.len() == 1 => Ok(children.remove(0)),
        "join" => Location::join(children),
        operator => Err(LocationError::UnsupportedOperator(operator.to_string())),
    }
}

/// Parses a leaf (`range` or `point` in the grammar)
fn parse_leaf(expr: &str) -> Result<Span, LocationError> {
    let five_prime_partial = expr.contains('<');
    let three_prime_partial = expr.contains('>');

    let span = match expr.split_once("..") {
        Some((start, end)) => {
            let start = parse_coordinate(start)?;
            let end = parse_coordinate(end)?;
            if start == 0 {
                return Err(LocationError::InvalidCoordinate("0".to_string()));
            }
            if start > end {
                return Err(LocationError::InvertedRange { start, end });
            }
            Span::new(start - 1, end)
        }
        None => {
            let position = parse_coordinate(expr)?;
            Span::new(position, position)
        }
    };

    Ok(span
        .with_five_prime_partial(five_prime_partial)
        .with_three_prime_partial(three_prime_partial))
}

fn parse_coordinate(text: &str) -> Result<usize, LocationError> {
    let digits = text.trim().trim_matches(|c| c == '<' || c == '>');
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(LocationError::InvalidCoordinate(text.to_string()));
    }
    digits
        .parse()
        .map_err(|_| LocationError::InvalidCoordinate(text.to_string()))
}

/// Returns the index of the parenthesis closing the one at `open`
fn matching_paren(expr: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (idx, byte) in expr.bytes().enumerate().skip(open) {
        match byte {
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(idx);
                }
            }
            _ => {}
        }
    }
    None
}

/// Splits an argument list on the commas at nesting depth zero
fn split_arguments(args: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut last = 0;
    for (idx, byte) in args.bytes().enumerate() {
        match byte {
            b'(' => depth += 1,
            b')' => depth = depth.saturating_sub(1),
            b',' if depth == 0 => {
                parts.push(&args[last..idx]);
                last = idx + 1;
            }
            _ => {}
        }
    }
    parts.push(&args[last..]);
    parts
}

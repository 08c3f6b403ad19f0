/*!
Pure scanners over a line of source text.

Positions are byte indices. Every boundary the scanners report sits on an
ASCII structural character (quote, bracket, operator, separator), so slicing
the source at a reported position is always valid.
*/

use super::Error;
use crate::error;

type Result<T> = std::result::Result<T, Error>;

/// Characters that terminate an operand at bracket depth zero.
const OPERAND_TERMINATORS: &[u8] = &[
    b' ', b'\t', b'^', b'*', b'/', b'+', b'-', b'=', b'<', b'>', b'%',
];

/// Index of the closing quote of a string starting at an optional `"`.
/// A `"` preceded by `\` does not close the string.
pub fn find_end_of_string(value: &str) -> Result<usize> {
    let bytes = value.as_bytes();
    let start = match bytes.first() {
        Some(b'"') => 1,
        _ => 0,
    };
    for pos in start..bytes.len() {
        if bytes[pos] == b'"' && !(pos != 0 && bytes[pos - 1] == b'\\') {
            return Ok(pos);
        }
    }
    Err(error!(Syntax; "Could not find end of quoted string, no closing quote"))
}

/// Index of the `)` matching an already-open bracket. The first byte is
/// skipped, so callers may pass text starting either at the `(` itself or
/// at the character after it.
pub fn find_end_of_bracket(value: &str) -> Result<usize> {
    let bytes = value.as_bytes();
    if bytes.first() == Some(&b')') {
        return Ok(0);
    }
    let mut bracket_count = 1;
    for pos in 1..bytes.len() {
        match bytes[pos] {
            b'(' => bracket_count += 1,
            b')' => {
                bracket_count -= 1;
                if bracket_count == 0 {
                    return Ok(pos);
                }
            }
            _ => {}
        }
    }
    Err(error!(Syntax; "Unclosed bracket found"))
}

/// Index of the last byte of the operand starting at the beginning of
/// `value`. Stops before the first terminator at bracket depth zero;
/// quoted sections inside brackets are skipped whole.
pub fn find_end_of_operand(value: &str) -> Result<usize> {
    let bytes = value.as_bytes();
    debug_assert!(!bytes.is_empty());
    let mut bracket_count: isize = 0;
    let mut has_brackets = false;
    let mut pos = 0;
    while pos < bytes.len() {
        let current = bytes[pos];
        if bracket_count <= 0 {
            if current == b'"' {
                return Err(error!(Syntax; "Unexpected quote \" character at position {}", pos));
            }
            if current == b')' {
                return Err(
                    error!(Syntax; "Unexpected close bracket ) character at position {}", pos),
                );
            }
            if OPERAND_TERMINATORS.contains(&current) {
                if pos == 0 {
                    return Err(error!(Syntax; "Missing operand"));
                }
                return Ok(pos - 1);
            }
            if current == b'(' {
                if has_brackets {
                    return Err(error!(Syntax;
                        "Unexpected opening bracket after brackets have closed at position {}",
                        pos
                    ));
                }
                bracket_count += 1;
                has_brackets = true;
            }
        } else {
            match current {
                b'"' => pos += find_end_of_string(&value[pos..])?,
                b')' => bracket_count -= 1,
                b'(' => bracket_count += 1,
                _ => {}
            }
        }
        pos += 1;
    }
    Ok(bytes.len() - 1)
}

/// Trim, then split at the first occurrence of `separator`.
/// Returns one or two trimmed parts.
pub fn split_in_two_on_char(value: &str, separator: char) -> Vec<&str> {
    let value = value.trim();
    match value.find(separator) {
        Some(pos) => vec![
            value[..pos].trim(),
            value[pos + separator.len_utf8()..].trim(),
        ],
        None => vec![value],
    }
}

/// Split a statement into its head word and the rest of the line at the
/// first whitespace. The rest is empty when the statement is a bare word.
pub fn split_keyword(value: &str) -> (&str, &str) {
    let value = value.trim();
    match value.find(|c: char| c == ' ' || c == '\t') {
        Some(pos) => (&value[..pos], value[pos + 1..].trim()),
        None => (value, ""),
    }
}

/// Split a line on `:` outside quoted strings. Each part is one statement.
pub fn split_statements(value: &str) -> Result<Vec<&str>> {
    let bytes = value.as_bytes();
    let mut statements = Vec::new();
    let mut last_pos = 0;
    let mut pos = 0;
    while pos < bytes.len() {
        match bytes[pos] {
            b'"' => pos += find_end_of_string(&value[pos..])?,
            b':' => {
                statements.push(&value[last_pos..pos]);
                last_pos = pos + 1;
            }
            _ => {}
        }
        pos += 1;
    }
    statements.push(&value[last_pos..]);
    Ok(statements)
}

/// Split a parameter list on `,` at depth zero, outside quoted strings.
/// An empty list yields no parts.
pub fn split_parameters(value: &str) -> Result<Vec<&str>> {
    if value.trim().is_empty() {
        return Ok(Vec::new());
    }
    let bytes = value.as_bytes();
    let mut parts = Vec::new();
    let mut bracket_count: isize = 0;
    let mut last_pos = 0;
    let mut pos = 0;
    while pos < bytes.len() {
        match bytes[pos] {
            b'"' => pos += find_end_of_string(&value[pos..])?,
            b'(' => bracket_count += 1,
            b')' => bracket_count -= 1,
            b',' if bracket_count == 0 => {
                parts.push(&value[last_pos..pos]);
                last_pos = pos + 1;
            }
            _ => {}
        }
        pos += 1;
    }
    parts.push(&value[last_pos..]);
    Ok(parts)
}

fn remove_outer_characters(value: &str, lhs: char, rhs: char) -> &str {
    if value.len() >= 2 && value.starts_with(lhs) && value.ends_with(rhs) {
        &value[lhs.len_utf8()..value.len() - rhs.len_utf8()]
    } else {
        value
    }
}

pub fn remove_outer_quotes(value: &str) -> &str {
    remove_outer_characters(value, '"', '"')
}

pub fn remove_outer_bracket(value: &str) -> &str {
    remove_outer_characters(value, '(', ')')
}

/// Undo the `\"` escape inside a scanned string literal.
pub fn unescape_quotes(value: &str) -> String {
    value.replace("\\\"", "\"")
}

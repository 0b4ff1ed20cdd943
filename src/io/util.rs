use super::{Format, error::Error};
use crate::model::value::parse_real;
use std::io::BufRead;

/// A source line with its 1-based line number.
pub type Line = (usize, String);

pub fn collect_lines<R: BufRead>(reader: R) -> Result<Vec<Line>, Error> {
    reader
        .lines()
        .enumerate()
        .map(|(i, line)| {
            line.map(|v| (i + 1, v))
                .map_err(|e| Error::Io { source: e })
        })
        .collect()
}

/// Next line that is neither blank nor a `#` comment.
pub fn next_data_line<'a>(lines: &'a [Line], cursor: &mut usize) -> Option<(usize, &'a str)> {
    while *cursor < lines.len() {
        let (ln, content) = &lines[*cursor];
        *cursor += 1;
        let trimmed = content.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        return Some((*ln, trimmed));
    }
    None
}

/// Next line verbatim (trimmed), blank or not.
pub fn next_line<'a>(lines: &'a [Line], cursor: &mut usize) -> Option<(usize, &'a str)> {
    let (ln, content) = lines.get(*cursor)?;
    *cursor += 1;
    Some((*ln, content.trim()))
}

/// Line number to report when input ends early.
pub fn last_line_no(lines: &[Line]) -> usize {
    lines.last().map(|(ln, _)| *ln).unwrap_or(0)
}

/// Whitespace-separated tokens, ignoring anything after an inline `#`.
pub fn tokens(line: &str) -> Vec<&str> {
    let data = line.split_once('#').map_or(line, |(head, _)| head);
    data.split_whitespace().collect()
}

pub fn parse_count(format: Format, line_no: usize, token: &str, what: &str) -> Result<usize, Error> {
    token
        .parse::<usize>()
        .map_err(|_| Error::parse(format, line_no, format!("invalid {} '{}'", what, token)))
}

pub fn parse_float(format: Format, line_no: usize, token: &str, what: &str) -> Result<f64, Error> {
    parse_real(token)
        .ok_or_else(|| Error::parse(format, line_no, format!("invalid {} '{}'", what, token)))
}

/// Parses a line of exactly three reals.
pub fn parse_vector(format: Format, line_no: usize, line: &str) -> Result<[f64; 3], Error> {
    let parts = tokens(line);
    if parts.len() != 3 {
        return Err(Error::malformed(
            format,
            line_no,
            "3 values",
            format!("{} token(s)", parts.len()),
        ));
    }
    let mut out = [0.0; 3];
    for (slot, token) in out.iter_mut().zip(parts) {
        *slot = parse_float(format, line_no, token, "coordinate")?;
    }
    Ok(out)
}

//! Reader for XYZ coordinate files.
//!
//! ```text
//! 3
//! water
//! O  0.000  0.000  0.000
//! H  0.970  0.000  0.000
//! H -0.250  0.937  0.000
//! ```
//!
//! Columns past the fourth are ignored, as are blank lines after the last atom.

use thiserror::Error;

use crate::api::types::AtomSpec;

/// Why an XYZ document could not be read. Line numbers are 1-based.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum XyzError {
    #[error("missing atom count line")]
    MissingCount,
    #[error("invalid atom count '{value}' on line {line}")]
    InvalidCount { line: usize, value: String },
    #[error("expected 'symbol x y z' on line {line}")]
    MalformedAtom { line: usize },
    #[error("invalid coordinate '{value}' on line {line}")]
    InvalidCoordinate { line: usize, value: String },
    #[error("header declares {expected} atoms but {found} were found")]
    CountMismatch { expected: usize, found: usize },
}

/// Parse an XYZ document into atom specs, in file order.
pub fn parse_xyz(text: &str) -> Result<Vec<AtomSpec>, XyzError> {
    let mut lines = text.lines().enumerate();

    let (count_idx, count_line) = lines
        .by_ref()
        .find(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| (idx, line.trim()))
        .ok_or(XyzError::MissingCount)?;
    let expected: usize = count_line.parse().map_err(|_| XyzError::InvalidCount {
        line: count_idx + 1,
        value: count_line.to_string(),
    })?;

    // Comment line, free text
    lines.next();

    // Every atom line takes more than two bytes, so this bounds the count line's claim
    let mut atoms = Vec::with_capacity(expected.min(text.len() / 2));
    for (idx, line) in lines {
        let line_no = idx + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if atoms.len() == expected {
            return Err(XyzError::CountMismatch {
                expected,
                found: expected + 1,
            });
        }
        atoms.push(parse_atom_line(trimmed, line_no)?);
    }

    if atoms.len() != expected {
        return Err(XyzError::CountMismatch {
            expected,
            found: atoms.len(),
        });
    }
    Ok(atoms)
}

fn parse_atom_line(line: &str, line_no: usize) -> Result<AtomSpec, XyzError> {
    let mut fields = line.split_whitespace();
    let symbol = fields.next().ok_or(XyzError::MalformedAtom { line: line_no })?;

    let mut position = [0.0f32; 3];
    for slot in &mut position {
        let raw = fields.next().ok_or(XyzError::MalformedAtom { line: line_no })?;
        let value: f32 = raw.parse().map_err(|_| XyzError::InvalidCoordinate {
            line: line_no,
            value: raw.to_string(),
        })?;
        if !value.is_finite() {
            return Err(XyzError::InvalidCoordinate {
                line: line_no,
                value: raw.to_string(),
            });
        }
        *slot = value;
    }

    Ok(AtomSpec::new(symbol, position))
}

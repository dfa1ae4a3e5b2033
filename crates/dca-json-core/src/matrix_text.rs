//! Matrix text reader for byte ranges
//!
//! Reads the text of a single matrix from a stream, starting at the stream's
//! current position and stopping at an end offset. Two layouts are accepted:
//!
//! ```text
//! [[1, 2, 3],          1 2 3
//!  [4, 5, 6]]          4 5 6     # one row per line, '#' comments
//! ```
//!
//! The reader decides the shape; callers size their targets from it.

use std::io::{Read, Seek};

use nom::{
    bytes::complete::{take_while, take_while1},
    character::complete::char,
    combinator::{all_consuming, map, map_opt, opt, rest},
    error::{ParseError as NomParseError, VerboseError},
    multi::separated_list1,
    sequence::{delimited, pair, preceded},
    IResult,
};

use crate::error::{MatrixTextError, ParseError};
use crate::parser::{number, parse_nested_list, Origin};
use crate::value::{Scalar, Value};

/// A dense matrix of scalars in row-major order
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MatrixText {
    rows: usize,
    cols: usize,
    values: Vec<Scalar>,
}

impl MatrixText {
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&Scalar> {
        if row < self.rows && col < self.cols {
            self.values.get(row * self.cols + col)
        } else {
            None
        }
    }

    /// Row-major element iterator
    pub fn values(&self) -> &[Scalar] {
        &self.values
    }

    /// Rebuild as a sequence-of-sequences value
    pub fn to_value(&self) -> Value {
        let rows = self
            .values
            .chunks(self.cols.max(1))
            .take(self.rows)
            .map(|row| Value::Sequence(row.iter().cloned().map(Value::Scalar).collect()))
            .collect();
        Value::Sequence(rows)
    }
}

/// Read matrix text from the reader's current position up to `end_offset`
/// (exclusive). Stops early at end of file.
pub fn read_matrix_range<R: Read + Seek>(
    reader: &mut R,
    end_offset: u64,
    origin: &Origin,
) -> Result<MatrixText, MatrixTextError> {
    let position = reader.stream_position()?;
    if end_offset < position {
        return Err(ParseError::new(
            origin.name(),
            1,
            1,
            format!(
                "matrix range ends at byte {} before read position {}",
                end_offset, position
            ),
        )
        .into());
    }

    let mut buf = Vec::new();
    reader
        .by_ref()
        .take(end_offset - position)
        .read_to_end(&mut buf)?;

    let range_origin = Origin::File(format!("{}[{}..{}]", origin, position, end_offset).into());
    let text = String::from_utf8(buf).map_err(|e| {
        ParseError::new(
            range_origin.name(),
            1,
            1,
            format!("matrix text is not valid UTF-8: {}", e),
        )
    })?;

    Ok(parse_matrix_text(&text, &range_origin)?)
}

/// Parse matrix text in either accepted layout
pub fn parse_matrix_text(text: &str, origin: &Origin) -> Result<MatrixText, ParseError> {
    if text.trim_start().starts_with('[') {
        let literal = parse_nested_list(text, origin)?;
        from_nested_list(&literal, text, origin)
    } else {
        from_plain_rows(text, origin)
    }
}

fn from_nested_list(literal: &Value, text: &str, origin: &Origin) -> Result<MatrixText, ParseError> {
    // parse_nested_list only returns sequences
    let rows = literal.as_sequence().unwrap_or_default();
    let mut values = Vec::new();
    let mut cols = None;

    for (i, row) in rows.iter().enumerate() {
        let items = row.as_sequence().map_err(|_| {
            ParseError::at_offset(origin.name(), text, 0, format!("row {} is not a list", i))
        })?;
        match cols {
            None => cols = Some(items.len()),
            Some(n) if n != items.len() => {
                return Err(ParseError::at_offset(
                    origin.name(),
                    text,
                    0,
                    format!("row {} has {} columns, expected {}", i, items.len(), n),
                ));
            }
            Some(_) => {}
        }
        for (j, item) in items.iter().enumerate() {
            let scalar = item.as_scalar().map_err(|_| {
                ParseError::at_offset(
                    origin.name(),
                    text,
                    0,
                    format!("element ({}, {}) is a {}, not a scalar", i, j, item.kind()),
                )
            })?;
            values.push(scalar.clone());
        }
    }

    Ok(MatrixText {
        rows: rows.len(),
        cols: cols.unwrap_or(0),
        values,
    })
}

fn from_plain_rows(text: &str, origin: &Origin) -> Result<MatrixText, ParseError> {
    let mut values = Vec::new();
    let mut rows = 0usize;
    let mut cols = None;

    for (line_no, line) in text.lines().enumerate() {
        let line_no = line_no as u32 + 1;
        let cells = match plain_row::<VerboseError<&str>>(line) {
            Ok((_, cells)) => cells,
            Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
                return Err(row_error(line, line_no, origin, e));
            }
            Err(nom::Err::Incomplete(_)) => {
                return Err(ParseError::new(origin.name(), line_no, 1, "incomplete row"));
            }
        };
        if cells.is_empty() {
            continue;
        }

        match cols {
            None => cols = Some(cells.len()),
            Some(n) if n != cells.len() => {
                return Err(ParseError::new(
                    origin.name(),
                    line_no,
                    1,
                    format!("row has {} columns, expected {}", cells.len(), n),
                ));
            }
            Some(_) => {}
        }
        values.extend(cells);
        rows += 1;
    }

    Ok(MatrixText {
        rows,
        cols: cols.unwrap_or(0),
        values,
    })
}

// ============================================================================
// Plain row grammar
// ============================================================================

/// Whitespace and commas between cells
fn cell_gap<'a, E: NomParseError<&'a str>>(input: &'a str) -> IResult<&'a str, &'a str, E> {
    take_while(|c: char| c == ',' || c.is_whitespace())(input)
}

fn cell_gap1<'a, E: NomParseError<&'a str>>(input: &'a str) -> IResult<&'a str, &'a str, E> {
    take_while1(|c: char| c == ',' || c.is_whitespace())(input)
}

fn scalar_cell<'a, E: NomParseError<&'a str>>(input: &'a str) -> IResult<&'a str, Scalar, E> {
    map_opt(number, |v: Value| match v {
        Value::Scalar(s) => Some(s),
        _ => None,
    })(input)
}

/// One line: cells separated by whitespace or commas, then an optional
/// `#` comment. Blank and comment-only lines yield no cells.
fn plain_row<'a, E: NomParseError<&'a str>>(line: &'a str) -> IResult<&'a str, Vec<Scalar>, E> {
    all_consuming(delimited(
        cell_gap,
        map(opt(separated_list1(cell_gap1, scalar_cell)), Option::unwrap_or_default),
        pair(cell_gap, opt(preceded(char('#'), rest))),
    ))(line)
}

fn row_error(line: &str, line_no: u32, origin: &Origin, err: VerboseError<&str>) -> ParseError {
    let at = err.errors.first().map(|(at, _)| *at).unwrap_or("");
    let column = (line.len() - at.len()) as u32 + 1;
    let token: String = at
        .chars()
        .take_while(|c| *c != ',' && !c.is_whitespace())
        .collect();
    ParseError::new(
        origin.name(),
        line_no,
        column,
        format!("'{}' is not a number", token),
    )
}

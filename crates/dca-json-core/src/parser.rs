//! Document parser - JSON superset to [`Value`] tree
//!
//! Accepts plain JSON plus the conveniences input files tend to grow:
//! - `//`, `#` and `/* */` comments
//! - trailing (and omitted) commas in arrays and objects
//! - single-quoted strings and bare identifier keys
//! - `@matrix("file", start, end)` out-of-line matrix references
//! - `@matrix [[...]]` inline matrices, recorded as a byte range of the
//!   document itself when it was read from a file
//!
//! ## Pipeline
//!
//! ```text
//! Source → parse_document → Value tree
//!                              ↓
//!                    Document flattening (dca-json)
//! ```

use std::fmt;
use std::path::PathBuf;

use nom::{
    branch::alt,
    bytes::complete::{escaped_transform, tag, take_until, take_while, take_while_m_n},
    character::complete::{char, digit0, digit1, multispace1, none_of, one_of, satisfy},
    combinator::{all_consuming, cut, map, map_opt, not, opt, recognize, value, verify},
    error::{context, ContextError, ErrorKind, ParseError as NomParseError, VerboseError, VerboseErrorKind},
    multi::{many0, many0_count},
    sequence::{delimited, pair, preceded, separated_pair, terminated, tuple},
    IResult,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ParseError;
use crate::value::{Map, MatrixFileRef, Value};

// ============================================================================
// Public API
// ============================================================================

/// Where the parsed text came from
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Origin {
    File(PathBuf),
    Memory,
}

impl Origin {
    pub fn name(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Origin::File(path) => write!(f, "{}", path.display()),
            Origin::Memory => f.write_str("<memory>"),
        }
    }
}

/// How `@matrix [[...]]` literals are materialised
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InlineMatrices {
    /// Record the literal's byte range in the source file; read at bind time.
    /// Falls back to `Eager` for in-memory text.
    #[default]
    Deferred,
    /// Parse the literal into a sequence of sequences immediately
    Eager,
}

/// Parse a complete document
pub fn parse_document(
    input: &str,
    origin: &Origin,
    inline: InlineMatrices,
) -> Result<Value, ParseError> {
    let ctx = Ctx {
        source: input,
        origin,
        inline,
    };
    let result = all_consuming(delimited(
        ws::<VerboseError<&str>>,
        |i| value_node(i, &ctx),
        ws,
    ))(input);

    match result {
        Ok((_, root)) => {
            debug!(origin = %origin, bytes = input.len(), kind = %root.kind(), "parsed document");
            Ok(root)
        }
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => Err(convert_error(input, origin, e)),
        Err(nom::Err::Incomplete(_)) => Err(ParseError::at_offset(
            origin.name(),
            input,
            input.len(),
            "incomplete input",
        )),
    }
}

/// Parse in-memory text with inline matrices expanded eagerly
pub fn parse_str(input: &str) -> Result<Value, ParseError> {
    parse_document(input, &Origin::Memory, InlineMatrices::Eager)
}

/// Parse a bracketed nested-list literal such as `[[1, 2], [3, 4]]`.
pub(crate) fn parse_nested_list(input: &str, origin: &Origin) -> Result<Value, ParseError> {
    let ctx = Ctx {
        source: input,
        origin,
        inline: InlineMatrices::Eager,
    };
    let result = all_consuming(delimited(
        ws::<VerboseError<&str>>,
        |i| sequence_node(i, &ctx),
        ws,
    ))(input);

    match result {
        Ok((_, v)) => Ok(v),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => Err(convert_error(input, origin, e)),
        Err(nom::Err::Incomplete(_)) => Err(ParseError::at_offset(
            origin.name(),
            input,
            input.len(),
            "incomplete input",
        )),
    }
}

// ============================================================================
// Error conversion
// ============================================================================

fn convert_error(source: &str, origin: &Origin, err: VerboseError<&str>) -> ParseError {
    let Some((at, kind)) = err.errors.first() else {
        return ParseError::at_offset(origin.name(), source, source.len(), "invalid document");
    };
    let offset = source.len().saturating_sub(at.len());

    let mut message = match kind {
        VerboseErrorKind::Char(c) => format!("expected '{}'", c),
        VerboseErrorKind::Context(c) => format!("expected {}", c),
        VerboseErrorKind::Nom(ErrorKind::Eof) => "unexpected trailing content".to_string(),
        VerboseErrorKind::Nom(k) => format!("unexpected input ({:?})", k),
    };

    match at.chars().next() {
        Some(c) => message.push_str(&format!(", found '{}'", c)),
        None => message.push_str(", found end of input"),
    }

    let contexts: Vec<&str> = err
        .errors
        .iter()
        .filter_map(|(_, k)| match k {
            VerboseErrorKind::Context(c) => Some(*c),
            _ => None,
        })
        .collect();
    if !contexts.is_empty() {
        message.push_str(" (in ");
        message.push_str(&contexts.join(" < "));
        message.push(')');
    }

    ParseError::at_offset(origin.name(), source, offset, message)
}

// ============================================================================
// Internal Parsers
// ============================================================================

struct Ctx<'a> {
    source: &'a str,
    origin: &'a Origin,
    inline: InlineMatrices,
}

impl Ctx<'_> {
    /// Byte offset of `rest` within the source
    fn offset(&self, rest: &str) -> usize {
        self.source.len() - rest.len()
    }
}

fn value_node<'a, E: NomParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
    ctx: &Ctx<'a>,
) -> IResult<&'a str, Value, E> {
    alt((
        value(Value::Null, keyword("null")),
        value(Value::from(true), keyword("true")),
        value(Value::from(false), keyword("false")),
        |i| matrix_node(i, ctx),
        map(quoted_string, Value::from),
        number,
        |i| sequence_node(i, ctx),
        |i| map_node(i, ctx),
    ))(input)
}

// ============================================================================
// Whitespace and comments
// ============================================================================

fn ws<'a, E: NomParseError<&'a str>>(input: &'a str) -> IResult<&'a str, (), E> {
    value(
        (),
        many0_count(alt((
            multispace1,
            line_comment,
            block_comment,
            tag("\u{feff}"),
        ))),
    )(input)
}

fn line_comment<'a, E: NomParseError<&'a str>>(input: &'a str) -> IResult<&'a str, &'a str, E> {
    recognize(pair(alt((tag("//"), tag("#"))), take_while(|c: char| c != '\n')))(input)
}

fn block_comment<'a, E: NomParseError<&'a str>>(input: &'a str) -> IResult<&'a str, &'a str, E> {
    recognize(tuple((tag("/*"), take_until("*/"), tag("*/"))))(input)
}

/// Optional comma between items, with surrounding whitespace
fn separator<'a, E: NomParseError<&'a str>>(input: &'a str) -> IResult<&'a str, (), E> {
    value((), pair(ws, opt(pair(char(','), ws))))(input)
}

// ============================================================================
// Scalars
// ============================================================================

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn keyword<'a, E: NomParseError<&'a str>>(
    word: &'static str,
) -> impl FnMut(&'a str) -> IResult<&'a str, &'a str, E> {
    terminated(tag(word), not(satisfy(is_ident_char)))
}

// Number literals (integer or float)
pub(crate) fn number<'a, E: NomParseError<&'a str>>(input: &'a str) -> IResult<&'a str, Value, E> {
    let (remaining, text) = recognize(tuple((
        opt(one_of("+-")),
        digit1,
        opt(pair(char('.'), digit0)),
        opt(tuple((one_of("eE"), opt(one_of("+-")), digit1))),
    )))(input)?;

    let is_float = text.contains(|c: char| matches!(c, '.' | 'e' | 'E'));
    if !is_float {
        if let Ok(i) = text.parse::<i64>() {
            return Ok((remaining, Value::from(i)));
        }
    }
    match text.parse::<f64>() {
        Ok(f) => Ok((remaining, Value::from(f))),
        Err(_) => Err(nom::Err::Error(E::from_error_kind(input, ErrorKind::Float))),
    }
}

// String literals with escape sequences, double or single quoted
fn quoted_string<'a, E: NomParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, String, E> {
    alt((
        preceded(
            char('"'),
            cut(terminated(
                string_body("\"\\"),
                context("closing quote", char('"')),
            )),
        ),
        preceded(
            char('\''),
            cut(terminated(
                string_body("'\\"),
                context("closing quote", char('\'')),
            )),
        ),
    ))(input)
}

fn string_body<'a, E: NomParseError<&'a str>>(
    stop: &'static str,
) -> impl FnMut(&'a str) -> IResult<&'a str, String, E> {
    // escaped_transform rejects empty input, so "" goes through opt
    map(
        opt(escaped_transform(none_of(stop), '\\', escape_char)),
        |s: Option<String>| s.unwrap_or_default(),
    )
}

fn escape_char<'a, E: NomParseError<&'a str>>(input: &'a str) -> IResult<&'a str, char, E> {
    alt((
        value('\n', char('n')),
        value('\r', char('r')),
        value('\t', char('t')),
        value('\u{8}', char('b')),
        value('\u{c}', char('f')),
        value('/', char('/')),
        value('\\', char('\\')),
        value('"', char('"')),
        value('\'', char('\'')),
        unicode_escape,
    ))(input)
}

fn unicode_escape<'a, E: NomParseError<&'a str>>(input: &'a str) -> IResult<&'a str, char, E> {
    map_opt(
        preceded(
            char('u'),
            take_while_m_n(4, 4, |c: char| c.is_ascii_hexdigit()),
        ),
        |hex: &str| u32::from_str_radix(hex, 16).ok().and_then(char::from_u32),
    )(input)
}

fn byte_offset<'a, E: NomParseError<&'a str>>(input: &'a str) -> IResult<&'a str, u64, E> {
    map_opt(digit1, |s: &str| s.parse::<u64>().ok())(input)
}

// ============================================================================
// Containers
// ============================================================================

fn sequence_node<'a, E: NomParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
    ctx: &Ctx<'a>,
) -> IResult<&'a str, Value, E> {
    let (input, _) = char('[')(input)?;
    let (input, _) = ws(input)?;
    let (input, items) = many0(terminated(|i| value_node(i, ctx), separator))(input)?;
    let (input, _) = cut(context("closing bracket", char(']')))(input)?;
    Ok((input, Value::Sequence(items)))
}

fn map_node<'a, E: NomParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
    ctx: &Ctx<'a>,
) -> IResult<&'a str, Value, E> {
    let (input, _) = char('{')(input)?;
    let (input, _) = ws(input)?;
    let (input, entries) = many0(terminated(|i| map_entry(i, ctx), separator))(input)?;
    let (input, _) = cut(context("closing brace", char('}')))(input)?;

    let mut map = Map::new();
    for (key, val) in entries {
        if map.contains_key(&key) {
            warn!(key = %key, origin = %ctx.origin, "duplicate key, later value replaces earlier");
        }
        map.insert(key, val);
    }
    Ok((input, Value::Map(map)))
}

fn map_entry<'a, E: NomParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
    ctx: &Ctx<'a>,
) -> IResult<&'a str, (String, Value), E> {
    let (input, key) = map_key(input)?;
    let (input, _) = ws(input)?;
    let (input, _) = cut(context("':' after key", char(':')))(input)?;
    let (input, _) = ws(input)?;
    let (input, val) = cut(context("value", |i| value_node(i, ctx)))(input)?;
    Ok((input, (key, val)))
}

fn map_key<'a, E: NomParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, String, E> {
    alt((quoted_string, map(bare_key, |s: &str| s.to_string())))(input)
}

fn bare_key<'a, E: NomParseError<&'a str>>(input: &'a str) -> IResult<&'a str, &'a str, E> {
    recognize(pair(
        satisfy(|c: char| c.is_ascii_alphabetic() || c == '_'),
        take_while(|c: char| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.')),
    ))(input)
}

// ============================================================================
// Matrices
// ============================================================================

fn matrix_node<'a, E: NomParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
    ctx: &Ctx<'a>,
) -> IResult<&'a str, Value, E> {
    let (input, _) = tag("@matrix")(input)?;
    let (input, _) = ws(input)?;
    cut(context(
        "matrix reference or literal",
        alt((matrix_range, |i| inline_matrix(i, ctx))),
    ))(input)
}

/// `("file", start, end)`
fn matrix_range<'a, E: NomParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, Value, E> {
    let (input, _) = char('(')(input)?;
    cut(|input: &'a str| -> IResult<&'a str, Value, E> {
        let (input, filename) = delimited(ws, quoted_string, ws)(input)?;
        let (input, _) = char(',')(input)?;
        let (input, (start, end)) = context(
            "byte range with end >= start",
            verify(
                separated_pair(
                    delimited(ws, byte_offset, ws),
                    char(','),
                    delimited(ws, byte_offset, ws),
                ),
                |(start, end): &(u64, u64)| end >= start,
            ),
        )(input)?;
        let (input, _) = opt(pair(char(','), ws))(input)?;
        let (input, _) = context("closing parenthesis", char(')'))(input)?;
        Ok((
            input,
            Value::MatrixFile(MatrixFileRef::new(filename, start, end)),
        ))
    })(input)
}

/// `[[...], ...]` written in place
fn inline_matrix<'a, E: NomParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
    ctx: &Ctx<'a>,
) -> IResult<&'a str, Value, E> {
    let start = ctx.offset(input);
    let (rest, literal) = sequence_node(input, ctx)?;
    let end = ctx.offset(rest);

    match (ctx.inline, ctx.origin) {
        (InlineMatrices::Deferred, Origin::File(path)) => Ok((
            rest,
            Value::MatrixFile(MatrixFileRef::new(path.clone(), start as u64, end as u64)),
        )),
        _ => Ok((rest, literal)),
    }
}

// ============================================================================
// Tests
// ============================================================================

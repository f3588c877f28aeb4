//! Literal model and parser for Doxygen navigation scripts.
//!
//! Doxygen writes its table of contents as JavaScript:
//!
//! ```text
//! var NAVTREE =
//! [
//!   [ "AngelScript", "index.html", [
//!     [ "Introduction", "index.html", null ],
//!     [ "Developer manual", "main_topics.html", "main_topics" ]
//!   ] ]
//! ];
//! ```
//!
//! Only the subset Doxygen emits is understood: `var` bindings whose values
//! are arrays, strings, numbers, booleans or `null`, plus comments.

use std::fmt;

use nom::branch::alt;
use nom::bytes::complete::{is_not, tag, take_until};
use nom::character::complete::{alpha1, alphanumeric1, char, multispace1};
use nom::combinator::{all_consuming, cut, map, opt, recognize, value};
use nom::error::{Error, ErrorKind};
use nom::multi::{many0, many0_count, separated_list0};
use nom::number::complete::double;
use nom::sequence::{delimited, pair, preceded, terminated, tuple};
use nom::{IResult, Parser};
use tracing::{debug, instrument};

use crate::domain::error::{DomainError, DomainResult};

/// Deepest array nesting the parser accepts.
pub const MAX_NESTING: usize = 128;

/// A parsed literal value.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    Bool(bool),
    Number(f64),
    Str(String),
    Array(Vec<Literal>),
}

impl Literal {
    pub fn str(s: impl Into<String>) -> Self {
        Literal::Str(s.into())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Literal::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Literal]> {
        match self {
            Literal::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Short name of the value kind, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Literal::Null => "null",
            Literal::Bool(_) => "boolean",
            Literal::Number(_) => "number",
            Literal::Str(_) => "string",
            Literal::Array(_) => "array",
        }
    }
}

/// One `var NAME = <literal>;` statement.
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub name: String,
    pub value: Literal,
}

/// A navigation script: its bindings in source order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Script {
    pub bindings: Vec<Binding>,
}

impl Script {
    #[instrument(level = "debug", skip(src), fields(len = src.len()))]
    pub fn parse(src: &str) -> DomainResult<Self> {
        let (_, bindings) = all_consuming(delimited(sp, many0(terminated(binding, sp)), sp))(src)
            .map_err(|e| syntax_error(src, e))?;
        debug!("parsed {} bindings", bindings.len());
        Ok(Self { bindings })
    }

    pub fn get(&self, name: &str) -> Option<&Literal> {
        self.bindings
            .iter()
            .find(|b| b.name == name)
            .map(|b| &b.value)
    }

    /// First binding holding an array, in source order.
    pub fn first_array(&self) -> Option<&Binding> {
        self.bindings
            .iter()
            .find(|b| matches!(b.value, Literal::Array(_)))
    }
}

/// Parse a bare literal (no `var` statement around it).
#[instrument(level = "debug", skip(src), fields(len = src.len()))]
pub fn parse_literal(src: &str) -> DomainResult<Literal> {
    all_consuming(delimited(sp, literal, sp))(src)
        .map(|(_, lit)| lit)
        .map_err(|e| syntax_error(src, e))
}

/// True when the first token after whitespace and comments opens an array.
pub fn is_bare_literal(src: &str) -> bool {
    sp(src)
        .map(|(rest, _)| rest.starts_with('['))
        .unwrap_or(false)
}

/// True when the source opens with `var NAME = [`, the way navigation
/// scripts do. Search indexes (`var X = {`) and plain code do not.
pub fn is_navigation_script(src: &str) -> bool {
    tuple((sp, tag("var"), multispace1, identifier, sp, char('='), sp, char('[')))(src).is_ok()
}

// Whitespace and comments
fn sp(input: &str) -> IResult<&str, ()> {
    value(
        (),
        many0_count(alt((
            value((), multispace1),
            value((), tuple((tag("/*"), take_until("*/"), tag("*/")))),
            value((), pair(tag("//"), opt(is_not("\r\n")))),
        ))),
    )(input)
}

/// A combinator that takes a parser `inner` and produces a parser that also consumes both leading and
/// trailing whitespace, returning the output of `inner`.
fn ws<'a, O, F>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    F: Parser<&'a str, O, Error<&'a str>>,
{
    delimited(sp, inner, sp)
}

fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        alt((alpha1, tag("_"), tag("$"))),
        many0_count(alt((alphanumeric1, tag("_"), tag("$")))),
    ))(input)
}

fn binding(input: &str) -> IResult<&str, Binding> {
    let (input, _) = terminated(tag("var"), multispace1)(input)?;
    let (input, name) = cut(identifier)(input)?;
    let (input, _) = cut(ws(char('=')))(input)?;
    let (input, value) = cut(literal)(input)?;
    let (input, _) = preceded(sp, opt(char(';')))(input)?;
    Ok((
        input,
        Binding {
            name: name.to_string(),
            value,
        },
    ))
}

fn literal(input: &str) -> IResult<&str, Literal> {
    nested_literal(input, 0)
}

// `depth` counts the arrays enclosing `input`
fn nested_literal(input: &str, depth: usize) -> IResult<&str, Literal> {
    alt((
        map(|i| array(i, depth), Literal::Array),
        map(string, Literal::Str),
        value(Literal::Null, tag("null")),
        value(Literal::Bool(true), tag("true")),
        value(Literal::Bool(false), tag("false")),
        map(double, Literal::Number),
    ))(input)
}

fn array(input: &str, depth: usize) -> IResult<&str, Vec<Literal>> {
    if depth >= MAX_NESTING && input.starts_with('[') {
        return Err(nom::Err::Failure(Error::new(input, ErrorKind::TooLarge)));
    }
    delimited(
        char('['),
        terminated(
            separated_list0(char(','), ws(|i| nested_literal(i, depth + 1))),
            pair(sp, opt(pair(char(','), sp))),
        ),
        cut(char(']')),
    )(input)
}

fn string(input: &str) -> IResult<&str, String> {
    alt((
        delimited(char('"'), |i| string_body(i, '"'), cut(char('"'))),
        delimited(char('\''), |i| string_body(i, '\''), cut(char('\''))),
    ))(input)
}

// Consumes up to (not including) the closing quote, resolving escapes.
fn string_body(input: &str, quote: char) -> IResult<&str, String> {
    let mut out = String::new();
    let mut chars = input.char_indices();
    while let Some((i, c)) = chars.next() {
        match c {
            c if c == quote => return Ok((&input[i..], out)),
            '\n' => return Err(nom::Err::Failure(Error::new(&input[i..], ErrorKind::Char))),
            '\\' => match chars.next() {
                Some((_, 'n')) => out.push('\n'),
                Some((_, 't')) => out.push('\t'),
                Some((_, 'r')) => out.push('\r'),
                Some((j, 'u')) => {
                    let start = j + 1;
                    let decoded = input
                        .get(start..start + 4)
                        .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                        .and_then(char::from_u32);
                    match decoded {
                        Some(ch) => {
                            out.push(ch);
                            for _ in 0..4 {
                                chars.next();
                            }
                        }
                        None => {
                            return Err(nom::Err::Failure(Error::new(
                                &input[i..],
                                ErrorKind::Escaped,
                            )))
                        }
                    }
                }
                Some((_, other)) => out.push(other),
                None => break,
            },
            c => out.push(c),
        }
    }
    Err(nom::Err::Failure(Error::new(input, ErrorKind::Char)))
}

fn syntax_error(src: &str, err: nom::Err<Error<&str>>) -> DomainError {
    let (rest, kind) = match err {
        nom::Err::Error(e) | nom::Err::Failure(e) => (e.input, e.code),
        nom::Err::Incomplete(_) => ("", ErrorKind::Eof),
    };
    let offset = src.len().saturating_sub(rest.len());
    let consumed = &src[..offset];
    let line = consumed.matches('\n').count() + 1;
    let column = consumed
        .rsplit('\n')
        .next()
        .map(|l| l.chars().count())
        .unwrap_or(0)
        + 1;
    let message = if kind == ErrorKind::TooLarge {
        format!("arrays nested deeper than {MAX_NESTING} levels")
    } else if rest.is_empty() {
        "unexpected end of input".to_string()
    } else {
        let near: String = rest.chars().take(16).collect();
        format!("unexpected {:?} ({})", near, kind.description())
    };
    DomainError::Syntax {
        line,
        column,
        message,
    }
}

impl fmt::Display for Literal {
    /// Renders in Doxygen's layout: one tuple per line, two-space indent.
    ///
    /// Doxygen indents fragment scripts by four spaces at the top level, so
    /// those reproduce structurally but not byte for byte.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        render(self, 0, &mut out);
        f.write_str(&out)
    }
}

fn render(lit: &Literal, indent: usize, out: &mut String) {
    match lit {
        Literal::Null => out.push_str("null"),
        Literal::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Literal::Number(n) => {
            if n.fract() == 0.0 && n.is_finite() && n.abs() < 1e15 {
                out.push_str(&format!("{}", *n as i64));
            } else {
                out.push_str(&n.to_string());
            }
        }
        Literal::Str(s) => render_str(s, out),
        Literal::Array(items) if items.is_empty() => out.push_str("[]"),
        Literal::Array(items) if items.iter().all(|i| matches!(i, Literal::Array(_))) => {
            out.push_str("[\n");
            for (n, item) in items.iter().enumerate() {
                if n > 0 {
                    out.push_str(",\n");
                }
                out.push_str(&" ".repeat(indent + 2));
                render(item, indent + 2, out);
            }
            out.push('\n');
            out.push_str(&" ".repeat(indent));
            out.push(']');
        }
        Literal::Array(items) => {
            out.push_str("[ ");
            for (n, item) in items.iter().enumerate() {
                if n > 0 {
                    out.push_str(", ");
                }
                render(item, indent, out);
            }
            out.push_str(" ]");
        }
    }
}

fn render_str(s: &str, out: &mut String) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
    out.push('"');
}

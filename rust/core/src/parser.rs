// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! STEP/IFC Parser using nom
//!
//! Zero-copy tokenization of entity instances and a quote-aware scanner
//! that locates instances in the DATA section without decoding them.

use nom::{
    branch::alt,
    bytes::complete::{take_while, take_while1},
    character::complete::{char, digit1, multispace0, one_of},
    combinator::{map, map_res, opt, recognize},
    multi::separated_list0,
    sequence::{delimited, pair, preceded, terminated, tuple},
    IResult,
};

use crate::error::{Error, Result};

/// STEP/IFC Token
#[derive(Debug, Clone, PartialEq)]
pub enum Token<'a> {
    /// Entity reference: #123
    EntityRef(u32),
    /// String literal: 'text' (still STEP-encoded)
    String(&'a str),
    /// Integer: 42
    Integer(i64),
    /// Float: 3.14
    Float(f64),
    /// Enum: .TRUE., .FALSE., .UNKNOWN.
    Enum(&'a str),
    /// List: (1, 2, 3)
    List(Vec<Token<'a>>),
    /// Typed value: IFCLABEL('700'), IFCBOOLEAN(.T.)
    TypedValue(&'a str, Vec<Token<'a>>),
    /// Null value: $
    Null,
    /// Asterisk (derived value): *
    Derived,
}

/// Parse entity reference: #123
fn entity_ref(input: &str) -> IResult<&str, Token> {
    map(
        preceded(char('#'), map_res(digit1, |s: &str| s.parse::<u32>())),
        Token::EntityRef,
    )(input)
}

/// Parse string literal: 'text'
/// STEP uses '' to escape a single quote within a string
fn string_literal(input: &str) -> IResult<&str, Token> {
    fn parse_string_content(input: &str) -> IResult<&str, &str> {
        let bytes = input.as_bytes();
        let mut i = 0;

        while i < bytes.len() {
            if bytes[i] == b'\'' {
                if i + 1 < bytes.len() && bytes[i + 1] == b'\'' {
                    i += 2;
                    continue;
                }
                return Ok((&input[i..], &input[..i]));
            }
            i += 1;
        }

        Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Char,
        )))
    }

    map(
        delimited(char('\''), parse_string_content, char('\'')),
        Token::String,
    )(input)
}

/// Parse integer: 42, -42
fn integer(input: &str) -> IResult<&str, Token> {
    map_res(
        recognize(tuple((opt(one_of("+-")), digit1))),
        |s: &str| s.parse::<i64>().map(Token::Integer),
    )(input)
}

/// Parse float: 3.14, -3.14, 1.5E-10, 0.
/// STEP allows reals like "0." without fraction digits
fn float(input: &str) -> IResult<&str, Token> {
    map_res(
        recognize(tuple((
            opt(one_of("+-")),
            digit1,
            char('.'),
            opt(digit1),
            opt(tuple((one_of("eE"), opt(one_of("+-")), digit1))),
        ))),
        |s: &str| s.parse::<f64>().map(Token::Float),
    )(input)
}

/// Parse enum: .T., .F., .METAL., .BOTH.
fn enum_value(input: &str) -> IResult<&str, Token> {
    map(
        delimited(
            char('.'),
            take_while1(|c: char| c.is_ascii_alphanumeric() || c == '_'),
            char('.'),
        ),
        Token::Enum,
    )(input)
}

/// Parse null: $
fn null(input: &str) -> IResult<&str, Token> {
    map(char('$'), |_| Token::Null)(input)
}

/// Parse derived: *
fn derived(input: &str) -> IResult<&str, Token> {
    map(char('*'), |_| Token::Derived)(input)
}

/// Parse typed value: IFCLABEL('x'), IFCSPECULARROUGHNESS(0.2), IFCLABEL ('x')
fn typed_value(input: &str) -> IResult<&str, Token> {
    map(
        pair(
            take_while1(|c: char| c.is_ascii_alphanumeric() || c == '_'),
            preceded(multispace0, arguments),
        ),
        |(type_name, args)| Token::TypedValue(type_name, args),
    )(input)
}

/// Skip whitespace
fn ws(input: &str) -> IResult<&str, ()> {
    map(take_while(|c: char| c.is_whitespace()), |_| ())(input)
}

/// Parse a token with optional surrounding whitespace
fn token(input: &str) -> IResult<&str, Token> {
    delimited(
        ws,
        alt((
            float, // Try float before integer (float includes '.')
            integer,
            entity_ref,
            string_literal,
            enum_value,
            list,
            typed_value,
            null,
            derived,
        )),
        ws,
    )(input)
}

/// Comma separated tokens in parentheses
fn arguments(input: &str) -> IResult<&str, Vec<Token>> {
    delimited(
        pair(char('('), ws),
        separated_list0(delimited(ws, char(','), ws), token),
        pair(ws, char(')')),
    )(input)
}

/// Parse list: (1, 2, 3) or nested lists
fn list(input: &str) -> IResult<&str, Token> {
    map(arguments, Token::List)(input)
}

/// Parse a complete entity instance.
/// Example: #123=IFCWALL('guid',#2,'name',$,$,$,$,$);
///
/// Returns the id, the type keyword as written in the file and the
/// attribute tokens.
pub fn parse_entity(input: &str) -> Result<(u32, &str, Vec<Token>)> {
    let result: IResult<&str, (u32, &str, Vec<Token>)> = tuple((
        delimited(
            ws,
            preceded(char('#'), map_res(digit1, |s: &str| s.parse::<u32>())),
            ws,
        ),
        preceded(
            char('='),
            delimited(
                ws,
                take_while1(|c: char| c.is_ascii_alphanumeric() || c == '_'),
                ws,
            ),
        ),
        terminated(arguments, tuple((ws, char(';')))),
    ))(input);

    match result {
        Ok((_, (id, type_name, args))) => Ok((id, type_name, args)),
        Err(e) => Err(Error::parse(0, format!("Failed to parse entity: {}", e))),
    }
}

/// Find the terminating `;` of an instance, skipping string literals.
/// Returns the offset one past the semicolon.
pub(crate) fn find_instance_end(bytes: &[u8], from: usize) -> Option<usize> {
    let mut pos = from;
    while pos < bytes.len() {
        let offset = memchr::memchr2(b'\'', b';', &bytes[pos..])?;
        let at = pos + offset;
        if bytes[at] == b';' {
            return Some(at + 1);
        }
        // Inside a string literal: the closing quote is the first quote that
        // is not doubled.
        let mut i = at + 1;
        loop {
            let q = memchr::memchr(b'\'', &bytes[i..])?;
            i += q;
            if bytes.get(i + 1) == Some(&b'\'') {
                i += 2;
                continue;
            }
            break;
        }
        pos = i + 1;
    }
    None
}

/// Fast entity scanner - scans the DATA section without full parsing
pub struct EntityScanner<'a> {
    content: &'a str,
    position: usize,
    limit: usize,
}

impl<'a> EntityScanner<'a> {
    /// Create a new scanner over the whole content
    pub fn new(content: &'a str) -> Self {
        Self::with_range(content, 0, content.len())
    }

    /// Create a scanner restricted to `content[start..end]`
    pub fn with_range(content: &'a str, start: usize, end: usize) -> Self {
        let limit = end.min(content.len());
        Self {
            content,
            position: start.min(limit),
            limit,
        }
    }

    /// Scan for the next entity
    /// Returns (entity_id, type_name, line_start, line_end)
    pub fn next_entity(&mut self) -> Option<(u32, &'a str, usize, usize)> {
        let content = self.content;
        let bytes = &content.as_bytes()[..self.limit];

        loop {
            let hash_offset = memchr::memchr(b'#', &bytes[self.position..])?;
            let line_start = self.position + hash_offset;
            let mut pos = line_start + 1;

            let id_start = pos;
            while pos < bytes.len() && bytes[pos].is_ascii_digit() {
                pos += 1;
            }
            let id_end = pos;

            while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
                pos += 1;
            }

            if id_end == id_start || pos >= bytes.len() || bytes[pos] != b'=' {
                // Not an instance name; keep looking after the '#'
                self.position = line_start + 1;
                continue;
            }

            let id = content[id_start..id_end].parse::<u32>().ok();
            let line_end = match find_instance_end(bytes, pos + 1) {
                Some(end) => end,
                None => {
                    self.position = self.limit;
                    return None;
                }
            };
            self.position = line_end;

            let id = match id {
                Some(id) => id,
                None => continue,
            };

            let mut type_start = pos + 1;
            while type_start < line_end && bytes[type_start].is_ascii_whitespace() {
                type_start += 1;
            }
            let mut type_end = type_start;
            while type_end < line_end
                && (bytes[type_end].is_ascii_alphanumeric() || bytes[type_end] == b'_')
            {
                type_end += 1;
            }

            let type_name = &content[type_start..type_end];
            return Some((id, type_name, line_start, line_end));
        }
    }
}

//! SMTP reply, the raw text returned by the server for one command
//!
//! A reply may span several lines. Every line starts with the three-digit
//! code; continuation lines put a `-` after it and the last line a space:
//!
//! ```text
//! 250-smtp.example.org
//! 250-SIZE 42
//! 250 AUTH LOGIN
//! ```

use std::fmt::{Display, Formatter, Result};

use nom::{
    bytes::complete::take_while_m_n,
    character::complete::{not_line_ending, one_of},
    combinator::{map_res, opt},
    IResult, Parser,
};

/// Upper bound for a single reply line read from the wire, in bytes
pub const MAX_LINE_LENGTH: u64 = 512;

/// A complete, possibly multi-line, SMTP reply
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct Response {
    /// Code from the first three characters, if they are digits
    code: Option<u16>,
    /// Every line as received, line endings included
    raw: String,
}

impl Response {
    /// Wraps the raw text of a reply
    pub fn new(raw: String) -> Response {
        let code = parse_code(&raw).ok().map(|(_, code)| code);
        Response { code, raw }
    }

    /// Reply code
    pub fn code(&self) -> Option<u16> {
        self.code
    }

    /// Tests code equality
    pub fn has_code(&self, code: u16) -> bool {
        self.code == Some(code)
    }

    /// The reply exactly as read
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Text of each line, without code and separator
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.raw.lines().map(|line| match parse_line(line) {
            Ok((_, (_, _, text))) => text,
            Err(_) => line,
        })
    }

    /// Returns only the first line of the text if possible
    pub fn first_line(&self) -> Option<&str> {
        self.lines().next()
    }
}

impl Display for Response {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        f.write_str(self.raw.trim_end())
    }
}

/// Whether `line` ends a reply: its fourth character is a space
pub fn is_last_line(line: &str) -> bool {
    line.as_bytes().get(3) == Some(&b' ')
}

fn parse_code(i: &str) -> IResult<&str, u16> {
    map_res(take_while_m_n(3, 3, |c: char| c.is_ascii_digit()), |code: &str| {
        code.parse::<u16>()
    })
    .parse(i)
}

fn parse_line(i: &str) -> IResult<&str, (u16, Option<char>, &str)> {
    (parse_code, opt(one_of("- ")), not_line_ending).parse(i)
}

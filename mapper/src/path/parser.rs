//! Parser for dotted field paths with indexers
//!
//! This module uses nom to parse paths like:
//! - `Name`
//! - `Home.Street`
//! - `Items[2].Value`
//! - `Matrix[0][1]`
//!
//! The separator is configurable, so the path is split on it first and each piece is
//! parsed as an optional identifier followed by any number of `[n]` indexers.

use nom::character::complete::{char, digit1};
use nom::bytes::complete::take_while1;
use nom::combinator::{all_consuming, map_res, opt};
use nom::multi::many0;
use nom::sequence::{delimited, pair};
use nom::{IResult, Parser};

use error_stack::Report;

use crate::error::{Error, Result};

/// One step of a parsed path
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RawSegment {
    /// Named field, matched case-insensitively
    Field(String),
    /// Position in a list or array
    Index(usize),
}

/// Parse an identifier (alphanumeric + underscore)
fn identifier(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_alphanumeric() || c == '_')(input)
}

/// Parse a bracketed element index
fn indexer(input: &str) -> IResult<&str, usize> {
    delimited(char('['), map_res(digit1, str::parse::<usize>), char(']')).parse(input)
}

/// Parse one separator-delimited piece: `Name`, `Name[0][1]` or `[3]`
fn piece(input: &str) -> IResult<&str, (Option<&str>, Vec<usize>)> {
    all_consuming(pair(opt(identifier), many0(indexer))).parse(input)
}

/// Split `path` on `separator` and parse every piece
///
/// Leading and trailing separators are ignored. An empty path, an empty piece between
/// two separators, or any character outside the grammar is a [`Error::PathParse`].
pub fn parse_path(path: &str, separator: &str) -> Result<Vec<RawSegment>> {
    let trimmed = path
        .trim()
        .trim_start_matches(separator)
        .trim_end_matches(separator);
    if trimmed.is_empty() {
        return Err(Report::new(Error::path_parse(path, "empty path")));
    }

    let mut segments = Vec::new();
    for raw_piece in trimmed.split(separator) {
        let raw_piece = raw_piece.trim();
        let (_, (name, indices)) = piece(raw_piece).map_err(|e| {
            Report::new(Error::path_parse(path, format!("bad segment '{raw_piece}': {e}")))
        })?;
        if name.is_none() && indices.is_empty() {
            return Err(Report::new(Error::path_parse(path, "empty segment")));
        }
        if let Some(name) = name {
            segments.push(RawSegment::Field(name.to_string()));
        }
        segments.extend(indices.into_iter().map(RawSegment::Index));
    }
    Ok(segments)
}

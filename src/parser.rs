//! Line parser for the magic-rule grammar.
//!
//! One directive per line, fields separated by runs of whitespace:
//!
//! ```text
//! [>]<offset> <match-type> <match-data> [<mime/type> [<description>]]
//! ```
//!
//! The leading `>` marks a dependent rule whose offset is relative to the
//! most recent independent rule. The fourth field only counts as a MIME
//! type when it fully matches `[a-z]+/[a-z0-9.-]+`; otherwise it and
//! everything after it form the free-text description, taken greedily to
//! the end of the line. Comments, blank lines, and anything else that does
//! not fit the shape parse to `None` and are skipped by the loader.

use nom::{
    bytes::complete::{tag, take_while1},
    character::complete::{digit1, space1},
    combinator::{map_res, opt},
    sequence::tuple,
    IResult,
};

use crate::rule::{MatchType, Rule};

/// Parses a single physical line. Total: malformed input yields `None`,
/// never an error.
pub fn parse_line(line: &str) -> Option<Rule> {
    match rule_line(line) {
        Ok((_, rule)) => Some(rule),
        Err(_) => None,
    }
}

fn rule_line(input: &str) -> IResult<&str, Rule> {
    let (rest, (marker, offset, _, type_token, _, data_token)) = tuple((
        opt(tag(">")),
        map_res(digit1, str::parse::<u64>),
        space1,
        token,
        space1,
        token,
    ))(input)?;

    let (mime_type, description) = classification(rest);

    Ok((
        "",
        Rule {
            dependent: marker.is_some(),
            offset,
            match_type: MatchType::from_token(type_token),
            match_data: data_token.to_string(),
            mime_type,
            description,
        },
    ))
}

fn token(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| !c.is_whitespace())(input)
}

/// Splits the remainder of a line after the match-data token into the
/// optional MIME type and the greedy trailing description.
fn classification(rest: &str) -> (Option<String>, Option<String>) {
    let rest = rest.trim_start();
    if rest.is_empty() {
        return (None, None);
    }

    let (first, tail) = match rest.split_once(|c: char| c.is_whitespace()) {
        Some((first, tail)) => (first, tail.trim()),
        None => (rest, ""),
    };

    if is_mime_token(first) {
        let description = if tail.is_empty() {
            None
        } else {
            Some(tail.to_string())
        };
        (Some(first.to_string()), description)
    } else {
        (None, Some(rest.trim_end().to_string()))
    }
}

fn is_mime_token(token: &str) -> bool {
    match token.split_once('/') {
        Some((kind, subtype)) => {
            !kind.is_empty()
                && kind.bytes().all(|b| b.is_ascii_lowercase())
                && !subtype.is_empty()
                && subtype
                    .bytes()
                    .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'.' || b == b'-')
        }
        None => false,
    }
}

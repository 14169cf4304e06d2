//! Lenient parsers for model output: scores, votes, and proposal lists.
//!
//! Model output is free-form text; every parser here recovers what it can
//! and reports the rest as a [`ParseError`]. Parse failures never surface
//! as crate errors from the search. They degrade a candidate's score to
//! zero or drop a fragment at the call site.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

/// Error type for output parsing
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParseError {
    /// Input contained nothing usable
    #[error("Empty input")]
    EmptyInput,

    /// No value of the expected shape was found
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// A vote named a candidate outside the presented set
    #[error("Choice {choice} out of range (1..={len})")]
    ChoiceOutOfRange { choice: usize, len: usize },
}

/// Result type for output parsing
pub type ParseResult<T> = Result<T, ParseError>;

static VOTE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)best choice is\s*\(?(\d+)").unwrap());

/// Extract a numeric promise score from a scoring response.
///
/// Takes the first token that parses as a finite float, scanning in order,
/// so both `0.8` and `Score: 0.8 because ...` work.
pub fn parse_score(raw: &str) -> ParseResult<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ParseError::EmptyInput);
    }

    for token in trimmed.split_whitespace() {
        let token = token.trim_matches(|c: char| !c.is_ascii_digit() && c != '.' && c != '-');
        if let Ok(value) = token.parse::<f64>() {
            if value.is_finite() {
                return Ok(value);
            }
        }
    }

    Err(ParseError::InvalidFormat(format!(
        "no numeric score in {:?}",
        trimmed
    )))
}

/// Extract a vote from a voting response.
///
/// Looks for "the best choice is N" (1-based, as presented to the model)
/// and returns the 0-based candidate index.
pub fn parse_vote(raw: &str, n_candidates: usize) -> ParseResult<usize> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ParseError::EmptyInput);
    }

    let captures = VOTE_RE
        .captures(trimmed)
        .ok_or_else(|| ParseError::InvalidFormat(format!("no vote in {:?}", trimmed)))?;

    let choice: usize = captures[1]
        .parse()
        .map_err(|_| ParseError::InvalidFormat(format!("bad vote number in {:?}", trimmed)))?;

    if choice == 0 || choice > n_candidates {
        return Err(ParseError::ChoiceOutOfRange {
            choice,
            len: n_candidates,
        });
    }

    Ok(choice - 1)
}

/// Split a batch proposal response into individual step fragments.
///
/// One fragment per non-empty line, with common list markers stripped.
/// A response that yields nothing is an empty vec, not an error; the
/// shortfall is tolerated upstream.
pub fn parse_proposals(raw: &str) -> Vec<String> {
    raw.lines()
        .map(strip_list_marker)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

fn strip_list_marker(line: &str) -> &str {
    let line = line.trim();
    let stripped = line
        .trim_start_matches(|c: char| c.is_ascii_digit())
        .trim_start_matches(['.', ')', '-', '*'])
        .trim_start();
    // Only treat it as a marker if something followed it.
    if stripped.is_empty() { line } else { stripped }
}

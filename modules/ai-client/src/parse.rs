//! Two-stage JSON parsing for model replies.
//!
//! Stage one parses the whole reply (after stripping markdown fences) against
//! the target type. Stage two looks for the first balanced `[...]` or `{...}`
//! span in the reply and parses only that. Models routinely wrap their JSON in
//! prose, so the second stage recovers most of those replies. Both stages
//! report a tagged [`ParseFailure`] instead of a silent default, and callers
//! decide what the fallback value is.

use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

use crate::util::strip_code_blocks;

/// Which JSON container the caller expects at the top level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    /// `[` ... `]`
    Array,
    /// `{` ... `}`
    Object,
}

impl Delimiter {
    fn open(self) -> char {
        match self {
            Delimiter::Array => '[',
            Delimiter::Object => '{',
        }
    }

    fn close(self) -> char {
        match self {
            Delimiter::Array => ']',
            Delimiter::Object => '}',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseFailure {
    #[error("model reply was empty")]
    Empty,

    #[error("no balanced JSON {0:?} found in model reply")]
    NoJson(Delimiter),

    #[error("malformed JSON in model reply: {0}")]
    Malformed(String),
}

/// Parse `text` as `T`, strictly first and then from the first balanced span.
pub fn parse_json<T: DeserializeOwned>(text: &str, delimiter: Delimiter) -> Result<T, ParseFailure> {
    let body = strip_code_blocks(text);
    if body.is_empty() {
        return Err(ParseFailure::Empty);
    }

    let strict_err = match serde_json::from_str::<T>(body) {
        Ok(value) => return Ok(value),
        Err(e) => e,
    };

    let span = first_balanced_span(body, delimiter).ok_or(ParseFailure::NoJson(delimiter))?;
    match serde_json::from_str::<T>(span) {
        Ok(value) => {
            debug!(strict_error = %strict_err, "Recovered JSON from surrounding text");
            Ok(value)
        }
        Err(e) => Err(ParseFailure::Malformed(e.to_string())),
    }
}

/// Locate the first balanced span opened by `delimiter`, skipping brackets
/// that appear inside JSON string literals.
pub fn first_balanced_span(text: &str, delimiter: Delimiter) -> Option<&str> {
    let (open, close) = (delimiter.open(), delimiter.close());
    let start = text.find(open)?;

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            c if c == open => depth += 1,
            c if c == close => {
                depth -= 1;
                if depth == 0 {
                    let end = start + offset + ch.len_utf8();
                    return Some(&text[start..end]);
                }
            }
            _ => {}
        }
    }
    None
}

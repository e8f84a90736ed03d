//! `Submission`: a stable name plus an ordered token sequence terminated by
//! exactly one `FILE_END`.

use crate::token::{Token, TokenKind};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubmissionError {
    #[error("submission `{name}` has {len} tokens, fewer than the required minimum_token_match + 1 = {required}")]
    TooShort { name: String, len: usize, required: usize },
    #[error("submission `{name}` token list must end with exactly one FILE_END token")]
    MissingFileEnd { name: String },
    #[error("submission `{name}` token list contains a FILE_END token before its final position")]
    MisplacedFileEnd { name: String },
}

/// A submission: one author's token stream, reduced from a set of source
/// files to a single sequence by the (out-of-scope) front-end.
#[derive(Debug, Clone)]
pub struct Submission {
    name: String,
    tokens: Vec<Token>,
}

impl Submission {
    /// Validates the `FILE_END`-termination invariant and the
    /// `minimum_token_match + 1` length floor from §3, returning the
    /// submission-too-short error behaviorally described in §7 as a
    /// recoverable, per-submission failure.
    pub fn new(name: impl Into<String>, tokens: Vec<Token>, minimum_token_match: usize) -> Result<Self, SubmissionError> {
        let name = name.into();
        match tokens.iter().position(|t| t.kind == TokenKind::FileEnd) {
            None => return Err(SubmissionError::MissingFileEnd { name }),
            Some(pos) if pos != tokens.len() - 1 => return Err(SubmissionError::MisplacedFileEnd { name }),
            _ => {}
        }
        let required = minimum_token_match + 1;
        if tokens.len() < required {
            return Err(SubmissionError::TooShort { name, len: tokens.len(), required });
        }
        Ok(Submission { name, tokens })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Token count, `FILE_END` included. This is the raw stored length used
    /// for the `minimum_token_match + 1` length floor and pair-ordering
    /// convention; `Comparison`'s `|L|`/`|R|` (used by the §4.6 similarity
    /// formulas) are one less than this, since those formulas exclude the
    /// sentinel (see `Engine`'s `content_len`).
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

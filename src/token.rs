//! The unit of comparison: `Token` and the language-specific type it carries.

use ahash::AHashSet;
use std::sync::Arc;

/// Sentinel for an unavailable `line`/`column`/`length` field.
pub const NO_VALUE: i64 = -1;

/// The type tag a front-end attaches to a token.
///
/// `FileEnd` and `Separator` are reserved: every [`crate::submission::Submission`]
/// ends with exactly one `FileEnd` token, and `Separator` is never emitted by a
/// front-end (it exists only as a pivot value reserved by the matcher).
/// `Language(_)` carries whatever finite, language-specific enumeration the
/// front-end defines (keyword, identifier, operator, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TokenKind {
    FileEnd,
    Separator,
    Language(u32),
}

/// Per-token semantic annotation, present only when the front-end reports
/// `tokens_have_semantics() == true`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Semantics {
    pub critical: bool,
    pub control: bool,
    pub reads: AHashSet<String>,
    pub writes: AHashSet<String>,
    pub keep: bool,
}

/// A single structural token produced by a front-end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub file: Arc<str>,
    pub line: i64,
    pub column: i64,
    pub length: i64,
    pub semantics: Option<Semantics>,
}

impl Token {
    pub fn file_end(file: Arc<str>) -> Self {
        Token { kind: TokenKind::FileEnd, file, line: NO_VALUE, column: NO_VALUE, length: NO_VALUE, semantics: None }
    }

    pub fn new(kind: TokenKind, file: Arc<str>, line: i64, column: i64, length: i64) -> Self {
        debug_assert!(!matches!(kind, TokenKind::Separator), "Separator is never emitted by a front-end");
        Token { kind, file, line, column, length, semantics: None }
    }

    pub fn with_semantics(mut self, semantics: Semantics) -> Self {
        self.semantics = Some(semantics);
        self
    }
}

/// The capability description a language front-end supplies, per the
/// "small capability struct passed by value" design note. Parsing itself is
/// out of scope: this crate consumes already-tokenized `Submission`s.
#[derive(Debug, Clone)]
pub struct FrontEndCaps {
    pub suffixes: Vec<String>,
    pub default_minimum_token_match: usize,
    pub tokens_have_semantics: bool,
    pub supports_normalization: bool,
    pub excluded_types: AHashSet<TokenKind>,
}

impl FrontEndCaps {
    pub fn is_excluded_from_matching(&self, kind: TokenKind) -> bool {
        self.excluded_types.contains(&kind)
    }
}

impl Default for FrontEndCaps {
    fn default() -> Self {
        FrontEndCaps {
            suffixes: Vec::new(),
            default_minimum_token_match: 9,
            tokens_have_semantics: false,
            supports_normalization: false,
            excluded_types: AHashSet::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_end_has_no_value_line() {
        let t = Token::file_end(Arc::from("a.rs"));
        assert_eq!(t.line, NO_VALUE);
        assert_eq!(t.kind, TokenKind::FileEnd);
    }

    #[test]
    fn excluded_types_are_consulted_by_kind() {
        let mut excluded = AHashSet::default();
        excluded.insert(TokenKind::Language(7));
        let caps = FrontEndCaps { excluded_types: excluded, ..Default::default() };
        assert!(caps.is_excluded_from_matching(TokenKind::Language(7)));
        assert!(!caps.is_excluded_from_matching(TokenKind::Language(8)));
    }
}

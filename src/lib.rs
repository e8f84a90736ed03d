//! Thread-safe greedy string tiling and statement-dependency normalization
//! for source-code similarity detection.
//!
//! A language front-end (out of scope here) reduces source files to a
//! [`Submission`]: an ordered token stream terminated by exactly one
//! `FILE_END`. [`Engine`] interns token types, runs the Greedy String Tiling
//! matcher of [`matcher`] over pairs of submissions, merges nearby tiles
//! ([`merge`]), and reports the result as a [`Comparison`] with the
//! similarity metrics of [`comparison::SimilarityMetric`]. [`normalize`]
//! offers an independent pre-pass that collapses a token stream to the
//! statements an observer can prove affect its output, making the matcher
//! robust to dead-code insertion and independent statement reordering.
//! [`driver::ComparisonDriver`] schedules all of the above across a
//! submission set using a worker pool.

pub mod comparison;
pub mod config;
pub mod driver;
pub mod engine;
pub mod error;
pub mod hash_index;
pub mod interner;
pub mod marks;
pub mod matcher;
pub mod merge;
pub mod normalize;
pub mod submission;
pub mod token;

pub use comparison::{Comparison, SimilarityMetric};
pub use config::MatchConfig;
pub use driver::ComparisonDriver;
pub use engine::{Engine, SubmissionId};
pub use error::EngineError;
pub use matcher::Match;
pub use submission::{Submission, SubmissionError};
pub use token::{FrontEndCaps, Semantics, Token, TokenKind};

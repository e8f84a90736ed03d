//! `Comparison` (§3) and the similarity metrics of §4.6.

use crate::matcher::Match;
use std::sync::Arc;

/// Which §4.6 formula `Comparison::similarity` should evaluate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimilarityMetric {
    Avg,
    Min,
    Max,
    Symmetric,
    Intersection,
    LongestMatch,
    Overall,
}

/// The result of comparing two submissions: the accepted tiling plus the
/// shorter matches kept only as merge bridges (§4.4), exposed here as a
/// first-class read accessor per SPEC_FULL §10.7.
#[derive(Debug, Clone)]
pub struct Comparison {
    pub first: Arc<str>,
    pub second: Arc<str>,
    first_len: usize,
    second_len: usize,
    matches: Vec<Match>,
    ignored_matches: Vec<Match>,
}

impl Comparison {
    pub fn new(
        first: Arc<str>,
        first_len: usize,
        second: Arc<str>,
        second_len: usize,
        matches: Vec<Match>,
        ignored_matches: Vec<Match>,
    ) -> Self {
        Comparison { first, first_len, second, second_len, matches, ignored_matches }
    }

    pub fn matches(&self) -> &[Match] {
        &self.matches
    }

    pub fn ignored_matches(&self) -> &[Match] {
        &self.ignored_matches
    }

    pub fn first_len(&self) -> usize {
        self.first_len
    }

    pub fn second_len(&self) -> usize {
        self.second_len
    }

    /// `numberOfMatchedTokens = Σ length`.
    pub fn matched_tokens(&self) -> usize {
        self.matches.iter().map(|m| m.length).sum()
    }

    pub fn longest_match(&self) -> usize {
        self.matches.iter().map(|m| m.length).max().unwrap_or(0)
    }

    /// Evaluates the §4.6 formula table for `metric`, clamped to `[0, 1]`
    /// where the formula is a ratio (`Overall` and `Intersection` are raw
    /// token counts and are returned unclamped).
    pub fn similarity(&self, metric: SimilarityMetric) -> f64 {
        let m = self.matched_tokens() as f64;
        let l = self.first_len as f64;
        let r = self.second_len as f64;
        match metric {
            SimilarityMetric::Avg => {
                let denom = (l + r) / 2.0;
                if denom == 0.0 { 0.0 } else { m / denom }
            }
            SimilarityMetric::Min => {
                let denom = l.min(r);
                if denom == 0.0 { 0.0 } else { m / denom }
            }
            SimilarityMetric::Max => {
                let denom = l.max(r);
                if denom == 0.0 { 0.0 } else { m / denom }
            }
            SimilarityMetric::Symmetric => {
                let denom = l + r;
                if denom == 0.0 { 0.0 } else { 2.0 * m / denom }
            }
            SimilarityMetric::Intersection => m,
            SimilarityMetric::LongestMatch => self.longest_match() as f64,
            SimilarityMetric::Overall => l + r,
        }
    }
}

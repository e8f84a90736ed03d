//! Comparison driver (§4.7): schedules all-pairs and cross-pairs-with-old
//! comparisons over a worker pool, supports pair-granularity cancellation,
//! and applies the similarity threshold and top-K cap.

use crate::comparison::Comparison;
use crate::engine::{Engine, SubmissionId};
use crate::error::EngineError;
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Builds the unordered pair set: all pairs within `submissions`, plus every
/// `submissions × old_submissions` cross-pair. `old × old` pairs are never
/// produced — those comparisons are assumed already reported by a prior run.
fn build_pairs(submissions: &[SubmissionId], old_submissions: &[SubmissionId]) -> Vec<(SubmissionId, SubmissionId)> {
    let mut pairs = Vec::new();
    for i in 0..submissions.len() {
        for j in (i + 1)..submissions.len() {
            pairs.push((submissions[i], submissions[j]));
        }
    }
    for &a in submissions {
        for &old in old_submissions {
            pairs.push((a, old));
        }
    }
    pairs
}

pub struct ComparisonDriver<'a> {
    engine: &'a Engine,
}

impl<'a> ComparisonDriver<'a> {
    pub fn new(engine: &'a Engine) -> Self {
        ComparisonDriver { engine }
    }

    /// Orders a pair so `first` is the smaller-token-count submission,
    /// ties broken by name, per §3's `Comparison` convention.
    fn order_by_convention(&self, a: SubmissionId, b: SubmissionId) -> (SubmissionId, SubmissionId) {
        let len_a = self.engine.submission_len(a);
        let len_b = self.engine.submission_len(b);
        match len_a.cmp(&len_b) {
            std::cmp::Ordering::Greater => (b, a),
            std::cmp::Ordering::Less => (a, b),
            std::cmp::Ordering::Equal => {
                if self.engine.submission_name(a).as_ref() <= self.engine.submission_name(b).as_ref() {
                    (a, b)
                } else {
                    (b, a)
                }
            }
        }
    }

    /// Runs the full §4.7 pipeline. `cancel`, if set at any point, stops new
    /// pairs from being dispatched; pairs already in flight still complete,
    /// and the call returns the comparisons gathered so far rather than an
    /// error (§5 "Cancellation and timeouts").
    pub fn run(
        &self,
        submissions: &[SubmissionId],
        old_submissions: &[SubmissionId],
        base: Option<SubmissionId>,
        cancel: Arc<AtomicBool>,
    ) -> Result<Vec<Comparison>, EngineError> {
        let required = self.engine.config().minimum_token_match + 1;

        if let Some(base_id) = base {
            let base_len = self.engine.submission_len(base_id);
            if base_len < required {
                return Err(EngineError::BaseCodeTooShort {
                    name: self.engine.submission_name(base_id).to_string(),
                    len: base_len,
                    required,
                });
            }
        }

        // §7: a too-short submission is excluded with a logged warning, not
        // a fatal error; only an empty set afterward is fatal.
        let submissions: Vec<SubmissionId> = submissions
            .iter()
            .copied()
            .filter(|&id| {
                let len = self.engine.submission_len(id);
                let ok = len >= required;
                if !ok {
                    log::warn!(
                        "excluding submission `{}` ({} tokens, fewer than required {})",
                        self.engine.submission_name(id),
                        len,
                        required
                    );
                }
                ok
            })
            .collect();
        if submissions.is_empty() {
            return Err(EngineError::NoValidSubmissions);
        }

        if let Some(base_id) = base {
            for &s in submissions.iter().chain(old_submissions.iter()) {
                if cancel.load(Ordering::Relaxed) {
                    break;
                }
                self.engine.generate_base_code_marking(s, base_id);
            }
        }

        let pairs = build_pairs(&submissions, old_submissions);
        let metric = self.engine.config().similarity_metric;
        let threshold = self.engine.config().clamped_threshold();

        let mut results: Vec<Comparison> = pairs
            .par_iter()
            .filter_map(|&(a, b)| {
                if cancel.load(Ordering::Relaxed) {
                    return None;
                }
                // §3: `first` is, by convention, the smaller-token-count
                // submission, ties broken by name.
                let (a, b) = self.order_by_convention(a, b);
                Some(self.engine.compare(a, b))
            })
            .filter(|c| c.similarity(metric) >= threshold)
            .collect();

        let cap = self.engine.config().maximum_number_of_comparisons;
        if cap > 0 && results.len() > cap {
            results.sort_by(|x, y| {
                y.similarity(metric).partial_cmp(&x.similarity(metric)).unwrap_or(std::cmp::Ordering::Equal)
            });
            results.truncate(cap);
        }

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MatchConfig;
    use crate::submission::Submission;
    use crate::token::{FrontEndCaps, Token, TokenKind};
    use std::sync::Arc as StdArc;

    fn token_seq(values: &[i32]) -> Vec<Token> {
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| Token {
                kind: if v == 0 { TokenKind::FileEnd } else { TokenKind::Language(v as u32) },
                file: StdArc::from("f"),
                line: i as i64,
                column: 0,
                length: 1,
                semantics: None,
            })
            .collect()
    }

    #[test]
    fn build_pairs_excludes_old_by_old() {
        let engine = Engine::new(FrontEndCaps::default(), MatchConfig::new(3));
        let a = Submission::new("a", token_seq(&[1, 2, 3, 4, 5, 0]), 3).unwrap();
        let b = Submission::new("b", token_seq(&[1, 2, 3, 4, 5, 0]), 3).unwrap();
        let old = Submission::new("old", token_seq(&[1, 2, 3, 4, 5, 0]), 3).unwrap();
        let ida = engine.register_submission(&a);
        let idb = engine.register_submission(&b);
        let id_old = engine.register_submission(&old);

        let submissions = vec![ida, idb];
        let old_submissions = vec![id_old];
        let pairs = build_pairs(&submissions, &old_submissions);
        // 1 within-new pair + 2 cross pairs, 0 old*old pairs.
        assert_eq!(pairs.len(), 3);
    }

    #[test]
    fn empty_submission_set_is_a_fatal_error() {
        let engine = Engine::new(FrontEndCaps::default(), MatchConfig::new(3));
        let driver = ComparisonDriver::new(&engine);
        let result = driver.run(&[], &[], None, Arc::new(AtomicBool::new(false)));
        assert!(matches!(result, Err(EngineError::NoValidSubmissions)));
    }

    #[test]
    fn similarity_threshold_filters_out_unrelated_pairs() {
        let mut config = MatchConfig::new(3);
        config.similarity_metric = crate::comparison::SimilarityMetric::Avg;
        config.similarity_threshold = 0.5;
        let engine = Engine::new(FrontEndCaps::default(), config);

        let a = Submission::new("a", token_seq(&[1, 2, 3, 4, 5, 0]), 3).unwrap();
        let b = Submission::new("b", token_seq(&[6, 7, 8, 9, 10, 0]), 3).unwrap();
        let ida = engine.register_submission(&a);
        let idb = engine.register_submission(&b);

        let driver = ComparisonDriver::new(&engine);
        let results = driver.run(&[ida, idb], &[], None, Arc::new(AtomicBool::new(false))).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn cancellation_before_dispatch_yields_empty_partial_results() {
        let engine = Engine::new(FrontEndCaps::default(), MatchConfig::new(3));
        let a = Submission::new("a", token_seq(&[1, 2, 3, 4, 5, 0]), 3).unwrap();
        let b = Submission::new("b", token_seq(&[1, 2, 3, 4, 5, 0]), 3).unwrap();
        let ida = engine.register_submission(&a);
        let idb = engine.register_submission(&b);

        let driver = ComparisonDriver::new(&engine);
        let results = driver.run(&[ida, idb], &[], None, Arc::new(AtomicBool::new(true))).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn reported_comparisons_put_the_smaller_submission_first() {
        let engine = Engine::new(FrontEndCaps::default(), MatchConfig::new(3));
        let small = Submission::new("small", token_seq(&[1, 2, 3, 4, 5, 0]), 3).unwrap();
        let big = Submission::new("big", token_seq(&[9, 1, 2, 3, 4, 5, 9, 9, 0]), 3).unwrap();
        let id_small = engine.register_submission(&small);
        let id_big = engine.register_submission(&big);

        let driver = ComparisonDriver::new(&engine);
        // Pass the larger submission first; the driver must still report
        // `small` as `Comparison::first`.
        let results = driver.run(&[id_big, id_small], &[], None, Arc::new(AtomicBool::new(false))).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].first.as_ref(), "small");
        assert_eq!(results[0].second.as_ref(), "big");
    }

    #[test]
    fn top_k_cap_keeps_the_highest_scoring_comparisons() {
        let mut config = MatchConfig::new(3);
        config.maximum_number_of_comparisons = 1;
        let engine = Engine::new(FrontEndCaps::default(), config);

        let a = Submission::new("a", token_seq(&[1, 2, 3, 4, 5, 6, 7, 0]), 3).unwrap();
        let b = Submission::new("b", token_seq(&[1, 2, 3, 4, 5, 6, 7, 0]), 3).unwrap();
        let c = Submission::new("c", token_seq(&[8, 9, 10, 11, 0]), 3).unwrap();
        let ida = engine.register_submission(&a);
        let idb = engine.register_submission(&b);
        let idc = engine.register_submission(&c);

        let driver = ComparisonDriver::new(&engine);
        let results = driver.run(&[ida, idb, idc], &[], None, Arc::new(AtomicBool::new(false))).unwrap();
        assert_eq!(results.len(), 1);
        assert!(results[0].matched_tokens() > 0);
    }
}

//! Thread-safe comparison engine (§4.1-4.4, §5): owns the token-type
//! interner and the per-submission one-shot caches (value-list, excluded
//! mask, base-code mask, hash index), all keyed by a stable submission
//! identity handed out at registration time rather than by reference from
//! `Submission` itself (§9 Design Notes, "cyclic ownership").

use crate::comparison::Comparison;
use crate::config::MatchConfig;
use crate::hash_index::HashIndex;
use crate::interner::TokenTypeInterner;
use crate::marks::MarkedBitmap;
use crate::matcher::{self, Match};
use crate::merge::merge_matches;
use crate::submission::Submission;
use crate::token::FrontEndCaps;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Opaque handle identifying a registered submission. Stable for the life
/// of the `Engine` it was registered with; never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubmissionId(u64);

struct SubmissionCache {
    name: Arc<str>,
    values: Vec<i32>,
    excluded_mask: MarkedBitmap,
    base_mask: RwLock<Option<MarkedBitmap>>,
    hash_index: RwLock<Option<Arc<HashIndex>>>,
}

impl SubmissionCache {
    fn combined_marks(&self) -> MarkedBitmap {
        let mut marks = self.excluded_mask.clone();
        if let Some(base) = self.base_mask.read().as_ref() {
            marks.union_with(base);
        }
        marks
    }

    fn invalidate_hash_index(&self) {
        *self.hash_index.write() = None;
    }

    /// `|L|`/`|R|` as the similarity formulas of §4.6 mean them: the count of
    /// real, matchable tokens, excluding the trailing `FILE_END` sentinel
    /// every submission carries. Scenario S1 (§8) pins this down: comparing
    /// `"ABCDEFG$"` against itself reports AVG = 1.0, which only holds if the
    /// sentinel is left out of the denominator — `Submission::len()` and
    /// `Engine::submission_len` intentionally keep counting it, since the
    /// `minimum_token_match + 1` length floor and pair-ordering convention
    /// are about the raw stored sequence, not this derived quantity.
    fn content_len(&self) -> usize {
        self.values.len().saturating_sub(1)
    }
}

pub struct Engine {
    interner: TokenTypeInterner,
    caps: FrontEndCaps,
    config: MatchConfig,
    next_id: AtomicU64,
    caches: RwLock<ahash::AHashMap<u64, Arc<SubmissionCache>>>,
}

impl Engine {
    pub fn new(caps: FrontEndCaps, config: MatchConfig) -> Self {
        Engine {
            interner: TokenTypeInterner::new(),
            caps,
            config,
            next_id: AtomicU64::new(0),
            caches: RwLock::new(ahash::AHashMap::default()),
        }
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Interns `submission`'s token kinds into per-token values, builds its
    /// excluded-type mask (FILE_END plus anything `FrontEndCaps` flags), and
    /// returns a stable handle for later `compare`/`generate_base_code_marking`
    /// calls. This is the one memoization point for the value-list (§4.1).
    pub fn register_submission(&self, submission: &Submission) -> SubmissionId {
        let tokens = submission.tokens();
        let values: Vec<i32> = tokens.iter().map(|t| self.interner.value_of(t.kind)).collect();

        let mut excluded_mask = MarkedBitmap::with_file_end_marked(values.len());
        for (i, t) in tokens.iter().enumerate() {
            if self.caps.is_excluded_from_matching(t.kind) {
                excluded_mask.set(i);
            }
        }

        let cache = Arc::new(SubmissionCache {
            name: Arc::from(submission.name()),
            values,
            excluded_mask,
            base_mask: RwLock::new(None),
            hash_index: RwLock::new(None),
        });

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        log::debug!("registered submission `{}` as {:?} ({} tokens)", submission.name(), SubmissionId(id), cache.values.len());
        self.caches.write().insert(id, cache);
        SubmissionId(id)
    }

    pub fn submission_name(&self, id: SubmissionId) -> Arc<str> {
        self.cache_of(id).name.clone()
    }

    pub fn submission_len(&self, id: SubmissionId) -> usize {
        self.cache_of(id).values.len()
    }

    fn cache_of(&self, id: SubmissionId) -> Arc<SubmissionCache> {
        self.caches.read().get(&id.0).cloned().expect("unknown SubmissionId")
    }

    fn hash_index_for(&self, cache: &SubmissionCache, marks: &MarkedBitmap, window: usize) -> Arc<HashIndex> {
        if let Some(existing) = cache.hash_index.read().as_ref() {
            if existing.window() == window {
                return existing.clone();
            }
        }
        let built = Arc::new(HashIndex::build(&cache.values, marks, window));
        *cache.hash_index.write() = Some(built.clone());
        built
    }

    /// Runs §4.3's tiling followed by §4.4's merge pass over two registered
    /// submissions and returns the resulting `Comparison`. Returns an empty
    /// comparison if either side has no tokens available to match against
    /// (shorter than `minimum_token_match`, counting `FILE_END` as pivot) —
    /// the driver is responsible for pre-filtering short submissions, so
    /// this is treated as the documented non-fatal empty case (§4.3 Failure
    /// modes), not an error.
    pub fn compare(&self, a: SubmissionId, b: SubmissionId) -> Comparison {
        let left = self.cache_of(a);
        let right = self.cache_of(b);

        let mtm = self.config.minimum_token_match;
        let mb = self.config.merge_buffer;
        let window = mtm.saturating_sub(mb).max(1);

        if left.values.len() <= mtm || right.values.len() <= mtm {
            return Comparison::new(
                left.name.clone(),
                left.content_len(),
                right.name.clone(),
                right.content_len(),
                Vec::new(),
                Vec::new(),
            );
        }

        let mut left_marks = left.combined_marks();
        let mut right_marks = right.combined_marks();
        let left_hash = self.hash_index_for(&left, &left_marks, window);
        let right_hash = self.hash_index_for(&right, &right_marks, window);

        let tiling = matcher::tile(
            &left.values,
            &mut left_marks,
            &left_hash,
            &right.values,
            &mut right_marks,
            &right_hash,
            mtm,
            mb,
        );

        let merged = merge_matches(&tiling.global_matches, &tiling.ignored_matches, self.config.merge_length);

        Comparison::new(
            left.name.clone(),
            left.content_len(),
            right.name.clone(),
            right.content_len(),
            merged,
            tiling.ignored_matches,
        )
    }

    /// Runs the matcher with `base` on one side and records every position
    /// it covers on `submission`'s side as that submission's base-code mask
    /// (§4.3 "Base-code subtraction"), invalidating the submission's cached
    /// hash index so the next `compare` rebuilds it against the new marks.
    /// Idempotent: a repeated call against the same base re-derives the
    /// same mask via `union_with`, which only ever grows set bits.
    pub fn generate_base_code_marking(&self, submission: SubmissionId, base: SubmissionId) -> Comparison {
        let s = self.cache_of(submission);
        let b = self.cache_of(base);

        let mtm = self.config.minimum_token_match;
        let mb = self.config.merge_buffer;
        let window = mtm.saturating_sub(mb).max(1);

        let mut s_marks = s.combined_marks();
        let mut b_marks = b.excluded_mask.clone();
        let s_hash = self.hash_index_for(&s, &s_marks, window);
        let b_hash = HashIndex::build(&b.values, &b_marks, window);

        let tiling = matcher::tile(
            &s.values,
            &mut s_marks,
            &s_hash,
            &b.values,
            &mut b_marks,
            &b_hash,
            mtm,
            mb,
        );

        let mut new_base_mask = MarkedBitmap::new(s.values.len());
        for m in tiling.global_matches.iter().chain(tiling.ignored_matches.iter()) {
            new_base_mask.mark_range(m.start_in_first, m.length);
        }

        {
            let mut guard = s.base_mask.write();
            match guard.as_mut() {
                Some(existing) => existing.union_with(&new_base_mask),
                None => *guard = Some(new_base_mask),
            }
        }
        s.invalidate_hash_index();

        let all_matches: Vec<Match> =
            tiling.global_matches.into_iter().chain(tiling.ignored_matches.clone()).collect();
        Comparison::new(s.name.clone(), s.content_len(), b.name.clone(), b.content_len(), all_matches, tiling.ignored_matches)
    }
}

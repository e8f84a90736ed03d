//! The Greedy String Tiling algorithm (§4.3): given two token-value
//! sequences and their marked bitmaps, computes a maximal non-overlapping
//! tiling in iterative longest-run-first passes.

use crate::hash_index::HashIndex;
use crate::marks::MarkedBitmap;

/// A single tile: `(startInFirst, startInSecond, length)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match {
    pub start_in_first: usize,
    pub start_in_second: usize,
    pub length: usize,
}

impl Match {
    pub fn new(start_in_first: usize, start_in_second: usize, length: usize) -> Self {
        Match { start_in_first, start_in_second, length }
    }

    #[inline]
    fn range_first(&self) -> std::ops::Range<usize> {
        self.start_in_first..self.start_in_first + self.length
    }

    #[inline]
    fn range_second(&self) -> std::ops::Range<usize> {
        self.start_in_second..self.start_in_second + self.length
    }

    /// True iff `self` and `other` intersect on either side.
    pub fn overlaps(&self, other: &Match) -> bool {
        ranges_intersect(&self.range_first(), &other.range_first())
            || ranges_intersect(&self.range_second(), &other.range_second())
    }
}

#[inline]
fn ranges_intersect(a: &std::ops::Range<usize>, b: &std::ops::Range<usize>) -> bool {
    a.start < b.end && b.start < a.end
}

/// Result of one `tile()` run: non-overlapping matches `>= MTM`, plus the
/// shorter ones in `[minimumMatchLength, MTM)` kept as merge bridges.
#[derive(Debug, Clone, Default)]
pub struct Tiling {
    pub global_matches: Vec<Match>,
    pub ignored_matches: Vec<Match>,
}

/// Verifies (backward) that the `start`-token window at `(i, j)` truly
/// matches — the hash index only guarantees a `w`-gram collision, not
/// equality over the full candidate length — then extends forward as far as
/// possible. Returns 0 if the backward check fails.
fn maximal_unmarked_run(
    left: &[i32],
    left_marked: &MarkedBitmap,
    right: &[i32],
    right_marked: &MarkedBitmap,
    i: usize,
    j: usize,
    start: usize,
) -> usize {
    for k in (0..start).rev() {
        if left_marked.get(i + k) || right_marked.get(j + k) || left[i + k] != right[j + k] {
            return 0;
        }
    }
    let mut len = start;
    while i + len < left.len() && j + len < right.len() {
        if left_marked.get(i + len) || right_marked.get(j + len) || left[i + len] != right[j + len] {
            break;
        }
        len += 1;
    }
    len
}

/// Runs the iterative-maximal-tiling algorithm of §4.3 over a pair of
/// sequences, given their precomputed hash indices (built over the same
/// `minimum_match_length` window as `mtm`/`mb` imply) and marked bitmaps.
/// `left_marked`/`right_marked` are mutated in place: every accepted or
/// ignored match marks both of its ranges, exactly as the spec requires.
pub fn tile(
    left: &[i32],
    left_marked: &mut MarkedBitmap,
    left_hash: &HashIndex,
    right: &[i32],
    right_marked: &mut MarkedBitmap,
    right_hash: &HashIndex,
    mtm: usize,
    mb: usize,
) -> Tiling {
    let minimum_match_length = mtm.saturating_sub(mb).max(1);
    let mut tiling = Tiling::default();

    loop {
        let mut max_len = minimum_match_length;
        let mut iteration: Vec<Match> = Vec::new();

        for i in 0..left.len() {
            if left_marked.get(i) {
                continue;
            }
            let h = left_hash.hash_for_start(i);
            if h == crate::hash_index::NO_HASH {
                continue;
            }
            for &j in right_hash.starts_with_hash(h) {
                let j = j as usize;
                if right_marked.get(j) {
                    continue;
                }
                if !(max_len < right.len().saturating_sub(j)) {
                    continue;
                }
                let len = maximal_unmarked_run(left, left_marked, right, right_marked, i, j, max_len);
                if len < max_len {
                    continue;
                }
                if len > max_len {
                    iteration.clear();
                    max_len = len;
                }
                let candidate = Match::new(i, j, len);
                if !iteration.iter().rev().any(|m| m.overlaps(&candidate)) {
                    iteration.push(candidate);
                }
            }
        }

        if iteration.is_empty() {
            break;
        }

        for m in &iteration {
            if m.length < mtm + mb {
                tiling.ignored_matches.push(*m);
            } else {
                tiling.global_matches.push(*m);
            }
            left_marked.mark_range(m.start_in_first, m.length);
            right_marked.mark_range(m.start_in_second, m.length);
        }

        if max_len <= minimum_match_length {
            break;
        }
    }

    tiling
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash_index::HashIndex;

    fn run(left: &[i32], right: &[i32], mtm: usize, mb: usize) -> Tiling {
        let mml = mtm.saturating_sub(mb).max(1);
        let mut lm = MarkedBitmap::with_file_end_marked(left.len());
        let mut rm = MarkedBitmap::with_file_end_marked(right.len());
        let lh = HashIndex::build(left, &lm, mml);
        let rh = HashIndex::build(right, &rm, mml);
        tile(left, &mut lm, &lh, right, &mut rm, &rh, mtm, mb)
    }

    #[test]
    fn identical_sequences_match_fully_minus_sentinel() {
        // "ABCDEFG$" as values, FILE_END = 0.
        let seq = [1, 2, 3, 4, 5, 6, 7, 0];
        let t = run(&seq, &seq, 3, 0);
        assert_eq!(t.global_matches.len(), 1);
        assert_eq!(t.global_matches[0], Match::new(0, 0, 7));
    }

    #[test]
    fn unrelated_sequences_match_nothing() {
        let a = [1, 2, 3, 4, 5, 0];
        let b = [6, 7, 8, 9, 10, 0];
        let t = run(&a, &b, 3, 0);
        assert!(t.global_matches.is_empty());
    }

    #[test]
    fn embedded_match_is_found_at_correct_offsets() {
        let a = [1, 2, 3, 4, 5, 6, 7, 0];
        let b = [20, 21, 22, 1, 2, 3, 4, 5, 6, 7, 20, 21, 22, 0];
        let t = run(&a, &b, 3, 0);
        assert_eq!(t.global_matches, vec![Match::new(0, 3, 7)]);
    }

    #[test]
    fn repeated_substring_matches_only_once_non_overlapping() {
        // "ABCABC$" vs "ABC$": only one occurrence of ABC exists in B, so at
        // most one 3-length match is possible, not two.
        let a = [1, 2, 3, 1, 2, 3, 0];
        let b = [1, 2, 3, 0];
        let t = run(&a, &b, 3, 0);
        assert_eq!(t.global_matches.len(), 1);
        assert_eq!(t.global_matches[0].length, 3);
        assert_eq!(t.global_matches[0].start_in_second, 0);
    }

    #[test]
    fn matches_never_overlap_on_either_side() {
        let a = [1, 2, 3, 4, 5, 6, 7, 8, 9, 0];
        let b = [1, 2, 3, 4, 9, 8, 7, 6, 5, 0];
        let t = run(&a, &b, 3, 0);
        for (idx, m1) in t.global_matches.iter().enumerate() {
            for m2 in t.global_matches.iter().skip(idx + 1) {
                assert!(!m1.overlaps(m2));
            }
        }
    }

    #[test]
    fn every_reported_match_is_at_least_mtm() {
        let a = [1, 2, 3, 4, 5, 9, 9, 9, 9, 9, 0];
        let b = [1, 2, 3, 4, 5, 8, 8, 8, 0];
        let t = run(&a, &b, 4, 0);
        for m in &t.global_matches {
            assert!(m.length >= 4);
        }
    }
}

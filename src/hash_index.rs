//! Subsequence hash index (§4.2): a rolling polynomial hash over fixed-length
//! windows of token values, used to find Greedy String Tiling match
//! candidates in expected O(1) per start instead of scanning the whole
//! second sequence.

use crate::marks::MarkedBitmap;
use ahash::AHashMap;
use smallvec::SmallVec;

/// Reserved hash value meaning "this window contains a marked position".
/// The rolling hash below never legitimately produces this value: on the
/// rare occasion the arithmetic does land on it, the value is flipped by one
/// bit, exactly as the Design Notes call for.
pub const NO_HASH: u64 = u64::MAX;

const BASE: u64 = 1_000_003;

/// Per-submission cache: for a fixed window length `w`, the hash of every
/// unmarked `w`-gram and a reverse index from hash to start positions.
pub struct HashIndex {
    window: usize,
    hash_for_start: Vec<u64>,
    buckets: AHashMap<u64, SmallVec<[u32; 4]>>,
}

impl HashIndex {
    /// Builds the index for `values` using `marked` to blank out windows that
    /// touch an excluded or base-code position. `window` is the effective
    /// `minimumMatchLength` from §4.3.
    pub fn build(values: &[i32], marked: &MarkedBitmap, window: usize) -> Self {
        let n = values.len();
        if window == 0 || n < window {
            return HashIndex { window, hash_for_start: Vec::new(), buckets: AHashMap::default() };
        }

        // Prefix hashes and base powers, exactly the rolling-hash shape used
        // elsewhere in this crate for byte strings, generalized to token values.
        let mut prefix = Vec::with_capacity(n + 1);
        let mut power = Vec::with_capacity(n + 1);
        prefix.push(0u64);
        power.push(1u64);
        for &v in values {
            let last_prefix = *prefix.last().unwrap();
            prefix.push(last_prefix.wrapping_mul(BASE).wrapping_add(v as u64));
            let last_power = *power.last().unwrap();
            power.push(last_power.wrapping_mul(BASE));
        }

        let num_starts = n - window + 1;
        let mut hash_for_start = Vec::with_capacity(num_starts);
        let mut buckets: AHashMap<u64, SmallVec<[u32; 4]>> = AHashMap::default();
        for start in 0..num_starts {
            if !marked.window_clear(start, window) {
                hash_for_start.push(NO_HASH);
                continue;
            }
            let mut h = prefix[start + window].wrapping_sub(prefix[start].wrapping_mul(power[window]));
            if h == NO_HASH {
                h ^= 1;
            }
            hash_for_start.push(h);
            buckets.entry(h).or_default().push(start as u32);
        }

        HashIndex { window, hash_for_start, buckets }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// The hash of the window beginning at `start`, or `NO_HASH` if `start`
    /// is out of range or its window is marked.
    pub fn hash_for_start(&self, start: usize) -> u64 {
        self.hash_for_start.get(start).copied().unwrap_or(NO_HASH)
    }

    /// `startsWithHash`: the start positions whose window hashes to `h`.
    pub fn starts_with_hash(&self, h: u64) -> &[u32] {
        self.buckets.get(&h).map(SmallVec::as_slice).unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_windows_share_a_bucket() {
        let values = [1, 2, 3, 1, 2, 3, 9];
        let marked = MarkedBitmap::new(values.len());
        let idx = HashIndex::build(&values, &marked, 3);
        let h0 = idx.hash_for_start(0);
        let h3 = idx.hash_for_start(3);
        assert_eq!(h0, h3);
        assert_eq!(idx.starts_with_hash(h0), &[0, 3]);
    }

    #[test]
    fn marked_windows_get_no_hash() {
        let values = [1, 2, 3, 4];
        let mut marked = MarkedBitmap::new(values.len());
        marked.set(1);
        let idx = HashIndex::build(&values, &marked, 2);
        assert_eq!(idx.hash_for_start(0), NO_HASH); // touches position 1
        assert_eq!(idx.hash_for_start(1), NO_HASH); // starts at marked position 1
        assert_ne!(idx.hash_for_start(2), NO_HASH);
    }

    #[test]
    fn window_longer_than_sequence_yields_empty_index() {
        let values = [1, 2];
        let marked = MarkedBitmap::new(values.len());
        let idx = HashIndex::build(&values, &marked, 5);
        assert_eq!(idx.hash_for_start(0), NO_HASH);
    }
}

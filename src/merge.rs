//! Match merging (§4.4): bridges `globalMatches` separated by small gaps
//! using `ignoredMatches` as connective tissue.
//!
//! Gap measure chosen (Design Notes' open choice): the gap at each link of a
//! candidate chain is the token distance between the *accepted endpoints*
//! of consecutive chain elements only (current tail's end to next
//! candidate's start), not a cumulative sum of interior bridge lengths. Both
//! sides of a link must independently fall within `merge_length`, and a
//! candidate that would put either side out of order with the running
//! chain tail breaks the chain instead of bridging it.
//!
//! A merged match's reported `length` is the sum of the lengths of every
//! chain element it absorbs (global anchors and ignored bridges) — the
//! count of tokens that actually matched, not the wider envelope including
//! the gap tokens in between. This keeps `Comparison::matched_tokens`
//! (`Σ length`) meaning "tokens verified identical", not "tokens spanned".

use crate::matcher::Match;

pub fn merge_matches(global: &[Match], ignored: &[Match], merge_length: usize) -> Vec<Match> {
    let mut combined: Vec<(bool, Match)> =
        global.iter().map(|&m| (true, m)).chain(ignored.iter().map(|&m| (false, m))).collect();
    combined.sort_by_key(|(_, m)| m.start_in_first);

    let mut result = Vec::new();
    let mut i = 0;
    while i < combined.len() {
        let (is_global, anchor) = combined[i];
        if !is_global {
            // An ignored match can never start a chain on its own; it only
            // bridges between two accepted matches.
            i += 1;
            continue;
        }

        let mut chain_tail = anchor;
        let mut last_accepted_idx = i;
        let mut total_length = anchor.length;
        let mut scan = i + 1;

        while scan < combined.len() {
            let (scan_is_global, candidate) = combined[scan];
            let tail_end_first = chain_tail.start_in_first + chain_tail.length;
            let tail_end_second = chain_tail.start_in_second + chain_tail.length;
            if candidate.start_in_second < tail_end_second {
                break; // inconsistent ordering between sides
            }
            let gap_first = candidate.start_in_first - tail_end_first;
            let gap_second = candidate.start_in_second - tail_end_second;
            if gap_first > merge_length || gap_second > merge_length {
                break;
            }

            chain_tail = candidate;
            total_length += candidate.length;
            if scan_is_global {
                last_accepted_idx = scan;
            }
            scan += 1;
        }

        if last_accepted_idx > i {
            result.push(Match::new(anchor.start_in_first, anchor.start_in_second, total_length));
            i = last_accepted_idx + 1;
        } else {
            result.push(anchor);
            i += 1;
        }
    }

    result
}

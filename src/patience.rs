//! Patience diff: finds a common subsequence by anchoring on lines that
//! occur exactly once in each of the two sequences being compared, then
//! taking the longest increasing subsequence of their cross-references.
//!
//! Grounded in the original tool's `patience_unique_lcs`/
//! `patience_longest_increasing_sequence` (pointer-identity piles built by
//! linear scan), reworked into the binary-search-over-piles technique used
//! by git's own patience implementation: each new card does a
//! `partition_point` lookup instead of a linear scan of pile tops, and we
//! track predecessors in a flat `Vec<Option<usize>>` instead of a linked
//! list of heap nodes.

use crate::linestore::LineRef;

/// Returns the longest common subsequence of `a` and `b` restricted to
/// lines that occur exactly once in `a` and exactly once in `b` (by value).
/// Lines that repeat in either side are excluded before the LIS search,
/// since they can't be placed unambiguously.
///
/// Returns `LineRef`s in increasing order of position in both `a` and `b`.
pub fn unique_lcs(a: &[LineRef], b: &[LineRef]) -> Vec<LineRef> {
    let a_unique = unique_refs(a);
    let b_unique = unique_refs(b);

    // (position in a, position in b) for lines unique to both, ordered by
    // position in a.
    let mut matches: Vec<(usize, usize)> = Vec::new();
    for (ai, line) in a.iter().enumerate() {
        if !a_unique.contains(line) {
            continue;
        }
        if let Some(bi) = b
            .iter()
            .position(|l| l == line)
        {
            if b_unique.contains(line) {
                matches.push((ai, bi));
            }
        }
    }

    let lis = longest_increasing_by_second(&matches);
    lis.into_iter().map(|(ai, _)| a[ai]).collect()
}

fn unique_refs(xs: &[LineRef]) -> std::collections::HashSet<LineRef> {
    let mut counts: std::collections::HashMap<LineRef, u32> = std::collections::HashMap::new();
    for &x in xs {
        *counts.entry(x).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .filter(|&(_, c)| c == 1)
        .map(|(l, _)| l)
        .collect()
}

/// Patience-sort the `(a_index, b_index)` pairs (already sorted by
/// `a_index`) into piles keyed on `b_index`, returning the longest strictly
/// increasing subsequence by `b_index`.
///
/// Each pile holds the index (into `pairs`) of its current top card. A new
/// card is dropped onto the leftmost pile whose top exceeds it, found via
/// binary search (`partition_point`) since pile tops are monotonic by
/// construction. Its predecessor in the subsequence is the top of the pile
/// immediately to its left.
fn longest_increasing_by_second(pairs: &[(usize, usize)]) -> Vec<(usize, usize)> {
    if pairs.is_empty() {
        return Vec::new();
    }

    let mut piles: Vec<usize> = Vec::new();
    let mut backptrs: Vec<Option<usize>> = vec![None; pairs.len()];

    for (idx, &(_, bi)) in pairs.iter().enumerate() {
        let pile_idx = piles.partition_point(|&top| pairs[top].1 < bi);
        if pile_idx > 0 {
            backptrs[idx] = Some(piles[pile_idx - 1]);
        }
        if pile_idx == piles.len() {
            piles.push(idx);
        } else {
            piles[pile_idx] = idx;
        }
    }

    let mut result = Vec::new();
    let mut cur = piles.last().copied();
    while let Some(idx) = cur {
        result.push(pairs[idx]);
        cur = backptrs[idx];
    }
    result.reverse();
    result
}

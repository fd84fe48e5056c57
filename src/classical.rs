//! Classical (dynamic-programming) LCS, used as the fallback when patience
//! diff finds no unique anchor lines to recurse around.
//!
//! Grounded in the original tool's `classical_lcs`: memoized recursion over
//! `(i, j)` suffix lengths, with the common-suffix-runs-collapsed-into-one-
//! memo-entry optimization (the `while a[i-1] == b[j-1]` loop) preserved,
//! since it's a memoization shortcut rather than a correctness-affecting
//! pruning of the input.
//!
//! Per the accompanying design notes, this port deliberately skips the
//! original's other optimization of pre-filtering `a` down to lines that
//! also occur in `b` before running the DP. That filter is a performance
//! optimization over the *same* LCS, not a change in semantics, and leaving
//! it out keeps this module a single, easily-verified algorithm instead of
//! two algorithms that have to agree.

use crate::linestore::LineRef;
use std::collections::HashMap;

/// The longest common subsequence of `a` and `b`, computed by
/// top-down memoized dynamic programming.
pub fn lcs(a: &[LineRef], b: &[LineRef]) -> Vec<LineRef> {
    let mut memo: HashMap<(usize, usize), Vec<LineRef>> = HashMap::new();
    recurse(a, b, a.len(), b.len(), &mut memo)
}

fn recurse(
    a: &[LineRef],
    b: &[LineRef],
    i: usize,
    j: usize,
    memo: &mut HashMap<(usize, usize), Vec<LineRef>>,
) -> Vec<LineRef> {
    if let Some(cached) = memo.get(&(i, j)) {
        return cached.clone();
    }

    let result = if i == 0 || j == 0 {
        Vec::new()
    } else if a[i - 1] == b[j - 1] {
        let old_i = i;
        let mut i = i;
        let mut j = j;
        while i > 0 && j > 0 && a[i - 1] == b[j - 1] {
            i -= 1;
            j -= 1;
        }
        let mut result = recurse(a, b, i, j, memo);
        result.extend_from_slice(&a[i..old_i]);
        result
    } else {
        let drop_a = recurse(a, b, i - 1, j, memo);
        let drop_b = recurse(a, b, i, j - 1, memo);
        if drop_a.len() >= drop_b.len() {
            drop_a
        } else {
            drop_b
        }
    };

    memo.insert((i, j), result.clone());
    result
}

//! Cosmetic post-processing pass that coalesces adjacent lines which are
//! textually identical but currently split across disjoint file masks,
//! choosing which adjacent pair to fold first by a brace/blank-line
//! priority so the resulting `#ifdef` boundaries land on natural edges
//! (closing braces, blank lines) rather than mid-statement.
//!
//! This has no counterpart in the original tool; it is new. The only
//! merge this module ever performs -- combining two adjacent `DiffLine`s
//! with disjoint masks and equal text into one line carrying the union
//! mask -- can never change any file's reconstructed sequence: a disjoint
//! mask means no file sees both entries today, so no file's occurrence
//! count of that text changes when the two entries become one. Anything
//! riskier (reclassifying a line's mask to cross into a file that didn't
//! already see it) is deliberately out of scope; see the design notes for
//! why a fuller version was not attempted.

use crate::diffmodel::{Diff, DiffLine};
use crate::linestore::LineStore;

/// Runs the coalescing pass to a fixed point and returns the result as a
/// new `Diff`. Callers that want the unmassaged merge (the `--no-slide`
/// escape hatch) simply skip calling this.
pub fn slide_windows(store: &LineStore, diff: &Diff) -> Diff {
    let mut lines: Vec<DiffLine> = diff.lines().to_vec();

    loop {
        let mut best: Option<(usize, i32)> = None;
        for i in 0..lines.len().saturating_sub(1) {
            let a = lines[i];
            let b = lines[i + 1];
            if a.mask.is_disjoint(b.mask) && store.equals(a.line, b.line) {
                let p = priority(store.text(a.line));
                if best.is_none_or(|(_, best_p)| p > best_p) {
                    best = Some((i, p));
                }
            }
        }
        let Some((i, _)) = best else { break };
        let merged_mask = lines[i].mask | lines[i + 1].mask;
        lines[i] = DiffLine::new(lines[i].line, merged_mask);
        lines.remove(i + 1);
    }

    let mut result = Diff::new(diff.dimension());
    for line in lines {
        result.push(line);
    }
    result
}

/// Brace/blank-line priority: a line whose first non-whitespace character
/// is `}` scores highest (the further left, the higher), a blank line
/// scores low but positive, anything else scores zero.
fn priority(text: &str) -> i32 {
    let trimmed = text.trim_start();
    if trimmed.starts_with('}') {
        let column = (text.len() - trimmed.len()) as i32;
        return (100 - column).max(10);
    }
    if text.trim().is_empty() {
        return 1;
    }
    0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linestore::LineStore;
    use crate::mask::Mask;

    #[test]
    fn merges_adjacent_disjoint_identical_lines() {
        let mut store = LineStore::new(2);
        let shared = store.intern(0, "}");
        store.intern(1, "}");

        let mut diff = Diff::new(2);
        diff.push(DiffLine::new(shared, Mask::single(0)));
        diff.push(DiffLine::new(shared, Mask::single(1)));

        let slid = slide_windows(&store, &diff);
        assert_eq!(slid.len(), 1);
        assert_eq!(slid.lines()[0].mask, Mask::all(2));
    }

    #[test]
    fn does_not_merge_overlapping_masks() {
        let mut store = LineStore::new(2);
        let shared = store.intern(0, "x");
        store.intern(1, "x");

        let mut diff = Diff::new(2);
        diff.push(DiffLine::new(shared, Mask::all(2)));
        diff.push(DiffLine::new(shared, Mask::single(0)));

        let slid = slide_windows(&store, &diff);
        assert_eq!(slid.len(), 2);
    }

    #[test]
    fn does_not_merge_differing_text() {
        let mut store = LineStore::new(2);
        let a = store.intern(0, "a");
        let b = store.intern(1, "b");

        let mut diff = Diff::new(2);
        diff.push(DiffLine::new(a, Mask::single(0)));
        diff.push(DiffLine::new(b, Mask::single(1)));

        let slid = slide_windows(&store, &diff);
        assert_eq!(slid.len(), 2);
    }

    #[test]
    fn preserves_central_correctness_property_after_merging() {
        let mut store = LineStore::new(2);
        let brace = store.intern(0, "}");
        store.intern(1, "}");
        let unique_a = store.intern(0, "only a");
        let unique_b = store.intern(1, "only b");

        let mut diff = Diff::new(2);
        diff.push(DiffLine::new(unique_a, Mask::single(0)));
        diff.push(DiffLine::new(unique_b, Mask::single(1)));
        diff.push(DiffLine::new(brace, Mask::single(0)));
        diff.push(DiffLine::new(brace, Mask::single(1)));

        let before_a = diff.reconstruct_file(0);
        let before_b = diff.reconstruct_file(1);
        let slid = slide_windows(&store, &diff);
        assert_eq!(slid.reconstruct_file(0), before_a);
        assert_eq!(slid.reconstruct_file(1), before_b);
    }

    #[test]
    fn cascading_merges_collapse_a_whole_run() {
        let mut store = LineStore::new(3);
        let blank = store.intern(0, "");
        store.intern(1, "");
        store.intern(2, "");

        let mut diff = Diff::new(3);
        diff.push(DiffLine::new(blank, Mask::single(0)));
        diff.push(DiffLine::new(blank, Mask::single(1)));
        diff.push(DiffLine::new(blank, Mask::single(2)));

        let slid = slide_windows(&store, &diff);
        assert_eq!(slid.len(), 1);
        assert_eq!(slid.lines()[0].mask, Mask::all(3));
    }
}

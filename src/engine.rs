//! The recursive fold that incorporates one file at a time into a growing
//! [`Diff`], preserving the central correctness property documented on
//! [`Diff::reconstruct_file`].
//!
//! Grounded directly in the original tool's `Difdef_impl::add_vec_to_diff`
//! and `add_vec_to_diff_classical`: patience diff anchors the merge on
//! lines unique to both sides, recurses on the gaps between anchors, and
//! falls back to the classical DP LCS when no unique anchors exist in a
//! gap.

use crate::classical;
use crate::diffmodel::{Diff, DiffLine};
use crate::linestore::{LineRef, LineStore};
use crate::mask::Mask;
use crate::patience;

/// Merges `dimension` files (given as per-file line sequences, already
/// interned into `store`) into a single [`Diff`], folding them in in order.
pub fn merge_all(store: &LineStore, files: &[Vec<LineRef>]) -> Diff {
    let dimension = files.len();
    let mut diff = Diff::new(dimension);
    for (fileid, lines) in files.iter().enumerate() {
        fold_file_into_diff(store, &mut diff, fileid, lines);
    }
    diff
}

/// Merges only the files named in `fileids` (a non-empty subset of
/// `0..files.len()`), in ascending file-id order.
pub fn merge_subset(store: &LineStore, files: &[Vec<LineRef>], fileids: &[usize]) -> Diff {
    assert!(!fileids.is_empty(), "merge_subset requires at least one file");
    let dimension = files.len();
    let mut diff = Diff::new(dimension);
    let mut ordered = fileids.to_vec();
    ordered.sort_unstable();
    ordered.dedup();
    for fileid in ordered {
        fold_file_into_diff(store, &mut diff, fileid, &files[fileid]);
    }
    diff
}

/// Merges exactly two files out of a larger file set, keeping `dimension`
/// (and therefore mask width) equal to the full file set.
pub fn merge_two(store: &LineStore, files: &[Vec<LineRef>], a: usize, b: usize) -> Diff {
    merge_subset(store, files, &[a, b])
}

/// Folds file `fileid`'s lines (`b`) into the accumulated `diff` in place.
pub fn fold_file_into_diff(store: &LineStore, diff: &mut Diff, fileid: usize, b: &[LineRef]) {
    let bmask = Mask::single(fileid);
    let known_files = diff.union_mask();
    assert!(
        known_files.is_disjoint(bmask),
        "file {fileid} already folded into this diff"
    );
    let a_lines = diff.lines().to_vec();
    let merged = fold(store, fileid, known_files, &a_lines, b);

    let dimension = diff.dimension();
    let mut rebuilt = Diff::new(dimension);
    for line in merged {
        rebuilt.push(line);
    }
    *diff = rebuilt;
}

/// Concatenates each file's lines one after another with no diffing at
/// all, each line tagged with only its own file's bit.
///
/// Used by the `#ifdef` reconstructor when a mask run can't be expressed
/// faithfully and has to be split into per-file duplicate ranges instead.
pub fn simply_concatenate(dimension: usize, files: &[Vec<LineRef>]) -> Diff {
    assert_eq!(files.len(), dimension);
    let mut diff = Diff::new(dimension);
    for (fileid, lines) in files.iter().enumerate() {
        let mask = Mask::single(fileid);
        for &line in lines {
            diff.push(DiffLine::new(line, mask));
        }
    }
    diff
}

/// The heart of the fold: merges `a` (already-tagged accumulated lines,
/// some subset of `known_files`) with `b` (file `fileid`'s untagged lines)
/// into a new tagged line sequence.
fn fold(
    store: &LineStore,
    fileid: usize,
    known_files: Mask,
    a: &[DiffLine],
    b: &[LineRef],
) -> Vec<DiffLine> {
    let bmask = Mask::single(fileid);
    let mut result = Vec::new();

    // Common prefix: as long as a and b agree line-for-line, there is
    // nothing to diff.
    let mut i = 0;
    while i < a.len() && i < b.len() && store.equals(a[i].line, b[i]) {
        result.push(DiffLine::new(b[i], a[i].mask | bmask));
        i += 1;
    }

    let ja = a.len();
    let jb = b.len();

    // Lines in the remaining a[i..] that occur exactly once in file
    // `fileid` and are not repeated anywhere else within a[i..] itself.
    // These are candidate patience-diff anchors.
    let mut ua: Vec<LineRef> = Vec::new();
    for k in i..ja {
        let line = a[k].line;
        let occ = store.occurrences(line);
        if occ[fileid] != 1 {
            continue;
        }
        let mut failed = false;
        for k2 in i..ja {
            if k2 != k && a[k2].line == line {
                failed = true;
                break;
            }
        }
        if !failed {
            ua.push(line);
        }
    }

    let ub: Vec<LineRef> = b[i..jb]
        .iter()
        .copied()
        .filter(|line| ua.contains(line))
        .collect();

    let lcs = patience::unique_lcs(&ua, &ub);

    if lcs.is_empty() {
        result.extend(classical_fold(store, fileid, &a[i..ja], &b[i..jb]));
        return result;
    }

    let mut ak = i;
    let mut bk = i;
    for anchor in lcs {
        let mut ta = Vec::new();
        while a[ak].line != anchor {
            ta.push(a[ak]);
            ak += 1;
        }
        let mut tb = Vec::new();
        while b[bk] != anchor {
            tb.push(b[bk]);
            bk += 1;
        }
        result.extend(fold(store, fileid, known_files, &ta, &tb));
        result.push(DiffLine::new(anchor, a[ak].mask | bmask));
        ak += 1;
        bk += 1;
    }
    result.extend(fold(store, fileid, known_files, &a[ak..ja], &b[bk..jb]));
    result
}

/// Classical-DP fallback merge for a gap with no unique patience anchors.
fn classical_fold(store: &LineStore, fileid: usize, a: &[DiffLine], b: &[LineRef]) -> Vec<DiffLine> {
    let _ = store;
    let bmask = Mask::single(fileid);
    if b.is_empty() {
        return a.to_vec();
    }

    let a_refs: Vec<LineRef> = a.iter().map(|l| l.line).collect();
    let lcs = classical::lcs(&a_refs, b);

    let mut result = Vec::new();
    let mut ak = 0;
    let mut bk = 0;
    for anchor in lcs {
        while a[ak].line != anchor {
            result.push(a[ak]);
            ak += 1;
        }
        while b[bk] != anchor {
            result.push(DiffLine::new(b[bk], bmask));
            bk += 1;
        }
        result.push(DiffLine::new(anchor, a[ak].mask | bmask));
        ak += 1;
        bk += 1;
    }
    while ak < a.len() {
        result.push(a[ak]);
        ak += 1;
    }
    while bk < b.len() {
        result.push(DiffLine::new(b[bk], bmask));
        bk += 1;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_and_files(dimension: usize, files: &[&[&str]]) -> (LineStore, Vec<Vec<LineRef>>) {
        let mut store = LineStore::new(dimension);
        let interned = files
            .iter()
            .enumerate()
            .map(|(id, lines)| store.intern_file(id, lines))
            .collect();
        (store, interned)
    }

    #[test]
    fn two_identical_files_merge_into_shared_lines() {
        let (store, files) = store_and_files(2, &[&["a", "b", "c"], &["a", "b", "c"]]);
        let diff = merge_all(&store, &files);
        assert!(diff.lines().iter().all(|l| l.mask == Mask::all(2)));
        assert_eq!(diff.len(), 3);
    }

    #[test]
    fn central_correctness_property_holds_for_two_files() {
        let (store, files) = store_and_files(
            2,
            &[&["a", "b", "c", "d"], &["a", "x", "c", "d"]],
        );
        let diff = merge_all(&store, &files);
        for (fileid, original) in files.iter().enumerate() {
            let reconstructed = diff.reconstruct_file(fileid);
            assert_eq!(reconstructed, *original);
        }
    }

    #[test]
    fn insertion_is_tagged_with_only_the_inserting_file() {
        let (store, files) = store_and_files(2, &[&["a", "c"], &["a", "b", "c"]]);
        let diff = merge_all(&store, &files);
        let b_only: Vec<_> = diff
            .lines()
            .iter()
            .filter(|l| l.mask == Mask::single(1))
            .collect();
        assert_eq!(b_only.len(), 1);
        assert_eq!(store.text(b_only[0].line), "b");
    }

    #[test]
    fn three_way_merge_preserves_every_file() {
        let (store, files) = store_and_files(
            3,
            &[
                &["a", "b", "c"],
                &["a", "X", "c"],
                &["a", "b", "Y", "c"],
            ],
        );
        let diff = merge_all(&store, &files);
        for (fileid, original) in files.iter().enumerate() {
            assert_eq!(diff.reconstruct_file(fileid), *original);
        }
    }

    #[test]
    fn merge_subset_ignores_files_outside_the_set() {
        let (store, files) = store_and_files(
            3,
            &[&["a", "b"], &["a", "c"], &["z", "z", "z"]],
        );
        let diff = merge_subset(&store, &files, &[0, 1]);
        assert!(diff.union_mask().contains(Mask::single(0)));
        assert!(diff.union_mask().contains(Mask::single(1)));
        assert!(!diff.union_mask().contains_file(2));
    }

    #[test]
    fn files_with_no_shared_lines_fall_back_to_classical_and_still_reconstruct() {
        let (store, files) = store_and_files(2, &[&["p", "q"], &["r", "s"]]);
        let diff = merge_all(&store, &files);
        assert_eq!(diff.reconstruct_file(0), files[0]);
        assert_eq!(diff.reconstruct_file(1), files[1]);
    }

    #[test]
    fn simply_concatenate_tags_each_line_with_only_its_own_file() {
        let (store, files) = store_and_files(2, &[&["a", "b"], &["a", "b"]]);
        let diff = simply_concatenate(2, &files);
        assert_eq!(diff.len(), 4);
        assert!(diff.lines()[0].mask == Mask::single(0));
        assert!(diff.lines()[2].mask == Mask::single(1));
    }
}

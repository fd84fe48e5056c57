use crate::linestore::LineRef;
use crate::mask::Mask;

/// One line of a merged result, tagged with the set of input files that
/// contain it.
///
/// `mask` is never `Mask::EMPTY` — a line with no owning file has no reason
/// to exist in a `Diff`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiffLine {
    pub line: LineRef,
    pub mask: Mask,
}

impl DiffLine {
    pub fn new(line: LineRef, mask: Mask) -> DiffLine {
        debug_assert!(!mask.is_empty(), "DiffLine mask must be non-empty");
        DiffLine { line, mask }
    }
}

/// The merged result of folding `dimension` input files together.
///
/// Central correctness property: for every file index `i` in `0..dimension`,
/// filtering `lines` down to those whose mask contains bit `i` reproduces
/// exactly file `i`'s original line sequence, in order. This property is the
/// thing every fold and every post-processing pass (sliding, range
/// splitting) must preserve.
#[derive(Debug, Clone)]
pub struct Diff {
    dimension: usize,
    lines: Vec<DiffLine>,
}

impl Diff {
    /// An empty diff over `dimension` files, ready to be built up by folding.
    pub fn new(dimension: usize) -> Diff {
        assert!(
            dimension > 0 && dimension <= crate::mask::MAX_FILES,
            "dimension {dimension} out of range"
        );
        Diff {
            dimension,
            lines: Vec::new(),
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn lines(&self) -> &[DiffLine] {
        &self.lines
    }

    pub fn push(&mut self, line: DiffLine) {
        assert!(
            line.mask.bits() & !Mask::all(self.dimension).bits() == 0,
            "DiffLine mask {} exceeds dimension {}",
            line.mask,
            self.dimension
        );
        self.lines.push(line);
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// The union of every line's mask: the set of files actually
    /// represented anywhere in this diff.
    pub fn union_mask(&self) -> Mask {
        self.lines.iter().fold(Mask::EMPTY, |acc, l| acc | l.mask)
    }

    /// Reconstructs file `file_id`'s original line sequence by filtering
    /// `lines` down to those whose mask contains it. This is the central
    /// correctness property made executable, and is exercised directly by
    /// the recursive fold's own tests plus the crate's property tests.
    pub fn reconstruct_file(&self, file_id: usize) -> Vec<LineRef> {
        assert!(file_id < self.dimension);
        self.lines
            .iter()
            .filter(|l| l.mask.contains_file(file_id))
            .map(|l| l.line)
            .collect()
    }

    /// Iterate lines whose mask is exactly `mask` (not merely a superset).
    pub fn lines_with_exact_mask(&self, mask: Mask) -> impl Iterator<Item = &DiffLine> {
        self.lines.iter().filter(move |l| l.mask == mask)
    }
}

//! GNU-compatible unified diff rendering for a two-file merge.
//!
//! Grounded in the original tool's `do_print_unified_diff`: find the next
//! differing run, grow it while the non-differing gap stays within
//! `2*context`, emit one `@@ -a,b +c,d @@` hunk, repeat. Ported as a loop
//! instead of `goto repeat`.

use crate::diffmodel::Diff;
use crate::linestore::LineStore;
use std::fmt::Write as _;

/// Renders `diff` (dimension 2) as a unified diff between `name_a`/`ts_a`
/// and `name_b`/`ts_b`, with `context` lines of leading/trailing context
/// per hunk (GNU diff's default is 3).
pub fn render(store: &LineStore, diff: &Diff, name_a: &str, ts_a: &str, name_b: &str, ts_b: &str, context: usize) -> String {
    assert_eq!(diff.dimension(), 2, "unified diff requires exactly two files");
    let lines = diff.lines();
    let in_a: Vec<bool> = lines.iter().map(|l| l.mask.contains_file(0)).collect();
    let in_b: Vec<bool> = lines.iter().map(|l| l.mask.contains_file(1)).collect();

    let hunks = find_hunks(&in_a, &in_b, context);
    if hunks.is_empty() {
        return String::new();
    }

    let mut out = String::new();
    let _ = writeln!(out, "--- {name_a}\t{ts_a}");
    let _ = writeln!(out, "+++ {name_b}\t{ts_b}");

    for hunk in hunks {
        let hunk_size_in_a = hunk.last_a - hunk.first_a;
        let hunk_size_in_b = hunk.last_b - hunk.first_b;
        let start_a = hunk.first_a + usize::from(hunk_size_in_a != 0);
        let start_b = hunk.first_b + usize::from(hunk_size_in_b != 0);

        out.push_str("@@ -");
        let _ = write!(out, "{start_a}");
        if hunk_size_in_a != 1 {
            let _ = write!(out, ",{hunk_size_in_a}");
        }
        out.push_str(" +");
        let _ = write!(out, "{start_b}");
        if hunk_size_in_b != 1 {
            let _ = write!(out, ",{hunk_size_in_b}");
        }
        out.push_str(" @@\n");

        for j in hunk.first_ab..hunk.last_ab {
            let marker = match (in_a[j], in_b[j]) {
                (true, true) => ' ',
                (true, false) => '-',
                (false, true) => '+',
                (false, false) => unreachable!("every line belongs to at least one file"),
            };
            out.push(marker);
            out.push_str(store.text(lines[j].line));
            out.push('\n');
        }
    }

    out
}

struct Hunk {
    first_ab: usize,
    last_ab: usize,
    first_a: usize,
    last_a: usize,
    first_b: usize,
    last_b: usize,
}

fn find_hunks(in_a: &[bool], in_b: &[bool], context: usize) -> Vec<Hunk> {
    let n = in_a.len();
    let mut hunks = Vec::new();
    let (mut abx, mut ax, mut bx) = (0usize, 0usize, 0usize);

    loop {
        while abx < n && in_a[abx] == in_b[abx] {
            ax += 1;
            bx += 1;
            abx += 1;
        }
        if abx == n {
            break;
        }

        let first_diff_in_ab = abx;
        let first_diff_in_a = ax;
        let first_diff_in_b = bx;

        let mut non_differing_range = 0usize;
        while abx < n {
            if in_a[abx] == in_b[abx] {
                if non_differing_range == 2 * context {
                    break;
                }
                non_differing_range += 1;
            } else {
                non_differing_range = 0;
            }
            ax += usize::from(in_a[abx]);
            bx += usize::from(in_b[abx]);
            abx += 1;
        }

        let last_diff_in_ab = abx - non_differing_range;
        let last_diff_in_a = ax - non_differing_range;
        let last_diff_in_b = bx - non_differing_range;

        let leading_context = context.min(first_diff_in_ab);
        let trailing_context = context.min(n - last_diff_in_ab);

        hunks.push(Hunk {
            first_ab: first_diff_in_ab - leading_context,
            last_ab: last_diff_in_ab + trailing_context,
            first_a: first_diff_in_a - leading_context,
            last_a: last_diff_in_a + trailing_context,
            first_b: first_diff_in_b - leading_context,
            last_b: last_diff_in_b + trailing_context,
        });
    }
    hunks
}

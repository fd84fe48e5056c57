//! Default "raw" output mode: one column per file, greppable rather than
//! pretty.
//!
//! Grounded in the original tool's `do_print_multicolumn`: column `i` holds
//! `alphabet[i]` if the line belongs to file `i`, a space otherwise,
//! followed by the line text.

use crate::diffmodel::Diff;
use crate::linestore::LineStore;
use crate::mask::MAX_FILES;

const ALPHABET: &[u8; MAX_FILES] = b"abcdefghijklmnopqrstuvwxyzABCDEF";

/// Renders `diff` as an `N`-column prefix format, one line of output per
/// `DiffLine`.
pub fn render(store: &LineStore, diff: &Diff) -> String {
    let dimension = diff.dimension();
    let mut out = String::with_capacity(diff.len() * 16);
    for line in diff.lines() {
        for file_id in 0..dimension {
            let ch = if line.mask.contains_file(file_id) {
                ALPHABET[file_id] as char
            } else {
                ' '
            };
            out.push(ch);
        }
        out.push_str(store.text(line.line));
        out.push('\n');
    }
    out
}

//! Recognizes C preprocessor conditional directives and validates their
//! nesting per input file.
//!
//! Grounded in the original tool's `matches_pp_directive`/
//! `matches_if_directive` and `verify_properly_nested_directives`: the
//! matcher is a small hand-rolled scanner (no regex crate pulled in for a
//! four-keyword prefix check), and the validator replays each file's own
//! subsequence of the merged diff through a pushdown automaton.

use crate::diffmodel::Diff;
use crate::linestore::LineStore;

/// True if `line`, after skipping leading whitespace and a `#`, begins
/// with `directive` followed by whitespace or end-of-line.
pub fn matches_pp_directive(line: &str, directive: &str) -> bool {
    let trimmed = line.trim_start();
    let Some(rest) = trimmed.strip_prefix('#') else {
        return false;
    };
    let rest = rest.trim_start();
    match rest.strip_prefix(directive) {
        Some(after) => after.is_empty() || after.starts_with(char::is_whitespace),
        None => false,
    }
}

pub fn matches_if_directive(line: &str) -> bool {
    matches_pp_directive(line, "if")
        || matches_pp_directive(line, "ifdef")
        || matches_pp_directive(line, "ifndef")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Frame {
    If,
    Else,
}

/// A preprocessor directive found unbalanced within a single file's view
/// of the merged diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NestingError {
    pub file_name: String,
    pub line_number: usize,
    pub reason: String,
}

impl std::fmt::Display for NestingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "file {}, line {}: {}",
            self.file_name, self.line_number, self.reason
        )
    }
}

impl std::error::Error for NestingError {}

/// Replays, for every file bit in `diff`'s dimension, that file's own
/// subsequence of lines through a pushdown automaton to confirm `#if*`/
/// `#elif`/`#else`/`#endif` directives are properly nested.
///
/// `file_names[v]` is used only to build a readable error message.
pub fn verify_properly_nested_directives(
    store: &LineStore,
    diff: &Diff,
    file_names: &[String],
) -> Result<(), NestingError> {
    assert_eq!(file_names.len(), diff.dimension());

    let mut nest: Vec<Vec<Frame>> = vec![Vec::new(); diff.dimension()];
    let mut lineno: Vec<usize> = vec![0; diff.dimension()];

    for diff_line in diff.lines() {
        let text = store.text(diff_line.line);
        let is_if = matches_if_directive(text);
        let is_elif = matches_pp_directive(text, "elif");
        let is_else = matches_pp_directive(text, "else");
        let is_endif = matches_pp_directive(text, "endif");

        for v in diff_line.mask.iter_files() {
            lineno[v] += 1;
        }

        if !(is_if || is_elif || is_else || is_endif) {
            continue;
        }

        for v in diff_line.mask.iter_files() {
            let stack = &mut nest[v];

            if (is_elif || is_else || is_endif) && stack.is_empty() {
                let which = if is_elif {
                    "#elif"
                } else if is_else {
                    "#else"
                } else {
                    "#endif"
                };
                return Err(NestingError {
                    file_name: file_names[v].clone(),
                    line_number: lineno[v],
                    reason: format!("{which} with no preceding #if"),
                });
            }
            if (is_elif || is_else) && stack.last() == Some(&Frame::Else) {
                let which = if is_elif { "#elif" } else { "#else" };
                return Err(NestingError {
                    file_name: file_names[v].clone(),
                    line_number: lineno[v],
                    reason: format!("unexpected {which} following an #else"),
                });
            }

            if is_if {
                stack.push(Frame::If);
            } else if is_else {
                *stack.last_mut().expect("checked non-empty above") = Frame::Else;
            } else if is_endif {
                stack.pop();
            }
        }
    }

    for (v, stack) in nest.iter().enumerate() {
        if !stack.is_empty() {
            return Err(NestingError {
                file_name: file_names[v].clone(),
                line_number: lineno[v],
                reason: "expected #endif before end of file".to_string(),
            });
        }
    }

    Ok(())
}

//! Tracks C lexical state (string/char literals, block comments,
//! backslash-continued lines) across a stream of source lines, so the
//! `#ifdef` reconstructor can tell which line boundaries are safe places to
//! insert a preprocessor directive.
//!
//! Ported line-for-line in spirit from the original tool's `CStateMachine`,
//! including its deliberate resync behavior: an unterminated string or
//! character literal does not carry across a line boundary unless that line
//! ends in a backslash continuation, because real-world inputs mixing in
//! non-C syntax (a stray `#pragma mark Typedef'd structures`, a Perl
//! regex literal) would otherwise desync the whole rest of the file. Block
//! comments have no such escape hatch and always carry over.

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CStateMachine {
    in_backslash: bool,
    in_comment: bool,
    in_string: bool,
    in_char: bool,
}

impl CStateMachine {
    pub fn new() -> CStateMachine {
        CStateMachine::default()
    }

    /// True if this line ends in the middle of a string, char literal,
    /// block comment, or backslash continuation -- i.e. a directive could
    /// not be safely inserted immediately after it.
    pub fn in_something(self) -> bool {
        self.in_backslash || self.in_comment || self.in_string || self.in_char
    }

    /// Feeds one more physical line through the state machine, advancing
    /// its internal state to reflect the end of that line.
    pub fn update(&mut self, line: &str) {
        let bytes = line.as_bytes();
        self.in_backslash = false;
        let mut i = 0;
        while i < bytes.len() {
            let c = bytes[i];
            let next = bytes.get(i + 1).copied();

            if c == b'\\' && next.is_none() {
                self.resync(bytes);
                return;
            } else if self.in_string {
                if c == b'\\' {
                    i += 1;
                } else if c == b'"' {
                    self.in_string = false;
                }
            } else if self.in_char {
                if c == b'\\' {
                    i += 1;
                } else if c == b'\'' {
                    self.in_char = false;
                }
            } else if self.in_comment {
                if c == b'*' && next == Some(b'/') {
                    i += 1;
                    self.in_comment = false;
                }
            } else if c == b'/' && next == Some(b'*') {
                i += 1;
                self.in_comment = true;
            } else if c == b'/' && next == Some(b'/') {
                self.resync(bytes);
                return;
            } else if c == b'"' {
                self.in_string = true;
            } else if c == b'\'' {
                self.in_char = true;
            }
            i += 1;
        }
        self.resync(bytes);
    }

    fn resync(&mut self, bytes: &[u8]) {
        self.in_backslash = bytes.last() == Some(&b'\\');
        if !self.in_backslash {
            self.in_string = false;
            self.in_char = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_line_ends_in_no_state() {
        let mut m = CStateMachine::new();
        m.update("int x = 1;");
        assert!(!m.in_something());
    }

    #[test]
    fn unterminated_block_comment_carries_over() {
        let mut m = CStateMachine::new();
        m.update("/* start of a comment");
        assert!(m.in_comment);
        m.update("still inside");
        assert!(m.in_comment);
        m.update("end here */ int x;");
        assert!(!m.in_something());
    }

    #[test]
    fn line_comment_does_not_carry_over() {
        let mut m = CStateMachine::new();
        m.update("int x; // trailing comment with \" unbalanced quote");
        assert!(!m.in_something());
    }

    #[test]
    fn backslash_continuation_carries_state() {
        let mut m = CStateMachine::new();
        m.update("#define FOO(x) \\");
        assert!(m.in_backslash);
        m.update("    (x + 1)");
        assert!(!m.in_something());
    }

    #[test]
    fn unterminated_string_resyncs_without_continuation() {
        let mut m = CStateMachine::new();
        m.update("const char *s = \"oops no closing quote");
        assert!(!m.in_something(), "unterminated string without backslash must resync");
    }

    #[test]
    fn unterminated_string_with_continuation_carries_over() {
        let mut m = CStateMachine::new();
        m.update("const char *s = \"oops \\");
        assert!(m.in_string);
        assert!(m.in_backslash);
    }

    #[test]
    fn char_literal_is_tracked_like_a_string() {
        let mut m = CStateMachine::new();
        m.update("char c = 'x';");
        assert!(!m.in_something());
    }
}

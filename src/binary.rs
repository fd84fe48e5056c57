//! Binary-file sniffing so a line-oriented merge never silently corrupts
//! non-text input.
//!
//! No original-source counterpart (the original tool simply treats
//! everything as text); grounded in the GNU diff / git `buffer_is_binary`
//! heuristic: a NUL byte in the first few KiB marks the file as binary.

/// Bytes examined before giving up and declaring the input text.
const SNIFF_WINDOW: usize = 8000;

/// True if a NUL byte appears in the first [`SNIFF_WINDOW`] bytes of `data`.
pub fn looks_binary(data: &[u8]) -> bool {
    let window = &data[..data.len().min(SNIFF_WINDOW)];
    window.contains(&0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_not_binary() {
        assert!(!looks_binary(b"hello\nworld\n"));
    }

    #[test]
    fn nul_byte_marks_binary() {
        assert!(looks_binary(b"hello\0world"));
    }

    #[test]
    fn nul_past_the_sniff_window_is_not_detected() {
        let mut data = vec![b'x'; SNIFF_WINDOW + 10];
        data[SNIFF_WINDOW + 5] = 0;
        assert!(!looks_binary(&data));
    }

    #[test]
    fn high_bit_bytes_alone_are_not_binary() {
        let data: Vec<u8> = (0u8..=255).filter(|&b| b != 0).collect();
        assert!(!looks_binary(&data));
    }
}

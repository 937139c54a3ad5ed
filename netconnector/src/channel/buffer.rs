//! Pattern buffer fed through a VT parser.
//!
//! Device output is run through `vte` so escape sequences never reach the
//! matchers. Backspace and cursor-left sequences erase already buffered
//! characters on the current line, which is how most pagers wipe their
//! `--More--` banner; carriage returns and other control bytes are dropped.

use std::borrow::Cow;

use regex::bytes::Regex;
use vte::{Params, Parser, Perform};

/// Position of a pattern match inside the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferMatch {
    /// Index of the pattern in the slice passed to [`PatternBuffer::find_earliest`].
    pub index: usize,
    pub start: usize,
    pub end: usize,
}

/// Bytes before the end of the previous search that are searched again, so
/// matches straddling two reads are still found.
pub const DEFAULT_SEARCH_DEPTH: usize = 1000;

/// Buffer for accumulating cleaned output and searching it for patterns.
///
/// Searches are incremental: bytes that were already searched without a
/// match are skipped on the next search, apart from the last
/// `search_depth` of them.
pub struct PatternBuffer {
    buffer: Vec<u8>,
    parser: Parser,
    /// Buffer length at the last search that found nothing.
    scanned: usize,
    search_depth: usize,
}

struct Screen<'a> {
    out: &'a mut Vec<u8>,
}

impl Screen<'_> {
    /// Erase up to `count` characters, never crossing a line break.
    fn erase(&mut self, count: usize) {
        for _ in 0..count {
            loop {
                match self.out.last() {
                    None | Some(b'\n') => return,
                    Some(&byte) => {
                        self.out.pop();
                        // Stop once the lead byte of a UTF-8 sequence is gone.
                        if byte & 0xC0 != 0x80 {
                            break;
                        }
                    }
                }
            }
        }
    }
}

impl Perform for Screen<'_> {
    fn print(&mut self, c: char) {
        let mut utf8 = [0u8; 4];
        self.out.extend_from_slice(c.encode_utf8(&mut utf8).as_bytes());
    }

    fn execute(&mut self, byte: u8) {
        match byte {
            b'\n' | b'\t' => self.out.push(byte),
            0x08 => self.erase(1),
            _ => {}
        }
    }

    fn csi_dispatch(&mut self, params: &Params, _intermediates: &[u8], _ignore: bool, action: char) {
        if action == 'D' {
            let count = params
                .iter()
                .next()
                .and_then(|p| p.first().copied())
                .filter(|&n| n > 0)
                .unwrap_or(1);
            self.erase(count as usize);
        }
    }
}

impl PatternBuffer {
    pub fn new() -> Self {
        Self::with_search_depth(DEFAULT_SEARCH_DEPTH)
    }

    pub fn with_search_depth(search_depth: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(4096),
            parser: Parser::new(),
            scanned: 0,
            search_depth,
        }
    }

    /// Feed raw terminal bytes. Escape sequences split across calls are
    /// handled because the parser keeps its state.
    pub fn extend(&mut self, data: &[u8]) {
        let mut screen = Screen {
            out: &mut self.buffer,
        };
        self.parser.advance(&mut screen, data);
    }

    /// Find the earliest match of any pattern. Ties go to the lower index.
    ///
    /// Only the text added since the last unsuccessful search (plus the
    /// search depth before it) is searched; call [`reset_scan`](Self::reset_scan)
    /// before searching for a different set of patterns.
    pub fn find_earliest(&mut self, patterns: &[&Regex]) -> Option<BufferMatch> {
        let from = self
            .scanned
            .min(self.buffer.len())
            .saturating_sub(self.search_depth);
        let found = patterns
            .iter()
            .enumerate()
            .filter_map(|(index, pattern)| {
                pattern.find_at(&self.buffer, from).map(|m| BufferMatch {
                    index,
                    start: m.start(),
                    end: m.end(),
                })
            })
            .min_by_key(|m| (m.start, m.index));
        if found.is_none() {
            self.scanned = self.buffer.len();
        }
        found
    }

    /// Search the whole buffer again on the next call.
    pub fn reset_scan(&mut self) {
        self.scanned = 0;
    }

    /// Remove everything up to the end of `m`, returning the text before the
    /// match and the matched text. Anything after the match stays buffered.
    pub fn consume(&mut self, m: &BufferMatch) -> (String, String) {
        let rest = self.buffer.split_off(m.end);
        let consumed = std::mem::replace(&mut self.buffer, rest);
        self.scanned = 0;
        (
            String::from_utf8_lossy(&consumed[..m.start]).into_owned(),
            String::from_utf8_lossy(&consumed[m.start..]).into_owned(),
        )
    }

    /// Take ownership of the buffer contents and reset.
    pub fn take(&mut self) -> String {
        let data = std::mem::take(&mut self.buffer);
        self.scanned = 0;
        String::from_utf8_lossy(&data).into_owned()
    }

    pub fn as_str_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.buffer)
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
        self.scanned = 0;
    }
}

impl Default for PatternBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_extend() {
        let mut buffer = PatternBuffer::new();
        buffer.extend(b"Hello, world!");
        assert_eq!(buffer.as_str_lossy(), "Hello, world!");
    }

    #[test]
    fn test_ansi_stripping() {
        let mut buffer = PatternBuffer::new();
        buffer.extend(b"\x1b[32mGreen text\x1b[0m\r\n");
        assert_eq!(buffer.as_str_lossy(), "Green text\n");
    }

    #[test]
    fn test_escape_split_across_chunks() {
        let mut buffer = PatternBuffer::new();
        buffer.extend(b"abc\x1b[");
        buffer.extend(b"1mdef");
        assert_eq!(buffer.as_str_lossy(), "abcdef");
    }

    #[test]
    fn test_backspace_erases_pager_banner() {
        let mut buffer = PatternBuffer::new();
        buffer.extend(b"line one\n");
        buffer.extend(b"\x08\x08\x08   \x08\x08\x08line two");
        assert_eq!(buffer.as_str_lossy(), "line one\nline two");
    }

    #[test]
    fn test_cursor_left_erases() {
        let mut buffer = PatternBuffer::new();
        buffer.extend(b"\x1b[4D    \x1b[4DGE0/0/1");
        assert_eq!(buffer.as_str_lossy(), "GE0/0/1");
    }

    #[test]
    fn test_find_earliest_prefers_first_position() {
        let mut buffer = PatternBuffer::new();
        buffer.extend(b"output --More-- tail sw#");
        let prompt = Regex::new(r"sw#\s*$").unwrap();
        let more = Regex::new(r"--More--").unwrap();
        let m = buffer.find_earliest(&[&prompt, &more]).unwrap();
        assert_eq!(m.index, 1);

        let (before, matched) = buffer.consume(&m);
        assert_eq!(before, "output ");
        assert_eq!(matched, "--More--");
        assert_eq!(buffer.as_str_lossy(), " tail sw#");
    }

    #[test]
    fn test_search_skips_scanned_text() {
        let mut buffer = PatternBuffer::with_search_depth(8);
        let word = Regex::new(r"needle").unwrap();
        buffer.extend(b"needle ");
        buffer.extend(&[b'.'; 64]);
        // Already past the needle: the next search starts near the tail.
        buffer.scanned = buffer.len();
        assert!(buffer.find_earliest(&[&word]).is_none());

        buffer.reset_scan();
        assert_eq!(buffer.find_earliest(&[&word]).unwrap().start, 0);
    }

    #[test]
    fn test_match_across_reads() {
        let mut buffer = PatternBuffer::with_search_depth(16);
        let prompt = Regex::new(r"(?:^|\n)sw1#\s*$").unwrap();
        buffer.extend(&[b'x'; 200]);
        buffer.extend(b"\nsw");
        assert!(buffer.find_earliest(&[&prompt]).is_none());
        buffer.extend(b"1#");
        let m = buffer.find_earliest(&[&prompt]).unwrap();
        assert_eq!(m.start, 200);
    }

    #[test]
    fn test_anchor_sees_text_before_window() {
        let mut buffer = PatternBuffer::with_search_depth(0);
        let prompt = Regex::new(r"(?:^|\n)sw1#\s*$").unwrap();
        buffer.extend(b"xx");
        assert!(buffer.find_earliest(&[&prompt]).is_none());
        buffer.extend(b"sw1#");
        assert!(buffer.find_earliest(&[&prompt]).is_none());
    }

    #[test]
    fn test_take_clears_buffer() {
        let mut buffer = PatternBuffer::new();
        buffer.extend(b"test data");
        assert_eq!(buffer.take(), "test data");
        assert!(buffer.is_empty());
    }
}

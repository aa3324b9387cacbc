use std::collections::VecDeque;

/// Prefix of every line that carries a frame
pub const DATA_PREFIX: &str = "data: ";

/// Payload of a `data: ` line, or None for keep-alives, comments and other lines
pub fn frame_payload(line: &str) -> Option<&str> {
    line.strip_prefix(DATA_PREFIX)
}

/// Byte-level line splitter for the response body.
///
/// Lines are cut on `\n` before any UTF-8 decoding happens. A newline byte
/// can never occur inside a multi-byte sequence, so a code point split across
/// two chunks simply stays buffered until its line is complete.
pub struct FrameDecoder {
    buffer: VecDeque<u8>,
    /// Bytes at the front of `buffer` already known to hold no newline
    scanned: usize,
}

impl FrameDecoder {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: VecDeque::with_capacity(capacity),
            scanned: 0,
        }
    }

    pub fn extend(&mut self, bytes: &[u8]) {
        self.buffer.extend(bytes);
    }

    /// Next complete line without its terminator (`\n` or `\r\n`)
    pub fn next_line(&mut self) -> Option<String> {
        let found = self.buffer.range(self.scanned..).position(|&b| b == b'\n');
        let Some(offset) = found else {
            self.scanned = self.buffer.len();
            return None;
        };
        let newline_pos = self.scanned + offset;
        self.scanned = 0;
        let mut line_bytes: Vec<u8> = self.buffer.drain(..=newline_pos).collect();
        line_bytes.pop();
        Some(decode_line(line_bytes))
    }

    /// Payload of the next `data: ` line, skipping everything else
    pub fn next_frame(&mut self) -> Option<String> {
        while let Some(line) = self.next_line() {
            if let Some(payload) = frame_payload(&line) {
                return Some(payload.to_string());
            }
            if !line.is_empty() {
                tracing::trace!("Dropping non-data line: {:?}", line);
            }
        }
        None
    }

    /// Flush a trailing unterminated line once the transport has closed
    pub fn finish(&mut self) -> Option<String> {
        if self.buffer.is_empty() {
            return None;
        }
        self.scanned = 0;
        let line_bytes: Vec<u8> = self.buffer.drain(..).collect();
        let line = decode_line(line_bytes);
        frame_payload(&line).map(str::to_string)
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::with_capacity(4096)
    }
}

fn decode_line(mut bytes: Vec<u8>) -> String {
    if bytes.last() == Some(&b'\r') {
        bytes.pop();
    }
    match String::from_utf8(bytes) {
        Ok(line) => line,
        Err(e) => {
            tracing::warn!("Invalid UTF-8 in stream line: {}", e.utf8_error());
            String::from_utf8_lossy(e.as_bytes()).into_owned()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lines_and_frames() {
        let mut decoder = FrameDecoder::with_capacity(64);
        decoder.extend(b"data: Hel\n: keep-alive\n\ndata: lo\n");

        assert_eq!(decoder.next_frame().as_deref(), Some("Hel"));
        assert_eq!(decoder.next_frame().as_deref(), Some("lo"));
        assert!(decoder.next_frame().is_none());
        assert!(decoder.is_empty());
    }

    #[test]
    fn test_partial_line() {
        let mut decoder = FrameDecoder::with_capacity(64);

        decoder.extend(b"data: par");
        assert!(decoder.next_frame().is_none());

        decoder.extend(b"tial\n");
        assert_eq!(decoder.next_frame().as_deref(), Some("partial"));
    }

    #[test]
    fn test_long_line_in_small_chunks() {
        let mut decoder = FrameDecoder::with_capacity(16);
        decoder.extend(b"data: ");
        for _ in 0..1000 {
            decoder.extend(b"ab");
            assert!(decoder.next_frame().is_none());
        }
        assert_eq!(decoder.scanned, decoder.len());

        decoder.extend(b"\ndata: next\n");
        assert_eq!(decoder.next_frame().map(|f| f.len()), Some(2000));
        assert_eq!(decoder.next_frame().as_deref(), Some("next"));
        assert_eq!(decoder.scanned, 0);
        assert!(decoder.is_empty());
    }

    #[test]
    fn test_split_code_point_is_buffered() {
        let text = "data: caf\u{e9} \u{1f600}\n".as_bytes();
        let mut decoder = FrameDecoder::with_capacity(64);

        // cut inside the two-byte 'é'
        decoder.extend(&text[..10]);
        assert!(decoder.next_frame().is_none());
        decoder.extend(&text[10..]);

        assert_eq!(decoder.next_frame().as_deref(), Some("caf\u{e9} \u{1f600}"));
    }

    #[test]
    fn test_empty_payload_is_a_frame() {
        let mut decoder = FrameDecoder::default();
        decoder.extend(b"data: \r\n");
        assert_eq!(decoder.next_frame().as_deref(), Some(""));
    }

    #[test]
    fn test_whitespace_is_preserved() {
        let mut decoder = FrameDecoder::default();
        decoder.extend(b"data:  two spaces \n");
        assert_eq!(decoder.next_frame().as_deref(), Some(" two spaces "));
    }

    #[test]
    fn test_prefix_without_space_is_ignored() {
        let mut decoder = FrameDecoder::default();
        decoder.extend(b"data:x\nevent: ping\n");
        assert!(decoder.next_frame().is_none());
    }

    #[test]
    fn test_finish_flushes_trailing_frame() {
        let mut decoder = FrameDecoder::default();
        decoder.extend(b"data: tail");
        assert!(decoder.next_frame().is_none());
        assert_eq!(decoder.finish().as_deref(), Some("tail"));
        assert!(decoder.finish().is_none());
    }
}

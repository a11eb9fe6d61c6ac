//! Incremental JSON framing.
//!
//! The bridge writes complete JSON objects but neither terminates them with
//! a newline nor flushes them atomically, so message boundaries are JSON
//! syntax boundaries. [`JsonFrameDecoder`] buffers raw bytes and yields one
//! object at a time as soon as it is complete.

use super::error::{BridgeError, Result};
use serde_json::Value;
use tracing::{trace, warn};

/// Default upper bound on a single pending frame (16 MiB).
pub const DEFAULT_MAX_FRAME_BYTES: usize = 16 * 1024 * 1024;

/// Byte buffer that cuts complete JSON objects off its front.
///
/// A string-aware brace scan finds where the pending object ends; its
/// position survives across pushes, so every byte is scanned once and
/// `serde_json` only parses a frame whose braces balance.
#[derive(Debug)]
pub struct JsonFrameDecoder {
    buf: Vec<u8>,
    max_frame: usize,
    /// Bytes of the pending frame already scanned
    scanned: usize,
    /// Open `{`/`[` count; zero when no frame is pending
    depth: usize,
    in_string: bool,
    escaped: bool,
}

enum Scan {
    /// Braces balanced; the frame is `buf[..end]`
    Closed(usize),
    Incomplete,
    /// A byte no JSON value could contain outside a string
    Invalid,
}

impl JsonFrameDecoder {
    pub fn new(max_frame: usize) -> Self {
        Self {
            buf: Vec::new(),
            max_frame,
            scanned: 0,
            depth: 0,
            in_string: false,
            escaped: false,
        }
    }

    /// Append bytes as they arrive from the peer.
    pub fn push(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Bytes held but not yet consumed as a frame.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Next complete object, or `None` if more bytes are needed.
    ///
    /// Bytes before the first `{` (whitespace, newlines, stray log output)
    /// are discarded. An object that can never parse is dropped one byte at
    /// a time until the scan resynchronizes on the next `{`. A frame larger
    /// than the limit fails whether or not it is complete.
    pub fn next_frame(&mut self) -> Result<Option<Value>> {
        loop {
            if self.depth == 0 && !self.seek_frame_start() {
                return Ok(None);
            }

            match self.scan() {
                Scan::Closed(end) if end > self.max_frame => {
                    return Err(BridgeError::FrameTooLarge {
                        size: end,
                        limit: self.max_frame,
                    });
                }
                Scan::Closed(end) => match serde_json::from_slice::<Value>(&self.buf[..end]) {
                    Ok(value) => {
                        self.buf.drain(..end);
                        self.reset();
                        return Ok(Some(value));
                    }
                    Err(e) => {
                        warn!(error = %e, "Framing: malformed JSON from bridge, resynchronizing");
                        self.resync();
                    }
                },
                Scan::Incomplete => {
                    if self.buf.len() > self.max_frame {
                        return Err(BridgeError::FrameTooLarge {
                            size: self.buf.len(),
                            limit: self.max_frame,
                        });
                    }
                    return Ok(None);
                }
                Scan::Invalid => {
                    warn!("Framing: unexpected bytes from bridge, resynchronizing");
                    self.resync();
                }
            }
        }
    }

    /// Drop everything before the next `{`. Returns false if there is none.
    fn seek_frame_start(&mut self) -> bool {
        let Some(start) = self.buf.iter().position(|b| *b == b'{') else {
            if self.buf.iter().any(|b| !b.is_ascii_whitespace()) {
                trace!("Framing: discarding {} bytes of non-JSON output", self.buf.len());
            }
            self.buf.clear();
            return false;
        };
        self.buf.drain(..start);
        self.reset();
        true
    }

    /// Continue the brace scan from where the last call stopped.
    fn scan(&mut self) -> Scan {
        while self.scanned < self.buf.len() {
            let byte = self.buf[self.scanned];
            self.scanned += 1;

            if self.in_string {
                if self.escaped {
                    self.escaped = false;
                } else if byte == b'\\' {
                    self.escaped = true;
                } else if byte == b'"' {
                    self.in_string = false;
                }
                continue;
            }

            match byte {
                b'"' => self.in_string = true,
                b'{' | b'[' => self.depth += 1,
                b'}' | b']' => {
                    self.depth = self.depth.saturating_sub(1);
                    if self.depth == 0 {
                        return Scan::Closed(self.scanned);
                    }
                }
                other if !outside_string_byte(other) => return Scan::Invalid,
                _ => {}
            }
        }
        Scan::Incomplete
    }

    /// Give up on the pending frame: drop its opening byte and rescan.
    fn resync(&mut self) {
        self.buf.drain(..1);
        self.reset();
    }

    fn reset(&mut self) {
        self.scanned = 0;
        self.depth = 0;
        self.in_string = false;
        self.escaped = false;
    }
}

/// Bytes a JSON value may contain outside string literals, besides brackets
/// and quotes: separators, whitespace, number characters and the letters of
/// `true`, `false` and `null`.
fn outside_string_byte(byte: u8) -> bool {
    matches!(
        byte,
        b' ' | b'\t'
            | b'\n'
            | b'\r'
            | b':'
            | b','
            | b'0'..=b'9'
            | b'-'
            | b'+'
            | b'.'
            | b'e'
            | b'E'
            | b't'
            | b'r'
            | b'u'
            | b'f'
            | b'a'
            | b'l'
            | b's'
            | b'n'
    )
}

impl Default for JsonFrameDecoder {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FRAME_BYTES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn drain(decoder: &mut JsonFrameDecoder) -> Vec<Value> {
        let mut frames = Vec::new();
        while let Some(frame) = decoder.next_frame().unwrap() {
            frames.push(frame);
        }
        frames
    }

    #[test]
    fn test_single_object_without_newline() {
        let mut decoder = JsonFrameDecoder::default();
        decoder.push(br#"{"id":"1","result":{"ok":true}}"#);
        assert_eq!(drain(&mut decoder), vec![json!({"id": "1", "result": {"ok": true}})]);
        assert_eq!(decoder.buffered(), 0);
    }

    #[test]
    fn test_byte_by_byte_delivery() {
        let text = br#"{"id":"1","result":{"text":"a } brace","n":[1,2,3]}}"#;
        let mut decoder = JsonFrameDecoder::default();
        let mut frames = Vec::new();
        for byte in text.iter() {
            decoder.push(std::slice::from_ref(byte));
            frames.extend(drain(&mut decoder));
        }
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0]["result"]["text"], "a } brace");
    }

    #[test]
    fn test_back_to_back_objects() {
        let mut decoder = JsonFrameDecoder::default();
        decoder.push(br#"{"id":"1","result":1}{"id":"2","result":2}"#);
        decoder.push(b"\n{\"id\":\"3\",");
        let frames = drain(&mut decoder);
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[1]["id"], "2");

        decoder.push(br#""result":3}"#);
        assert_eq!(drain(&mut decoder), vec![json!({"id": "3", "result": 3})]);
    }

    #[test]
    fn test_leading_noise_is_skipped() {
        let mut decoder = JsonFrameDecoder::default();
        decoder.push(b"bridge starting...\r\n{\"id\":\"1\",\"result\":null}");
        assert_eq!(drain(&mut decoder), vec![json!({"id": "1", "result": null})]);
    }

    #[test]
    fn test_malformed_object_resynchronizes() {
        let mut decoder = JsonFrameDecoder::default();
        decoder.push(br#"{"id": oops} {"id":"2","result":2}"#);
        assert_eq!(drain(&mut decoder), vec![json!({"id": "2", "result": 2})]);
    }

    #[test]
    fn test_oversized_pending_frame() {
        let mut decoder = JsonFrameDecoder::new(16);
        decoder.push(br#"{"id":"1","result":"0123456789abcdef"#);
        assert!(matches!(
            decoder.next_frame(),
            Err(BridgeError::FrameTooLarge { limit: 16, .. })
        ));
    }

    #[test]
    fn test_oversized_complete_frame() {
        let mut decoder = JsonFrameDecoder::new(16);
        decoder.push(br#"{"id":"1","result":"0123456789abcdef"}"#);
        assert!(decoder.next_frame().is_err());
    }

    #[test]
    fn test_braces_inside_strings_are_ignored() {
        let mut decoder = JsonFrameDecoder::default();
        decoder.push(br#"{"text":"}{ [","quote":"say \"}\" ok"}{"id":"2"}"#);
        let frames = drain(&mut decoder);
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0]["text"], "}{ [");
        assert_eq!(frames[0]["quote"], "say \"}\" ok");
    }

    #[test]
    fn test_large_frame_in_chunks_is_scanned_once() {
        let payload = "x".repeat(256 * 1024);
        let text = format!(r#"{{"id":"1","result":{{"bytes":"{}"}}}}"#, payload);
        let mut decoder = JsonFrameDecoder::default();
        let mut frames = Vec::new();
        for chunk in text.as_bytes().chunks(1024) {
            decoder.push(chunk);
            frames.extend(drain(&mut decoder));
            if frames.is_empty() {
                assert_eq!(decoder.scanned, decoder.buffered());
            }
        }
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0]["result"]["bytes"].as_str().map(str::len), Some(payload.len()));
        assert_eq!(decoder.buffered(), 0);
    }

    #[test]
    fn test_unclosed_garbage_resynchronizes_without_waiting() {
        let mut decoder = JsonFrameDecoder::default();
        decoder.push(br#"{"id": 1 <html>{"id":"2","result":2}"#);
        assert_eq!(drain(&mut decoder), vec![json!({"id": "2", "result": 2})]);
    }

    #[test]
    fn test_whitespace_only_is_incomplete() {
        let mut decoder = JsonFrameDecoder::default();
        decoder.push(b"  \n");
        assert!(decoder.next_frame().unwrap().is_none());
        assert_eq!(decoder.buffered(), 0);
    }
}

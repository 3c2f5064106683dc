// src/stream/lines.rs

//! Line buffering across chunk boundaries.

/// Splits a byte stream into text lines.
///
/// Lines end at `\n`; a `\r` right before it is dropped. Bytes are decoded
/// as UTF-8 only once a whole line is available, so multi-byte characters
/// split across chunks decode correctly. Invalid UTF-8 is replaced.
#[derive(Debug, Default)]
pub struct LineSplitter {
    buf: Vec<u8>,
}

impl LineSplitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk, returning every line it completed.
    pub fn push(&mut self, data: &[u8]) -> Vec<String> {
        let mut lines = Vec::new();
        let mut rest = data;

        while let Some(pos) = rest.iter().position(|&b| b == b'\n') {
            self.buf.extend_from_slice(&rest[..pos]);
            lines.push(decode_line(std::mem::take(&mut self.buf)));
            rest = &rest[pos + 1..];
        }
        self.buf.extend_from_slice(rest);

        lines
    }

    /// Flush the unterminated trailing fragment, if any.
    pub fn finish(&mut self) -> Option<String> {
        if self.buf.is_empty() {
            None
        } else {
            Some(decode_line(std::mem::take(&mut self.buf)))
        }
    }
}

fn decode_line(mut line: Vec<u8>) -> String {
    if line.last() == Some(&b'\r') {
        line.pop();
    }
    match String::from_utf8(line) {
        Ok(s) => s,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    }
}

//! SSE (Server-Sent Events) decoding
//!
//! Turns the backend's byte chunks into `data:` payloads. Chunks may split a
//! line anywhere, including inside a multi-byte character, so incomplete
//! trailing bytes are kept until their newline arrives and only whole lines
//! are decoded.

/// Marker payload that ends a stream
pub const DONE_MARKER: &str = "[DONE]";

/// One decoded `data:` line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseData {
    Payload(String),
    Done,
}

/// Incremental decoder for `data:` lines
#[derive(Debug, Default)]
pub struct SseDecoder {
    incomplete: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and return the data lines it completed.
    ///
    /// Blank separator lines, comments and non-data fields are skipped.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<SseData> {
        self.incomplete.extend_from_slice(bytes);

        let mut decoded = Vec::new();
        while let Some(newline_pos) = self.incomplete.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.incomplete.drain(..=newline_pos).collect();
            if let Some(data) = parse_line(&String::from_utf8_lossy(&line)) {
                decoded.push(data);
            }
        }
        decoded
    }

    /// Flush a final line the stream ended without terminating
    pub fn finish(&mut self) -> Option<SseData> {
        let line = std::mem::take(&mut self.incomplete);
        parse_line(&String::from_utf8_lossy(&line))
    }

    pub fn has_incomplete(&self) -> bool {
        !self.incomplete.is_empty()
    }
}

fn parse_line(line: &str) -> Option<SseData> {
    let line = line.trim_end_matches(['\r', '\n']);
    let payload = line.strip_prefix("data:")?.trim_start();
    if payload == DONE_MARKER {
        Some(SseData::Done)
    } else if payload.is_empty() {
        None
    } else {
        Some(SseData::Payload(payload.to_string()))
    }
}

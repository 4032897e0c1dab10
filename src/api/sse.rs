// Server-sent event line handling for streamGenerateContent

use serde::Deserialize;

pub const DATA_PREFIX: &str = "data: ";

/// Buffers raw bytes and hands out complete lines.
///
/// Splitting happens on the `\n` byte before decoding. That byte never occurs
/// inside a multi-byte UTF-8 sequence, so a code point split across two chunks
/// stays intact in the carry-over until its line is complete.
#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and return every line it completed.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);

        let mut lines = Vec::new();
        while let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
            let rest = self.pending.split_off(pos + 1);
            let line = std::mem::replace(&mut self.pending, rest);
            lines.push(decode_line(&line[..pos]));
        }
        lines
    }

    /// Take the unterminated carry-over fragment, if any.
    pub fn finish(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        let rest = std::mem::take(&mut self.pending);
        Some(decode_line(&rest))
    }
}

fn decode_line(bytes: &[u8]) -> String {
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}

#[derive(Debug, Deserialize)]
pub struct StreamChunk {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
pub struct CandidatePart {
    #[serde(default)]
    pub text: Option<String>,
}

impl StreamChunk {
    /// Text of the first part of the first candidate, when non-empty.
    pub fn into_text(self) -> Option<String> {
        self.candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .next()?
            .text
            .filter(|text| !text.is_empty())
    }
}

/// Extract the incremental text carried by one line.
///
/// Lines without the `data: ` prefix, events that fail to parse, and events
/// without text all yield `None`; none of them are errors.
pub fn parse_event_line(line: &str) -> Option<String> {
    let payload = line.strip_prefix(DATA_PREFIX)?;
    match serde_json::from_str::<StreamChunk>(payload) {
        Ok(chunk) => chunk.into_text(),
        Err(e) => {
            log::debug!("Skipping malformed stream event: {e}");
            None
        }
    }
}

//! Incremental decoder for the `text/event-stream` framing Gemini uses when
//! called with `alt=sse`.

use crate::{Error, Result};

/// Splits raw network reads into complete event payloads.
///
/// Lines may arrive split across reads and may end in `\r\n`. Multiple
/// `data:` lines within one event are joined with `\n`; comment lines and
/// other fields are ignored.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    /// Prefix of `buffer` already known to contain no newline.
    scanned: usize,
    data_lines: Vec<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one network read; returns every event completed by it.
    pub fn push(&mut self, bytes: &[u8]) -> Result<Vec<String>> {
        self.buffer.extend_from_slice(bytes);

        let mut events = Vec::new();
        loop {
            let Some(offset) = self.buffer[self.scanned..].iter().position(|&b| b == b'\n')
            else {
                self.scanned = self.buffer.len();
                break;
            };
            let newline = self.scanned + offset;
            self.scanned = 0;

            let mut line: Vec<u8> = self.buffer.drain(..=newline).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }

            let line = String::from_utf8(line)
                .map_err(|e| Error::Stream(format!("Invalid UTF-8 in event stream: {}", e)))?;
            if let Some(event) = self.process_line(&line) {
                events.push(event);
            }
        }

        Ok(events)
    }

    /// Flush whatever is left once the byte stream has ended.
    pub fn finish(&mut self) -> Result<Option<String>> {
        if !self.buffer.is_empty() {
            self.scanned = 0;
            let rest = std::mem::take(&mut self.buffer);
            let line = String::from_utf8(rest)
                .map_err(|e| Error::Stream(format!("Invalid UTF-8 in event stream: {}", e)))?;
            let line = line.trim_end_matches('\r');
            if let Some(event) = self.process_line(line) {
                return Ok(Some(event));
            }
        }

        Ok(self.take_event())
    }

    fn process_line(&mut self, line: &str) -> Option<String> {
        if line.is_empty() {
            return self.take_event();
        }

        if let Some(value) = line.strip_prefix("data:") {
            let value = value.strip_prefix(' ').unwrap_or(value);
            self.data_lines.push(value.to_string());
        }

        None
    }

    fn take_event(&mut self) -> Option<String> {
        if self.data_lines.is_empty() {
            return None;
        }
        Some(std::mem::take(&mut self.data_lines).join("\n"))
    }
}

//! Incremental server-sent events decoder.
//!
//! Network chunks can split events (and UTF-8 sequences) anywhere, so bytes
//! are buffered until a blank line closes an event. Only `data:` fields are
//! kept; multi-line data is joined with `\n`.

/// Terminal payload sent by OpenAI-compatible streams.
pub const DONE: &str = "[DONE]";

#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and return the data of every event it completes.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend(chunk.iter().copied().filter(|b| *b != b'\r'));

        let mut events = Vec::new();
        while let Some(end) = find_event_end(&self.buffer) {
            let block: Vec<u8> = self.buffer.drain(..end + 2).collect();
            if let Some(data) = parse_block(&block[..end]) {
                events.push(data);
            }
        }
        events
    }

    /// Flush a trailing event that was not terminated by a blank line.
    pub fn finish(&mut self) -> Option<String> {
        let block = std::mem::take(&mut self.buffer);
        parse_block(&block)
    }
}

fn find_event_end(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == b"\n\n")
}

fn parse_block(block: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(block);
    let mut data: Option<String> = None;
    for line in text.lines() {
        let Some(rest) = line.strip_prefix("data:") else {
            // Comments (":keep-alive"), event names and ids are ignored.
            continue;
        };
        let value = rest.strip_prefix(' ').unwrap_or(rest);
        match data.as_mut() {
            Some(existing) => {
                existing.push('\n');
                existing.push_str(value);
            }
            None => data = Some(value.to_string()),
        }
    }
    data
}

// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Newline-delimited JSON decoding for the local streaming backend
//!
//! By default each read is split on newlines on its own: a JSON object torn
//! across two reads fails to parse on both halves and its token is dropped.
//! `carry_partial_lines` keeps the unterminated tail of a read and prepends it
//! to the next one instead. Incomplete UTF-8 sequences are always carried.

use serde::Deserialize;

/// One object of the streaming response
#[derive(Debug, Deserialize)]
pub(crate) struct StreamChunk {
    #[serde(default)]
    pub message: Option<StreamChunkMessage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StreamChunkMessage {
    #[serde(default)]
    pub content: Option<String>,
}

impl StreamChunk {
    /// Incremental text token at `message.content`, if non-empty
    pub fn token(self) -> Option<String> {
        self.message
            .and_then(|m| m.content)
            .filter(|content| !content.is_empty())
    }
}

/// Stateful decoder from raw reads to text tokens
#[derive(Debug, Default)]
pub struct NdjsonDecoder {
    carry_partial_lines: bool,
    pending_bytes: Vec<u8>,
    pending_line: String,
    skipped_lines: usize,
}

impl NdjsonDecoder {
    pub fn new(carry_partial_lines: bool) -> Self {
        Self {
            carry_partial_lines,
            ..Default::default()
        }
    }

    /// Lines that were not valid stream objects
    pub fn skipped_lines(&self) -> usize {
        self.skipped_lines
    }

    /// Decode one read and return the tokens it completed, in order.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<String> {
        let text = self.decode_utf8(bytes);
        let text = if self.carry_partial_lines {
            let mut joined = std::mem::take(&mut self.pending_line);
            joined.push_str(&text);
            joined
        } else {
            text
        };

        let mut tokens = Vec::new();
        let mut lines: Vec<&str> = text.split('\n').collect();

        if self.carry_partial_lines {
            // The last element is whatever followed the final newline.
            if let Some(tail) = lines.pop() {
                self.pending_line = tail.to_string();
            }
        }

        for line in lines {
            if let Some(token) = self.parse_line(line) {
                tokens.push(token);
            }
        }
        tokens
    }

    /// Flush anything still held once the channel has closed.
    pub fn finish(&mut self) -> Vec<String> {
        let mut tokens = Vec::new();
        if !self.pending_bytes.is_empty() {
            let tail = String::from_utf8_lossy(&self.pending_bytes).into_owned();
            self.pending_bytes.clear();
            self.pending_line.push_str(&tail);
        }
        let line = std::mem::take(&mut self.pending_line);
        if let Some(token) = self.parse_line(&line) {
            tokens.push(token);
        }
        tokens
    }

    fn parse_line(&mut self, line: &str) -> Option<String> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        match serde_json::from_str::<StreamChunk>(line) {
            Ok(chunk) => chunk.token(),
            Err(_) => {
                self.skipped_lines += 1;
                None
            }
        }
    }

    /// Decode bytes, holding back an incomplete trailing UTF-8 sequence.
    fn decode_utf8(&mut self, bytes: &[u8]) -> String {
        let mut data = std::mem::take(&mut self.pending_bytes);
        data.extend_from_slice(bytes);

        match std::str::from_utf8(&data) {
            Ok(text) => text.to_string(),
            Err(err) if err.error_len().is_none() => {
                let valid = err.valid_up_to();
                self.pending_bytes = data[valid..].to_vec();
                String::from_utf8_lossy(&data[..valid]).into_owned()
            }
            Err(_) => String::from_utf8_lossy(&data).into_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_single_line() {
        let mut decoder = NdjsonDecoder::new(false);
        let tokens = decoder.feed(b"{\"message\":{\"content\":\"Hel\"}}\n");
        assert_eq!(tokens, vec!["Hel"]);
    }

    #[test]
    fn test_feed_multiple_lines_in_one_read() {
        let mut decoder = NdjsonDecoder::new(false);
        let tokens = decoder.feed(
            b"{\"message\":{\"content\":\"Hel\"}}\n{\"message\":{\"content\":\"lo\"}}\n",
        );
        assert_eq!(tokens, vec!["Hel", "lo"]);
    }

    #[test]
    fn test_feed_line_without_trailing_newline() {
        let mut decoder = NdjsonDecoder::new(false);
        let tokens = decoder.feed(b"{\"message\":{\"content\":\"end\"},\"done\":true}");
        assert_eq!(tokens, vec!["end"]);
    }

    #[test]
    fn test_empty_and_missing_content_yield_nothing() {
        let mut decoder = NdjsonDecoder::new(false);
        let tokens = decoder.feed(
            b"{\"message\":{\"role\":\"assistant\",\"content\":\"\"},\"done\":true}\n{\"done\":true}\n\n",
        );
        assert!(tokens.is_empty());
        assert_eq!(decoder.skipped_lines(), 0);
    }

    #[test]
    fn test_split_line_is_lost_without_carry() {
        let mut decoder = NdjsonDecoder::new(false);
        let mut tokens = decoder.feed(b"{\"message\":{\"content\":\"A\"}}\n{\"message\":{\"con");
        tokens.extend(decoder.feed(b"tent\":\"B\"}}\n{\"message\":{\"content\":\"C\"}}\n"));
        tokens.extend(decoder.finish());

        assert_eq!(tokens, vec!["A", "C"]);
        assert_eq!(decoder.skipped_lines(), 2);
    }

    #[test]
    fn test_split_line_is_recovered_with_carry() {
        let mut decoder = NdjsonDecoder::new(true);
        let mut tokens = decoder.feed(b"{\"message\":{\"content\":\"A\"}}\n{\"message\":{\"con");
        tokens.extend(decoder.feed(b"tent\":\"B\"}}\n{\"message\":{\"content\":\"C\"}}"));
        tokens.extend(decoder.finish());

        assert_eq!(tokens, vec!["A", "B", "C"]);
        assert_eq!(decoder.skipped_lines(), 0);
    }

    #[test]
    fn test_multibyte_character_across_reads() {
        let line = "{\"message\":{\"content\":\"caf\u{e9}\"}}\n".as_bytes();
        let cut = line.iter().position(|b| *b == 0xC3).unwrap() + 1;

        let mut decoder = NdjsonDecoder::new(true);
        let mut tokens = decoder.feed(&line[..cut]);
        tokens.extend(decoder.feed(&line[cut..]));

        assert_eq!(tokens, vec!["caf\u{e9}"]);
    }

    #[test]
    fn test_malformed_line_is_skipped() {
        let mut decoder = NdjsonDecoder::new(false);
        let tokens = decoder.feed(b"not json\n{\"message\":{\"content\":\"ok\"}}\n");
        assert_eq!(tokens, vec!["ok"]);
        assert_eq!(decoder.skipped_lines(), 1);
    }

    #[test]
    fn test_finish_on_empty_decoder() {
        let mut decoder = NdjsonDecoder::new(true);
        assert!(decoder.finish().is_empty());
    }
}

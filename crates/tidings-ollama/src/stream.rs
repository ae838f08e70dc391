// SPDX-FileCopyrightText: 2026 Tidings Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! JSON Lines decoding for streamed `/api/chat` responses.
//!
//! Ollama writes one JSON object per line. Lines are split on raw bytes, so
//! a multi-byte character cut across network chunks is reassembled before
//! decoding.

use bytes::Bytes;
use futures::StreamExt;
use tidings_core::{FragmentStream, TidingsError};
use tracing::{debug, warn};

use crate::types::ChatChunk;

/// Upper bound on a single buffered line.
const MAX_LINE: usize = 16 * 1024 * 1024;

/// Incremental line splitter and decoder.
#[derive(Debug)]
pub(crate) struct LineDecoder {
    buffer: Vec<u8>,
    done: bool,
    max_line: usize,
}

impl Default for LineDecoder {
    fn default() -> Self {
        Self {
            buffer: Vec::new(),
            done: false,
            max_line: MAX_LINE,
        }
    }
}

impl LineDecoder {
    #[cfg(test)]
    fn with_max_line(max_line: usize) -> Self {
        Self {
            max_line,
            ..Self::default()
        }
    }

    /// Feeds bytes and returns the fragments of every complete line.
    pub(crate) fn push(&mut self, bytes: &[u8]) -> Vec<Result<String, TidingsError>> {
        if self.done {
            return Vec::new();
        }
        self.buffer.extend_from_slice(bytes);

        let mut out = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if let Some(item) = self.decode(&line) {
                let failed = item.is_err();
                out.push(item);
                if failed {
                    self.done = true;
                    break;
                }
            }
            if self.done {
                break;
            }
        }

        // Only the unterminated tail is still buffered here.
        if !self.done && self.buffer.len() > self.max_line {
            self.buffer.clear();
            self.done = true;
            out.push(Err(TidingsError::provider(format!(
                "stream line exceeded {} bytes",
                self.max_line
            ))));
        }
        out
    }

    /// Decodes a final line the server did not terminate with a newline.
    pub(crate) fn finish(&mut self) -> Option<Result<String, TidingsError>> {
        if self.done {
            return None;
        }
        self.done = true;
        let line = std::mem::take(&mut self.buffer);
        self.decode(&line)
    }

    fn decode(&mut self, line: &[u8]) -> Option<Result<String, TidingsError>> {
        let line = line.trim_ascii();
        if line.is_empty() {
            return None;
        }

        let chunk: ChatChunk = match serde_json::from_slice(line) {
            Ok(chunk) => chunk,
            Err(e) => {
                warn!(error = %e, "skipping undecodable stream line");
                return None;
            }
        };

        if let Some(error) = chunk.error {
            return Some(Err(TidingsError::provider(format!("Ollama stream error: {error}"))));
        }
        if chunk.done {
            debug!("stream finished");
            self.done = true;
        }

        let content = chunk.content();
        (!content.is_empty()).then(|| Ok(content.to_string()))
    }
}

/// Converts a byte stream into a stream of text fragments.
pub(crate) fn into_fragments<S>(bytes: S) -> FragmentStream
where
    S: futures::Stream<Item = Result<Bytes, reqwest::Error>> + Send + 'static,
{
    // `None` marks the end of the body so the decoder can flush its tail.
    let stream = bytes
        .map(Some)
        .chain(futures::stream::once(futures::future::ready(None)))
        .scan(LineDecoder::default(), |decoder, chunk| {
            let items = match chunk {
                Some(Ok(bytes)) => decoder.push(&bytes),
                Some(Err(e)) => {
                    decoder.done = true;
                    vec![Err(TidingsError::Provider {
                        message: format!("stream read error: {e}"),
                        source: Some(Box::new(e)),
                    })]
                }
                None => decoder.finish().into_iter().collect(),
            };
            futures::future::ready(Some(items))
        })
        .flat_map(futures::stream::iter);
    Box::pin(stream)
}

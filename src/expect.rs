//! Pattern-matching reader over a shell's output stream.
//!
//! [`PatternReader`] accumulates output until a regular expression matches,
//! in the spirit of `expect(1)`. Bytes that arrive after the match point are
//! held back for the next call, so a response never swallows the start of
//! the one after it.
//!
//! Matching works on raw bytes. A pattern is tested against everything read
//! so far and the buffer is cut at the earliest offset where a match ends,
//! which is the same place a byte-at-a-time scan would have stopped for
//! patterns without end-of-text assertions. Filenames in non-UTF-8 or
//! multi-byte encodings still pass through, but a pattern using `.` will not
//! step over bytes that are not valid UTF-8.

use std::time::Duration;

use regex::bytes::Regex;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::trace;

/// A successful match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    /// Everything consumed, up to and including the match.
    pub raw: Vec<u8>,
    /// Capture groups of the match; `None` for groups that did not take part.
    pub captures: Vec<Option<String>>,
}

impl Match {
    fn new(pattern: &Regex, raw: Vec<u8>) -> Self {
        let captures = pattern
            .captures(&raw)
            .map(|caps| {
                caps.iter()
                    .skip(1)
                    .map(|group| group.map(|m| String::from_utf8_lossy(m.as_bytes()).into_owned()))
                    .collect()
            })
            .unwrap_or_default();
        Self { raw, captures }
    }

    /// The consumed text, decoded lossily.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.raw).into_owned()
    }
}

/// Why a pattern never matched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExpectError {
    /// The deadline passed first.
    #[error("no match within {waited:?}")]
    Timeout { waited: Duration, partial: String },

    /// The stream ended first.
    #[error("stream closed before a match")]
    Eof { partial: String },
}

impl ExpectError {
    /// Output seen before giving up.
    pub fn partial(&self) -> &str {
        match self {
            Self::Timeout { partial, .. } | Self::Eof { partial } => partial,
        }
    }
}

/// Incremental regex matcher over a chunked byte stream.
#[derive(Debug)]
pub struct PatternReader {
    output: mpsc::Receiver<Vec<u8>>,
    /// Received but not yet consumed.
    pending: Vec<u8>,
    /// What the last failed `expect` had buffered.
    unmatched: Vec<u8>,
    eof: bool,
}

impl PatternReader {
    /// Read from the output side of a transport.
    pub fn new(output: mpsc::Receiver<Vec<u8>>) -> Self {
        Self {
            output,
            pending: Vec::new(),
            unmatched: Vec::new(),
            eof: false,
        }
    }

    /// Consume output until `pattern` matches or `timeout` elapses.
    ///
    /// On failure the consumed bytes are kept and available through
    /// [`unmatched`](Self::unmatched) until the next failure.
    pub async fn expect(&mut self, pattern: &Regex, timeout: Duration) -> Result<Match, ExpectError> {
        let deadline = Instant::now() + timeout;
        let mut buffer = Vec::new();

        loop {
            if !self.pending.is_empty() {
                buffer.append(&mut self.pending);
                if let Some(end) = pattern.shortest_match(&buffer) {
                    self.pending = buffer.split_off(end);
                    trace!(
                        consumed = buffer.len(),
                        held_back = self.pending.len(),
                        "pattern matched"
                    );
                    return Ok(Match::new(pattern, buffer));
                }
            }

            if self.eof {
                return Err(self.fail(buffer, |partial| ExpectError::Eof { partial }));
            }

            match tokio::time::timeout_at(deadline, self.output.recv()).await {
                Ok(Some(chunk)) => self.pending.extend_from_slice(&chunk),
                Ok(None) => self.eof = true,
                Err(_) => {
                    return Err(self.fail(buffer, |partial| ExpectError::Timeout {
                        waited: timeout,
                        partial,
                    }))
                }
            }
        }
    }

    /// Bytes buffered by the most recent failed [`expect`](Self::expect).
    pub fn unmatched(&self) -> &[u8] {
        &self.unmatched
    }

    /// Whether the stream has reported end-of-file.
    pub fn is_eof(&self) -> bool {
        self.eof
    }

    /// Stop accepting output. Whatever was already queued is discarded.
    pub fn close(&mut self) {
        self.output.close();
        self.pending.clear();
        self.eof = true;
    }

    fn fail(&mut self, buffer: Vec<u8>, make: impl FnOnce(String) -> ExpectError) -> ExpectError {
        let partial = String::from_utf8_lossy(&buffer).into_owned();
        self.unmatched = buffer;
        make(partial)
    }
}

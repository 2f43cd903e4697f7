//! Recorded push streams: one JSON object per line, `{"event": <bus event>, "data": {...}}`.

use std::path::Path;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tokio::{
    fs::File,
    io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines},
};

/// One recorded bus event.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RecordedEvent {
    /// Bus event name.
    pub event: String,
    /// Raw event data.
    #[serde(default)]
    pub data: Value,
}

/// Failure while reading a recording.
#[derive(Debug, Error)]
pub enum ReplayError {
    /// The recording could not be read.
    #[error("failed to read recording")]
    Io(#[from] std::io::Error),
    /// A line is not a recorded event.
    #[error("line {line} is not a recorded event")]
    Decode {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Sequential reader over a recording. Blank lines and `#` comments are skipped.
pub struct ReplayReader<R> {
    lines: Lines<R>,
    line: usize,
}

impl ReplayReader<BufReader<File>> {
    /// Open the recording at `path`.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, ReplayError> {
        let file = File::open(path).await?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: AsyncBufRead + Unpin> ReplayReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line: 0,
        }
    }

    /// Next event with its 1-based line number, or `None` at end of input.
    pub async fn next_event(&mut self) -> Result<Option<(usize, RecordedEvent)>, ReplayError> {
        while let Some(raw) = self.lines.next_line().await? {
            self.line += 1;
            let trimmed = raw.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let event = serde_json::from_str(trimmed).map_err(|source| ReplayError::Decode {
                line: self.line,
                source,
            })?;
            return Ok(Some((self.line, event)));
        }
        Ok(None)
    }
}

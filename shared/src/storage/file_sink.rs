//! JSON-lines file sink.

use super::{ResultSink, SinkError};
use crate::models::QueryResult;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;

/// Appends each result to a file as one JSON object per line.
///
/// The file is opened in append mode and created if missing (readable and
/// writable by the owner only on unix). Every record is written with a
/// single `write_all` and flushed before `write` returns.
///
/// A write that fails part way leaves a torn line behind. The next record
/// then starts on a fresh line, so only the failed record is lost, at the cost
/// of one line that does not parse.
pub struct JsonLinesSink {
    path: PathBuf,
    output: Mutex<LineWriter<File>>,
}

/// Appends whole lines, starting a new line after a failed write.
struct LineWriter<W> {
    writer: W,
    torn: bool,
}

impl<W: AsyncWrite + Unpin> LineWriter<W> {
    fn new(writer: W) -> Self {
        Self { writer, torn: false }
    }

    async fn append(&mut self, line: &[u8]) -> Result<(), SinkError> {
        if self.torn {
            self.writer.write_all(b"\n").await?;
            self.torn = false;
        }

        let written: std::io::Result<()> = async {
            self.writer.write_all(line).await?;
            self.writer.flush().await
        }
        .await;

        if written.is_err() {
            self.torn = true;
        }
        written.map_err(SinkError::from)
    }
}

impl JsonLinesSink {
    /// Opens `path` for appending.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError::Open`] if the file cannot be opened or created.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, SinkError> {
        let path = path.as_ref().to_path_buf();

        let mut options = OpenOptions::new();
        options.create(true).append(true);
        #[cfg(unix)]
        options.mode(0o600);

        let file = options.open(&path).await.map_err(|source| SinkError::Open {
            path: path.clone(),
            source,
        })?;

        tracing::info!(path = %path.display(), "Output file opened");
        Ok(Self {
            path,
            output: Mutex::new(LineWriter::new(file)),
        })
    }

    /// Returns the path being written to.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ResultSink for JsonLinesSink {
    async fn write(&self, result: &QueryResult) -> Result<(), SinkError> {
        let mut line = serde_json::to_vec(result)?;
        line.push(b'\n');

        self.output.lock().await.append(&line).await
    }
}

//! Destinations for decoded log lines.

use std::future::Future;
use std::io;

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;

/// Caller-supplied destination for log lines.
///
/// A failed write is reported by the streamer and the stream keeps going;
/// sinks should not rely on an error to stop it.
pub trait LogSink: Send {
    fn write_line(&mut self, line: &str) -> impl Future<Output = io::Result<()>> + Send;
}

/// Writes one newline-terminated line per log entry and flushes after each.
#[derive(Debug)]
pub struct WriterSink<W> {
    writer: W,
}

impl<W> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: AsyncWrite + Unpin + Send> LogSink for WriterSink<W> {
    async fn write_line(&mut self, line: &str) -> io::Result<()> {
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await
    }
}

impl LogSink for mpsc::UnboundedSender<String> {
    fn write_line(&mut self, line: &str) -> impl Future<Output = io::Result<()>> + Send {
        let sent = self
            .send(line.to_owned())
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "log line receiver dropped"));
        std::future::ready(sent)
    }
}

impl LogSink for Vec<String> {
    fn write_line(&mut self, line: &str) -> impl Future<Output = io::Result<()>> + Send {
        self.push(line.to_owned());
        std::future::ready(Ok(()))
    }
}

//! Abstract line source over a streamed HTTP connection
//!
//! The controller only sees successive text lines; the SSE transport lives
//! behind [`LineConnector`]/[`LineSource`] so integration tests can script
//! faults without a network.

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{BoxStream, StreamExt};
use std::time::Duration;

#[derive(Debug)]
pub enum SourceError {
    /// Non-success HTTP status on the handshake. Fatal: the upstream rejected
    /// us, this is not a transient network fault and is never retried.
    ConnectFault(u16),
    /// I/O failure opening or reading the stream. Retryable.
    Transient(String),
}

impl std::fmt::Display for SourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceError::ConnectFault(status) => {
                write!(f, "stream handshake rejected with status {}", status)
            }
            SourceError::Transient(msg) => write!(f, "stream fault: {}", msg),
        }
    }
}

impl std::error::Error for SourceError {}

#[async_trait]
pub trait LineSource: Send {
    /// Next raw line from the stream. `Ok(None)` is a clean end of stream.
    async fn next_line(&mut self) -> Result<Option<String>, SourceError>;
}

#[async_trait]
pub trait LineConnector: Send {
    /// Open the stream against the configured endpoint.
    async fn connect(&mut self) -> Result<Box<dyn LineSource>, SourceError>;
}

/// Production connector: streamed GET against the SSE endpoint.
pub struct SseConnector {
    client: reqwest::Client,
    url: String,
}

impl SseConnector {
    pub fn new(url: String) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| SourceError::Transient(e.to_string()))?;

        Ok(Self { client, url })
    }
}

#[async_trait]
impl LineConnector for SseConnector {
    async fn connect(&mut self) -> Result<Box<dyn LineSource>, SourceError> {
        let response = self
            .client
            .get(&self.url)
            .header("Accept", "text/event-stream")
            .send()
            .await
            .map_err(|e| SourceError::Transient(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::ConnectFault(status.as_u16()));
        }

        Ok(Box::new(SseLineSource::new(
            response.bytes_stream().boxed(),
        )))
    }
}

/// Splits the streamed response body into lines.
pub struct SseLineSource {
    chunks: BoxStream<'static, reqwest::Result<Bytes>>,
    buffer: Vec<u8>,
    exhausted: bool,
}

impl SseLineSource {
    pub fn new(chunks: BoxStream<'static, reqwest::Result<Bytes>>) -> Self {
        Self {
            chunks,
            buffer: Vec::new(),
            exhausted: false,
        }
    }

    fn take_buffered_line(&mut self) -> Option<String> {
        let pos = self.buffer.iter().position(|&b| b == b'\n')?;
        let mut line: Vec<u8> = self.buffer.drain(..=pos).collect();
        line.pop();
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        Some(String::from_utf8_lossy(&line).into_owned())
    }
}

#[async_trait]
impl LineSource for SseLineSource {
    async fn next_line(&mut self) -> Result<Option<String>, SourceError> {
        loop {
            if let Some(line) = self.take_buffered_line() {
                return Ok(Some(line));
            }

            if self.exhausted {
                if self.buffer.is_empty() {
                    return Ok(None);
                }
                // Final unterminated line before EOF
                let rest = std::mem::take(&mut self.buffer);
                return Ok(Some(String::from_utf8_lossy(&rest).into_owned()));
            }

            match self.chunks.next().await {
                Some(Ok(chunk)) => self.buffer.extend_from_slice(&chunk),
                Some(Err(e)) => return Err(SourceError::Transient(e.to_string())),
                None => self.exhausted = true,
            }
        }
    }
}

//! Caller-facing byte sinks and the header-commit state machine

use crate::utils::error::{RelayError, SinkClosed};
use async_trait::async_trait;
use bytes::Bytes;
use std::io;
use tokio::sync::{mpsc, oneshot};

pub const MEDIA_CONTENT_TYPE: &str = "video/mp4";
pub const NO_CACHE: &str = "no-cache";

/// Response headers committed once the upstream answered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaHeaders {
    pub filename: String,
    pub content_type: &'static str,
    pub cache_control: &'static str,
    /// Forwarded from the media origin when it reports one
    pub content_length: Option<u64>,
}

impl MediaHeaders {
    pub fn new(filename: impl Into<String>, content_length: Option<u64>) -> Self {
        Self {
            filename: filename.into(),
            content_type: MEDIA_CONTENT_TYPE,
            cache_control: NO_CACHE,
            content_length,
        }
    }

    pub fn content_disposition(&self) -> String {
        format!("attachment; filename=\"{}\"", self.filename)
    }
}

/// Destination of a relayed media stream (e.g. an HTTP response body)
#[async_trait]
pub trait ByteSink: Send + Sync {
    /// Sends the response headers. Called at most once, before any write.
    async fn commit(&mut self, headers: MediaHeaders) -> Result<(), SinkClosed>;

    /// Forwards one chunk. An error means the caller went away.
    async fn write(&mut self, chunk: Bytes) -> Result<(), SinkClosed>;

    /// Tears the stream down after headers were sent
    async fn abort(&mut self, reason: String);

    /// Resolves once the caller has gone away
    async fn closed(&self) {
        std::future::pending::<()>().await
    }
}

/// Where a relay stands with respect to its caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayState {
    /// Nothing sent yet; failures can still become a structured response
    HeadersPending,
    /// Headers are out; failures can only be logged
    Streaming { bytes_sent: u64 },
    Finished { bytes_sent: u64 },
}

/// Wraps a sink and enforces `HeadersPending -> Streaming -> Finished`
pub struct GuardedSink<'a, S: ByteSink + ?Sized> {
    sink: &'a mut S,
    state: RelayState,
}

impl<'a, S: ByteSink + ?Sized> GuardedSink<'a, S> {
    pub fn new(sink: &'a mut S) -> Self {
        Self {
            sink,
            state: RelayState::HeadersPending,
        }
    }

    pub fn state(&self) -> RelayState {
        self.state
    }

    pub fn is_committed(&self) -> bool {
        !matches!(self.state, RelayState::HeadersPending)
    }

    pub fn bytes_sent(&self) -> u64 {
        match self.state {
            RelayState::HeadersPending => 0,
            RelayState::Streaming { bytes_sent } | RelayState::Finished { bytes_sent } => {
                bytes_sent
            }
        }
    }

    pub async fn commit(&mut self, headers: MediaHeaders) -> Result<(), RelayError> {
        if self.is_committed() {
            return Err(RelayError::Internal(
                "response headers already committed".to_string(),
            ));
        }

        self.sink
            .commit(headers)
            .await
            .map_err(|_| RelayError::ClientDisconnected { bytes_sent: 0 })?;
        self.state = RelayState::Streaming { bytes_sent: 0 };
        Ok(())
    }

    pub async fn write(&mut self, chunk: Bytes) -> Result<(), RelayError> {
        match &mut self.state {
            RelayState::Streaming { bytes_sent } => {
                let len = chunk.len() as u64;
                self.sink
                    .write(chunk)
                    .await
                    .map_err(|_| RelayError::ClientDisconnected {
                        bytes_sent: *bytes_sent,
                    })?;
                *bytes_sent += len;
                Ok(())
            }
            RelayState::HeadersPending => Err(RelayError::Internal(
                "body write before headers were committed".to_string(),
            )),
            RelayState::Finished { .. } => Err(RelayError::Internal(
                "body write after the stream finished".to_string(),
            )),
        }
    }

    /// Tears the caller's stream down; only meaningful after commit
    pub async fn abort(&mut self, reason: &str) {
        if self.is_committed() {
            self.sink.abort(reason.to_string()).await;
        }
    }

    pub async fn closed(&self) {
        self.sink.closed().await
    }

    pub fn finish(&mut self) -> u64 {
        let bytes_sent = self.bytes_sent();
        self.state = RelayState::Finished { bytes_sent };
        bytes_sent
    }
}

pub type BodyChunk = Result<Bytes, io::Error>;

/// Sink backed by channels, for handing a relay to an HTTP response body
pub struct ChannelSink {
    headers: Option<oneshot::Sender<MediaHeaders>>,
    body: mpsc::Sender<BodyChunk>,
}

/// Receiving half of a [`ChannelSink`]
pub struct ChannelReceiver {
    /// Fires once headers are committed; dropped without a value when the
    /// relay fails beforehand
    pub headers: oneshot::Receiver<MediaHeaders>,
    pub body: mpsc::Receiver<BodyChunk>,
}

pub fn channel_sink(buffer: usize) -> (ChannelSink, ChannelReceiver) {
    let (headers_tx, headers_rx) = oneshot::channel();
    let (body_tx, body_rx) = mpsc::channel(buffer.max(1));
    (
        ChannelSink {
            headers: Some(headers_tx),
            body: body_tx,
        },
        ChannelReceiver {
            headers: headers_rx,
            body: body_rx,
        },
    )
}

#[async_trait]
impl ByteSink for ChannelSink {
    async fn commit(&mut self, headers: MediaHeaders) -> Result<(), SinkClosed> {
        self.headers
            .take()
            .ok_or(SinkClosed)?
            .send(headers)
            .map_err(|_| SinkClosed)
    }

    async fn write(&mut self, chunk: Bytes) -> Result<(), SinkClosed> {
        self.body.send(Ok(chunk)).await.map_err(|_| SinkClosed)
    }

    async fn abort(&mut self, reason: String) {
        let _ = self
            .body
            .send(Err(io::Error::new(io::ErrorKind::BrokenPipe, reason)))
            .await;
    }

    async fn closed(&self) {
        self.body.closed().await
    }
}

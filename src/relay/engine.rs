//! Pass-through media relay

use crate::extractor::models::{QualityTag, SourceTag};
use crate::extractor::resolver::Resolver;
use crate::relay::sink::{ByteSink, GuardedSink, MediaHeaders};
use crate::relay::variant::{media_filename, select_variant};
use crate::utils::config::{AppSettings, DEFAULT_REFERER, DEFAULT_USER_AGENT};
use crate::utils::error::{timeout_message, RelayError};
use futures::StreamExt;
use reqwest::header::REFERER;
use reqwest::{Client, Response};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Relay configuration
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub timeout: Duration,    // Connection + response headers from the media origin
    pub user_agent: String,   // Browser user agent for the media origin
    pub referer: String,      // Required by upstream hotlink protection
    pub buffer: usize,        // Chunks queued towards the caller
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(60_000),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            referer: DEFAULT_REFERER.to_string(),
            buffer: 16,
        }
    }
}

impl From<&AppSettings> for RelayConfig {
    fn from(settings: &AppSettings) -> Self {
        Self {
            timeout: settings.relay_timeout,
            user_agent: settings.user_agent.clone(),
            referer: settings.referer.clone(),
            buffer: settings.relay_buffer,
        }
    }
}

/// Summary of a completed relay
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayOutcome {
    pub bytes_sent: u64,
    pub source: SourceTag,
    pub quality: QualityTag,
    pub filename: String,
}

/// Resolves a link, picks a variant and streams it to a [`ByteSink`]
pub struct RelayEngine {
    client: Client,
    config: RelayConfig,
    resolver: Arc<Resolver>,
}

/// Everything needed to start streaming, gathered before commit
struct Prepared {
    source: SourceTag,
    quality: QualityTag,
    filename: String,
    response: Response,
}

enum Step {
    Chunk(Option<reqwest::Result<bytes::Bytes>>),
    Disconnected,
}

impl RelayEngine {
    pub fn new(resolver: Arc<Resolver>, config: RelayConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .connect_timeout(config.timeout)
            .build()?;

        Ok(Self {
            client,
            config,
            resolver,
        })
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    pub fn resolver(&self) -> &Arc<Resolver> {
        &self.resolver
    }

    /// Relay the media behind `reference` into `sink`.
    ///
    /// Nothing reaches the sink until the media origin has answered with a
    /// success status; every error before that point leaves the sink
    /// untouched. Once headers are committed, upstream failures abort the
    /// sink and a closed sink drops the upstream connection.
    pub async fn relay<S: ByteSink + ?Sized>(
        &self,
        reference: &str,
        requested: Option<QualityTag>,
        sink: &mut S,
    ) -> Result<RelayOutcome, RelayError> {
        // Resolution and the upstream request are abandoned as soon as the
        // caller goes away
        let prepared = tokio::select! {
            biased;
            () = sink.closed() => {
                info!("Caller went away before headers were sent");
                return Err(RelayError::Cancelled);
            }
            prepared = self.prepare(reference, requested) => prepared?,
        };
        let Prepared {
            source,
            quality,
            filename,
            response,
        } = prepared;

        let headers = MediaHeaders::new(filename.clone(), response.content_length());

        let mut guarded = GuardedSink::new(sink);
        guarded.commit(headers).await?;

        let mut upstream = std::pin::pin!(response.bytes_stream());
        loop {
            let step = tokio::select! {
                chunk = upstream.next() => Step::Chunk(chunk),
                () = guarded.closed() => Step::Disconnected,
            };

            match step {
                Step::Chunk(Some(Ok(chunk))) => {
                    if let Err(e) = guarded.write(chunk).await {
                        info!(error = %e, "Caller went away, dropping upstream stream");
                        return Err(e);
                    }
                }
                Step::Chunk(Some(Err(e))) => {
                    let err = RelayError::UpstreamStream(e.to_string());
                    error!(
                        bytes_sent = guarded.bytes_sent(),
                        error = %err,
                        "Upstream stream error"
                    );
                    guarded.abort(&e.to_string()).await;
                    return Err(err);
                }
                Step::Chunk(None) => break,
                Step::Disconnected => {
                    let err = RelayError::ClientDisconnected {
                        bytes_sent: guarded.bytes_sent(),
                    };
                    info!(error = %err, "Caller went away, dropping upstream stream");
                    return Err(err);
                }
            }
        }

        let bytes_sent = guarded.finish();
        info!(bytes_sent, %filename, "Media relay completed");

        Ok(RelayOutcome {
            bytes_sent,
            source,
            quality,
            filename,
        })
    }

    /// Resolve, pick a variant and open the media origin
    async fn prepare(
        &self,
        reference: &str,
        requested: Option<QualityTag>,
    ) -> Result<Prepared, RelayError> {
        let record = self.resolver.resolve(reference).await?;
        let variant = select_variant(&record.qualities, requested)?;
        let filename = media_filename(&record);

        info!(
            requested = ?requested,
            selected = %variant.quality,
            source = %record.source_tag,
            %filename,
            "Starting media relay"
        );

        let response = self.open_upstream(&variant.url).await?;

        Ok(Prepared {
            source: record.source_tag,
            quality: variant.quality,
            filename,
            response,
        })
    }

    /// Connect to the media origin and wait for its response headers
    async fn open_upstream(&self, url: &str) -> Result<Response, RelayError> {
        debug!(%url, "Opening upstream media stream");

        let request = self
            .client
            .get(url)
            .header(REFERER, self.config.referer.as_str())
            .send();

        let response = tokio::time::timeout(self.config.timeout, request)
            .await
            .map_err(|_| RelayError::Upstream(timeout_message(&self.config.timeout)))?
            .map_err(|e| RelayError::Upstream(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!(%url, status = status.as_u16(), "Media origin rejected the request");
            return Err(RelayError::Upstream(format!(
                "Request failed with status code {}",
                status.as_u16()
            )));
        }

        Ok(response)
    }
}

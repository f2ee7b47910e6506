//! Outbound beacon delivery.

use anyhow::Context as _;
use async_trait::async_trait;
use thiserror::Error;

use crate::context::RequestContext;

#[derive(Debug, Error)]
pub enum TransportError {
    /// Collector answered with a non-success status.
    #[error("collector returned status {0}")]
    Status(u16),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type TransportResult<T> = Result<T, TransportError>;

/// Delivers a fully built beacon URL to the collector.
#[async_trait]
pub trait BeaconSender: Send + Sync {
    /// Issue the outbound GET and return the response body. Single-shot, no
    /// retry; failures are surfaced to the caller as recoverable errors.
    async fn send(&self, url: &str, context: &RequestContext) -> TransportResult<Vec<u8>>;
}

/// reqwest-backed sender that forwards the inbound request's identity
/// headers verbatim.
pub struct HttpBeaconSender {
    client: reqwest::Client,
}

impl HttpBeaconSender {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for HttpBeaconSender {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BeaconSender for HttpBeaconSender {
    async fn send(&self, url: &str, context: &RequestContext) -> TransportResult<Vec<u8>> {
        let mut request = self.client.get(url);
        if !context.user_agent.is_empty() {
            request = request.header(reqwest::header::USER_AGENT, &context.user_agent);
        }
        if !context.accept_language.is_empty() {
            request = request.header(reqwest::header::ACCEPT_LANGUAGE, &context.accept_language);
        }

        let response = request.send().await.context("beacon request failed")?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .context("failed to read collector response")?;
        Ok(body.to_vec())
    }
}

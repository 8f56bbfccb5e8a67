use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::USER_AGENT;
use tracing::debug;

use super::FeedSource;
use crate::error::FeedError;

const USER_AGENT_VALUE: &str = "gtfs-rt-viewer/1.0";

/// Fetches the feed over HTTP with a shared connection pool.
///
/// No retries at this layer: a failed fetch fails the refresh that
/// requested it.
pub struct HttpFeedSource {
    client: reqwest::Client,
    url: Option<String>,
}

impl HttpFeedSource {
    pub fn new(url: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
        }
    }
}

#[async_trait]
impl FeedSource for HttpFeedSource {
    async fn fetch(&self) -> Result<Bytes, FeedError> {
        let url = self.url.as_deref().ok_or(FeedError::Config)?;

        let resp = self
            .client
            .get(url)
            .header(USER_AGENT, USER_AGENT_VALUE)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FeedError::UpstreamStatus(status));
        }

        let bytes = resp.bytes().await?;
        debug!(bytes = bytes.len(), "feed bytes received");
        Ok(bytes)
    }
}

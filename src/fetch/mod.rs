mod http;

pub use http::HttpFeedSource;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::FeedError;

/// Retrieves the raw bytes of the upstream feed.
///
/// The cache is generic over this seam so tests can inject sources that
/// count invocations, block, or fail on demand.
#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch(&self) -> Result<Bytes, FeedError>;
}

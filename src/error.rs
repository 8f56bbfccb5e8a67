//! Error taxonomy for the feed pipeline.
//!
//! Each variant is terminal for the refresh that produced it; the cache
//! propagates them to every coalesced waiter without retrying.

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("GTFS_RT_URL is required. Set it in the environment or pass --url.")]
    Config,

    #[error("GTFS-RT fetch failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("GTFS-RT fetch failed: {0}")]
    UpstreamStatus(StatusCode),

    #[error("GTFS-RT decode failed: {0}")]
    Decode(#[from] prost::DecodeError),
}

//! Protobuf decoder for GTFS Realtime feeds.

use prost::Message;

use crate::error::FeedError;
use crate::gtfs_rt::FeedMessage;

/// Decodes a protobuf-encoded GTFS-RT [`FeedMessage`] from raw bytes.
///
/// Pure and deterministic: identical input always yields structurally
/// identical output.
///
/// # Errors
///
/// Returns [`FeedError::Decode`] if the bytes are not valid protobuf for
/// a `FeedMessage`.
pub fn parse_feed(bytes: &[u8]) -> Result<FeedMessage, FeedError> {
    Ok(FeedMessage::decode(bytes)?)
}

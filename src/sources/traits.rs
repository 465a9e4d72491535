//! Seams between the update job and the video platform

use async_trait::async_trait;

use super::records::{ChannelRecord, VideoRecord};
use crate::errors::SourceResult;

/// Single-strategy channel id lookups used by identifier resolution.
///
/// `Ok(None)` means the lookup ran and found nothing.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChannelLookup: Send + Sync {
    async fn by_handle(&self, handle: &str) -> SourceResult<Option<String>>;

    async fn by_username(&self, username: &str) -> SourceResult<Option<String>>;

    /// Costs far more quota than the other lookups
    async fn search_by_name(&self, name: &str) -> SourceResult<Option<String>>;
}

/// Fetches channel and video snapshots.
///
/// Failures are logged by implementations and surface as `None` or a short
/// list; the update job never sees platform errors.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VideoPlatform: Send + Sync {
    async fn fetch_channel(&self, identifier: &str) -> Option<ChannelRecord>;

    async fn fetch_channel_videos(&self, identifier: &str, max_results: usize) -> Vec<VideoRecord>;
}

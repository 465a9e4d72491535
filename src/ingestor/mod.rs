//! The update job: fetch every listed channel and its uploads, then persist
//! them with today's counts appended to their histories.

use serde::Serialize;
use std::path::Path;
use std::time::Instant;
use tracing::{error, info, warn};

use crate::database::Database;
use crate::errors::AppResult;
use crate::history::HistoryRecorder;
use crate::sources::VideoPlatform;

pub mod channel_list;
pub mod scheduler;

pub use channel_list::{parse_channel_identifiers, read_channel_identifiers};
pub use scheduler::UpdateScheduler;

/// Outcome of one update run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UpdateSummary {
    pub channels_updated: usize,
    pub channels_skipped: usize,
    pub videos_saved: usize,
}

pub struct UpdateService<P> {
    platform: P,
    database: Database,
    recorder: HistoryRecorder,
    max_videos_per_channel: usize,
}

impl<P: VideoPlatform> UpdateService<P> {
    pub fn new(
        platform: P,
        database: Database,
        recorder: HistoryRecorder,
        max_videos_per_channel: usize,
    ) -> Self {
        Self {
            platform,
            database,
            recorder,
            max_videos_per_channel,
        }
    }

    /// Update every channel listed in `channels_file`
    pub async fn run(&self, channels_file: &Path) -> AppResult<UpdateSummary> {
        let started = Instant::now();
        info!("Starting update run");

        let identifiers = read_channel_identifiers(channels_file).await;
        if identifiers.is_empty() {
            warn!("No channels to update in {}", channels_file.display());
            return Ok(UpdateSummary::default());
        }

        let summary = self.update_channels(&identifiers).await?;
        info!(
            "Update run finished in {:.2}s: {} channels updated, {} skipped, {} videos saved",
            started.elapsed().as_secs_f64(),
            summary.channels_updated,
            summary.channels_skipped,
            summary.videos_saved
        );
        Ok(summary)
    }

    /// Fetch and persist each identifier in order.
    ///
    /// Channels the platform cannot return are skipped; a storage failure
    /// aborts the run.
    pub async fn update_channels(&self, identifiers: &[String]) -> AppResult<UpdateSummary> {
        let mut summary = UpdateSummary::default();

        for identifier in identifiers {
            info!("Updating channel {}", identifier);

            let Some(record) = self.platform.fetch_channel(identifier).await else {
                warn!("Could not fetch channel {}, skipping", identifier);
                summary.channels_skipped += 1;
                continue;
            };

            let channel = self
                .database
                .upsert_channel(&record, &self.recorder)
                .await
                .map_err(|e| {
                    error!("Aborting update run at channel {}: {}", record.id, e);
                    e
                })?;
            summary.channels_updated += 1;

            let videos = self
                .platform
                .fetch_channel_videos(&channel.id, self.max_videos_per_channel)
                .await;
            if videos.is_empty() {
                warn!("No videos found for channel {}", channel.title);
                continue;
            }

            summary.videos_saved += self
                .database
                .save_videos(&channel.id, &videos, &self.recorder)
                .await
                .map_err(|e| {
                    error!("Aborting update run at videos of {}: {}", channel.id, e);
                    e
                })?;
        }

        Ok(summary)
    }
}

use anyhow::Result;
use chrono::{DateTime, Utc};
use cron::Schedule;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, error, info};

use super::UpdateService;
use crate::errors::{AppError, AppResult};
use crate::sources::VideoPlatform;

/// Runs the update job on a cron schedule.
///
/// A failed run is logged and the scheduler waits for the next slot; there is
/// no retry in between.
pub struct UpdateScheduler<P> {
    service: Arc<UpdateService<P>>,
    schedule: Schedule,
    channels_file: PathBuf,
    run_on_startup: bool,
}

impl<P: VideoPlatform> UpdateScheduler<P> {
    pub fn new(
        service: Arc<UpdateService<P>>,
        update_cron: &str,
        channels_file: PathBuf,
        run_on_startup: bool,
    ) -> AppResult<Self> {
        let schedule = Schedule::from_str(update_cron).map_err(|e| {
            AppError::configuration(format!("invalid update_cron '{}': {}", update_cron, e))
        })?;

        Ok(Self {
            service,
            schedule,
            channels_file,
            run_on_startup,
        })
    }

    /// First scheduled run strictly after `after`
    pub fn next_run_after(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.schedule.after(&after).next()
    }

    pub async fn start(self) -> Result<()> {
        info!("Starting update scheduler");

        if self.run_on_startup {
            info!("Running update immediately on startup");
            self.run_once().await;
        }

        loop {
            let now = Utc::now();
            let Some(next) = self.next_run_after(now) else {
                info!("Update schedule has no further runs, stopping scheduler");
                return Ok(());
            };
            info!("Next update scheduled at {}", next);

            let wait = (next - now).to_std().unwrap_or_default();
            tokio::time::sleep(wait).await;
            self.run_once().await;
        }
    }

    async fn run_once(&self) {
        debug!("Scheduled update triggered");
        if let Err(e) = self.service.run(&self.channels_file).await {
            error!("Scheduled update failed: {}", e);
        }
    }
}

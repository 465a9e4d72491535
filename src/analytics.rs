//! Derived per-video metrics and the analysis note template

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::Video;

/// Engagement threshold (percent) above which a video counts as performing well
pub const STRONG_ENGAGEMENT_PERCENT: f64 = 5.0;

/// Ratios derived from a video's current counters.
///
/// Every ratio over views is 0 for an unviewed video. Per-day rates are
/// `None` on the day of publication.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoStats {
    pub engagement_percent: f64,
    pub like_percent: f64,
    pub comment_percent: f64,
    pub likes_per_1000_views: f64,
    pub comments_per_1000_views: f64,
    pub comments_per_like: Option<f64>,
    pub days_since_publish: i64,
    pub views_per_day: Option<f64>,
    pub interactions_per_day: Option<f64>,
}

impl VideoStats {
    pub fn compute(video: &Video, now: DateTime<Utc>) -> Self {
        let views = video.view_count.max(0) as f64;
        let likes = video.like_count.max(0) as f64;
        let comments = video.comment_count.max(0) as f64;

        let per_view = |value: f64, scale: f64| {
            if views > 0.0 {
                value / views * scale
            } else {
                0.0
            }
        };

        let days = (now - video.published_at).num_days();
        let per_day = |value: f64| (days > 0).then(|| value / days as f64);

        Self {
            engagement_percent: per_view(likes + comments, 100.0),
            like_percent: per_view(likes, 100.0),
            comment_percent: per_view(comments, 100.0),
            likes_per_1000_views: per_view(likes, 1000.0),
            comments_per_1000_views: per_view(comments, 1000.0),
            comments_per_like: (likes > 0.0).then(|| comments / likes),
            days_since_publish: days,
            views_per_day: per_day(views),
            interactions_per_day: per_day(likes + comments),
        }
    }

    pub fn performed_well(&self) -> bool {
        self.engagement_percent > STRONG_ENGAGEMENT_PERCENT
    }
}

/// Markdown skeleton offered when a video has no analysis yet
pub fn analysis_template(title: &str, stats: &VideoStats) -> String {
    let verdict = if stats.performed_well() { "well" } else { "less well" };
    format!(
        "# Video Analysis: {title}\n\
         \n\
         ## Strengths\n\
         - \n\
         - \n\
         - \n\
         \n\
         ## Areas for Improvement\n\
         - \n\
         - \n\
         - \n\
         \n\
         ## Why this video performed {verdict}?\n\
         - \n\
         \n\
         ## Ideas to Reproduce\n\
         - \n\
         \n\
         ## Personal Notes\n\
         - \n"
    )
}

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::history::{codec, HistorySeries};
use crate::utils::datetime::calendar_date;
use crate::utils::watch_url;

/// A video as stored in the `videos` table
#[derive(Debug, Clone, Serialize)]
pub struct Video {
    pub id: String,
    pub channel_id: String,
    pub title: String,
    pub description: String,
    pub published_at: DateTime<Utc>,
    pub view_count: i64,
    pub like_count: i64,
    pub comment_count: i64,
    pub fetched_at: DateTime<Utc>,
    pub hidden: bool,
    pub analysis: Option<String>,
    #[serde(skip)]
    pub view_count_history: Option<String>,
    #[serde(skip)]
    pub like_count_history: Option<String>,
    #[serde(skip)]
    pub comment_count_history: Option<String>,
}

impl Video {
    pub fn view_series(&self) -> HistorySeries {
        codec::decode(self.view_count_history.as_deref())
    }

    pub fn like_series(&self) -> HistorySeries {
        codec::decode(self.like_count_history.as_deref())
    }

    pub fn comment_series(&self) -> HistorySeries {
        codec::decode(self.comment_count_history.as_deref())
    }

    /// Likes as a percentage of views; `None` for unviewed videos
    pub fn like_ratio(&self) -> Option<f64> {
        if self.view_count > 0 {
            Some(self.like_count as f64 / self.view_count as f64 * 100.0)
        } else {
            None
        }
    }
}

/// Timeline marker for a published video
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoPublication {
    #[serde(with = "calendar_date")]
    pub date: NaiveDate,
    pub title: String,
    pub video_id: String,
}

/// Row of the per-channel video table
#[derive(Debug, Clone, Serialize)]
pub struct VideoListEntry {
    pub id: String,
    pub title: String,
    #[serde(with = "calendar_date")]
    pub published_on: NaiveDate,
    pub view_count: i64,
    pub like_count: i64,
    pub comment_count: i64,
    pub like_ratio: Option<f64>,
    pub url: String,
    pub hidden: bool,
}

impl From<&Video> for VideoListEntry {
    fn from(video: &Video) -> Self {
        Self {
            id: video.id.clone(),
            title: video.title.clone(),
            published_on: video.published_at.date_naive(),
            view_count: video.view_count,
            like_count: video.like_count,
            comment_count: video.comment_count,
            like_ratio: video.like_ratio(),
            url: watch_url(&video.id),
            hidden: video.hidden,
        }
    }
}

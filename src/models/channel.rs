use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::history::{codec, HistorySeries};

/// A tracked channel as stored in the `channels` table
#[derive(Debug, Clone, Serialize)]
pub struct Channel {
    pub id: String,
    pub title: String,
    pub description: String,
    pub subscribers: i64,
    pub video_count: i64,
    pub view_count: i64,
    pub fetched_at: DateTime<Utc>,
    #[serde(skip)]
    pub subscriber_history: Option<String>,
    #[serde(skip)]
    pub view_count_history: Option<String>,
}

impl Channel {
    pub fn subscriber_series(&self) -> HistorySeries {
        codec::decode(self.subscriber_history.as_deref())
    }

    pub fn view_series(&self) -> HistorySeries {
        codec::decode(self.view_count_history.as_deref())
    }
}

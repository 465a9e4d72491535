//! Typed channel and video records
//!
//! Wire payloads are deserialised into the loose `Raw*` shapes and converted
//! into [`ChannelRecord`] / [`VideoRecord`] at the boundary. Counters arrive
//! as decimal strings; a missing counter is 0, an unparseable one rejects the
//! record.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::errors::SourceError;
use crate::utils::datetime::DateTimeParser;

/// Channel snapshot as returned by `channels.list`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelRecord {
    pub id: String,
    pub title: String,
    pub description: String,
    pub subscribers: u64,
    pub video_count: u64,
    pub view_count: u64,
}

/// Video snapshot as returned by `videos.list`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoRecord {
    pub id: String,
    pub title: String,
    pub description: String,
    pub published_at: DateTime<Utc>,
    pub view_count: u64,
    pub like_count: u64,
    pub comment_count: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    pub next_page_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawSnippet {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub published_at: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawStatistics {
    pub subscriber_count: Option<String>,
    pub video_count: Option<String>,
    pub view_count: Option<String>,
    pub like_count: Option<String>,
    pub comment_count: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawChannel {
    pub id: String,
    #[serde(default)]
    pub snippet: RawSnippet,
    #[serde(default)]
    pub statistics: RawStatistics,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawVideo {
    pub id: String,
    #[serde(default)]
    pub snippet: RawSnippet,
    #[serde(default)]
    pub statistics: RawStatistics,
}

/// Bare id item, as in `channels.list(part=id)`
#[derive(Debug, Deserialize)]
pub(crate) struct IdItem {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchItem {
    pub id: SearchId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SearchId {
    pub channel_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PlaylistItem {
    pub content_details: PlaylistContentDetails,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PlaylistContentDetails {
    pub video_id: String,
}

fn parse_count(record: &str, field: &str, value: Option<&str>) -> Result<u64, SourceError> {
    match value.map(str::trim) {
        None | Some("") => Ok(0),
        Some(raw) => raw.parse::<u64>().map_err(|_| {
            SourceError::invalid_payload(record, format!("{} is not a count: '{}'", field, raw))
        }),
    }
}

impl TryFrom<RawChannel> for ChannelRecord {
    type Error = SourceError;

    fn try_from(raw: RawChannel) -> Result<Self, Self::Error> {
        let stats = &raw.statistics;
        let record = format!("channel {}", raw.id);
        Ok(Self {
            subscribers: parse_count(&record, "subscriberCount", stats.subscriber_count.as_deref())?,
            video_count: parse_count(&record, "videoCount", stats.video_count.as_deref())?,
            view_count: parse_count(&record, "viewCount", stats.view_count.as_deref())?,
            title: raw.snippet.title,
            description: raw.snippet.description,
            id: raw.id,
        })
    }
}

impl TryFrom<RawVideo> for VideoRecord {
    type Error = SourceError;

    fn try_from(raw: RawVideo) -> Result<Self, Self::Error> {
        let stats = &raw.statistics;
        let record = format!("video {}", raw.id);

        let published_at = raw
            .snippet
            .published_at
            .as_deref()
            .ok_or_else(|| SourceError::invalid_payload(&record, "missing publishedAt"))
            .and_then(|value| {
                DateTimeParser::parse_flexible(value)
                    .map_err(|e| SourceError::invalid_payload(&record, e.to_string()))
            })?;

        Ok(Self {
            view_count: parse_count(&record, "viewCount", stats.view_count.as_deref())?,
            like_count: parse_count(&record, "likeCount", stats.like_count.as_deref())?,
            comment_count: parse_count(&record, "commentCount", stats.comment_count.as_deref())?,
            published_at,
            title: raw.snippet.title,
            description: raw.snippet.description,
            id: raw.id,
        })
    }
}

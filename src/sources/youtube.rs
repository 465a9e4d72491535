//! YouTube Data API v3 client
//!
//! Implements both [`ChannelLookup`] and [`VideoPlatform`]. Uploads are read
//! from the channel's uploads playlist (`UU` + channel id without `UC`), in
//! pages of at most 50, and video details are fetched in batches of 50 (the
//! API maximum for both calls).

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use super::records::{
    ChannelRecord, IdItem, ListResponse, PlaylistItem, RawChannel, RawVideo, SearchItem,
    VideoRecord,
};
use super::resolve::resolve_channel_id;
use super::traits::{ChannelLookup, VideoPlatform};
use crate::config::YouTubeConfig;
use crate::errors::{AppError, AppResult, SourceError, SourceResult};
use crate::utils::sanitize_base_url;

/// Largest page / batch the API accepts
pub const MAX_PAGE_SIZE: usize = 50;

/// Uploads playlist id for a channel id
pub fn uploads_playlist_id(channel_id: &str) -> String {
    let rest = channel_id
        .strip_prefix("UC")
        .or_else(|| channel_id.get(2..))
        .unwrap_or_default();
    format!("UU{}", rest)
}

pub struct YouTubeApiClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl YouTubeApiClient {
    pub fn new(config: &YouTubeConfig, api_key: &str) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(concat!("tubestats/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let base_url = sanitize_base_url(&config.base_url);
        Url::parse(&base_url).map_err(|e| {
            AppError::configuration(format!("invalid youtube.base_url '{}': {}", base_url, e))
        })?;

        Ok(Self {
            client,
            base_url,
            api_key: api_key.to_string(),
        })
    }

    async fn list<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> SourceResult<ListResponse<T>> {
        let url = format!("{}/{}", self.base_url, endpoint);
        debug!("GET {} {:?}", url, params);

        let response = self
            .client
            .get(&url)
            .query(&[("key", self.api_key.as_str())])
            .query(params)
            .send()
            .await
            .map_err(|e| SourceError::request_failed(endpoint, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(match status {
                StatusCode::UNAUTHORIZED => SourceError::AuthenticationFailed { message: body },
                _ => SourceError::Http {
                    status: status.as_u16(),
                    message: body,
                },
            });
        }

        response
            .json::<ListResponse<T>>()
            .await
            .map_err(|e| SourceError::invalid_payload(endpoint, e.to_string()))
    }

    /// Details for the given video ids, fetched in batches of 50.
    ///
    /// Records that fail validation are dropped with a warning.
    pub async fn fetch_video_details(&self, video_ids: &[String]) -> SourceResult<Vec<VideoRecord>> {
        let mut videos = Vec::with_capacity(video_ids.len());

        for batch in video_ids.chunks(MAX_PAGE_SIZE) {
            let ids = batch.join(",");
            let response: ListResponse<RawVideo> = self
                .list("videos", &[("part", "snippet,statistics"), ("id", ids.as_str())])
                .await?;

            for raw in response.items {
                match VideoRecord::try_from(raw) {
                    Ok(video) => videos.push(video),
                    Err(e) => warn!("Dropping video record: {}", e),
                }
            }
        }

        Ok(videos)
    }

    async fn fetch_channel_by_id(&self, channel_id: &str) -> SourceResult<Option<ChannelRecord>> {
        let response: ListResponse<RawChannel> = self
            .list("channels", &[("part", "snippet,statistics"), ("id", channel_id)])
            .await?;

        match response.items.into_iter().next() {
            Some(raw) => ChannelRecord::try_from(raw).map(Some),
            None => Ok(None),
        }
    }

    async fn first_channel_id(&self, filter: (&str, &str)) -> SourceResult<Option<String>> {
        let response: ListResponse<IdItem> = self.list("channels", &[("part", "id"), filter]).await?;
        Ok(response.items.into_iter().next().map(|item| item.id))
    }
}

#[async_trait]
impl ChannelLookup for YouTubeApiClient {
    async fn by_handle(&self, handle: &str) -> SourceResult<Option<String>> {
        self.first_channel_id(("forHandle", handle)).await
    }

    async fn by_username(&self, username: &str) -> SourceResult<Option<String>> {
        self.first_channel_id(("forUsername", username)).await
    }

    async fn search_by_name(&self, name: &str) -> SourceResult<Option<String>> {
        let response: ListResponse<SearchItem> = self
            .list(
                "search",
                &[("part", "snippet"), ("type", "channel"), ("maxResults", "1"), ("q", name)],
            )
            .await?;
        Ok(response
            .items
            .into_iter()
            .find_map(|item| item.id.channel_id))
    }
}

#[async_trait]
impl VideoPlatform for YouTubeApiClient {
    async fn fetch_channel(&self, identifier: &str) -> Option<ChannelRecord> {
        let channel_id = resolve_channel_id(self, identifier).await?;

        match self.fetch_channel_by_id(&channel_id).await {
            Ok(Some(channel)) => Some(channel),
            Ok(None) => {
                warn!("No channel data returned for {}", channel_id);
                None
            }
            Err(e) => {
                warn!("Failed to fetch channel {}: {}", channel_id, e);
                None
            }
        }
    }

    async fn fetch_channel_videos(&self, identifier: &str, max_results: usize) -> Vec<VideoRecord> {
        let mut videos = Vec::new();
        if max_results == 0 {
            return videos;
        }
        let Some(channel_id) = resolve_channel_id(self, identifier).await else {
            return videos;
        };

        let playlist_id = uploads_playlist_id(&channel_id);
        let mut page_token: Option<String> = None;

        while videos.len() < max_results {
            let page_size = (max_results - videos.len()).min(MAX_PAGE_SIZE).to_string();
            let mut params = vec![
                ("part", "contentDetails"),
                ("playlistId", playlist_id.as_str()),
                ("maxResults", page_size.as_str()),
            ];
            if let Some(token) = page_token.as_deref() {
                params.push(("pageToken", token));
            }

            let page: ListResponse<PlaylistItem> = match self.list("playlistItems", &params).await {
                Ok(page) => page,
                Err(e) => {
                    warn!("Failed to list uploads for {}: {}", channel_id, e);
                    break;
                }
            };

            let ids: Vec<String> = page
                .items
                .into_iter()
                .map(|item| item.content_details.video_id)
                .collect();
            if ids.is_empty() {
                break;
            }

            match self.fetch_video_details(&ids).await {
                Ok(details) => videos.extend(details),
                Err(e) => {
                    warn!("Failed to fetch video details for {}: {}", channel_id, e);
                    break;
                }
            }

            page_token = page.next_page_token;
            if page_token.is_none() {
                break;
            }
        }

        videos.truncate(max_results);
        info!("Fetched {} videos for channel {}", videos.len(), channel_id);
        videos
    }
}

//! Channel endpoints: listing, detail, deletion, history series and the
//! chart data (series plus publication markers).

use axum::{
    extract::{Path, Query, State},
    response::Response,
};
use chrono::NaiveDate;
use serde::Serialize;

use crate::errors::{AppError, AppResult};
use crate::history::{HistoryPoint, HistorySeries};
use crate::models::{Channel, VideoListEntry, VideoPublication};
use crate::utils::datetime::calendar_date;
use crate::utils::truncate_title;
use crate::web::extractors::{DateRangeParams, VideoFilterParams};
use crate::web::{responses::handle_result, AppState};

/// Marker titles are cut to this many characters
const MARKER_TITLE_CHARS: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelMetric {
    Subscribers,
    Views,
}

impl std::str::FromStr for ChannelMetric {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "subscribers" => Ok(Self::Subscribers),
            "views" => Ok(Self::Views),
            other => Err(AppError::validation(format!(
                "unknown metric '{}', expected 'subscribers' or 'views'",
                other
            ))),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DeletedChannel {
    pub id: String,
    pub deleted: bool,
}

/// A publication plotted on a channel chart
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartMarker {
    #[serde(with = "calendar_date")]
    pub date: NaiveDate,
    pub title: String,
    pub video_id: String,
    /// Metric value on the publication date, interpolated between snapshots
    pub value: f64,
}

#[derive(Debug, Serialize)]
pub struct ChannelChart {
    pub channel_id: String,
    pub metric: ChannelMetric,
    pub series: Vec<HistoryPoint>,
    pub markers: Vec<ChartMarker>,
}

/// Place each publication inside `[start, end]` on the series. A chart
/// without history has nothing to place markers on.
pub fn chart_markers(
    series: &HistorySeries,
    publications: &[VideoPublication],
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Vec<ChartMarker> {
    publications
        .iter()
        .filter(|p| start.map_or(true, |s| p.date >= s))
        .filter(|p| end.map_or(true, |e| p.date <= e))
        .filter_map(|p| {
            // `value_at` is only `None` for an empty series
            let value = series.value_at(p.date)?;
            Some(ChartMarker {
                date: p.date,
                title: truncate_title(&p.title, MARKER_TITLE_CHARS),
                video_id: p.video_id.clone(),
                value,
            })
        })
        .collect()
}

async fn require_channel(state: &AppState, id: &str) -> AppResult<Channel> {
    state
        .database
        .get_channel(id)
        .await?
        .ok_or_else(|| AppError::not_found("channel", id))
}

pub async fn list_channels(State(state): State<AppState>) -> Response {
    handle_result(state.database.list_channels().await.map_err(AppError::from))
}

pub async fn get_channel(Path(id): Path<String>, State(state): State<AppState>) -> Response {
    handle_result(require_channel(&state, &id).await)
}

pub async fn delete_channel(Path(id): Path<String>, State(state): State<AppState>) -> Response {
    let result = async move {
        if state.database.delete_channel(&id).await? {
            Ok::<_, AppError>(DeletedChannel { id, deleted: true })
        } else {
            Err(AppError::not_found("channel", id))
        }
    }
    .await;
    handle_result(result)
}

pub async fn subscriber_history(
    Path(id): Path<String>,
    Query(range): Query<DateRangeParams>,
    State(state): State<AppState>,
) -> Response {
    let result = async move {
        let (start, end) = range.parse()?;
        Ok::<_, AppError>(
            state
                .database
                .get_channel_subscriber_history(&id, start, end)
                .await?,
        )
    }
    .await;
    handle_result(result)
}

pub async fn view_history(
    Path(id): Path<String>,
    Query(range): Query<DateRangeParams>,
    State(state): State<AppState>,
) -> Response {
    let result = async move {
        let (start, end) = range.parse()?;
        Ok::<_, AppError>(state.database.get_channel_view_history(&id, start, end).await?)
    }
    .await;
    handle_result(result)
}

pub async fn publications(Path(id): Path<String>, State(state): State<AppState>) -> Response {
    handle_result(
        state
            .database
            .get_channel_video_publication_dates(&id)
            .await
            .map_err(AppError::from),
    )
}

pub async fn chart(
    Path((id, metric)): Path<(String, String)>,
    Query(range): Query<DateRangeParams>,
    State(state): State<AppState>,
) -> Response {
    let result = async move {
        let metric: ChannelMetric = metric.parse()?;
        let (start, end) = range.parse()?;
        let channel = require_channel(&state, &id).await?;

        let full = match metric {
            ChannelMetric::Subscribers => channel.subscriber_series(),
            ChannelMetric::Views => channel.view_series(),
        };
        let series = HistorySeries::from_points(full.range(start, end));
        let publications = state
            .database
            .get_channel_video_publication_dates(&channel.id)
            .await?;

        Ok::<_, AppError>(ChannelChart {
            markers: chart_markers(&series, &publications, start, end),
            series: series.into_points(),
            channel_id: channel.id,
            metric,
        })
    }
    .await;
    handle_result(result)
}

pub async fn list_videos(
    Path(id): Path<String>,
    Query(filter): Query<VideoFilterParams>,
    State(state): State<AppState>,
) -> Response {
    let result = async move {
        let channel = require_channel(&state, &id).await?;
        let videos = state
            .database
            .list_videos_for_channel(&channel.id, filter.hidden)
            .await?;
        Ok::<_, AppError>(videos.iter().map(VideoListEntry::from).collect::<Vec<_>>())
    }
    .await;
    handle_result(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::date;

    fn publication(day: &str, title: &str) -> VideoPublication {
        VideoPublication {
            date: date(day),
            title: title.to_string(),
            video_id: format!("id-{}", day),
        }
    }

    #[test]
    fn test_metric_parsing() {
        assert_eq!("views".parse::<ChannelMetric>().unwrap(), ChannelMetric::Views);
        assert!("likes".parse::<ChannelMetric>().is_err());
    }

    #[test]
    fn test_markers_interpolate_and_truncate() {
        let series = HistorySeries::from_points(vec![
            HistoryPoint::new(date("2025-01-01"), 100),
            HistoryPoint::new(date("2025-01-11"), 200),
        ]);
        let long_title = "x".repeat(60);
        let publications = vec![
            publication("2024-12-01", "early"),
            publication("2025-01-06", &long_title),
            publication("2025-02-01", "late"),
        ];

        let markers = chart_markers(&series, &publications, None, None);
        let values: Vec<_> = markers.iter().map(|m| m.value).collect();
        assert_eq!(values, vec![100.0, 150.0, 200.0]);
        assert_eq!(markers[1].title, format!("{}...", "x".repeat(50)));

        let bounded = chart_markers(
            &series,
            &publications,
            Some(date("2025-01-01")),
            Some(date("2025-01-31")),
        );
        assert_eq!(bounded.len(), 1);
    }

    #[test]
    fn test_no_markers_without_history() {
        let markers = chart_markers(
            &HistorySeries::new(),
            &[publication("2025-01-01", "only")],
            None,
            None,
        );
        assert!(markers.is_empty());
    }
}

use axum::{
    extract::{Path, Query, State},
    response::Response,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::analytics::{analysis_template, VideoStats};
use crate::errors::{AppError, AppResult};
use crate::history::{Growth, HistoryPoint, HistorySeries};
use crate::models::Video;
use crate::utils::watch_url;
use crate::web::extractors::DateRangeParams;
use crate::web::{responses::handle_result, AppState};

#[derive(Debug, Serialize)]
pub struct VideoDetail {
    #[serde(flatten)]
    pub video: Video,
    pub url: String,
    pub like_ratio: Option<f64>,
    pub stats: VideoStats,
}

impl From<Video> for VideoDetail {
    fn from(video: Video) -> Self {
        Self {
            url: watch_url(&video.id),
            like_ratio: video.like_ratio(),
            stats: VideoStats::compute(&video, Utc::now()),
            video,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct VideoViewHistory {
    pub video_id: String,
    pub points: Vec<HistoryPoint>,
    pub growth: Option<Growth>,
}

#[derive(Debug, Serialize)]
pub struct AnalysisTemplate {
    pub video_id: String,
    pub template: String,
}

#[derive(Debug, Deserialize)]
pub struct HiddenRequest {
    pub hidden: bool,
}

#[derive(Debug, Deserialize)]
pub struct AnalysisRequest {
    pub analysis: String,
}

async fn require_video(state: &AppState, id: &str) -> AppResult<Video> {
    state
        .database
        .get_video(id)
        .await?
        .ok_or_else(|| AppError::not_found("video", id))
}

pub async fn get_video(Path(id): Path<String>, State(state): State<AppState>) -> Response {
    handle_result(require_video(&state, &id).await.map(VideoDetail::from))
}

pub async fn view_history(
    Path(id): Path<String>,
    Query(range): Query<DateRangeParams>,
    State(state): State<AppState>,
) -> Response {
    let result = async move {
        let (start, end) = range.parse()?;
        let points = state.database.get_video_view_history(&id, start, end).await?;
        let series = HistorySeries::from_points(points);
        Ok::<_, AppError>(VideoViewHistory {
            growth: series.growth(),
            points: series.into_points(),
            video_id: id,
        })
    }
    .await;
    handle_result(result)
}

pub async fn set_hidden(
    Path(id): Path<String>,
    State(state): State<AppState>,
    Json(request): Json<HiddenRequest>,
) -> Response {
    let result = async move {
        if !state.database.set_video_hidden(&id, request.hidden).await? {
            return Err(AppError::not_found("video", id));
        }
        info!(
            "Video {} {}",
            id,
            if request.hidden { "hidden" } else { "restored" }
        );
        require_video(&state, &id).await.map(VideoDetail::from)
    }
    .await;
    handle_result(result)
}

pub async fn save_analysis(
    Path(id): Path<String>,
    State(state): State<AppState>,
    Json(request): Json<AnalysisRequest>,
) -> Response {
    let result = async move {
        if request.analysis.trim().is_empty() {
            return Err(AppError::validation(
                "analysis must not be empty; use DELETE to remove it",
            ));
        }
        if !state
            .database
            .set_video_analysis(&id, Some(&request.analysis))
            .await?
        {
            return Err(AppError::not_found("video", id));
        }
        require_video(&state, &id).await.map(VideoDetail::from)
    }
    .await;
    handle_result(result)
}

pub async fn delete_analysis(Path(id): Path<String>, State(state): State<AppState>) -> Response {
    let result = async move {
        if !state.database.set_video_analysis(&id, None).await? {
            return Err(AppError::not_found("video", id));
        }
        require_video(&state, &id).await.map(VideoDetail::from)
    }
    .await;
    handle_result(result)
}

pub async fn get_analysis_template(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Response {
    let result = require_video(&state, &id).await.map(|video| {
        let stats = VideoStats::compute(&video, Utc::now());
        AnalysisTemplate {
            template: analysis_template(&video.title, &stats),
            video_id: video.id,
        }
    });
    handle_result(result)
}

use chrono::{NaiveDate, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use tracing::{debug, error, info};

use super::{parse_timestamp, to_db_count, Database};
use crate::errors::{RepositoryError, RepositoryResult};
use crate::history::{points_in_range, HistoryPoint, HistoryRecorder};
use crate::models::{Video, VideoPublication};
use crate::sources::VideoRecord;
use crate::utils::datetime::DateTimeParser;

const VIDEO_COLUMNS: &str = "id, channel_id, title, description, published_at, view_count,
     like_count, comment_count, fetched_at, hidden, analysis,
     view_count_history, like_count_history, comment_count_history";

fn video_from_row(row: &SqliteRow) -> RepositoryResult<Video> {
    let published_at: String = row.try_get("published_at")?;
    let fetched_at: String = row.try_get("fetched_at")?;
    Ok(Video {
        id: row.try_get("id")?,
        channel_id: row.try_get("channel_id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        published_at: parse_timestamp("videos", "published_at", &published_at)?,
        view_count: row.try_get("view_count")?,
        like_count: row.try_get("like_count")?,
        comment_count: row.try_get("comment_count")?,
        fetched_at: parse_timestamp("videos", "fetched_at", &fetched_at)?,
        hidden: row.try_get("hidden")?,
        analysis: row.try_get("analysis")?,
        view_count_history: row.try_get("view_count_history")?,
        like_count_history: row.try_get("like_count_history")?,
        comment_count_history: row.try_get("comment_count_history")?,
    })
}

impl Database {
    /// Upsert a batch of fetched videos for one channel in a single transaction.
    ///
    /// Scalar fields are overwritten and today's view, like and comment counts
    /// are merged into their histories. The hidden flag and analysis of known
    /// videos are left alone. Any failure rolls the whole batch back.
    pub async fn save_videos(
        &self,
        channel_id: &str,
        videos: &[VideoRecord],
        recorder: &HistoryRecorder,
    ) -> RepositoryResult<usize> {
        let saved = self
            .write_videos(channel_id, videos, recorder)
            .await
            .map_err(|e| {
                error!(
                    "Failed to save {} videos for channel {}, rolled back batch: {}",
                    videos.len(),
                    channel_id,
                    e
                );
                e
            })?;
        info!("Saved {} videos for channel {}", saved, channel_id);
        Ok(saved)
    }

    async fn write_videos(
        &self,
        channel_id: &str,
        videos: &[VideoRecord],
        recorder: &HistoryRecorder,
    ) -> RepositoryResult<usize> {
        let mut tx = self.pool.begin().await?;
        let fetched_at = DateTimeParser::format_for_storage(&Utc::now());

        for video in videos {
            let existing: Option<(Option<String>, Option<String>, Option<String>)> = sqlx::query_as(
                "SELECT view_count_history, like_count_history, comment_count_history
                 FROM videos WHERE id = ?",
            )
            .bind(&video.id)
            .fetch_optional(&mut *tx)
            .await?;
            let (views, likes, comments) = existing.unwrap_or((None, None, None));

            let views = recorder.add_point(views.as_deref(), video.view_count, None)?;
            let likes = recorder.add_point(likes.as_deref(), video.like_count, None)?;
            let comments = recorder.add_point(comments.as_deref(), video.comment_count, None)?;

            sqlx::query(
                "INSERT INTO videos (id, channel_id, title, description, published_at,
                                     view_count, like_count, comment_count, fetched_at,
                                     view_count_history, like_count_history, comment_count_history)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                 ON CONFLICT(id) DO UPDATE SET
                    channel_id = excluded.channel_id,
                    title = excluded.title,
                    description = excluded.description,
                    published_at = excluded.published_at,
                    view_count = excluded.view_count,
                    like_count = excluded.like_count,
                    comment_count = excluded.comment_count,
                    fetched_at = excluded.fetched_at,
                    view_count_history = excluded.view_count_history,
                    like_count_history = excluded.like_count_history,
                    comment_count_history = excluded.comment_count_history",
            )
            .bind(&video.id)
            .bind(channel_id)
            .bind(&video.title)
            .bind(&video.description)
            .bind(DateTimeParser::format_for_storage(&video.published_at))
            .bind(to_db_count(video.view_count))
            .bind(to_db_count(video.like_count))
            .bind(to_db_count(video.comment_count))
            .bind(&fetched_at)
            .bind(&views)
            .bind(&likes)
            .bind(&comments)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                RepositoryError::query_failed(format!("upsert video {}", video.id), e.to_string())
            })?;
        }

        // an early return drops `tx`, rolling back the whole batch
        tx.commit().await?;
        Ok(videos.len())
    }

    pub async fn get_video(&self, video_id: &str) -> RepositoryResult<Option<Video>> {
        let row = sqlx::query(&format!("SELECT {} FROM videos WHERE id = ?", VIDEO_COLUMNS))
            .bind(video_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(video_from_row).transpose()
    }

    /// Videos of a channel with the given hidden flag, newest first
    pub async fn list_videos_for_channel(
        &self,
        channel_id: &str,
        hidden: bool,
    ) -> RepositoryResult<Vec<Video>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM videos WHERE channel_id = ? AND hidden = ?
             ORDER BY published_at DESC, id",
            VIDEO_COLUMNS
        ))
        .bind(channel_id)
        .bind(hidden)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(video_from_row).collect()
    }

    /// Returns `false` when the video does not exist
    pub async fn set_video_hidden(&self, video_id: &str, hidden: bool) -> RepositoryResult<bool> {
        let affected = sqlx::query("UPDATE videos SET hidden = ? WHERE id = ?")
            .bind(hidden)
            .bind(video_id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        debug!("Set hidden={} on video {} ({} rows)", hidden, video_id, affected);
        Ok(affected > 0)
    }

    /// Store (or with `None`, clear) the free-text analysis of a video
    pub async fn set_video_analysis(
        &self,
        video_id: &str,
        analysis: Option<&str>,
    ) -> RepositoryResult<bool> {
        let affected = sqlx::query("UPDATE videos SET analysis = ? WHERE id = ?")
            .bind(analysis)
            .bind(video_id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(affected > 0)
    }

    /// View history of a video within `[start, end]`; empty when unknown
    pub async fn get_video_view_history(
        &self,
        video_id: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> RepositoryResult<Vec<HistoryPoint>> {
        let blob: Option<Option<String>> =
            sqlx::query_scalar("SELECT view_count_history FROM videos WHERE id = ?")
                .bind(video_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(points_in_range(blob.flatten().as_deref(), start, end))
    }

    /// Publication markers for the visible videos of a channel, oldest first
    pub async fn get_channel_video_publication_dates(
        &self,
        channel_id: &str,
    ) -> RepositoryResult<Vec<VideoPublication>> {
        let rows = sqlx::query(
            "SELECT id, title, published_at FROM videos
             WHERE channel_id = ? AND hidden = 0
             ORDER BY published_at, id",
        )
        .bind(channel_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> RepositoryResult<VideoPublication> {
                let published_at: String = row.try_get("published_at")?;
                Ok(VideoPublication {
                    date: parse_timestamp("videos", "published_at", &published_at)?.date_naive(),
                    title: row.try_get("title")?,
                    video_id: row.try_get("id")?,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_database;
    use crate::sources::ChannelRecord;
    use crate::utils::time::CalendarZone;
    use chrono::TimeZone;

    fn recorder() -> HistoryRecorder {
        HistoryRecorder::new(CalendarZone::from_config(Some("UTC")).unwrap())
    }

    fn video(id: &str, day: u32, views: u64) -> VideoRecord {
        VideoRecord {
            id: id.to_string(),
            title: format!("Video {}", id),
            description: String::new(),
            published_at: Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0).unwrap(),
            view_count: views,
            like_count: views / 10,
            comment_count: views / 100,
        }
    }

    async fn database_with_channel() -> Database {
        let db = test_database().await;
        let channel = ChannelRecord {
            id: "UC1".to_string(),
            title: "One".to_string(),
            description: String::new(),
            subscribers: 10,
            video_count: 3,
            view_count: 1000,
        };
        db.upsert_channel(&channel, &recorder()).await.unwrap();
        db
    }

    #[tokio::test]
    async fn test_save_and_list_newest_first() {
        let db = database_with_channel().await;
        let batch = [video("a", 1, 100), video("b", 3, 300), video("c", 2, 200)];
        let saved = db.save_videos("UC1", &batch, &recorder()).await.unwrap();
        assert_eq!(saved, 3);

        let ids: Vec<_> = db
            .list_videos_for_channel("UC1", false)
            .await
            .unwrap()
            .into_iter()
            .map(|v| v.id)
            .collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
        assert!(db.list_videos_for_channel("UC1", true).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_upsert_preserves_hidden_and_analysis() {
        let db = database_with_channel().await;
        let recorder = recorder();
        db.save_videos("UC1", &[video("a", 1, 100)], &recorder).await.unwrap();
        assert!(db.set_video_hidden("a", true).await.unwrap());
        assert!(db.set_video_analysis("a", Some("# notes")).await.unwrap());

        db.save_videos("UC1", &[video("a", 1, 250)], &recorder).await.unwrap();

        let stored = db.get_video("a").await.unwrap().unwrap();
        assert_eq!(stored.view_count, 250);
        assert!(stored.hidden);
        assert_eq!(stored.analysis.as_deref(), Some("# notes"));
        assert_eq!(stored.view_series().len(), 1);
        assert_eq!(stored.like_series().get(recorder.today()), Some(25));
        assert_eq!(stored.comment_series().get(recorder.today()), Some(2));

        assert!(db.set_video_analysis("a", None).await.unwrap());
        assert!(db.get_video("a").await.unwrap().unwrap().analysis.is_none());
        assert!(!db.set_video_hidden("missing", true).await.unwrap());
    }

    #[tokio::test]
    async fn test_failing_batch_leaves_no_partial_rows() {
        let db = database_with_channel().await;
        sqlx::query(
            "CREATE TRIGGER reject_boom BEFORE INSERT ON videos WHEN NEW.id = 'boom'
             BEGIN SELECT RAISE(ABORT, 'rejected'); END",
        )
        .execute(&db.pool())
        .await
        .unwrap();

        let result = db
            .save_videos("UC1", &[video("ok", 1, 10), video("boom", 2, 20)], &recorder())
            .await;
        assert!(matches!(
            result,
            Err(RepositoryError::QueryFailed { ref query, .. }) if query.contains("boom")
        ));

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM videos")
            .fetch_one(&db.pool())
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_videos_for_unknown_channel_are_rejected() {
        let db = test_database().await;
        assert!(db
            .save_videos("UCghost", &[video("a", 1, 1)], &recorder())
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_publication_dates_skip_hidden() {
        let db = database_with_channel().await;
        let batch = [video("a", 5, 1), video("b", 2, 1), video("c", 9, 1)];
        db.save_videos("UC1", &batch, &recorder()).await.unwrap();
        db.set_video_hidden("c", true).await.unwrap();

        let markers = db.get_channel_video_publication_dates("UC1").await.unwrap();
        assert_eq!(
            markers,
            vec![
                VideoPublication {
                    date: NaiveDate::from_ymd_opt(2024, 3, 2).unwrap(),
                    title: "Video b".to_string(),
                    video_id: "b".to_string(),
                },
                VideoPublication {
                    date: NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(),
                    title: "Video a".to_string(),
                    video_id: "a".to_string(),
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_delete_channel_removes_videos() {
        let db = database_with_channel().await;
        db.save_videos("UC1", &[video("a", 1, 1), video("b", 2, 1)], &recorder())
            .await
            .unwrap();

        assert!(db.delete_channel("UC1").await.unwrap());
        assert!(db.get_video("a").await.unwrap().is_none());
        assert!(db.get_video_view_history("a", None, None).await.unwrap().is_empty());
    }
}

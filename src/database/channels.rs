use chrono::{NaiveDate, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use tracing::{debug, error, info};

use super::{parse_timestamp, Database};
use crate::errors::RepositoryResult;
use crate::history::{points_in_range, HistoryPoint, HistoryRecorder};
use crate::models::Channel;
use crate::sources::ChannelRecord;
use crate::utils::datetime::DateTimeParser;

const CHANNEL_COLUMNS: &str = "id, title, description, subscribers, video_count, view_count,
     fetched_at, subscriber_history, view_count_history";

fn channel_from_row(row: &SqliteRow) -> RepositoryResult<Channel> {
    let fetched_at: String = row.try_get("fetched_at")?;
    Ok(Channel {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        subscribers: row.try_get("subscribers")?,
        video_count: row.try_get("video_count")?,
        view_count: row.try_get("view_count")?,
        fetched_at: parse_timestamp("channels", "fetched_at", &fetched_at)?,
        subscriber_history: row.try_get("subscriber_history")?,
        view_count_history: row.try_get("view_count_history")?,
    })
}

impl Database {
    /// Insert or refresh a channel from a fetched record and append today's
    /// subscriber and view counts to its history. One transaction.
    pub async fn upsert_channel(
        &self,
        record: &ChannelRecord,
        recorder: &HistoryRecorder,
    ) -> RepositoryResult<Channel> {
        let channel = self.write_channel(record, recorder).await.map_err(|e| {
            error!("Failed to save channel {}, rolled back: {}", record.id, e);
            e
        })?;
        info!("Saved channel {} ({})", channel.title, channel.id);
        Ok(channel)
    }

    async fn write_channel(
        &self,
        record: &ChannelRecord,
        recorder: &HistoryRecorder,
    ) -> RepositoryResult<Channel> {
        let mut tx = self.pool.begin().await?;

        let existing: Option<(Option<String>, Option<String>)> = sqlx::query_as(
            "SELECT subscriber_history, view_count_history FROM channels WHERE id = ?",
        )
        .bind(&record.id)
        .fetch_optional(&mut *tx)
        .await?;
        let (subscriber_history, view_count_history) = existing.unwrap_or((None, None));

        let subscriber_history =
            recorder.add_point(subscriber_history.as_deref(), record.subscribers, None)?;
        let view_count_history =
            recorder.add_point(view_count_history.as_deref(), record.view_count, None)?;

        sqlx::query(
            "INSERT INTO channels (id, title, description, subscribers, video_count, view_count,
                                   fetched_at, subscriber_history, view_count_history)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                description = excluded.description,
                subscribers = excluded.subscribers,
                video_count = excluded.video_count,
                view_count = excluded.view_count,
                fetched_at = excluded.fetched_at,
                subscriber_history = excluded.subscriber_history,
                view_count_history = excluded.view_count_history",
        )
        .bind(&record.id)
        .bind(&record.title)
        .bind(&record.description)
        .bind(super::to_db_count(record.subscribers))
        .bind(super::to_db_count(record.video_count))
        .bind(super::to_db_count(record.view_count))
        .bind(DateTimeParser::format_for_storage(&Utc::now()))
        .bind(&subscriber_history)
        .bind(&view_count_history)
        .execute(&mut *tx)
        .await?;

        let row = sqlx::query(&format!("SELECT {} FROM channels WHERE id = ?", CHANNEL_COLUMNS))
            .bind(&record.id)
            .fetch_one(&mut *tx)
            .await?;
        let channel = channel_from_row(&row)?;

        tx.commit().await?;
        Ok(channel)
    }

    pub async fn get_channel(&self, channel_id: &str) -> RepositoryResult<Option<Channel>> {
        let row = sqlx::query(&format!("SELECT {} FROM channels WHERE id = ?", CHANNEL_COLUMNS))
            .bind(channel_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(channel_from_row).transpose()
    }

    /// All channels ordered by title
    pub async fn list_channels(&self) -> RepositoryResult<Vec<Channel>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM channels ORDER BY title COLLATE NOCASE, id",
            CHANNEL_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(channel_from_row).collect()
    }

    /// Delete a channel together with its videos.
    ///
    /// Returns `false` when no such channel exists.
    pub async fn delete_channel(&self, channel_id: &str) -> RepositoryResult<bool> {
        let mut tx = self.pool.begin().await?;

        let videos = sqlx::query("DELETE FROM videos WHERE channel_id = ?")
            .bind(channel_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        let channels = sqlx::query("DELETE FROM channels WHERE id = ?")
            .bind(channel_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;

        if channels > 0 {
            info!("Deleted channel {} and {} videos", channel_id, videos);
        } else {
            debug!("Delete requested for unknown channel {}", channel_id);
        }
        Ok(channels > 0)
    }

    /// Subscriber history of a channel within `[start, end]`; empty when the
    /// channel is unknown
    pub async fn get_channel_subscriber_history(
        &self,
        channel_id: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> RepositoryResult<Vec<HistoryPoint>> {
        let blob: Option<Option<String>> =
            sqlx::query_scalar("SELECT subscriber_history FROM channels WHERE id = ?")
                .bind(channel_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(points_in_range(blob.flatten().as_deref(), start, end))
    }

    /// View history of a channel within `[start, end]`; empty when the channel
    /// is unknown
    pub async fn get_channel_view_history(
        &self,
        channel_id: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> RepositoryResult<Vec<HistoryPoint>> {
        let blob: Option<Option<String>> =
            sqlx::query_scalar("SELECT view_count_history FROM channels WHERE id = ?")
                .bind(channel_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(points_in_range(blob.flatten().as_deref(), start, end))
    }
}
